//! # plumrs Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Foundational pieces used by every subcommand:
//! - `config`: loading and validating `~/.plum_tools.yaml`
//! - `constants`: command templates, timeouts and pool size
//! - `error`: `PlumError`, `CommandError` and the crate-wide `Result` alias
//!
//! ## Usage
//!
//! ```rust
//! use crate::core::config;
//! use crate::core::error::{PlumError, Result};
//! ```
//!
pub mod config;
pub mod constants;
pub mod error;
