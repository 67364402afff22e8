//! # plumrs Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared building blocks used by the subcommands in `commands::`. Nothing in
//! here parses arguments or decides exit codes; that stays with the command
//! handlers and `main`.
//!
//! ## Architecture
//!
//! - **`process`**: the Command Runner. Every external program (git, ping,
//!   ssh, rsync) is started through it.
//! - **`scan`**: `ProbeOutcome` and the bounded concurrent `Scanner`.
//! - **`fs`**: git repository discovery and local/remote path handling.
//! - **`git`**: git command wrappers and the repository-change probe.
//! - **`network`**: IP range enumeration, host shorthand, the ping probe and
//!   IPMI addressing.
//! - **`ssh`**: host resolution against `~/.ssh/config` and ssh command lines.
//! - **`ui`**: colored stdout output.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::{network, process::SystemRunner, scan::Scanner};
//!
//! let outcomes = Scanner::new(POOL_SIZE)
//!     .scan(network::host_range("10.0.0"), |ip| Some(network::ping(&SystemRunner, ip)))
//!     .await;
//! ```
//!

pub mod fs;
pub mod git;
pub mod network;
/// External command execution and shell quoting.
pub mod process;
/// Bounded concurrent probing of many targets.
pub mod scan;
pub mod ssh;
/// Terminal output helpers.
pub mod ui;
