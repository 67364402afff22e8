//! # plumrs Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! One module per subcommand of the `plum` binary. Each module defines a
//! `clap` argument struct and an async `handle_*` function called from
//! `main.rs`.
//!
//! - `gitrepo`: report repositories with local changes, upstream drift or stashes
//! - `gitstash`: switch branches, carrying local changes in a marked stash
//! - `pping`: ping sweep of a /24 prefix
//! - `pssh`: interactive ssh login by IP shorthand or alias
//! - `pipmi`: `ipmitool` against out-of-band addresses through a jump host
//! - `prn`: rsync configured projects to or from hosts
//!
//! Handlers never exit the process themselves; they return errors to `main`.
//! The parts that run external commands take a `CommandRunner` so they can be
//! exercised with a scripted runner in the unit tests.
//!
//! This module also holds `GlobalArgs`, the flags shared by every subcommand.
//!
use crate::core::config::{self, Config};
use crate::core::error::Result;
use clap::Args;
use std::path::PathBuf;

pub mod gitrepo;
pub mod gitstash;
pub mod pipmi;
pub mod pping;
pub mod prn;
pub mod pssh;

/// Options accepted before or after any subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file [default: ~/.plum_tools.yaml]
    #[arg(long, global = true, env = "PLUM_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// ssh client configuration used for alias lookup [default: ~/.ssh/config]
    #[arg(long, global = true, env = "PLUM_SSH_CONFIG", value_name = "FILE")]
    pub ssh_config: Option<PathBuf>,
}

impl GlobalArgs {
    /// Loads the configuration file selected by `--config` or the default path.
    pub fn load_config(&self) -> Result<Config> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => config::default_config_path()?,
        };
        config::load_config(&path)
    }

    pub fn ssh_config_path(&self) -> Result<PathBuf> {
        match &self.ssh_config {
            Some(path) => Ok(path.clone()),
            None => config::default_ssh_config_path(),
        }
    }
}
