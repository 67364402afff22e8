//! # plumrs Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout plumrs. Two typed
//! enums cover the failure domains, and the crate-wide `Result` alias is
//! `anyhow::Result` so command handlers can attach context freely.
//!
//! ## Architecture
//!
//! - `CommandError`: failures of a single external process run by the
//!   Command Runner (`common::process`). Every non-zero exit becomes a
//!   `CommandError::NonZeroExit` carrying the captured output.
//! - `PlumError`: everything a command handler may surface to the user:
//!   configuration problems, unknown ssh aliases, missing paths, ssh
//!   connection failures and wrapped command errors.
//! - `SshFailure`: the classified cause of an ssh connection failure.
//!
//! Recoverability is decided by the caller. The ping sweep and the repository
//! scan swallow per-target failures; `pssh`, `pipmi` and `prn` propagate them
//! and `main` turns them into exit code 1.
//!
//! ## Examples
//!
//! ```rust
//! match runner.run(&cmd, None, None) {
//!     Ok(stdout) => println!("{}", stdout),
//!     Err(CommandError::NonZeroExit { stderr, .. }) => ui::print_error(&stderr),
//!     Err(e) => return Err(e.into()),
//! }
//! ```
//!
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of one external command.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` exited with {}", exit_code_display(.exit_code))]
    NonZeroExit {
        command: String,
        /// `None` when the process was terminated by a signal.
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Command `{command}` timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },
}

impl CommandError {
    /// Captured standard error, if the process ran to completion.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            CommandError::NonZeroExit { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Exit code reported by the process, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::NonZeroExit { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

fn exit_code_display(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Classified cause of a failed ssh connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SshFailure {
    Timeout,
    Authentication,
    Unreachable,
    Other,
}

impl fmt::Display for SshFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hint = match self {
            SshFailure::Timeout => {
                "connection timed out, check the user name, IP address and port"
            }
            SshFailure::Authentication => {
                "authentication failed, check the password or identity file"
            }
            SshFailure::Unreachable => "host unreachable, check the port or IP address",
            SshFailure::Other => "connection failed",
        };
        f.write_str(hint)
    }
}

/// Custom error type for plumrs.
#[derive(Error, Debug)]
pub enum PlumError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file {} is missing key: {key}", .path.display())]
    MissingKey { path: PathBuf, key: String },

    #[error("Host '{alias}' is not configured in {}", .path.display())]
    HostAlias { path: PathBuf, alias: String },

    #[error("Path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Invalid host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("SSH connection to {target} failed ({kind}): {stderr}")]
    Connection {
        target: String,
        kind: SshFailure,
        stderr: String,
    },

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Argument error: {0}")]
    Argument(String),
}

/// Type alias for Result using anyhow::Error.
pub type Result<T> = anyhow::Result<T>;
