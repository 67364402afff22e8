//! # plumrs Fixed Commands and Constants
//!
//! File: cli/src/core/constants.rs
//!
//! ## Overview
//!
//! Command templates and numeric constants shared by the subcommands. Templates
//! are plain `&str` constants; call sites format them with already-quoted
//! values (see `common::process::quote`).
//!
use std::time::Duration;

/// Configuration file, relative to the home directory.
pub const CONFIG_FILE_NAME: &str = ".plum_tools.yaml";
/// ssh client configuration, relative to the home directory.
pub const SSH_CONFIG_FILE_NAME: &str = ".ssh/config";

/// Number of concurrent probe slots used by the scanner.
pub const POOL_SIZE: usize = 100;
/// Timeout for a single remote command (seconds).
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(3);
/// Marker appended to the branch name when stashing across a checkout.
pub const STASH_UUID: &str = "plum123456789987654321plum";

/// Commands run inside a git working tree.
pub mod git {
    pub const STASH_LIST: &str = "git stash list";
    pub const STATUS: &str = "git status";
    pub const STATUS_SHORT: &str = "git status -s";
    pub const BRANCH_ABBREV: &str = "git rev-parse --abbrev-ref HEAD";
    pub const STASH_SAVE: &str = "git stash save --include-untracked";
    pub const STASH_POP: &str = "git stash pop --index";
    pub const CHECKOUT: &str = "git checkout";

    /// `git status` hint printed when the branch is behind its upstream.
    pub const PULL_KEYWORD: &str = "\"git pull\"";
    /// `git status` hint printed when the branch is ahead of its upstream.
    pub const PUSH_KEYWORD: &str = "\"git push\"";
}

/// Network and remote-management commands.
pub mod os {
    /// `-W` per-reply timeout in seconds, `-c` packet count.
    pub const PING: &str = "ping -W 3 -c 1";
    pub const IPMITOOL: &str = "ipmitool -I lanplus";
}

/// ssh connection defaults.
pub mod ssh {
    pub const DEFAULT_PORT: u16 = 22;
    /// `ConnectTimeout` for interactive and remote-command sessions (seconds).
    pub const CONNECT_TIMEOUT: u64 = 3;
    /// `ConnectTimeout` used inside the rsync remote shell (seconds).
    pub const RSYNC_CONNECT_TIMEOUT: u64 = 2;
    /// ssh exits with this code when the connection itself fails.
    pub const CONNECTION_FAILURE_EXIT: i32 = 255;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_templates() {
        assert_eq!(git::STATUS_SHORT, "git status -s");
        assert_eq!(git::PULL_KEYWORD, r#""git pull""#);
        assert_eq!(os::PING, "ping -W 3 -c 1");
        assert_eq!(POOL_SIZE, 100);
    }
}
