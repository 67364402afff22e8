//! # plumrs CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Each test file
//! declares `mod common;` and drives the compiled `plum` binary through
//! `assert_cmd`.
//!
//! Every command built by `plum_cmd` runs with `NO_COLOR` set and `RUST_LOG`
//! removed, so stdout can be matched literally and log output stays at the
//! default level.
//!

// Not every test file uses every helper.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration used by most tests: one host type and default credentials.
pub const SAMPLE_CONFIG: &str = r#"
default_ssh_conf:
  user: root
  port: 22
  identityfile: /keys/id_rsa
ipmi_interval: 100
host_type_default: "10.10.100"
"#;

/// `assert_cmd::Command` for the `plum` binary built for this test run.
pub fn plum_cmd() -> Command {
    let mut cmd = Command::cargo_bin("plum").expect("Failed to find plum binary for testing");
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

/// Writes `content` to `dir/plum.yaml` and returns the path.
pub fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("plum.yaml");
    fs::write(&path, content).expect("Failed to write test config");
    path
}

/// Author and committer identity for git commands run by the tests.
pub const GIT_IDENTITY: [(&str, &str); 4] = [
    ("GIT_AUTHOR_NAME", "plum"),
    ("GIT_AUTHOR_EMAIL", "plum@example.com"),
    ("GIT_COMMITTER_NAME", "plum"),
    ("GIT_COMMITTER_EMAIL", "plum@example.com"),
];

/// Runs `git` in `dir` with a fixed identity, returning stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .envs(GIT_IDENTITY)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Whether a `git` binary is available; git-based tests return early without it.
pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
