//! # plumrs CLI Pping Integration Tests
//!
//! File: cli/tests/pping.rs
//!
//! ## Overview
//!
//! Error paths of `plum pping`. A successful sweep needs a real network, so
//! the sweep itself is covered by the unit tests with a scripted runner.
//!

mod common;
use common::*;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_missing_host_type_is_fatal_without_output() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), SAMPLE_CONFIG);
    plum_cmd()
        .args(["pping", "-t", "lab", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("missing key: host_type_lab"));
}

#[test]
fn test_config_from_environment() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), SAMPLE_CONFIG);
    plum_cmd()
        .env("PLUM_CONFIG", &config)
        .args(["pping", "-t", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("host_type_nope"));
}

#[test]
fn test_invalid_config_is_fatal() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "host_type_default: [1, 2]\n");
    plum_cmd()
        .args(["pping", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid format"));
}
