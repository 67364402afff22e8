//! # plumrs CLI Prn Integration Tests
//!
//! File: cli/tests/prn.rs
//!
//! ## Overview
//!
//! Argument handling and validation of `plum prn`. Every case here fails or
//! stops before rsync would be started.
//!

mod common;
use common::*;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_no_servers_prints_help() {
    plum_cmd()
        .arg("prn")
        .assert()
        .success()
        .stdout(predicate::str::contains("--servers"));
}

#[test]
fn test_multiple_local_and_remote_rejected() {
    plum_cmd()
        .args(["prn", "-s", "5", "-l", "a", "b", "-r", "c", "d"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot both have several values"));
}

#[test]
fn test_missing_local_path_is_reported() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), SAMPLE_CONFIG);
    plum_cmd()
        .args(["prn", "-s", "5", "-l", "/definitely/not/here", "-r", "/tmp/x", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Path does not exist: /definitely/not/here"));
}

#[test]
fn test_unknown_project_is_reported() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), SAMPLE_CONFIG);
    plum_cmd()
        .args(["prn", "-s", "5", "-p", "web", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no project 'web'"));
}

#[test]
fn test_delete_flag_accepts_only_zero_or_one() {
    plum_cmd()
        .args(["prn", "-s", "5", "-d", "3"])
        .assert()
        .failure()
        .code(2);
}
