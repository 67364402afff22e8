//! # plumrs CLI Gitstash Integration Tests
//!
//! File: cli/tests/gitstash.rs
//!
//! ## Overview
//!
//! Round trip of `plum gitstash` on a real repository: changes made on one
//! branch follow it across a switch to another branch and back. Tests return
//! early when git is not installed.
//!

mod common;
use common::*;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_changes_follow_their_branch() {
    if !git_available() {
        return;
    }
    let repo = tempdir().unwrap();
    let path = repo.path();
    git(path, &["init", "-q"]);
    fs::write(path.join("a.txt"), "base\n").unwrap();
    git(path, &["add", "a.txt"]);
    git(path, &["commit", "-q", "-m", "init"]);
    let main = git(path, &["rev-parse", "--abbrev-ref", "HEAD"]).trim().to_string();
    git(path, &["branch", "dev"]);

    fs::write(path.join("a.txt"), "work on main\n").unwrap();
    plum_cmd()
        .envs(GIT_IDENTITY)
        .args(["gitstash", "dev", "--path"])
        .arg(path)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Switched from {} to dev", main)));
    assert_eq!(git(path, &["rev-parse", "--abbrev-ref", "HEAD"]).trim(), "dev");
    assert_eq!(fs::read_to_string(path.join("a.txt")).unwrap(), "base\n");

    plum_cmd()
        .envs(GIT_IDENTITY)
        .args(["gitstash", main.as_str(), "--path"])
        .arg(path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored stash@{0}"));
    assert_eq!(
        fs::read_to_string(path.join("a.txt")).unwrap(),
        "work on main\n"
    );
    assert!(git(path, &["stash", "list"]).trim().is_empty());
}

#[test]
fn test_same_branch_is_a_no_op() {
    if !git_available() {
        return;
    }
    let repo = tempdir().unwrap();
    git(repo.path(), &["init", "-q"]);
    fs::write(repo.path().join("a.txt"), "x").unwrap();
    git(repo.path(), &["add", "a.txt"]);
    git(repo.path(), &["commit", "-q", "-m", "init"]);
    let branch = git(repo.path(), &["rev-parse", "--abbrev-ref", "HEAD"]);

    plum_cmd()
        .args(["gitstash", branch.trim(), "--path"])
        .arg(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Already on branch"));
}

#[test]
fn test_outside_repository_is_fatal() {
    let dir = tempdir().unwrap();
    plum_cmd()
        .args(["gitstash", "main", "--path"])
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Not a git repository"));
}

#[test]
fn test_untracked_files_follow_their_branch() {
    if !git_available() {
        return;
    }
    let repo = tempdir().unwrap();
    let path = repo.path();
    git(path, &["init", "-q"]);
    fs::write(path.join("a.txt"), "base\n").unwrap();
    git(path, &["add", "a.txt"]);
    git(path, &["commit", "-q", "-m", "init"]);
    let main = git(path, &["rev-parse", "--abbrev-ref", "HEAD"]).trim().to_string();
    git(path, &["branch", "dev"]);

    fs::write(path.join("untracked.txt"), "draft\n").unwrap();
    plum_cmd()
        .envs(GIT_IDENTITY)
        .args(["gitstash", "dev", "--path"])
        .arg(path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Stashed local changes"));
    assert!(!path.join("untracked.txt").exists());
    assert!(git(path, &["stash", "list"]).contains(&format!("{}-plum", main)));

    plum_cmd()
        .envs(GIT_IDENTITY)
        .args(["gitstash", main.as_str(), "--path"])
        .arg(path)
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(path.join("untracked.txt")).unwrap(),
        "draft\n"
    );
    assert!(git(path, &["stash", "list"]).trim().is_empty());
}
