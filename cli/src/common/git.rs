//! # plumrs Git Helpers (`common::git`)
//!
//! File: cli/src/common/git.rs
//!
//! ## Overview
//!
//! Thin wrappers around the `git` CLI plus the repository-change probe used by
//! `plum gitrepo`. Git is treated purely as a subprocess: fixed command
//! templates from `core::constants::git`, substring checks on the output.
//! Every call passes the repository as the child's working directory.
//!
//! ## Repository-change probe
//!
//! `check_repository` classifies one working tree:
//! 1. `git status` mentioning `"git pull"` or `"git push"` means the branch is
//!    behind/ahead of its upstream: match, tag `status`.
//! 2. Otherwise non-empty `git status -s` means uncommitted changes: match,
//!    tag `status`.
//! 3. Otherwise, when stash checking is enabled, a non-empty `git stash list`
//!    is a match tagged `stash`.
//!
//! Git failures never escape the probe. They produce a non-matching outcome
//! tagged `error` with the message as detail, and a warning in the log.
//!
use crate::common::process::{quote, CommandRunner};
use crate::common::scan::ProbeOutcome;
use crate::core::constants::git as cmd;
use crate::core::error::CommandError;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const TAG_STATUS: &str = "status";
pub const TAG_STASH: &str = "stash";
pub const TAG_ERROR: &str = "error";

/// Name of the branch checked out in `repo`.
pub fn current_branch(runner: &dyn CommandRunner, repo: &Path) -> Result<String, CommandError> {
    Ok(runner
        .run(cmd::BRANCH_ABBREV, Some(repo), None)?
        .trim()
        .to_string())
}

/// Whether `repo` has local changes or diverges from its upstream, with the `git status` output.
pub fn check_modify_status(
    runner: &dyn CommandRunner,
    repo: &Path,
) -> Result<(bool, String), CommandError> {
    let output = runner.run(cmd::STATUS, Some(repo), None)?;
    if output.contains(cmd::PULL_KEYWORD) || output.contains(cmd::PUSH_KEYWORD) {
        return Ok((true, output));
    }
    Ok((has_local_changes(runner, repo)?, output))
}

/// Whether `repo` has uncommitted changes to tracked or untracked files.
pub fn has_local_changes(runner: &dyn CommandRunner, repo: &Path) -> Result<bool, CommandError> {
    Ok(!runner
        .run(cmd::STATUS_SHORT, Some(repo), None)?
        .trim()
        .is_empty())
}

/// Whether `repo` has stash entries, with the `git stash list` output.
pub fn check_stash(
    runner: &dyn CommandRunner,
    repo: &Path,
) -> Result<(bool, String), CommandError> {
    let output = runner.run(cmd::STASH_LIST, Some(repo), None)?;
    Ok((!output.trim().is_empty(), output))
}

/// Repository-change probe.
///
/// Matches when `git status` reports local changes or a divergence from the
/// upstream. With `include_stash`, a repository that passed the status check
/// still matches when it has stash entries. The outcome's tag names the
/// check that fired and its detail holds that command's output.
///
/// # Arguments
///
/// * `runner` - Runs the git commands, always with `repo` as working directory.
/// * `repo` - Root of the repository (the directory holding `.git`).
/// * `include_stash` - Also run `git stash list`.
///
/// # Returns
///
/// * `ProbeOutcome<PathBuf>` - Never an error: a failing git command yields an
///   unmatched outcome tagged `error`, with git's stderr as the detail.
pub fn check_repository(
    runner: &dyn CommandRunner,
    repo: PathBuf,
    include_stash: bool,
) -> ProbeOutcome<PathBuf> {
    match classify(runner, &repo, include_stash) {
        Ok(Some((tag, detail))) => ProbeOutcome::matched(repo).with_tag(tag).with_detail(detail),
        Ok(None) => ProbeOutcome::unmatched(repo),
        Err(e) => {
            warn!("Failed to check {}: {}", repo.display(), e);
            let detail = e.stderr().map(str::to_string).unwrap_or_else(|| e.to_string());
            ProbeOutcome::unmatched(repo)
                .with_tag(TAG_ERROR)
                .with_detail(detail)
        }
    }
}

fn classify(
    runner: &dyn CommandRunner,
    repo: &Path,
    include_stash: bool,
) -> Result<Option<(&'static str, String)>, CommandError> {
    let (modified, status) = check_modify_status(runner, repo)?;
    if modified {
        return Ok(Some((TAG_STATUS, status)));
    }
    if include_stash {
        let (stashed, list) = check_stash(runner, repo)?;
        if stashed {
            return Ok(Some((TAG_STASH, list)));
        }
    }
    Ok(None)
}

/// `git stash save --include-untracked "<message>"`.
///
/// Untracked files are included because `has_local_changes` counts them.
pub fn stash_save(
    runner: &dyn CommandRunner,
    repo: &Path,
    message: &str,
) -> Result<String, CommandError> {
    runner.run(
        &format!("{} {}", cmd::STASH_SAVE, quote(message)),
        Some(repo),
        None,
    )
}

/// `git checkout <branch>`.
pub fn checkout(
    runner: &dyn CommandRunner,
    repo: &Path,
    branch: &str,
) -> Result<String, CommandError> {
    runner.run(
        &format!("{} {}", cmd::CHECKOUT, quote(branch)),
        Some(repo),
        None,
    )
}

/// `git stash pop --index <stash_ref>`.
pub fn stash_pop(
    runner: &dyn CommandRunner,
    repo: &Path,
    stash_ref: &str,
) -> Result<String, CommandError> {
    runner.run(
        &format!("{} {}", cmd::STASH_POP, quote(stash_ref)),
        Some(repo),
        None,
    )
}

/// Finds the newest stash whose message is exactly `marker` and returns its ref (`stash@{n}`).
///
/// `git stash list` prints newest first, one `stash@{n}: On <branch>: <message>` per line.
pub fn find_marked_stash(stash_list: &str, marker: &str) -> Option<String> {
    stash_list.lines().find_map(|line| {
        let (stash_ref, message) = line.split_once(':')?;
        let exact = message
            .trim_end()
            .strip_suffix(marker)
            .is_some_and(|head| head.ends_with(": "));
        exact.then(|| stash_ref.trim().to_string())
    })
}
