//! # plumrs Branch Switch (`plum gitstash`)
//!
//! File: cli/src/commands/gitstash.rs
//!
//! ## Overview
//!
//! Switches the repository to another branch without losing work in
//! progress. Local changes on the current branch are stashed under a marker
//! derived from the branch name, and when the target branch has a marked
//! stash of its own it is restored after the checkout. Going back and forth
//! between two branches therefore carries each branch's uncommitted changes
//! with it.
//!
//! ## Workflow
//!
//! 1. Read the current branch (`git rev-parse --abbrev-ref HEAD`). Failure
//!    means the directory is not a repository.
//! 2. Already on the target branch: nothing to do.
//! 3. Local changes, untracked files included:
//!    `git stash save --include-untracked <current>-plum123456789987654321plum`.
//! 4. `git checkout <branch>`.
//! 5. Newest stash marked `<branch>-plum123456789987654321plum`, if any:
//!    `git stash pop --index stash@{n}`.
//!
//! ## Usage
//!
//! ```bash
//! plum gitstash develop
//! plum gitstash main --path ~/code/web
//! ```
//!
use crate::common::fs::paths;
use crate::common::git;
use crate::common::process::{CommandRunner, SystemRunner};
use crate::common::ui;
use crate::core::constants::STASH_UUID;
use crate::core::error::{PlumError, Result};
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Arguments for `plum gitstash`.
#[derive(Parser, Debug)]
#[command(about = "Switch branch, stashing and restoring local changes per branch")]
pub struct GitstashArgs {
    /// Branch to switch to
    #[arg(required = true)]
    branch: String,

    /// Repository to operate on [default: current directory]
    #[arg(long, value_name = "DIR")]
    path: Option<String>,
}

/// What `switch_branch` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchSummary {
    pub from: String,
    pub to: String,
    /// Marker of the stash created for `from`, if any.
    pub stashed: Option<String>,
    /// Stash ref popped for `to`, if any.
    pub restored: Option<String>,
}

impl SwitchSummary {
    pub fn unchanged(&self) -> bool {
        self.from == self.to
    }
}

/// Stash message used for `branch`.
pub fn stash_marker(branch: &str) -> String {
    format!("{}-{}", branch, STASH_UUID)
}

/// Handles `plum gitstash`.
pub async fn handle_gitstash(args: GitstashArgs) -> Result<()> {
    let repo: PathBuf = match &args.path {
        Some(p) => paths::resolve_existing(p)?,
        None => std::env::current_dir().context("Failed to determine the current directory")?,
    };
    let branch = args.branch.clone();
    let summary =
        tokio::task::spawn_blocking(move || switch_branch(&SystemRunner, &repo, &branch))
            .await
            .context("Branch switch task failed")??;

    if summary.unchanged() {
        ui::print_plain(&format!("Already on branch {}", summary.to));
        return Ok(());
    }
    if let Some(marker) = &summary.stashed {
        ui::print_plain(&format!("Stashed local changes of {} as {}", summary.from, marker));
    }
    ui::print_success(&format!("Switched from {} to {}", summary.from, summary.to));
    if let Some(stash_ref) = &summary.restored {
        ui::print_plain(&format!("Restored {} for {}", stash_ref, summary.to));
    }
    Ok(())
}

/// Switches `repo` to `target`, carrying local changes in marked stashes.
///
/// # Arguments
///
/// * `runner` - Runs the git commands inside `repo`.
/// * `repo` - The repository to operate on.
/// * `target` - The branch to check out.
///
/// # Returns
///
/// * `Result<SwitchSummary>` - Which stash was created and which was restored.
///
/// # Errors
///
/// Returns an `Err` if:
/// - `repo` is not a git repository (`PlumError::NotARepository`).
/// - Stashing, the checkout or the stash pop fails. Nothing is rolled back;
///   the error names the step that failed.
pub fn switch_branch(runner: &dyn CommandRunner, repo: &Path, target: &str) -> Result<SwitchSummary> {
    let current = git::current_branch(runner, repo).map_err(|e| {
        debug!("rev-parse failed: {}", e);
        PlumError::NotARepository(repo.to_path_buf())
    })?;
    let mut summary = SwitchSummary {
        from: current.clone(),
        to: target.to_string(),
        stashed: None,
        restored: None,
    };
    if current == target {
        info!("Already on {}", target);
        return Ok(summary);
    }

    // Save this branch's work before leaving it.
    if git::has_local_changes(runner, repo)? {
        let marker = stash_marker(&current);
        info!("Stashing local changes of {} as {}", current, marker);
        git::stash_save(runner, repo, &marker)
            .with_context(|| format!("Failed to stash changes on {}", current))?;
        summary.stashed = Some(marker);
    }

    git::checkout(runner, repo, target)
        .with_context(|| format!("Failed to check out {}", target))?;

    // Bring back the target branch's own work, if it left any.
    let (_, list) = git::check_stash(runner, repo)?;
    if let Some(stash_ref) = git::find_marked_stash(&list, &stash_marker(target)) {
        info!("Restoring {} for {}", stash_ref, target);
        git::stash_pop(runner, repo, &stash_ref)
            .with_context(|| format!("Failed to restore {} on {}", stash_ref, target))?;
        summary.restored = Some(stash_ref);
    }
    Ok(summary)
}
