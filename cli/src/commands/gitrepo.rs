//! # plumrs Repository Scan (`plum gitrepo`)
//!
//! File: cli/src/commands/gitrepo.rs
//!
//! ## Overview
//!
//! Finds every git working tree below one or more directories and reports the
//! ones that need attention: uncommitted changes, commits to pull or push, and
//! (with `--stash`) leftover stash entries.
//!
//! ## Architecture
//!
//! 1. Each `--path` is tilde-expanded and must exist (`$HOME` when none given).
//! 2. `common::fs::walk` enumerates repository roots without descending into them.
//! 3. The `Scanner` runs `git::check_repository` on every root, `POOL_SIZE` at a time.
//! 4. Matching repositories are printed in yellow, sorted by path. With
//!    `--detail` the git output that triggered the match follows in red.
//!
//! A repository that cannot be inspected is logged as a warning and skipped;
//! the command still exits 0.
//!
//! ## Usage
//!
//! ```bash
//! plum gitrepo                      # scan $HOME
//! plum gitrepo -p ~/code ~/work -d  # two roots, show git output
//! plum gitrepo -s                   # also report stashes
//! ```
//!
use crate::common::fs::{paths, walk};
use crate::common::git;
use crate::common::process::{CommandRunner, SystemRunner};
use crate::common::scan::{ProbeOutcome, Scanner};
use crate::common::ui;
use crate::core::constants::POOL_SIZE;
use crate::core::error::{PlumError, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Arguments for `plum gitrepo`.
#[derive(Parser, Debug)]
#[command(about = "Report git repositories with uncommitted, unpushed or unpulled work")]
pub struct GitrepoArgs {
    /// Directories to search [default: $HOME]
    #[arg(short, long = "path", value_name = "PATH", num_args = 1..)]
    paths: Vec<String>,

    /// Print the git output that caused each match
    #[arg(short, long)]
    detail: bool,

    /// Also report repositories that have stash entries
    #[arg(short, long)]
    stash: bool,
}

/// Handles `plum gitrepo`.
pub async fn handle_gitrepo(args: GitrepoArgs) -> Result<()> {
    let roots = resolve_roots(&args.paths)?;
    info!("Scanning {} root(s) for repositories", roots.len());

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let outcomes = scan_repositories(runner, &roots, args.stash).await;
    for outcome in outcomes.iter().filter(|o| o.matched) {
        ui::print_highlight(&outcome.target.to_string_lossy());
        if args.detail {
            if let Some(detail) = &outcome.detail {
                ui::print_failure(detail.trim_end());
            }
        }
    }
    Ok(())
}

fn resolve_roots(given: &[String]) -> Result<Vec<PathBuf>> {
    if given.is_empty() {
        let home = dirs::home_dir()
            .ok_or_else(|| PlumError::Config("Could not determine the home directory".into()))?;
        return Ok(vec![home]);
    }
    given
        .iter()
        .map(|p| paths::resolve_existing(p).map_err(Into::into))
        .collect()
}

/// Probes every repository below `roots`. Outcomes are sorted by path.
pub async fn scan_repositories(
    runner: Arc<dyn CommandRunner>,
    roots: &[PathBuf],
    include_stash: bool,
) -> Vec<ProbeOutcome<PathBuf>> {
    let repos = walk::find_all_git_repositories(roots);
    info!("Found {} repositories", repos.len());

    let mut outcomes = Scanner::new(POOL_SIZE)
        .scan(repos, move |repo| {
            let outcome = git::check_repository(runner.as_ref(), repo, include_stash);
            // Broken repositories were already logged by the probe.
            (outcome.tag != Some(git::TAG_ERROR)).then_some(outcome)
        })
        .await;
    outcomes.sort_by(|a, b| a.target.cmp(&b.target));
    outcomes
}
