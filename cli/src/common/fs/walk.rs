//! # plumrs Repository Discovery
//!
//! File: cli/src/common/fs/walk.rs
//!
//! ## Overview
//!
//! Enumerates git working trees below one or more root directories. A
//! directory is a repository root when it contains a `.git` *directory*. Once
//! a root is found the walk does not descend into it, so nested checkouts,
//! vendored submodules and build trees inside a repository are never visited.
//!
//! Dot-prefixed directories (`.cache`, `.venv`, ...) are skipped. The starting
//! directory itself is always visited even if its name starts with a dot.
//! Unreadable directories are logged and skipped.
//!
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

const GIT_DIR: &str = ".git";

/// Returns `true` when `path/.git` exists and is a directory.
pub fn is_git_repository(path: &Path) -> bool {
    path.join(GIT_DIR).is_dir()
}

/// All repository roots under `root`, in walk order.
pub fn find_git_repositories(root: &Path) -> Vec<PathBuf> {
    let mut repos = Vec::new();
    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || (is_dir(entry) && !is_hidden(entry)));

    loop {
        let entry = match walker.next() {
            None => break,
            Some(Ok(entry)) => entry,
            Some(Err(e)) => {
                warn!("Skipping unreadable path: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if is_git_repository(entry.path()) {
            debug!("Found repository: {}", entry.path().display());
            repos.push(entry.into_path());
            walker.skip_current_dir();
        }
    }
    repos
}

/// Repository roots under every path in `roots`.
pub fn find_all_git_repositories(roots: &[PathBuf]) -> Vec<PathBuf> {
    roots
        .iter()
        .flat_map(|root| find_git_repositories(root))
        .collect()
}

fn is_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
