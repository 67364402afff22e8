//! # plumrs Path Helpers
//!
//! File: cli/src/common/fs/paths.rs
//!
//! Resolution of user-supplied local paths (rsync sources, identity files).
//! A path that does not exist is always reported as
//! `PlumError::PathNotFound`; the caller decides whether that ends the program.
//!
use crate::core::error::PlumError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Expands a leading `~` and checks that the result exists.
///
/// # Arguments
///
/// * `path` - A path as typed by the user or written in the configuration.
///
/// # Returns
///
/// * `Result<PathBuf, PlumError>` - The expanded path.
///
/// # Errors
///
/// Returns `PlumError::PathNotFound` (with the expanded path) if nothing exists there.
pub fn resolve_existing(path: &str) -> Result<PathBuf, PlumError> {
    let expanded = PathBuf::from(shellexpand::tilde(path).into_owned());
    if expanded.exists() {
        debug!("Resolved '{}' to {}", path, expanded.display());
        Ok(expanded)
    } else {
        Err(PlumError::PathNotFound(expanded))
    }
}

/// Formats a local rsync path: directories end with `/` so their contents are copied.
pub fn local_rsync_path(path: &Path) -> String {
    let text = path.to_string_lossy().into_owned();
    if path.is_dir() && !text.ends_with('/') {
        format!("{}/", text)
    } else {
        text
    }
}

/// Formats a remote rsync path: a trailing `/` is removed.
pub fn remote_rsync_path(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => path.to_string(),
    }
}
