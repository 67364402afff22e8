//! # plumrs Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//!
//! ## Overview
//!
//! Filesystem helpers shared by the subcommands.
//!
//! - **`walk`**: git repository discovery (`find_git_repositories`). Used by `plum gitrepo`.
//! - **`paths`**: resolution and rsync formatting of user-supplied paths. Used by `plum prn`.
//!
//! As elsewhere in `common`, callers import the submodule they need:
//!
//! ```rust
//! use crate::common::fs::{paths, walk};
//!
//! let repos = walk::find_git_repositories(Path::new("/home/me/code"));
//! let src = paths::resolve_existing("~/code/web")?;
//! ```
//!

/// Repository discovery below a directory tree.
pub mod walk;
/// Local/remote path resolution and formatting.
pub mod paths;
