//! # plumrs Bounded Concurrent Scanner (`common::scan`)
//!
//! File: cli/src/common/scan.rs
//!
//! ## Overview
//!
//! Runs a probe function over a list of targets on a fixed-size worker pool and
//! collects one `ProbeOutcome` per target. Both `plum gitrepo` (targets are
//! repository paths) and `plum pping` (targets are IPv4 addresses) are built
//! on it.
//!
//! ## Architecture
//!
//! - Probes are ordinary blocking functions. They spend their time waiting on
//!   child processes, so each invocation runs on tokio's blocking thread pool
//!   via `spawn_blocking`.
//! - A `Semaphore` with `pool_size` permits bounds how many probes run at once.
//!   Fewer targets than permits simply means fewer busy workers.
//! - Tasks are tracked in a `JoinSet` and results are gathered in completion
//!   order. Callers must not rely on the result order matching the input.
//! - A probe returning `None` marks the target as not applicable; it is dropped
//!   from the results. A probe that panics is logged and skipped; the rest of
//!   the batch keeps going.
//!
//! Workers share nothing but the probe itself (behind an `Arc`), so no locking
//! is involved.
//!
//! ## Usage
//!
//! ```rust
//! let scanner = Scanner::new(POOL_SIZE);
//! let outcomes = scanner
//!     .scan(addresses, move |ip: String| Some(network::ping(runner.as_ref(), ip)))
//!     .await;
//! for outcome in outcomes.iter().filter(|o| o.matched) {
//!     println!("{}", outcome.target);
//! }
//! ```
//!
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Result of probing one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome<T> {
    pub target: T,
    /// `true` when the target needs attention (dirty repository, reachable host).
    pub matched: bool,
    /// Raw command output kept for `--detail` style printing.
    pub detail: Option<String>,
    /// Which check fired, for probes with more than one.
    pub tag: Option<&'static str>,
}

impl<T> ProbeOutcome<T> {
    pub fn matched(target: T) -> Self {
        ProbeOutcome {
            target,
            matched: true,
            detail: None,
            tag: None,
        }
    }

    pub fn unmatched(target: T) -> Self {
        ProbeOutcome {
            target,
            matched: false,
            detail: None,
            tag: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }
}

/// Fixed-size worker pool for blocking probes.
#[derive(Debug, Clone, Copy)]
pub struct Scanner {
    pool_size: usize,
}

impl Scanner {
    /// A `pool_size` of zero is treated as one.
    pub fn new(pool_size: usize) -> Self {
        Scanner {
            pool_size: pool_size.max(1),
        }
    }

    /// Maximum number of probes running at once.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Probes every target exactly once. Results arrive in completion order.
    ///
    /// Each probe runs on tokio's blocking pool, at most `pool_size` at a
    /// time. The call returns once every probe has finished.
    ///
    /// # Arguments
    ///
    /// * `targets` - Hosts, paths or anything else the probe understands.
    /// * `probe` - Checks one target. `None` means the target was not
    ///   applicable and produces no outcome.
    ///
    /// # Returns
    ///
    /// * `Vec<ProbeOutcome<T>>` - One outcome per applicable target, in the
    ///   order the probes completed. A probe that panics is logged and dropped;
    ///   the rest of the batch is unaffected.
    pub async fn scan<T, F>(&self, targets: Vec<T>, probe: F) -> Vec<ProbeOutcome<T>>
    where
        T: Send + 'static,
        F: Fn(T) -> Option<ProbeOutcome<T>> + Send + Sync + 'static,
    {
        let total = targets.len();
        debug!("Scanning {} targets with {} workers", total, self.pool_size);

        let probe = Arc::new(probe);
        let permits = Arc::new(Semaphore::new(self.pool_size));
        let mut tasks = JoinSet::new();

        for target in targets {
            let probe = Arc::clone(&probe);
            let permits = Arc::clone(&permits);
            // One task per target; the permit bounds how many reach the blocking pool.
            tasks.spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail.
                let _permit = permits.acquire_owned().await.ok()?;
                tokio::task::spawn_blocking(move || probe(target))
                    .await
                    .unwrap_or_else(|e| {
                        error!("Probe worker failed: {}", e);
                        None
                    })
            });
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => {}
                Err(e) => error!("Scan task failed: {}", e),
            }
        }
        debug!(
            "Scan finished: {} outcomes from {} targets",
            outcomes.len(),
            total
        );
        outcomes
    }
}
