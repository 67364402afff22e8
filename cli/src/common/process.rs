//! # plumrs Process Execution Utilities (`common::process`)
//!
//! File: cli/src/common/process.rs
//!
//! ## Overview
//!
//! This module is the Command Runner: it executes one shell command line,
//! captures its output and classifies the result. Every higher-level tool
//! (git checks, ping, ssh, rsync) goes through it.
//!
//! ## Architecture
//!
//! - **`CommandRunner`**: trait with a single `run` method. Probes take
//!   `&dyn CommandRunner` so tests can substitute a scripted runner.
//! - **`SystemRunner`**: the real implementation, built on
//!   `tokio::process::Command`. It spawns `sh -c <command>` with the working
//!   directory passed to the spawn call (never a process-wide `chdir`) and
//!   waits for the output under `tokio::time::timeout`. The runner is called
//!   from blocking code (scanner workers, `spawn_blocking` tasks), so it
//!   drives the future with `Handle::block_on`.
//! - Only a command with a timeout gets its own process group. On timeout
//!   the group is killed and the child is dropped (`kill_on_drop`). Untimed
//!   commands stay in the caller's foreground group so ssh can still prompt
//!   on the terminal.
//! - **`run_interactive`**: runs a command on the terminal (interactive ssh,
//!   `prn --debug`), tees its stderr and hands back the exit status.
//! - **`quote`**: single-quotes a value for interpolation into a command line.
//!
//! There are no retries. A non-zero exit always becomes
//! `CommandError::NonZeroExit`; the caller decides whether it is fatal.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::process::{CommandRunner, SystemRunner};
//! use std::{path::Path, time::Duration};
//!
//! let runner = SystemRunner;
//! let branch = runner.run(
//!     "git rev-parse --abbrev-ref HEAD",
//!     Some(Path::new("/srv/repo")),
//!     Some(Duration::from_secs(3)),
//! )?;
//! ```
//!
use crate::core::error::CommandError;
use std::future::Future;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::runtime::{Builder, Handle};
use tracing::{debug, trace, warn};

/// Executes shell command lines.
pub trait CommandRunner: Send + Sync {
    /// Runs `command` through the shell and returns its standard output.
    ///
    /// # Arguments
    ///
    /// * `command` - The full command line, passed to `sh -c`.
    /// * `cwd` - Working directory of the child. `None` keeps the caller's.
    /// * `timeout` - Upper bound on the run time. `None` waits indefinitely.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Captured stdout of a command that exited with status 0.
    ///
    /// # Errors
    ///
    /// * `CommandError::Spawn` - The shell could not be started.
    /// * `CommandError::NonZeroExit` - Non-zero exit, with stdout and stderr.
    /// * `CommandError::Timeout` - The deadline passed; the command was killed.
    fn run(
        &self,
        command: &str,
        cwd: Option<&Path>,
        timeout: Option<Duration>,
    ) -> Result<String, CommandError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        command: &str,
        cwd: Option<&Path>,
        timeout: Option<Duration>,
    ) -> Result<String, CommandError> {
        debug!("Running `{}` (cwd: {:?}, timeout: {:?})", command, cwd, timeout);
        block_on(execute(command, cwd, timeout)).map_err(|source| CommandError::Spawn {
            command: command.to_string(),
            source,
        })?
    }
}

async fn execute(
    command: &str,
    cwd: Option<&Path>,
    timeout: Option<Duration>,
) -> Result<String, CommandError> {
    let spawn_error = |source| CommandError::Spawn {
        command: command.to_string(),
        source,
    };

    let mut cmd = shell(command, cwd);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // Untimed commands must stay in the foreground group: a background child
    // that opens /dev/tty (an ssh password prompt) is stopped by SIGTTIN.
    #[cfg(unix)]
    {
        if timeout.is_some() {
            cmd.process_group(0);
        }
    }
    let child = cmd.spawn().map_err(spawn_error)?;
    let pid = child.id();

    let waited = match timeout {
        None => child.wait_with_output().await,
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(waited) => waited,
            Err(_) => {
                // The child itself went down with the dropped future.
                warn!("Command `{}` timed out after {:?}", command, limit);
                if let Some(pid) = pid {
                    kill_group(pid);
                }
                return Err(CommandError::Timeout {
                    command: command.to_string(),
                    timeout: limit,
                });
            }
        },
    };
    let output = waited.map_err(spawn_error)?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    trace!(
        "`{}` exited with {}: stdout={:?} stderr={:?}",
        command,
        output.status,
        stdout,
        stderr
    );

    if output.status.success() {
        Ok(stdout)
    } else {
        Err(CommandError::NonZeroExit {
            command: command.to_string(),
            exit_code: output.status.code(),
            stdout,
            stderr,
        })
    }
}

/// Exit status and stderr of a command run on the terminal.
#[derive(Debug)]
pub struct Attached {
    pub status: ExitStatus,
    /// Everything the command wrote to stderr, also echoed to ours.
    pub stderr: String,
}

/// Runs `command` attached to the current terminal.
///
/// stdin and stdout are inherited, so the user sees the output and can
/// answer prompts. stderr is copied through to ours as it arrives and kept,
/// so a caller can explain a failure (e.g. why ssh could not connect).
/// A non-zero exit is not an error here.
///
/// # Arguments
///
/// * `command` - The full command line, passed to `sh -c`.
/// * `cwd` - Optional working directory.
///
/// # Returns
///
/// * `Attached` - The exit status and the captured stderr.
///
/// # Errors
///
/// Returns `CommandError::Spawn` if the shell cannot be started or its
/// stderr cannot be read.
pub async fn run_interactive(command: &str, cwd: Option<&Path>) -> Result<Attached, CommandError> {
    debug!("Running interactively: `{}`", command);
    let spawn_error = |source| CommandError::Spawn {
        command: command.to_string(),
        source,
    };

    let mut child = shell(command, cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;

    // Tee stderr: echo each chunk right away, keep a copy.
    let mut captured = Vec::new();
    if let Some(mut pipe) = child.stderr.take() {
        let mut echo = tokio::io::stderr();
        let mut buf = [0u8; 4096];
        loop {
            let n = pipe.read(&mut buf).await.map_err(spawn_error)?;
            if n == 0 {
                break;
            }
            // Echo failures must not lose the child's exit status.
            let _ = echo.write_all(&buf[..n]).await;
            let _ = echo.flush().await;
            captured.extend_from_slice(&buf[..n]);
        }
    }
    let status = child.wait().await.map_err(spawn_error)?;

    Ok(Attached {
        status,
        stderr: String::from_utf8_lossy(&captured).into_owned(),
    })
}

/// Drives `future` to completion from synchronous code.
///
/// Uses the surrounding runtime when called from one of its blocking threads,
/// otherwise a throwaway current-thread runtime. Must not be called from
/// inside an async task.
///
/// # Errors
///
/// Fails only when a new runtime is needed and cannot be built.
pub fn block_on<F: Future>(future: F) -> std::io::Result<F::Output> {
    match Handle::try_current() {
        Ok(handle) => Ok(handle.block_on(future)),
        Err(_) => Ok(Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(future)),
    }
}

/// Wraps `value` in single quotes so the shell passes it through verbatim.
///
/// Values made only of characters that are never special to the shell are
/// returned unchanged to keep printed commands readable.
pub fn quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@=,+%".contains(c));
    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

fn shell(command: &str, cwd: Option<&Path>) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd
}

/// Kills whatever is left of a timed-out command's process group.
#[cfg(unix)]
fn kill_group(pid: u32) {
    // SAFETY: plain syscall; `pid` leads the group created in `execute`.
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc != 0 {
        debug!("Process group {} already gone", pid);
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}


// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_run_captures_stdout() {
        let out = SystemRunner.run("echo 1", None, None).unwrap();
        assert_eq!(out, "1\n");
    }

    #[test]
    fn test_run_non_zero_exit() {
        let err = SystemRunner
            .run("echo out; echo err >&2; exit 3", None, None)
            .unwrap_err();
        match err {
            CommandError::NonZeroExit {
                exit_code,
                stdout,
                stderr,
                ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stdout, "out\n");
                assert_eq!(stderr, "err\n");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_run_unknown_command_is_non_zero() {
        let err = SystemRunner
            .run("definitely-not-a-command-12345", None, None)
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(127));
    }

    #[test]
    fn test_run_uses_working_directory() {
        let dir = tempdir().unwrap();
        let before = std::env::current_dir().unwrap();
        let out = SystemRunner.run("pwd -P", Some(dir.path()), None).unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(out.trim(), expected.to_string_lossy());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_run_timeout_kills_child() {
        let started = std::time::Instant::now();
        let err = SystemRunner
            .run("sleep 5", None, Some(Duration::from_millis(200)))
            .unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_run_within_timeout() {
        let out = SystemRunner
            .run("echo fast", None, Some(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(out.trim(), "fast");
    }

    /// Process group ids of the shell and of this test process, in that order.
    #[cfg(target_os = "linux")]
    fn process_groups(timeout: Option<Duration>) -> (String, String) {
        let script = format!(
            "cut -d' ' -f5 /proc/$$/stat; cut -d' ' -f5 /proc/{}/stat",
            std::process::id()
        );
        let out = SystemRunner.run(&script, None, timeout).unwrap();
        let mut lines = out.lines().map(str::to_string);
        (lines.next().unwrap(), lines.next().unwrap())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_untimed_command_stays_in_caller_process_group() {
        // A background group would be stopped as soon as ssh opened /dev/tty.
        let (child, ours) = process_groups(None);
        assert_eq!(child, ours);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_timed_command_gets_own_process_group() {
        let (child, ours) = process_groups(Some(Duration::from_secs(5)));
        assert_ne!(child, ours);
    }

    #[test]
    fn test_timeout_reaches_grandchildren() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join("late");
        let command = format!("(sleep 1; touch {}) & sleep 5", quote(&marker.to_string_lossy()));
        let err = SystemRunner
            .run(&command, None, Some(Duration::from_millis(200)))
            .unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
        std::thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists(), "background job survived the timeout");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_from_blocking_worker() {
        let out = tokio::task::spawn_blocking(|| {
            SystemRunner.run("echo worker", None, Some(Duration::from_secs(5)))
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(out, "worker\n");
    }

    #[tokio::test]
    async fn test_run_interactive_keeps_stderr_and_status() {
        let attached = run_interactive("echo oops >&2; exit 4", None).await.unwrap();
        assert_eq!(attached.status.code(), Some(4));
        assert_eq!(attached.stderr, "oops\n");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("/tmp/repo"), "/tmp/repo");
        assert_eq!(quote("root@10.0.0.1:/opt"), "root@10.0.0.1:/opt");
        assert_eq!(quote("power on"), "'power on'");
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote(""), "''");
        assert_eq!(quote("a;rm -rf /"), "'a;rm -rf /'");
    }

    #[test]
    fn test_quoted_value_round_trips_through_shell() {
        let value = "it's $HOME `x`";
        let out = SystemRunner
            .run(&format!("printf %s {}", quote(value)), None, None)
            .unwrap();
        assert_eq!(out, value);
    }
}
