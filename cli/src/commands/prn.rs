//! # plumrs Project Sync (`plum prn`)
//!
//! File: cli/src/commands/prn.rs
//!
//! ## Overview
//!
//! Copies project files between this machine and one or more hosts with
//! `rsync` over ssh. A project is a named entry under `projects` in the
//! configuration file (`src`, `dest`, `exclude`, `delete`); every field can
//! be overridden on the command line, and `--local` plus `--remote` together
//! make a project entry unnecessary.
//!
//! ## Architecture
//!
//! 1. Without `--servers` the help text is printed and the command succeeds.
//! 2. Every server is resolved up front (`common::ssh::resolve`), so a typo in
//!    the last host fails before anything is transferred.
//! 3. Each project becomes a `SyncSpec`. On upload the local paths must exist;
//!    a missing one is a `PlumError::PathNotFound`.
//! 4. Each host and project pair becomes one `Transfer` per destination, a
//!    complete `rsync` command line.
//! 5. Transfers run one after another. Successes print in green, failures in
//!    red with rsync's error output, and the command exits 1 at the end when
//!    any transfer failed.
//!
//! Upload commands pass `--rsync-path=mkdir -p <remote parent> && rsync` so
//! the remote directory is created on first use. Directories on the local
//! side get a trailing `/` (copy contents); remote paths lose theirs.
//!
//! ## Usage
//!
//! ```bash
//! plum prn -s 5 6 -p web                  # upload project "web" to two hosts
//! plum prn -s db -l ./dump -r /tmp/dump   # ad-hoc upload to an ssh alias
//! plum prn -s 5 -p web --download         # fetch the remote copy instead
//! ```
//!
use crate::commands::GlobalArgs;
use crate::common::fs::paths;
use crate::common::process::{self, quote, CommandRunner, SystemRunner};
use crate::common::ssh::{self, Overrides, SshConfig};
use crate::common::ui;
use crate::core::config::{Config, ProjectConfig};
use crate::core::constants::ssh::RSYNC_CONNECT_TIMEOUT;
use crate::core::error::{PlumError, Result};
use anyhow::Context;
use clap::{CommandFactory, Parser};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// Arguments for `plum prn`.
#[derive(Parser, Debug)]
#[command(about = "Sync configured projects to or from hosts with rsync")]
pub struct PrnArgs {
    /// Target hosts: IP shorthand or ssh config aliases
    #[arg(short, long, value_name = "HOST", num_args = 1..)]
    servers: Vec<String>,

    /// Projects from the configuration file
    #[arg(short, long, value_name = "NAME", num_args = 1.., default_value = "default")]
    projects: Vec<String>,

    /// Host type used to complete IP shorthand
    #[arg(short = 't', long = "type", default_value = "default")]
    host_type: String,

    /// Copy from the hosts to this machine
    #[arg(long)]
    download: bool,

    /// ssh identity file
    #[arg(short, long, value_name = "FILE")]
    identityfile: Option<String>,

    /// ssh user
    #[arg(short = 'u', long = "username", value_name = "USER")]
    user: Option<String>,

    /// ssh port
    #[arg(long)]
    port: Option<u16>,

    /// Local paths, overriding the project's `src`
    #[arg(short, long, value_name = "PATH", num_args = 1..)]
    local: Vec<String>,

    /// Remote paths, overriding the project's `dest`
    #[arg(short, long, value_name = "PATH", num_args = 1..)]
    remote: Vec<String>,

    /// Delete remote files missing locally (1) or keep them (0)
    #[arg(short, long, value_name = "0|1", value_parser = clap::value_parser!(u8).range(0..=1))]
    delete: Option<u8>,

    /// Exclude patterns, replacing the project's list
    #[arg(short, long, value_name = "PATTERN", num_args = 1..)]
    exclude: Vec<String>,

    /// Print each rsync command and run it attached to the terminal
    #[arg(long)]
    debug: bool,
}

/// Effective settings for one project after command-line overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSpec {
    pub local: Vec<String>,
    pub remote: Vec<String>,
    pub exclude: BTreeSet<String>,
    pub delete: bool,
}

/// One rsync invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub command: String,
    pub description: String,
}

/// Handles `plum prn`.
pub async fn handle_prn(args: PrnArgs, globals: &GlobalArgs) -> Result<()> {
    if args.servers.is_empty() {
        PrnArgs::command()
            .name("plum prn")
            .print_help()
            .context("Failed to print help")?;
        return Ok(());
    }
    if args.local.len() > 1 && args.remote.len() > 1 {
        return Err(PlumError::Argument(
            "--local and --remote cannot both have several values".into(),
        )
        .into());
    }

    let config = globals.load_config()?;
    let ssh_config = globals.ssh_config_path()?;
    let overrides = Overrides::new(args.user.clone(), args.port, args.identityfile.clone());
    let hosts = args
        .servers
        .iter()
        .map(|server| ssh::resolve(server, &args.host_type, &overrides, &config, &ssh_config))
        .collect::<Result<Vec<_>>>()?;
    let specs = args
        .projects
        .iter()
        .map(|project| project_spec(&config, project, &args))
        .collect::<Result<Vec<_>>>()?;

    let mut transfers = Vec::new();
    for host in &hosts {
        for spec in &specs {
            transfers.extend(build_transfers(host, spec, args.download));
        }
    }
    info!("{} transfer(s) planned", transfers.len());

    let debug = args.debug;
    let failures = tokio::task::spawn_blocking(move || run_transfers(&SystemRunner, &transfers, debug))
        .await
        .context("Transfer task failed")?;
    if failures > 0 {
        return Err(anyhow::anyhow!("{} transfer(s) failed", failures));
    }
    Ok(())
}

/// Merges `projects.<name>` with the command-line overrides.
///
/// `--local`, `--remote`, `--exclude` and `--delete` replace the project's
/// values. With both `--local` and `--remote` given, the project entry may
/// be missing altogether.
///
/// # Arguments
///
/// * `config` - The loaded configuration.
/// * `name` - Project name under `projects`.
/// * `args` - Parsed `plum prn` arguments.
///
/// # Returns
///
/// * `Result<SyncSpec>` - The effective settings. On upload, local paths are
///   tilde-expanded and known to exist.
///
/// # Errors
///
/// Returns an `Err` if:
/// - The project is unknown and the command line does not stand in for it.
/// - No local or no remote path is left after the overrides.
/// - An upload source does not exist (`PlumError::PathNotFound`).
pub fn project_spec(config: &Config, name: &str, args: &PrnArgs) -> Result<SyncSpec> {
    let project = match config.project(name) {
        Some(project) => project.clone(),
        None if !args.local.is_empty() && !args.remote.is_empty() => ProjectConfig::default(),
        None => {
            return Err(PlumError::Config(format!(
                "{} has no project '{}'",
                config.path().display(),
                name
            ))
            .into())
        }
    };

    let local = if args.local.is_empty() { project.src } else { args.local.clone() };
    let remote = if args.remote.is_empty() {
        project.dest.into_iter().collect()
    } else {
        args.remote.clone()
    };
    if local.is_empty() || remote.is_empty() {
        return Err(PlumError::Config(format!(
            "Project '{}' needs both a local path (src) and a remote path (dest)",
            name
        ))
        .into());
    }

    let local = if args.download {
        local
    } else {
        local
            .iter()
            .map(|p| paths::resolve_existing(p).map(|p| p.to_string_lossy().into_owned()))
            .collect::<std::result::Result<Vec<_>, PlumError>>()?
    };
    let exclude = if args.exclude.is_empty() { project.exclude } else { args.exclude.clone() };

    Ok(SyncSpec {
        local,
        remote,
        exclude: exclude.into_iter().collect(),
        delete: args.delete.map(|d| d == 1).unwrap_or(project.delete),
    })
}

/// rsync options up to, not including, the source and destination.
pub fn rsync_options(host: &SshConfig, spec: &SyncSpec, mkdir: Option<&str>) -> String {
    let mut option = vec!["rsync -rtv".to_string()];
    if let Some(dir) = mkdir {
        option.push(quote(&format!("--rsync-path=mkdir -p {} && rsync", quote(dir))));
    }
    let remote_shell = format!(
        "ssh -p {} -i {} {}",
        host.port,
        quote(&host.identityfile),
        ssh::common_options(RSYNC_CONNECT_TIMEOUT)
    );
    option.push(format!("-e {}", quote(&remote_shell)));
    if spec.delete {
        option.push("--delete".into());
    }
    for pattern in &spec.exclude {
        option.push(format!("--exclude {}", quote(pattern)));
    }
    option.join(" ")
}

fn remote_parent(remote: &str) -> String {
    match Path::new(remote).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        _ => remote.to_string(),
    }
}

fn remote_spec(host: &SshConfig, path: &str) -> String {
    quote(&format!("{}@{}:{}", host.user, host.hostname, path))
}

/// rsync commands moving `spec` to or from `host`, one per destination path.
///
/// Upload: every local path is a source, and each remote path gets its own
/// command with `--rsync-path` creating the remote parent first.
/// Download: every remote path is a source, and each local path gets its
/// own command.
///
/// # Arguments
///
/// * `host` - Resolved destination or source host.
/// * `spec` - Effective project settings from `project_spec`.
/// * `download` - Copy from `host` instead of to it.
///
/// # Returns
///
/// * `Vec<Transfer>` - Complete command lines with a human-readable description.
pub fn build_transfers(host: &SshConfig, spec: &SyncSpec, download: bool) -> Vec<Transfer> {
    let target = format!("{}@{} (port {})", host.user, host.hostname, host.port);
    if download {
        let sources: Vec<String> = spec.remote.iter().map(|p| remote_spec(host, p)).collect();
        let options = rsync_options(host, spec, None);
        spec.local
            .iter()
            .map(|local| {
                let local = paths::remote_rsync_path(local);
                Transfer {
                    command: format!("{} {} {}", options, sources.join(" "), quote(&local)),
                    description: format!(
                        "Download {} from {} to {}",
                        spec.remote.join(" "),
                        target,
                        local
                    ),
                }
            })
            .collect()
    } else {
        let sources: Vec<String> = spec
            .local
            .iter()
            .map(|p| paths::local_rsync_path(Path::new(p)))
            .collect();
        let quoted: Vec<String> = sources.iter().map(|s| quote(s)).collect();
        spec.remote
            .iter()
            .map(|remote| {
                let remote = paths::remote_rsync_path(remote);
                let options = rsync_options(host, spec, Some(&remote_parent(&remote)));
                Transfer {
                    command: format!("{} {} {}", options, quoted.join(" "), remote_spec(host, &remote)),
                    description: format!(
                        "Upload {} to {} {}",
                        sources.join(" "),
                        target,
                        remote
                    ),
                }
            })
            .collect()
    }
}

/// Runs every transfer in order and returns the number that failed.
///
/// Transfers run without a timeout and in the terminal's process group, so
/// ssh can ask for a password or passphrase. With `debug` each command is
/// printed first and runs attached to the terminal.
pub fn run_transfers(runner: &dyn CommandRunner, transfers: &[Transfer], debug: bool) -> usize {
    let mut failures = 0;
    for transfer in transfers {
        debug!("Running `{}`", transfer.command);
        let result = if debug {
            ui::print_plain(&transfer.command);
            match process::block_on(process::run_interactive(&transfer.command, None)) {
                Ok(Ok(attached)) if attached.status.success() => Ok(()),
                Ok(Ok(attached)) => Err(format!("rsync exited with {}", attached.status)),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(e.to_string()),
            }
        } else {
            runner
                .run(&transfer.command, None, None)
                .map(|_| ())
                .map_err(|e| match e.stderr() {
                    Some(stderr) if !stderr.trim().is_empty() => stderr.trim().to_string(),
                    _ => e.to_string(),
                })
        };
        match result {
            Ok(()) => ui::print_success(&format!("{} succeeded", transfer.description)),
            Err(reason) => {
                failures += 1;
                ui::print_failure(&format!("{} failed: {}", transfer.description, reason));
            }
        }
    }
    failures
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::process::testing::ScriptedRunner;
    use std::fs;
    use tempfile::tempdir;

    const SSH_OPTS: &str = r#"-o "UserKnownHostsFile=/dev/null" -o "StrictHostKeyChecking no" -o "ConnectTimeout=2""#;

    fn host() -> SshConfig {
        SshConfig {
            hostname: "1.1.1.1".into(),
            user: "user".into(),
            port: 22,
            identityfile: "/keys/id_rsa".into(),
        }
    }

    fn config(src: &Path) -> Config {
        let yaml = format!(
            r#"
default_ssh_conf: {{user: root, identityfile: /keys/id_rsa}}
host_type_default: "1.1.1"
projects:
  web:
    src: {}
    dest: /opt/web/
    exclude: [.git, target, .git]
    delete: 1
  nodest:
    src: /tmp
"#,
            src.display()
        );
        Config::from_yaml_str(&yaml, Path::new("/tmp/plum.yaml")).unwrap()
    }

    fn args(extra: &[&str]) -> PrnArgs {
        let mut argv = vec!["prn", "-s", "5"];
        argv.extend_from_slice(extra);
        PrnArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_project_spec_from_config() {
        let dir = tempdir().unwrap();
        let spec = project_spec(&config(dir.path()), "web", &args(&[])).unwrap();
        assert_eq!(spec.local, vec![dir.path().to_string_lossy().into_owned()]);
        assert_eq!(spec.remote, vec!["/opt/web/"]);
        assert_eq!(
            spec.exclude.iter().cloned().collect::<Vec<_>>(),
            vec![".git", "target"]
        );
        assert!(spec.delete);
    }

    #[test]
    fn test_command_line_overrides_project() {
        let dir = tempdir().unwrap();
        let local = dir.path().join("a.txt");
        fs::write(&local, "").unwrap();
        let local = local.to_string_lossy().into_owned();
        let spec = project_spec(
            &config(dir.path()),
            "web",
            &args(&["-l", &local, "-r", "/tmp/x", "-d", "0", "-e", "*.pyc"]),
        )
        .unwrap();
        assert_eq!(spec.local, vec![local]);
        assert_eq!(spec.remote, vec!["/tmp/x"]);
        assert!(!spec.delete);
        assert_eq!(spec.exclude.len(), 1);
    }

    #[test]
    fn test_unknown_project() {
        let dir = tempdir().unwrap();
        let err = project_spec(&config(dir.path()), "xxx", &args(&[])).unwrap_err();
        assert!(err.to_string().contains("has no project 'xxx'"));

        // --local and --remote together stand in for a project entry.
        let local = dir.path().to_string_lossy().into_owned();
        let spec = project_spec(
            &config(dir.path()),
            "xxx",
            &args(&["-l", &local, "-r", "/tmp/2"]),
        )
        .unwrap();
        assert!(!spec.delete);
        assert!(spec.exclude.is_empty());
    }

    #[test]
    fn test_project_without_dest() {
        let dir = tempdir().unwrap();
        let err = project_spec(&config(dir.path()), "nodest", &args(&[])).unwrap_err();
        assert!(err.to_string().contains("needs both"));
    }

    #[test]
    fn test_missing_local_path_is_typed_error() {
        let dir = tempdir().unwrap();
        let err = project_spec(
            &config(dir.path()),
            "web",
            &args(&["-l", "/definitely/not/here"]),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlumError>(),
            Some(PlumError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_download_does_not_require_local_paths() {
        let dir = tempdir().unwrap();
        let spec = project_spec(
            &config(dir.path()),
            "web",
            &args(&["--download", "-l", "/not/yet/here/"]),
        )
        .unwrap();
        assert_eq!(spec.local, vec!["/not/yet/here/"]);
    }

    #[test]
    fn test_upload_command() {
        let spec = SyncSpec {
            local: vec!["/tmp/file.txt".into()],
            remote: vec!["/opt/web/".into()],
            exclude: [".git".to_string()].into_iter().collect(),
            delete: true,
        };
        let transfers = build_transfers(&host(), &spec, false);
        assert_eq!(transfers.len(), 1);
        let expected = format!(
            "rsync -rtv '--rsync-path=mkdir -p /opt && rsync' -e 'ssh -p 22 -i /keys/id_rsa {}' --delete --exclude .git /tmp/file.txt user@1.1.1.1:/opt/web",
            SSH_OPTS
        );
        assert_eq!(transfers[0].command, expected);
        assert_eq!(
            transfers[0].description,
            "Upload /tmp/file.txt to user@1.1.1.1 (port 22) /opt/web"
        );
    }

    #[test]
    fn test_upload_directory_gets_trailing_slash() {
        let dir = tempdir().unwrap();
        let spec = SyncSpec {
            local: vec![dir.path().to_string_lossy().into_owned()],
            remote: vec!["/tmp".into(), "/srv/b".into()],
            exclude: BTreeSet::new(),
            delete: false,
        };
        let transfers = build_transfers(&host(), &spec, false);
        assert_eq!(transfers.len(), 2);
        assert!(transfers[0].command.contains(&format!("{}/ ", dir.path().display())));
        assert!(transfers[0].command.ends_with("user@1.1.1.1:/tmp"));
        assert!(transfers[1].command.contains("mkdir -p /srv"));
        assert!(!transfers[0].command.contains("--delete"));
    }

    #[test]
    fn test_download_command() {
        let spec = SyncSpec {
            local: vec!["/tmp/dl/".into()],
            remote: vec!["/opt/web".into(), "/opt/api".into()],
            exclude: BTreeSet::new(),
            delete: false,
        };
        let transfers = build_transfers(&host(), &spec, true);
        assert_eq!(transfers.len(), 1);
        let expected = format!(
            "rsync -rtv -e 'ssh -p 22 -i /keys/id_rsa {}' user@1.1.1.1:/opt/web user@1.1.1.1:/opt/api /tmp/dl",
            SSH_OPTS
        );
        assert_eq!(transfers[0].command, expected);
        assert!(!transfers[0].command.contains("--rsync-path"));
    }

    #[test]
    fn test_run_transfers_counts_failures() {
        let transfers = vec![
            Transfer {
                command: "rsync ok".into(),
                description: "Upload a".into(),
            },
            Transfer {
                command: "rsync bad".into(),
                description: "Upload b".into(),
            },
        ];
        let runner = ScriptedRunner::new()
            .ok("rsync ok", "sent 10 bytes")
            .fail("rsync bad", 23, "rsync error: some files could not be transferred");
        assert_eq!(run_transfers(&runner, &transfers, false), 1);
        assert_eq!(runner.commands(), vec!["rsync ok", "rsync bad"]);
    }

    #[test]
    fn test_args_parsing() {
        let args = PrnArgs::try_parse_from(["prn"]).unwrap();
        assert!(args.servers.is_empty());
        assert_eq!(args.projects, vec!["default"]);
        assert_eq!(args.delete, None);

        assert!(PrnArgs::try_parse_from(["prn", "-s", "1", "-d", "2"]).is_err());
        let args = PrnArgs::try_parse_from(["prn", "-s", "1", "2", "-p", "a", "b", "--port", "2222"])
            .unwrap();
        assert_eq!(args.servers, vec!["1", "2"]);
        assert_eq!(args.projects, vec!["a", "b"]);
        assert_eq!(args.port, Some(2222));
    }
}
