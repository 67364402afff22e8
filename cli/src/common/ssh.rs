//! # plumrs SSH Helpers (`common::ssh`)
//!
//! File: cli/src/common/ssh.rs
//!
//! ## Overview
//!
//! Everything needed to reach a host through the system `ssh` client:
//! resolving which host and credentials to use, building the command line, and
//! making sense of connection failures. The SSH transport itself is always the
//! external `ssh` binary.
//!
//! ## Host resolution
//!
//! `resolve` accepts either IP shorthand (`5`, `100.5`, a full address) or an
//! alias from `~/.ssh/config`:
//!
//! - Shorthand is completed with the `host_type_<label>` prefix and paired
//!   with `default_ssh_conf`; CLI overrides win.
//! - An alias takes `hostname`, `user`, `port` and `identityfile` from its
//!   `Host` stanza. Precedence is CLI override, then alias, then
//!   `default_ssh_conf`.
//!
//! ## Command lines
//!
//! All sessions disable host-key checking and the known-hosts file (the tools
//! target short-lived lab machines) and set a short `ConnectTimeout`.
//! `remote_command` adds `BatchMode=yes` so a missing key fails fast instead
//! of prompting for a password.
//!
use crate::common::network;
use crate::common::process::{quote, CommandRunner};
use crate::core::config::Config;
use crate::core::constants::ssh::{CONNECTION_FAILURE_EXIT, CONNECT_TIMEOUT};
use crate::core::error::{CommandError, PlumError, Result, SshFailure};
use anyhow::Context;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Resolved connection settings for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshConfig {
    pub hostname: String,
    pub user: String,
    pub port: u16,
    pub identityfile: String,
}

impl SshConfig {
    /// `user@host:port`, for messages.
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.user, self.hostname, self.port)
    }
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identityfile: Option<String>,
}

impl Overrides {
    /// Builds overrides from raw flags, treating empty strings and port 0 as absent.
    pub fn new(user: Option<String>, port: Option<u16>, identityfile: Option<String>) -> Self {
        Overrides {
            user: user.filter(|u| !u.is_empty()),
            port: port.filter(|p| *p != 0),
            identityfile: identityfile
                .filter(|i| !i.is_empty())
                .map(|i| shellexpand::tilde(&i).into_owned()),
        }
    }
}

/// Extracts the `Host <alias>` stanza from ssh client configuration text.
///
/// Only two-column `Key Value` lines are read; keys are lower-cased. The
/// stanza ends at the next `Host` line.
pub fn parse_alias(content: &str, alias: &str) -> Option<HashMap<String, String>> {
    let mut found = false;
    let mut conf = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let key = match parts.next() {
            Some(k) => k.to_lowercase(),
            None => continue,
        };
        let values: Vec<&str> = parts.collect();

        if key == "host" {
            if found {
                break;
            }
            found = values.iter().any(|v| *v == alias);
            continue;
        }
        if found && values.len() == 1 {
            conf.insert(key, values[0].to_string());
        }
    }
    found.then_some(conf)
}

/// Reads `path` and returns the stanza for `alias`.
pub fn find_alias(path: &Path, alias: &str) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ssh config: {}", path.display()))?;
    parse_alias(&content, alias).ok_or_else(|| {
        PlumError::HostAlias {
            path: path.to_path_buf(),
            alias: alias.to_string(),
        }
        .into()
    })
}

/// Resolves `host` (IP shorthand or alias) to full connection settings.
///
/// IP shorthand is completed with the `host_type_<host_type>` prefix (a full
/// address needs no prefix) and takes user, port and identity file from
/// `default_ssh_conf`. Anything else is looked up as a `Host` alias in the
/// ssh client configuration, with `default_ssh_conf` filling the fields the
/// alias leaves out. Explicit `overrides` always win.
///
/// # Arguments
///
/// * `host` - IP shorthand (`5`, `100.5`, `10.0.0.5`) or an ssh alias.
/// * `host_type` - Selects the `host_type_<name>` prefix for shorthand.
/// * `overrides` - User, port and identity file given on the command line.
/// * `config` - The loaded plum configuration.
/// * `ssh_config_path` - ssh client configuration consulted for aliases.
///
/// # Returns
///
/// * `Result<SshConfig>` - Hostname, user, port and identity file to connect with.
///
/// # Errors
///
/// Returns an `Err` if:
/// - The shorthand's host type has no `host_type_*` key (`PlumError::MissingKey`).
/// - The ssh config cannot be read.
/// - The alias is not defined there (`PlumError::HostAlias`).
/// - The alias has no `HostName` or an unparsable `Port` (`PlumError::Config`).
pub fn resolve(
    host: &str,
    host_type: &str,
    overrides: &Overrides,
    config: &Config,
    ssh_config_path: &Path,
) -> Result<SshConfig> {
    let defaults = &config.default_ssh_conf;
    // IP shorthand never consults the ssh config.
    if network::is_ip_shorthand(host) {
        let hostname = if network::is_full_address(host) {
            host.to_string()
        } else {
            network::expand_host(host, config.prefix_for(host_type)?)
        };
        debug!("Expanded '{}' to {}", host, hostname);
        return Ok(SshConfig {
            hostname,
            user: overrides.user.clone().unwrap_or_else(|| defaults.user.clone()),
            port: overrides.port.unwrap_or(defaults.port),
            identityfile: overrides
                .identityfile
                .clone()
                .unwrap_or_else(|| defaults.identityfile.clone()),
        });
    }

    info!("Looking up ssh alias '{}' in {}", host, ssh_config_path.display());
    let alias = find_alias(ssh_config_path, host)?;
    let hostname = alias.get("hostname").cloned().ok_or_else(|| {
        PlumError::Config(format!(
            "Host '{}' in {} has no HostName",
            host,
            ssh_config_path.display()
        ))
    })?;
    let port = match (overrides.port, alias.get("port")) {
        (Some(p), _) => p,
        (None, Some(p)) => p.parse().map_err(|_| {
            PlumError::Config(format!("Host '{}' has an invalid Port '{}'", host, p))
        })?,
        (None, None) => defaults.port,
    };
    let identityfile = overrides
        .identityfile
        .clone()
        .or_else(|| alias.get("identityfile").map(|i| shellexpand::tilde(i).into_owned()))
        .unwrap_or_else(|| defaults.identityfile.clone());
    Ok(SshConfig {
        hostname,
        user: overrides
            .user
            .clone()
            .or_else(|| alias.get("user").cloned())
            .unwrap_or_else(|| defaults.user.clone()),
        port,
        identityfile,
    })
}

/// `-o` options shared by every ssh invocation.
pub fn common_options(connect_timeout: u64) -> String {
    format!(
        r#"-o "UserKnownHostsFile=/dev/null" -o "StrictHostKeyChecking no" -o "ConnectTimeout={}""#,
        connect_timeout
    )
}

/// Interactive login command.
pub fn login_command(conf: &SshConfig) -> String {
    format!(
        "ssh -i {} {} {}@{} -p {}",
        quote(&conf.identityfile),
        common_options(CONNECT_TIMEOUT),
        quote(&conf.user),
        quote(&conf.hostname),
        conf.port
    )
}

/// Non-interactive command running `remote` on the host.
pub fn remote_command(conf: &SshConfig, remote: &str) -> String {
    format!(
        "ssh -i {} {} -o BatchMode=yes {}@{} -p {} {}",
        quote(&conf.identityfile),
        common_options(CONNECT_TIMEOUT),
        quote(&conf.user),
        quote(&conf.hostname),
        conf.port,
        quote(remote)
    )
}

/// Maps ssh's diagnostic output to a failure cause.
pub fn classify_failure(stderr: &str) -> SshFailure {
    let text = stderr.to_lowercase();
    if text.contains("timed out") {
        SshFailure::Timeout
    } else if text.contains("permission denied")
        || text.contains("authentication")
        || text.contains("too many authentication failures")
    {
        SshFailure::Authentication
    } else if text.contains("connection refused")
        || text.contains("no route to host")
        || text.contains("could not resolve")
        || text.contains("network is unreachable")
        || text.contains("name or service not known")
    {
        SshFailure::Unreachable
    } else {
        SshFailure::Other
    }
}

/// Turns a failed ssh invocation into `PlumError::Connection` when ssh itself could not connect.
pub fn connection_error(conf: &SshConfig, err: CommandError) -> PlumError {
    match err {
        ref e if e.exit_code() == Some(CONNECTION_FAILURE_EXIT) => {
            let stderr = e.stderr().unwrap_or_default();
            PlumError::Connection {
                target: conf.target(),
                kind: classify_failure(stderr),
                stderr: stderr.trim().to_string(),
            }
        }
        CommandError::Timeout { .. } => PlumError::Connection {
            target: conf.target(),
            kind: SshFailure::Timeout,
            stderr: String::new(),
        },
        other => PlumError::Command(other),
    }
}

/// Verifies that `conf` can log in by running `true` remotely.
///
/// # Errors
///
/// Returns `PlumError::Connection` with the classified cause when ssh exits
/// with 255 or the check times out, and `PlumError::Command` for anything else.
pub fn check_connection(
    runner: &dyn CommandRunner,
    conf: &SshConfig,
) -> std::result::Result<(), PlumError> {
    let limit = Duration::from_secs(CONNECT_TIMEOUT * 2);
    runner
        .run(&remote_command(conf, "true"), None, Some(limit))
        .map(|_| ())
        .map_err(|e| connection_error(conf, e))
}
