//! # plumrs IPMI Through a Jump Host (`plum pipmi`)
//!
//! File: cli/src/commands/pipmi.rs
//!
//! ## Overview
//!
//! Runs `ipmitool` against the out-of-band management address of one or more
//! servers. The BMC network is usually only reachable from inside the lab, so
//! the command is executed on a jump host over ssh.
//!
//! A server's IPMI address is its own address with `ipmi_interval` added to
//! the last octet (`10.10.100.5` with interval 100 becomes `10.10.100.105`).
//!
//! ## Workflow
//!
//! 1. Resolve the jump host (`--login`) like `plum pssh` does.
//! 2. Verify the jump host once with `ssh ... true`. A failure here is fatal
//!    and reported with its classified cause.
//! 3. For each server: compute the IPMI address and run
//!    `ipmitool -I lanplus -H <ip> -U <user> -P <password> <command>` on the
//!    jump host with a timeout of `COMMAND_TIMEOUT + CONNECT_TIMEOUT`.
//! 4. Print `cmd:` and `output:` for each server. A failing server is printed
//!    in red and the remaining servers are still processed.
//!
//! ## Usage
//!
//! ```bash
//! plum pipmi -l 1 -s 5 6 7                       # power on three servers
//! plum pipmi -l jump -s 10.10.100.5 -c "power status"
//! ```
//!
use crate::commands::GlobalArgs;
use crate::common::network;
use crate::common::process::{quote, CommandRunner, SystemRunner};
use crate::common::ssh::{self, Overrides, SshConfig};
use crate::common::ui;
use crate::core::config::Config;
use crate::core::constants::os::IPMITOOL;
use crate::core::constants::{ssh::CONNECT_TIMEOUT, COMMAND_TIMEOUT};
use crate::core::error::{PlumError, Result};
use anyhow::Context;
use clap::Parser;
use std::time::Duration;
use tracing::{info, warn};

/// Arguments for `plum pipmi`.
#[derive(Parser, Debug)]
#[command(about = "Run ipmitool against servers' IPMI addresses through a jump host")]
pub struct PipmiArgs {
    /// Jump host: IP shorthand or ssh config alias
    #[arg(short, long, value_name = "HOST", required = true)]
    login: String,

    /// Servers whose IPMI interface is addressed (IP or shorthand)
    #[arg(short, long, value_name = "HOST", num_args = 1.., required = true)]
    servers: Vec<String>,

    /// Jump host login user
    #[arg(short = 'u', long = "username", value_name = "USER")]
    user: Option<String>,

    /// Jump host ssh port
    #[arg(short, long)]
    port: Option<u16>,

    /// Jump host identity file
    #[arg(short, long, value_name = "FILE")]
    identityfile: Option<String>,

    /// Host type used to complete IP shorthand
    #[arg(short = 't', long = "type", default_value = "default")]
    host_type: String,

    /// IPMI user
    #[arg(short = 'U', long, default_value = "ADMIN")]
    ipmi_user: String,

    /// IPMI password
    #[arg(short = 'P', long, default_value = "12345678")]
    ipmi_password: String,

    /// ipmitool command
    #[arg(short, long, default_value = "power on")]
    command: String,
}

/// Credentials and command passed to `ipmitool`.
#[derive(Debug, Clone)]
pub struct IpmiRequest {
    pub user: String,
    pub password: String,
    pub command: String,
}

impl IpmiRequest {
    /// `ipmitool` command line for the BMC at `ip`.
    pub fn command_line(&self, ip: &str) -> String {
        format!(
            "{} -H {} -U {} -P {} {}",
            IPMITOOL,
            quote(ip),
            quote(&self.user),
            quote(&self.password),
            self.command
        )
    }
}

/// Result for one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerReport {
    pub server: String,
    /// `ipmitool` command line, empty when no address could be computed.
    pub command: String,
    pub output: std::result::Result<String, String>,
}

/// Handles `plum pipmi`.
pub async fn handle_pipmi(args: PipmiArgs, globals: &GlobalArgs) -> Result<()> {
    let config = globals.load_config()?;
    let overrides = Overrides::new(args.user.clone(), args.port, args.identityfile.clone());
    let jump = ssh::resolve(
        &args.login,
        &args.host_type,
        &overrides,
        &config,
        &globals.ssh_config_path()?,
    )?;
    let request = IpmiRequest {
        user: args.ipmi_user,
        password: args.ipmi_password,
        command: args.command,
    };

    let reports = tokio::task::spawn_blocking(move || {
        run_ipmi(&SystemRunner, &jump, &config, &args.host_type, &args.servers, &request)
    })
    .await
    .context("IPMI task failed")??;

    for report in reports {
        if !report.command.is_empty() {
            ui::print_plain(&format!("cmd: {}", report.command));
        }
        match report.output {
            Ok(output) => ui::print_plain(&format!("output: {}", output.trim_end())),
            Err(message) => ui::print_failure(&format!("{}: {}", report.server, message)),
        }
    }
    Ok(())
}

/// Verifies the jump host, then runs `request` for every server in order.
///
/// # Arguments
///
/// * `runner` - Runs the ssh commands.
/// * `jump` - Resolved jump host.
/// * `config` - Supplies `ipmi_interval` and the host type prefix.
/// * `host_type` - Prefix used to complete server shorthand.
/// * `servers` - Servers as IP shorthand or full addresses.
/// * `request` - IPMI credentials and the `ipmitool` command.
///
/// # Returns
///
/// * `Result<Vec<ServerReport>>` - One report per server, in input order.
///   A server that cannot be addressed or whose command fails gets an `Err`
///   output; the batch continues.
///
/// # Errors
///
/// Returns an `Err` if the jump host is unreachable (`PlumError::Connection`)
/// or `ipmi_interval` is missing from the configuration.
pub fn run_ipmi(
    runner: &dyn CommandRunner,
    jump: &SshConfig,
    config: &Config,
    host_type: &str,
    servers: &[String],
    request: &IpmiRequest,
) -> Result<Vec<ServerReport>> {
    info!("Checking jump host {}", jump.target());
    ssh::check_connection(runner, jump)?;
    let interval = config.ipmi_interval()?;
    let timeout = COMMAND_TIMEOUT + Duration::from_secs(CONNECT_TIMEOUT);

    let mut reports = Vec::with_capacity(servers.len());
    for server in servers {
        let address = match server_address(server, config, host_type)
            .and_then(|ip| network::ipmi_address(&ip, interval))
        {
            Ok(address) => address,
            Err(e) => {
                warn!("Skipping {}: {}", server, e);
                reports.push(ServerReport {
                    server: server.clone(),
                    command: String::new(),
                    output: Err(e.to_string()),
                });
                continue;
            }
        };
        let command = request.command_line(&address);
        let output = runner
            .run(&ssh::remote_command(jump, &command), None, Some(timeout))
            .map_err(|e| match e.stderr() {
                Some(stderr) if !stderr.trim().is_empty() => stderr.trim().to_string(),
                _ => e.to_string(),
            });
        reports.push(ServerReport {
            server: server.clone(),
            command,
            output,
        });
    }
    Ok(reports)
}

fn server_address(
    server: &str,
    config: &Config,
    host_type: &str,
) -> std::result::Result<String, PlumError> {
    if !network::is_ip_shorthand(server) {
        return Err(PlumError::InvalidHost {
            host: server.to_string(),
            reason: "servers must be given as IP addresses or shorthand".into(),
        });
    }
    if network::is_full_address(server) {
        return Ok(server.to_string());
    }
    Ok(network::expand_host(server, config.prefix_for(host_type)?))
}
