//! # plumrs SSH Login (`plum pssh`)
//!
//! File: cli/src/commands/pssh.rs
//!
//! ## Overview
//!
//! Opens an interactive ssh session. The host is either IP shorthand
//! completed from `host_type_<type>` (`5` becomes `10.10.100.5`) or an alias
//! from the ssh client configuration. See `common::ssh::resolve` for the
//! precedence rules.
//!
//! ssh runs attached to the terminal. Exit status 255 means the connection
//! itself failed and is reported as an error, classified from what ssh wrote
//! to stderr (timeout, authentication, unreachable host). Any other status is
//! the remote shell's own business and ends the command normally.
//!
//! ## Usage
//!
//! ```bash
//! plum pssh 5                  # root@10.10.100.5 with default credentials
//! plum pssh 1.5 -t lab -u me   # other host type, other user
//! plum pssh github --dry-run   # print the ssh command only
//! ```
//!
use crate::commands::GlobalArgs;
use crate::common::process;
use crate::common::ssh::{self, Overrides, SshConfig};
use crate::common::ui;
use crate::core::config::Config;
use crate::core::constants::ssh::CONNECTION_FAILURE_EXIT;
use crate::core::error::{PlumError, Result};
use clap::Parser;
use std::path::Path;
use tracing::info;

/// Arguments for `plum pssh`.
#[derive(Parser, Debug)]
#[command(about = "Log into a host by IP shorthand or ssh config alias")]
pub struct PsshArgs {
    /// Host: IP shorthand (`5`, `100.5`, full address) or ssh config alias
    #[arg(required = true)]
    host: String,

    /// Host type used to complete IP shorthand
    #[arg(short = 't', long = "type", default_value = "default")]
    host_type: String,

    /// Identity file [default: from alias or config]
    #[arg(short, long, value_name = "FILE")]
    identityfile: Option<String>,

    /// Login user [default: from alias or config]
    #[arg(short = 'u', long = "username", value_name = "USER")]
    user: Option<String>,

    /// ssh port [default: from alias or config]
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the ssh command instead of running it
    #[arg(long)]
    dry_run: bool,
}

impl PsshArgs {
    fn overrides(&self) -> Overrides {
        Overrides::new(self.user.clone(), self.port, self.identityfile.clone())
    }
}

/// Handles `plum pssh`.
pub async fn handle_pssh(args: PsshArgs, globals: &GlobalArgs) -> Result<()> {
    let config = globals.load_config()?;
    let conf = resolve_target(&args, &config, &globals.ssh_config_path()?)?;
    let command = ssh::login_command(&conf);
    if args.dry_run {
        ui::print_plain(&command);
        return Ok(());
    }

    info!("Connecting to {}", conf.target());
    let attached = process::run_interactive(&command, None).await?;
    login_result(&conf, attached.status.code(), &attached.stderr)?;
    Ok(())
}

/// Maps the exit of an interactive ssh session to a connection error.
///
/// Only status 255 belongs to ssh itself; the cause is read from the
/// stderr ssh printed while connecting.
fn login_result(
    conf: &SshConfig,
    code: Option<i32>,
    stderr: &str,
) -> std::result::Result<(), PlumError> {
    if code != Some(CONNECTION_FAILURE_EXIT) {
        return Ok(());
    }
    Err(PlumError::Connection {
        target: conf.target(),
        kind: ssh::classify_failure(stderr),
        stderr: stderr.trim().to_string(),
    })
}

fn resolve_target(args: &PsshArgs, config: &Config, ssh_config: &Path) -> Result<SshConfig> {
    ssh::resolve(&args.host, &args.host_type, &args.overrides(), config, ssh_config)
}
