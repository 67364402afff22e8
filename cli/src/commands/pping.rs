//! # plumrs Ping Sweep (`plum pping`)
//!
//! File: cli/src/commands/pping.rs
//!
//! ## Overview
//!
//! Pings every host address of a /24 prefix (`P.1` .. `P.254`) and prints the
//! ones that answer, one per line, ordered by last octet.
//!
//! The prefix comes from `--prefix-host` or, failing that, from the
//! `host_type_<type>` key of the configuration file. A missing key is fatal
//! and nothing is printed.
//!
//! ## Usage
//!
//! ```bash
//! plum pping                 # host_type_default
//! plum pping -t lab          # host_type_lab
//! plum pping -p 192.168.1    # explicit prefix, no config needed
//! ```
//!
use crate::commands::GlobalArgs;
use crate::common::network;
use crate::common::process::{CommandRunner, SystemRunner};
use crate::common::scan::Scanner;
use crate::common::ui;
use crate::core::constants::POOL_SIZE;
use crate::core::error::Result;
use clap::Parser;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, info};

/// Arguments for `plum pping`.
#[derive(Parser, Debug)]
#[command(about = "Ping every address of a /24 prefix and list the hosts that answer")]
pub struct PpingArgs {
    /// Host type whose `host_type_<TYPE>` prefix is swept
    #[arg(short = 't', long = "type", default_value = "default")]
    host_type: String,

    /// Sweep this three-octet prefix instead of a configured one
    #[arg(short, long, value_name = "PREFIX")]
    prefix_host: Option<String>,
}

/// Handles `plum pping`.
pub async fn handle_pping(args: PpingArgs, globals: &GlobalArgs) -> Result<()> {
    let prefix = match args.prefix_host {
        Some(prefix) => prefix,
        None => globals.load_config()?.prefix_for(&args.host_type)?.to_string(),
    };
    info!("Sweeping {}.1-254", prefix.trim_end_matches('.'));

    for ip in sweep(Arc::new(SystemRunner), &prefix).await {
        ui::print_plain(&ip);
    }
    Ok(())
}

/// Reachable addresses of `prefix`, ordered by last octet.
pub async fn sweep(runner: Arc<dyn CommandRunner>, prefix: &str) -> Vec<String> {
    let scanner = Scanner::new(POOL_SIZE);
    let targets = network::host_range(prefix);
    debug!("Pinging {} hosts, {} at a time", targets.len(), scanner.pool_size());
    let outcomes = scanner
        .scan(targets, move |ip| {
            Some(network::ping(runner.as_ref(), ip))
        })
        .await;
    let mut alive: Vec<String> = outcomes
        .into_iter()
        .filter(|o| o.matched)
        .map(|o| o.target)
        .collect();
    alive.sort_by_key(|ip| sort_key(ip));
    alive
}

fn sort_key(ip: &str) -> (u32, String) {
    match ip.parse::<Ipv4Addr>() {
        Ok(addr) => (u32::from(addr), String::new()),
        Err(_) => (u32::MAX, ip.to_string()),
    }
}
