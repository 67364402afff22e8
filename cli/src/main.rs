//! # plumrs Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file is the entry point of the `plum` binary. It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the subcommand handlers
//! - Turning any propagated error into `Error: <message>` and exit code 1
//!
//! ## Architecture
//!
//! - Each tool (`gitrepo`, `gitstash`, `pping`, `pssh`, `pipmi`, `prn`) is a
//!   variant of the `Commands` enum, backed by a module in `commands/`.
//! - `--config`, `--ssh-config` and `-v` are global and may appear before or
//!   after the subcommand.
//! - Handlers return errors; only this file decides to exit.
//!
//! Logging goes to stderr through `tracing-subscriber`. `RUST_LOG` wins over
//! the `-v` count (none: warn, `-v`: info, `-vv`: debug, more: trace).
//!
//! ## Examples
//!
//! ```bash
//! plum --help
//! plum -vv pping -t lab
//! plum --config ./plum.yaml pssh 5
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // One module per subcommand
mod common; // Shared utilities (process, scan, git, ssh, ...)
mod core; // Errors, configuration and constants

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "plum",
    about = "Operator tools: git repository checks, ping sweeps, ssh, IPMI and rsync helpers",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[command(flatten)]
    globals: commands::GlobalArgs,
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// All available subcommands.
#[derive(Parser, Debug)]
enum Commands {
    Gitrepo(commands::gitrepo::GitrepoArgs),
    Gitstash(commands::gitstash::GitstashArgs),
    Pping(commands::pping::PpingArgs),
    Pssh(commands::pssh::PsshArgs),
    Pipmi(commands::pipmi::PipmiArgs),
    Prn(commands::prn::PrnArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let globals = cli.globals;
    let command_result = match cli.command {
        Commands::Gitrepo(args) => commands::gitrepo::handle_gitrepo(args).await,
        Commands::Gitstash(args) => commands::gitstash::handle_gitstash(args).await,
        Commands::Pping(args) => commands::pping::handle_pping(args, &globals).await,
        Commands::Pssh(args) => commands::pssh::handle_pssh(args, &globals).await,
        Commands::Pipmi(args) => commands::pipmi::handle_pipmi(args, &globals).await,
        Commands::Prn(args) => commands::prn::handle_prn(args, &globals).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        common::ui::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["plum", "pping", "-vv", "--config", "/tmp/p.yaml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(
            cli.globals.config.as_deref(),
            Some(std::path::Path::new("/tmp/p.yaml"))
        );
        assert!(matches!(cli.command, Commands::Pping(_)));
    }
}
