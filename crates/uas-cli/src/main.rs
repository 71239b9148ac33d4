//! # uas CLI entry point
//!
//! Parses command-line arguments, installs logging on stderr, and dispatches
//! to subcommand handlers. Handlers return the process exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use uas_cli::check::{run_check, CheckArgs};
use uas_cli::config_file::DEFAULT_CONFIG_PATH;
use uas_cli::sites::run_sites;
use uas_cli::sync::{run_sync, SyncArgs};

/// UniFi client alias sync
///
/// Copies client aliases between the sites of one UniFi controller so a
/// device carries the same name everywhere it appears.
#[derive(Parser, Debug)]
#[command(name = "uas", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the settings file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile client aliases across every site.
    Sync(SyncArgs),

    /// Verify the settings without contacting the controller.
    Check(CheckArgs),

    /// Print the sites in the order a sync run visits them.
    Sites,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    tracing::debug!(config = %cli.config.display(), "uas starting");

    let result = match &cli.command {
        Commands::Sync(args) => run_sync(args, &cli.config),
        Commands::Check(args) => run_check(args, &cli.config),
        Commands::Sites => run_sites(&cli.config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
