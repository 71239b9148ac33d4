//! # Sync Subcommand
//!
//! The full run: verify settings, log in, reconcile aliases across every
//! non-excluded site, log out.
//!
//! ## Commands
//!
//! - `uas sync`: Run with the mode from the settings (dry run by default).
//! - `uas sync --live`: Send alias updates to the controller.
//! - `uas sync --allow-overwrites`: Replace existing, different aliases.
//! - `uas sync --summary run.json`: Also write the run summary as JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use uas_sync::{verify_config, StdoutReporter, SyncEngine, SyncSummary};

use crate::config_file::{load_settings, CliOverrides};

/// Arguments for the `uas sync` subcommand.
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Apply alias updates instead of simulating them.
    #[arg(long, conflicts_with = "dry_run")]
    pub live: bool,

    /// Only report what would change.
    #[arg(long)]
    pub dry_run: bool,

    /// Replace existing aliases that differ from the resolved one.
    #[arg(long)]
    pub allow_overwrites: bool,

    /// Write the run summary as JSON to this path.
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

impl SyncArgs {
    /// Flag values that override file and environment settings.
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            dry_run: match (self.live, self.dry_run) {
                (true, _) => Some(false),
                (false, true) => Some(true),
                (false, false) => None,
            },
            allow_overwrites: self.allow_overwrites.then_some(true),
        }
    }
}

/// Execute the sync subcommand.
pub fn run_sync(args: &SyncArgs, config_path: &Path) -> Result<u8> {
    let provider = load_settings(config_path, args.overrides())?;
    let mut reporter = StdoutReporter::new();
    let config = match verify_config(&provider, &mut reporter) {
        Ok(config) => config,
        Err(err) => return Ok(err.exit_code()),
    };

    let session = crate::connect(&config.controller)?;
    let result = SyncEngine::new(config, &session, &mut reporter).sync_all();
    if let Err(err) = session.disconnect() {
        tracing::warn!(error = %err, "logout failed");
    }

    match result {
        Ok(summary) => {
            if let Some(path) = &args.summary {
                write_summary(&summary, path)?;
            }
            Ok(0)
        }
        Err(err) => Ok(err.exit_code()),
    }
}

fn write_summary(summary: &SyncSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("failed to serialize summary")?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("failed to write summary to {}", path.display()))?;
    tracing::info!(path = %path.display(), "run summary written");
    Ok(())
}
