//! # Check Subcommand
//!
//! Verifies the layered settings without contacting the controller.
//!
//! ## Commands
//!
//! - `uas check`: Print every configuration diagnostic, or the verification
//!   line when the settings are usable.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use uas_sync::{verify_config, StdoutReporter};

use crate::config_file::{load_settings, CliOverrides};

/// Arguments for the `uas check` subcommand.
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Also print the effective settings, password redacted.
    #[arg(long)]
    pub show: bool,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs, config_path: &Path) -> Result<u8> {
    let provider = load_settings(config_path, CliOverrides::default())?;
    let mut reporter = StdoutReporter::new();

    match verify_config(&provider, &mut reporter) {
        Ok(config) => {
            if args.show {
                println!("{config:#?}");
            }
            Ok(0)
        }
        Err(err) => Ok(err.exit_code()),
    }
}
