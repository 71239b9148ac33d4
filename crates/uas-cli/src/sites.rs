//! # Sites Subcommand
//!
//! Lists the controller's sites in the order a sync run would visit them.
//!
//! ## Commands
//!
//! - `uas sites`: Connect, fetch sites, and print the priority order with
//!   excluded sites listed last. Clients are not read.

use std::path::Path;

use anyhow::Result;
use uas_core::Site;
use uas_sync::{verify_config, SitePriorityList, SiteRegistry, StdoutReporter, SyncError};

use crate::config_file::{load_settings, CliOverrides};

/// Execute the sites subcommand.
pub fn run_sites(config_path: &Path) -> Result<u8> {
    let provider = load_settings(config_path, CliOverrides::default())?;
    let mut reporter = StdoutReporter::new();
    let config = match verify_config(&provider, &mut reporter) {
        Ok(config) => config,
        Err(err) => return Ok(err.exit_code()),
    };

    let session = crate::connect(&config.controller)?;
    let mut registry = SiteRegistry::from_config(&config);
    let listed = registry
        .raw_sites(&session)
        .and_then(|raw| Ok((raw, registry.get_sites(&session)?)));
    if let Err(err) = session.disconnect() {
        tracing::warn!(error = %err, "logout failed");
    }

    match listed {
        Ok((raw, ordered)) => {
            for line in render(&raw, &ordered) {
                println!("{line}");
            }
            Ok(0)
        }
        Err(SyncError::NoSites) => {
            println!("No sites found.");
            Ok(SyncError::NoSites.exit_code())
        }
        Err(err) => Err(err.into()),
    }
}

/// One line per site: ranked sites first, then excluded ones.
fn render(raw: &[Site], ordered: &SitePriorityList) -> Vec<String> {
    let mut lines: Vec<String> = ordered
        .iter()
        .enumerate()
        .map(|(rank, site)| format!("{:>3}. {}", rank + 1, describe(site)))
        .collect();
    lines.extend(
        raw.iter()
            .filter(|site| !ordered.contains(&site.name))
            .map(|site| format!("  -  {} (excluded)", describe(site))),
    );
    lines
}

fn describe(site: &Site) -> String {
    match site.description.as_deref() {
        Some(desc) if !desc.is_empty() && desc != site.name => {
            format!("{} [{desc}]", site.name)
        }
        _ => site.name.clone(),
    }
}
