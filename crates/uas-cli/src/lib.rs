//! # uas-cli -- Command-Line Interface for UniFi Client Alias Sync
//!
//! Provides the `uas` binary. Settings come from a YAML file, overlaid by
//! `UNIFI_ALIAS_SYNC_*` environment variables and then by command-line flags.
//!
//! ## Subcommands
//!
//! - `uas sync`: Verify settings, connect, and reconcile aliases across sites.
//! - `uas check`: Verify settings only, printing every diagnostic.
//! - `uas sites`: Connect and print the site priority order.
//!
//! ```bash
//! uas sync                         # dry run unless the file says otherwise
//! uas sync --live --allow-overwrites
//! uas --config /etc/uas/config.yaml -vv sites
//! ```
//!
//! Status lines go to stdout; logs go to stderr.

pub mod check;
pub mod config_file;
pub mod sites;
pub mod sync;

use anyhow::{Context, Result};
use uas_client::{ControllerConfig, ControllerSession};
use uas_sync::ControllerSettings;

/// Translate validated connection settings into a client configuration.
///
/// # Errors
///
/// The controller URL does not parse or a credential is empty.
pub fn controller_config(settings: &ControllerSettings) -> Result<ControllerConfig> {
    let url = settings.url();
    let mut config = ControllerConfig::new(&url, settings.user.clone(), settings.password.as_str())
        .with_context(|| format!("invalid controller settings for {url}"))?;
    config.verify_ssl = settings.verify_ssl;
    config.timeout_secs = settings.timeout_secs;
    config.debug = settings.debug;
    Ok(config)
}

/// Log in to the configured controller.
///
/// # Errors
///
/// See [`controller_config`]; also any login failure.
pub fn connect(settings: &ControllerSettings) -> Result<ControllerSession> {
    let config = controller_config(settings)?;
    let url = config.base_url.to_string();
    ControllerSession::connect(config)
        .with_context(|| format!("failed to connect to controller at {url}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uas_sync::{StaticConfig, SyncConfig};

    fn settings(controller: &str) -> ControllerSettings {
        let provider = StaticConfig::new()
            .with("controller", controller)
            .with("user", "admin")
            .with("password", "secret")
            .with("verify_ssl", false)
            .with("timeout_secs", 5);
        SyncConfig::from_provider(&provider).unwrap().controller
    }

    #[test]
    fn controller_config_carries_transport_settings() {
        let config = controller_config(&settings("unifi.example.com")).unwrap();
        assert_eq!(config.base_url.as_str(), "https://unifi.example.com:8443/");
        assert_eq!(config.username, "admin");
        assert_eq!(config.password.as_str(), "secret");
        assert!(!config.verify_ssl);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn controller_config_keeps_explicit_port() {
        let config = controller_config(&settings("http://10.0.0.2:8080/")).unwrap();
        assert_eq!(config.base_url.as_str(), "http://10.0.0.2:8080/");
    }
}
