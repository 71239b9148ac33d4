//! # Settings Sources
//!
//! Three layers feed [`uas_sync::SyncConfig::from_provider`], highest
//! precedence first:
//!
//! 1. command-line flags ([`CliOverrides`]),
//! 2. `UNIFI_ALIAS_SYNC_<KEY>` environment variables ([`EnvConfig`]),
//! 3. the YAML settings file ([`load_yaml`]).
//!
//! A `null` in a higher layer falls through to the next one.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use uas_sync::{keys, ConfigProvider, StaticConfig};

/// Settings file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Annotated example settings shipped with the project.
pub const SAMPLE_CONFIG_PATH: &str = "config-sample.yaml";

/// Prefix of environment variables overriding file settings.
pub const ENV_PREFIX: &str = "UNIFI_ALIAS_SYNC_";

/// Settings whose environment value is never parsed.
const VERBATIM_KEYS: &[&str] = &[keys::CONTROLLER, keys::USER, keys::PASSWORD];

/// Read the YAML settings file.
///
/// An empty file yields an empty table, so every required setting is then
/// reported as missing during verification.
///
/// # Errors
///
/// The file is missing or unreadable, is not valid YAML, or its top level is
/// not a mapping.
pub fn load_yaml(path: &Path) -> Result<StaticConfig> {
    if !path.exists() {
        bail!(
            "settings file {} not found; copy {SAMPLE_CONFIG_PATH} to {} and edit it",
            path.display(),
            path.display()
        );
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(StaticConfig::new());
    }
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    match value {
        Value::Null => Ok(StaticConfig::new()),
        Value::Object(_) => {
            tracing::debug!(path = %path.display(), "loaded settings file");
            Ok(StaticConfig::from_value(value))
        }
        _ => bail!("{} must contain a mapping of settings", path.display()),
    }
}

/// Settings taken from `UNIFI_ALIAS_SYNC_<KEY>` environment variables.
///
/// Credentials and the controller address are taken verbatim. Every other
/// value is parsed as YAML, so `false`, `8443` and `[a, b]` keep their type.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    values: StaticConfig,
}

impl EnvConfig {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Read an explicit set of variables. Unknown names are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut values = StaticConfig::new();
        for (name, raw) in vars {
            let Some(suffix) = name.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let key = suffix.to_ascii_lowercase();
            let Some(key) = keys::ALL.iter().find(|k| **k == key) else {
                tracing::warn!(variable = name.as_ref(), "ignoring unknown setting variable");
                continue;
            };
            let raw = raw.into();
            let value = if VERBATIM_KEYS.contains(key) {
                Value::String(raw)
            } else {
                serde_yaml::from_str(&raw).unwrap_or(Value::String(raw))
            };
            tracing::debug!(setting = *key, "setting taken from environment");
            values.set(key, value);
        }
        Self { values }
    }

    /// Whether no recognized variable was set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigProvider for EnvConfig {
    fn setting(&self, key: &str) -> Option<Value> {
        self.values.setting(key)
    }
}

/// Settings given as command-line flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// `Some(false)` for `--live`, `Some(true)` for `--dry-run`.
    pub dry_run: Option<bool>,
    /// `Some(true)` for `--allow-overwrites`.
    pub allow_overwrites: Option<bool>,
}

impl ConfigProvider for CliOverrides {
    fn setting(&self, key: &str) -> Option<Value> {
        match key {
            keys::DRY_RUN => self.dry_run.map(Value::Bool),
            keys::ALLOW_OVERWRITES => self.allow_overwrites.map(Value::Bool),
            _ => None,
        }
    }
}

/// Ordered stack of settings sources; the first non-null value wins.
#[derive(Default)]
pub struct LayeredConfig {
    layers: Vec<Box<dyn ConfigProvider>>,
}

impl LayeredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer below every existing one.
    pub fn with_layer(mut self, layer: impl ConfigProvider + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl ConfigProvider for LayeredConfig {
    fn setting(&self, key: &str) -> Option<Value> {
        self.layers
            .iter()
            .find_map(|layer| layer.setting(key).filter(|v| !v.is_null()))
    }
}

/// Assemble flags, environment and file into one provider.
///
/// # Errors
///
/// See [`load_yaml`].
pub fn load_settings(path: &Path, overrides: CliOverrides) -> Result<LayeredConfig> {
    let file = load_yaml(path)?;
    let env = EnvConfig::from_env();
    if !env.is_empty() {
        tracing::info!("environment overrides present");
    }
    Ok(LayeredConfig::new()
        .with_layer(overrides)
        .with_layer(env)
        .with_layer(file))
}
