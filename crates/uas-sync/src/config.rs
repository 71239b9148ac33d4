//! # Sync Configuration
//!
//! Settings are read through the [`ConfigProvider`] capability as loosely
//! typed JSON values, then validated into a [`SyncConfig`]. Validation is
//! exhaustive: every violated rule is collected into a [`ConfigIssue`] so an
//! operator sees the complete list of fixes in one pass.
//!
//! ## Settings
//!
//! | Key | Required | Default |
//! |-----|----------|---------|
//! | `controller` | yes | |
//! | `user` | yes | |
//! | `password` | yes | |
//! | `port` | no | `8443` |
//! | `verify_ssl` | no | `true` |
//! | `timeout_secs` | no | `30` |
//! | `dry_run` | no | `true` |
//! | `debug` | no | `false` |
//! | `aliases` | no | `{}` |
//! | `exclude_sites` | no | `[]` |
//! | `exclude_clients` | no | `[]` |
//! | `allow_overwrites` | no | `false` |
//! | `prioritized_sites` | no | `[]` |
//! | `disable_status` | no | `false` |

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use thiserror::Error;
use uas_core::MacAddress;
use zeroize::Zeroizing;

/// Setting names.
pub mod keys {
    pub const CONTROLLER: &str = "controller";
    pub const USER: &str = "user";
    pub const PASSWORD: &str = "password";
    pub const PORT: &str = "port";
    pub const VERIFY_SSL: &str = "verify_ssl";
    pub const TIMEOUT_SECS: &str = "timeout_secs";
    pub const DRY_RUN: &str = "dry_run";
    pub const DEBUG: &str = "debug";
    pub const ALIASES: &str = "aliases";
    pub const EXCLUDE_SITES: &str = "exclude_sites";
    pub const EXCLUDE_CLIENTS: &str = "exclude_clients";
    pub const ALLOW_OVERWRITES: &str = "allow_overwrites";
    pub const PRIORITIZED_SITES: &str = "prioritized_sites";
    pub const DISABLE_STATUS: &str = "disable_status";

    /// Every recognized setting, required ones first.
    pub const ALL: &[&str] = &[
        CONTROLLER,
        USER,
        PASSWORD,
        PORT,
        VERIFY_SSL,
        TIMEOUT_SECS,
        DRY_RUN,
        DEBUG,
        ALIASES,
        EXCLUDE_SITES,
        EXCLUDE_CLIENTS,
        ALLOW_OVERWRITES,
        PRIORITIZED_SITES,
        DISABLE_STATUS,
    ];
}

/// Required settings and their descriptions.
pub const REQUIRED_SETTINGS: &[(&str, &str)] = &[
    (
        keys::CONTROLLER,
        "Domain (or fully qualified URL) of the UniFi controller.",
    ),
    (keys::USER, "Username of admin user."),
    (keys::PASSWORD, "Password for admin user."),
];

/// Controller port used when the controller setting carries none.
pub const DEFAULT_PORT: u16 = 8443;

/// Per-request timeout for controller calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Source of raw setting values.
///
/// A `null` value is treated the same as an absent one.
pub trait ConfigProvider {
    /// Raw value for `key`, if set.
    fn setting(&self, key: &str) -> Option<Value>;
}

impl<P: ConfigProvider + ?Sized> ConfigProvider for &P {
    fn setting(&self, key: &str) -> Option<Value> {
        (**self).setting(key)
    }
}

/// In-memory settings table.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    values: serde_json::Map<String, Value>,
}

impl StaticConfig {
    /// An empty table; every setting falls back to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object. Non-object values yield an empty table.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }

    /// Set one value, builder style.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Set one value in place.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Whether the table holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigProvider for StaticConfig {
    fn setting(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}

/// One violated configuration rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    /// A required setting is absent or empty.
    #[error("Required setting {key} was not defined: {description}")]
    MissingRequired {
        /// Setting name.
        key: &'static str,
        /// What the setting is for.
        description: &'static str,
    },

    /// A setting has the wrong shape.
    #[error("Invalid format for {key} (must be {expected}): {value}")]
    InvalidFormat {
        /// Setting name.
        key: &'static str,
        /// Expected shape.
        expected: &'static str,
        /// Rendered offending value.
        value: String,
    },

    /// A hardware address in a list or mapping does not parse.
    #[error("Invalid MAC address supplied in {key}: {value}")]
    InvalidMac {
        /// Setting name.
        key: &'static str,
        /// The offending address.
        value: String,
    },

    /// An override alias is empty or not a string.
    #[error("Invalid alias supplied in {key} for {mac}: {value}")]
    InvalidAlias {
        /// Setting name.
        key: &'static str,
        /// The address the alias belongs to.
        mac: String,
        /// Rendered offending value.
        value: String,
    },
}

/// Connection settings handed to the controller collaborator.
///
/// Custom `Debug` implementation redacts the password.
#[derive(Clone)]
pub struct ControllerSettings {
    /// Controller domain or URL as configured.
    pub controller: String,
    /// Port used when `controller` carries none.
    pub port: u16,
    /// Admin user name.
    pub user: String,
    /// Admin password.
    pub password: Zeroizing<String>,
    /// Verify the controller's TLS certificate.
    pub verify_ssl: bool,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Log every controller request and response envelope.
    pub debug: bool,
}

impl std::fmt::Debug for ControllerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerSettings")
            .field("controller", &self.controller)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout_secs", &self.timeout_secs)
            .field("debug", &self.debug)
            .finish()
    }
}

impl ControllerSettings {
    /// Fully qualified controller URL.
    ///
    /// Trailing slashes are dropped and `https://` is assumed when no scheme
    /// is given. A port in `controller` takes precedence over `port`.
    pub fn url(&self) -> String {
        let trimmed = self.controller.trim_end_matches('/');
        let controller = if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        match controller.rsplit_once(':') {
            Some((host, port))
                if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) =>
            {
                format!("{host}:{port}")
            }
            _ => format!("{controller}:{}", self.port),
        }
    }
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Connection settings.
    pub controller: ControllerSettings,
    /// Simulate alias updates and report intent only.
    pub dry_run: bool,
    /// Explicit `mac -> alias` overrides applied to every site.
    pub aliases: BTreeMap<MacAddress, String>,
    /// Sites ignored entirely, in configured order.
    pub exclude_sites: Vec<String>,
    /// Clients removed from every site's client list.
    pub exclude_clients: BTreeSet<MacAddress>,
    /// Permit replacing an existing, different alias.
    pub allow_overwrites: bool,
    /// Sites ranked first, in configured order.
    pub prioritized_sites: Vec<String>,
    /// Suppress status lines.
    pub disable_status: bool,
}

impl SyncConfig {
    /// Validate every setting exposed by `provider`.
    ///
    /// # Errors
    ///
    /// Returns every violated rule, in setting order.
    pub fn from_provider<P: ConfigProvider + ?Sized>(
        provider: &P,
    ) -> Result<Self, Vec<ConfigIssue>> {
        let mut v = Validator {
            provider,
            issues: Vec::new(),
        };

        let controller = v.required_string(REQUIRED_SETTINGS[0]);
        let user = v.required_string(REQUIRED_SETTINGS[1]);
        let password = Zeroizing::new(v.required_string(REQUIRED_SETTINGS[2]));
        let port = v.positive_integer(keys::PORT, u64::from(DEFAULT_PORT), u64::from(u16::MAX));
        let verify_ssl = v.boolean(keys::VERIFY_SSL, true);
        let timeout_secs = v.positive_integer(keys::TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS, 3600);
        let dry_run = v.boolean(keys::DRY_RUN, true);
        let debug = v.boolean(keys::DEBUG, false);
        let aliases = v.alias_map(keys::ALIASES);
        let exclude_sites = v.string_list(keys::EXCLUDE_SITES);
        let exclude_clients = v.mac_list(keys::EXCLUDE_CLIENTS);
        let allow_overwrites = v.boolean(keys::ALLOW_OVERWRITES, false);
        let prioritized_sites = v.string_list(keys::PRIORITIZED_SITES);
        let disable_status = v.boolean(keys::DISABLE_STATUS, false);

        if !v.issues.is_empty() {
            return Err(v.issues);
        }

        Ok(Self {
            controller: ControllerSettings {
                controller,
                // Bounded by `positive_integer`.
                port: u16::try_from(port).unwrap_or(DEFAULT_PORT),
                user,
                password,
                verify_ssl,
                timeout_secs,
                debug,
            },
            dry_run,
            aliases,
            exclude_sites,
            exclude_clients,
            allow_overwrites,
            prioritized_sites,
            disable_status,
        })
    }

    /// Whether any explicit alias overrides are configured.
    pub fn has_overrides(&self) -> bool {
        !self.aliases.is_empty()
    }
}

/// Whether status output is switched off, read leniently.
///
/// Used before validation so configuration diagnostics honor the setting
/// even when other settings are broken.
pub fn status_disabled<P: ConfigProvider + ?Sized>(provider: &P) -> bool {
    matches!(provider.setting(keys::DISABLE_STATUS), Some(Value::Bool(true)))
}

/// Render a raw value for a diagnostic: strings verbatim, everything else as JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct Validator<'a, P: ?Sized> {
    provider: &'a P,
    issues: Vec<ConfigIssue>,
}

impl<P: ConfigProvider + ?Sized> Validator<'_, P> {
    fn value(&self, key: &str) -> Option<Value> {
        self.provider.setting(key).filter(|v| !v.is_null())
    }

    fn invalid(&mut self, key: &'static str, expected: &'static str, value: &Value) {
        self.issues.push(ConfigIssue::InvalidFormat {
            key,
            expected,
            value: render(value),
        });
    }

    fn required_string(&mut self, (key, description): (&'static str, &'static str)) -> String {
        match self.value(key) {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::String(_)) | None => {
                self.issues
                    .push(ConfigIssue::MissingRequired { key, description });
                String::new()
            }
            Some(other) => {
                self.invalid(key, "string", &other);
                String::new()
            }
        }
    }

    fn boolean(&mut self, key: &'static str, default: bool) -> bool {
        match self.value(key) {
            None => default,
            Some(Value::Bool(b)) => b,
            Some(other) => {
                self.invalid(key, "boolean", &other);
                default
            }
        }
    }

    /// Integer in `1..=max`; numeric strings are accepted.
    fn positive_integer(&mut self, key: &'static str, default: u64, max: u64) -> u64 {
        let Some(value) = self.value(key) else {
            return default;
        };
        let parsed = match &value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if n > 0 && n <= max => n,
            _ => {
                self.invalid(key, "integer", &value);
                default
            }
        }
    }

    fn list(&mut self, key: &'static str) -> Vec<Value> {
        match self.value(key) {
            None => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.invalid(key, "array", &other);
                Vec::new()
            }
        }
    }

    /// List of names, de-duplicated, first occurrence kept.
    fn string_list(&mut self, key: &'static str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for item in self.list(key) {
            match item {
                Value::String(s) => {
                    if !names.contains(&s) {
                        names.push(s);
                    }
                }
                other => self.invalid(key, "array of strings", &other),
            }
        }
        names
    }

    fn mac_list(&mut self, key: &'static str) -> BTreeSet<MacAddress> {
        let mut macs = BTreeSet::new();
        for item in self.list(key) {
            let parsed = match &item {
                Value::String(s) => MacAddress::new(s).ok(),
                _ => None,
            };
            match parsed {
                Some(mac) => {
                    macs.insert(mac);
                }
                None => self.issues.push(ConfigIssue::InvalidMac {
                    key,
                    value: render(&item),
                }),
            }
        }
        macs
    }

    fn alias_map(&mut self, key: &'static str) -> BTreeMap<MacAddress, String> {
        let mut aliases = BTreeMap::new();
        let entries = match self.value(key) {
            None => return aliases,
            Some(Value::Object(entries)) => entries,
            Some(other) => {
                self.invalid(key, "mapping of MAC addresses to aliases", &other);
                return aliases;
            }
        };

        for (raw_mac, alias) in entries {
            let mac = match MacAddress::new(&raw_mac) {
                Ok(mac) => Some(mac),
                Err(_) => {
                    self.issues.push(ConfigIssue::InvalidMac {
                        key,
                        value: raw_mac.clone(),
                    });
                    None
                }
            };
            let alias = match alias {
                Value::String(s) if !s.is_empty() => Some(s),
                other => {
                    self.issues.push(ConfigIssue::InvalidAlias {
                        key,
                        mac: raw_mac.clone(),
                        value: render(&other),
                    });
                    None
                }
            };
            if let (Some(mac), Some(alias)) = (mac, alias) {
                aliases.insert(mac, alias);
            }
        }
        aliases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> StaticConfig {
        StaticConfig::new()
            .with(keys::CONTROLLER, "https://example.com")
            .with(keys::USER, "adminuser")
            .with(keys::PASSWORD, "adminpassword")
    }

    fn settings(controller: &str, port: u16) -> ControllerSettings {
        ControllerSettings {
            controller: controller.to_string(),
            port,
            user: "u".into(),
            password: Zeroizing::new("p".into()),
            verify_ssl: true,
            timeout_secs: 30,
            debug: false,
        }
    }

    #[test]
    fn optional_settings_get_default_values() {
        let cfg = SyncConfig::from_provider(&minimal()).unwrap();
        assert_eq!(cfg.controller.port, 8443);
        assert!(cfg.controller.verify_ssl);
        assert_eq!(cfg.controller.timeout_secs, 30);
        assert!(!cfg.controller.debug);
        assert!(cfg.dry_run);
        assert!(cfg.aliases.is_empty());
        assert!(cfg.exclude_sites.is_empty());
        assert!(cfg.exclude_clients.is_empty());
        assert!(!cfg.allow_overwrites);
        assert!(cfg.prioritized_sites.is_empty());
        assert!(!cfg.disable_status);
    }

    #[test]
    fn required_settings_are_all_reported_at_once() {
        let issues = SyncConfig::from_provider(&StaticConfig::new()).unwrap_err();
        assert_eq!(issues.len(), 3);
        assert_eq!(
            issues[0].to_string(),
            "Required setting controller was not defined: Domain (or fully qualified URL) of the UniFi controller."
        );
        assert_eq!(
            issues[1].to_string(),
            "Required setting user was not defined: Username of admin user."
        );
        assert_eq!(
            issues[2].to_string(),
            "Required setting password was not defined: Password for admin user."
        );
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let issues = SyncConfig::from_provider(&minimal().with(keys::USER, "")).unwrap_err();
        assert_eq!(
            issues,
            vec![ConfigIssue::MissingRequired {
                key: keys::USER,
                description: "Username of admin user."
            }]
        );
    }

    #[test]
    fn null_falls_back_to_default() {
        let cfg = SyncConfig::from_provider(&minimal().with(keys::DRY_RUN, Value::Null)).unwrap();
        assert!(cfg.dry_run);
    }

    #[test]
    fn port_must_be_int_like() {
        for bad in [json!("abc"), json!(0), json!(-1), json!(70000), json!(true)] {
            let issues =
                SyncConfig::from_provider(&minimal().with(keys::PORT, bad.clone())).unwrap_err();
            assert_eq!(issues.len(), 1, "for {bad}");
            assert!(issues[0]
                .to_string()
                .starts_with("Invalid format for port (must be integer): "));
        }
        let cfg = SyncConfig::from_provider(&minimal().with(keys::PORT, "443")).unwrap();
        assert_eq!(cfg.controller.port, 443);
    }

    #[test]
    fn booleans_must_be_booleans() {
        let issues = SyncConfig::from_provider(
            &minimal()
                .with(keys::ALLOW_OVERWRITES, "yes")
                .with(keys::DRY_RUN, 1),
        )
        .unwrap_err();
        let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "Invalid format for dry_run (must be boolean): 1",
                "Invalid format for allow_overwrites (must be boolean): yes",
            ]
        );
    }

    #[test]
    fn exclude_sites_must_be_array() {
        let issues =
            SyncConfig::from_provider(&minimal().with(keys::EXCLUDE_SITES, "default")).unwrap_err();
        assert_eq!(
            issues[0].to_string(),
            "Invalid format for exclude_sites (must be array): default"
        );
    }

    #[test]
    fn prioritized_sites_must_be_array_of_strings() {
        let issues = SyncConfig::from_provider(
            &minimal().with(keys::PRIORITIZED_SITES, json!(["a", 7])),
        )
        .unwrap_err();
        assert_eq!(
            issues[0].to_string(),
            "Invalid format for prioritized_sites (must be array of strings): 7"
        );
    }

    #[test]
    fn prioritized_sites_are_deduplicated_in_order() {
        let cfg = SyncConfig::from_provider(
            &minimal().with(keys::PRIORITIZED_SITES, json!(["b", "a", "b"])),
        )
        .unwrap();
        assert_eq!(cfg.prioritized_sites, vec!["b", "a"]);
    }

    #[test]
    fn aliases_must_be_mapping() {
        let issues =
            SyncConfig::from_provider(&minimal().with(keys::ALIASES, json!(["x"]))).unwrap_err();
        assert_eq!(
            issues[0].to_string(),
            "Invalid format for aliases (must be mapping of MAC addresses to aliases): [\"x\"]"
        );
    }

    #[test]
    fn aliases_validate_every_entry() {
        let issues = SyncConfig::from_provider(&minimal().with(
            keys::ALIASES,
            json!({
                "90:04:e3:51:9d:a1": "Adam's iPhone",
                "zz:04:e3:51:9d:a1": "Bad mac",
                "9e:cc:a1:2f:0b:aa": "",
            }),
        ))
        .unwrap_err();
        let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "Invalid alias supplied in aliases for 9e:cc:a1:2f:0b:aa: ",
                "Invalid MAC address supplied in aliases: zz:04:e3:51:9d:a1",
            ]
        );
    }

    #[test]
    fn aliases_keys_are_canonicalized() {
        let cfg = SyncConfig::from_provider(
            &minimal().with(keys::ALIASES, json!({"9E-CC-A1-2F-0B-AA": "iPad"})),
        )
        .unwrap();
        let mac = MacAddress::new("9e:cc:a1:2f:0b:aa").unwrap();
        assert_eq!(cfg.aliases.get(&mac).map(String::as_str), Some("iPad"));
        assert!(cfg.has_overrides());
    }

    #[test]
    fn exclude_clients_must_be_macs() {
        let issues = SyncConfig::from_provider(
            &minimal().with(keys::EXCLUDE_CLIENTS, json!(["aa:bb:cc:dd:ee:ff", "nope"])),
        )
        .unwrap_err();
        assert_eq!(
            issues,
            vec![ConfigIssue::InvalidMac {
                key: keys::EXCLUDE_CLIENTS,
                value: "nope".into()
            }]
        );
    }

    #[test]
    fn issues_from_several_settings_accumulate() {
        let issues = SyncConfig::from_provider(
            &StaticConfig::new()
                .with(keys::CONTROLLER, "example.com")
                .with(keys::PORT, "x")
                .with(keys::EXCLUDE_SITES, 3),
        )
        .unwrap_err();
        assert_eq!(issues.len(), 4);
    }

    #[test]
    fn status_disabled_is_lenient() {
        assert!(!status_disabled(&StaticConfig::new()));
        assert!(!status_disabled(
            &StaticConfig::new().with(keys::DISABLE_STATUS, "true")
        ));
        assert!(status_disabled(
            &StaticConfig::new().with(keys::DISABLE_STATUS, true)
        ));
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", settings("example.com", 8443));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("password: \"p\""));
    }

    #[test]
    fn controller_url_normalization() {
        let cases = [
            ("https://example.com:8443", 8443, "https://example.com:8443"),
            ("https://example.com:8443/", 8443, "https://example.com:8443"),
            ("https://example.com:8443", 443, "https://example.com:8443"),
            ("https://example.com:8443/", 443, "https://example.com:8443"),
            ("https://example.com", 8443, "https://example.com:8443"),
            ("https://example.com/", 8443, "https://example.com:8443"),
            ("https://example.com", 443, "https://example.com:443"),
            ("https://example.com/", 443, "https://example.com:443"),
            ("example.com:8443", 8443, "https://example.com:8443"),
            ("example.com:8443/", 8443, "https://example.com:8443"),
            ("example.com:8443", 443, "https://example.com:8443"),
            ("example.com:8443/", 443, "https://example.com:8443"),
            ("example.com", 8443, "https://example.com:8443"),
            ("example.com/", 8443, "https://example.com:8443"),
            ("example.com", 443, "https://example.com:443"),
            ("example.com/", 443, "https://example.com:443"),
            ("http://127.0.0.1:9000", 8443, "http://127.0.0.1:9000"),
        ];
        for (controller, port, expected) in cases {
            assert_eq!(
                settings(controller, port).url(),
                expected,
                "controller={controller} port={port}"
            );
        }
    }
}
