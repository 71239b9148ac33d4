//! Controller connection configuration.

use url::Url;
use zeroize::Zeroizing;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to one UniFi controller.
///
/// Custom `Debug` implementation redacts the `password` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct ControllerConfig {
    /// Fully qualified controller URL, e.g. `https://unifi.example.com:8443`.
    pub base_url: Url,
    /// Admin user name.
    pub username: String,
    /// Admin password.
    pub password: Zeroizing<String>,
    /// Verify the controller's TLS certificate.
    pub verify_ssl: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Log request and response bodies.
    pub debug: bool,
}

impl std::fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout_secs", &self.timeout_secs)
            .field("debug", &self.debug)
            .finish()
    }
}

impl ControllerConfig {
    /// Build a configuration with default transport settings.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidUrl`] when `base_url` does not parse, and
    /// [`ConfigError::MissingCredentials`] when either credential is empty.
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(base_url.to_string(), e.to_string()))?;
        let username = username.into();
        let password = Zeroizing::new(password.into());
        if username.is_empty() || password.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(Self {
            base_url,
            username,
            password,
            verify_ssl: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            debug: false,
        })
    }

    /// Full URL of an API path relative to the controller root.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid controller URL {0}: {1}")]
    InvalidUrl(String, String),
    #[error("controller user and password are required")]
    MissingCredentials,
}
