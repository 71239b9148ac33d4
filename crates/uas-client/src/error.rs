//! Controller client error types.

use uas_core::ControllerError;

/// Errors from controller API calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The controller rejected the request.
    #[error("controller {endpoint} returned {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// Login failed or the session is no longer valid.
    #[error("controller {endpoint} rejected the session: {message}")]
    Unauthorized { endpoint: String, message: String },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: serde_json::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
    /// The blocking session could not start its runtime.
    #[error("failed to start controller runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl ClientError {
    /// The API message, for errors that carry one.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } | Self::Unauthorized { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<ClientError> for ControllerError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http { endpoint, source } => ControllerError::Transport {
                operation: endpoint,
                reason: source.to_string(),
            },
            ClientError::Api {
                endpoint,
                status,
                message,
            } => ControllerError::Rejected {
                operation: endpoint,
                status,
                message,
            },
            ClientError::Unauthorized { endpoint, .. } => ControllerError::Unauthorized {
                operation: endpoint,
            },
            ClientError::Deserialization { endpoint, source } => ControllerError::Malformed {
                operation: endpoint,
                reason: source.to_string(),
            },
            ClientError::Config(e) => ControllerError::Transport {
                operation: "client_init".into(),
                reason: e.to_string(),
            },
            ClientError::Runtime(e) => ControllerError::Transport {
                operation: "runtime_init".into(),
                reason: e.to_string(),
            },
        }
    }
}
