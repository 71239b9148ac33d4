//! # uas-client -- Typed Rust client for the UniFi controller API
//!
//! Async access to the handful of controller endpoints alias sync needs,
//! plus [`ControllerSession`], a blocking wrapper implementing the
//! `uas_core` capability traits for the sync engine.
//!
//! ## Endpoints
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST | `/api/login` | [`ControllerClient::login`] |
//! | POST | `/logout` | [`ControllerClient::logout`] |
//! | GET  | `/api/self/sites` | [`ControllerClient::list_sites`] |
//! | POST | `/api/s/{site}/stat/alluser` | [`ControllerClient::list_clients`] |
//! | POST | `/api/s/{site}/upd/user/{id}` | [`ControllerClient::set_client_alias`] |
//!
//! The controller authenticates with a session cookie set by the login call;
//! the underlying `reqwest` client keeps it in its cookie store.

pub mod config;
pub mod error;
pub(crate) mod retry;
pub mod session;
pub mod types;

pub use config::{ConfigError, ControllerConfig};
pub use error::ClientError;
pub use session::ControllerSession;

use std::time::Duration;

use serde::de::DeserializeOwned;
use uas_core::{Client, Site};

use retry::RetryPolicy;
use types::{
    ClientQuery, ClientRecord, Envelope, LoginRequest, SetAliasRequest, SiteRecord,
    LOGIN_REQUIRED, NO_SITE_CONTEXT,
};

/// Async controller API client.
#[derive(Debug, Clone)]
pub struct ControllerClient {
    http: reqwest::Client,
    config: ControllerConfig,
}

impl ControllerClient {
    /// Create a client from configuration. No request is sent.
    pub fn new(config: ControllerConfig) -> Result<Self, ClientError> {
        if !config.verify_ssl {
            tracing::warn!(
                controller = %config.base_url,
                "TLS certificate verification disabled"
            );
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Authenticate and store the session cookie.
    ///
    /// Calls `POST {base_url}/api/login`.
    pub async fn login(&self) -> Result<(), ClientError> {
        let endpoint = "POST /api/login";
        let url = self.config.endpoint("api/login");
        let body = LoginRequest {
            username: &self.config.username,
            password: self.config.password.as_str(),
            remember: false,
        };

        let resp = RetryPolicy::READS
            .send(endpoint, || self.http.post(&url).json(&body).send())
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        match self.decode::<serde_json::Value>(endpoint, resp).await {
            Ok(_) => {
                tracing::info!(
                    controller = %self.config.base_url,
                    user = %self.config.username,
                    "logged in to controller"
                );
                Ok(())
            }
            Err(ClientError::Api { message, .. }) => Err(ClientError::Unauthorized {
                endpoint: endpoint.into(),
                message,
            }),
            Err(e) => Err(e),
        }
    }

    /// End the session.
    ///
    /// Calls `POST {base_url}/logout`.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let endpoint = "POST /logout";
        let url = self.config.endpoint("logout");

        let resp = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() && !status.is_redirection() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message,
            });
        }
        tracing::debug!("logged out of controller");
        Ok(())
    }

    /// List every site the user can see.
    ///
    /// Calls `GET {base_url}/api/self/sites`.
    pub async fn list_sites(&self) -> Result<Vec<Site>, ClientError> {
        let endpoint = "GET /api/self/sites";
        let url = self.config.endpoint("api/self/sites");

        let resp = RetryPolicy::READS
            .send(endpoint, || self.http.get(&url).send())
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let envelope = self.decode::<SiteRecord>(endpoint, resp).await?;
        Ok(envelope.data.into_iter().map(Site::from).collect())
    }

    /// List every client a site has seen in the past year.
    ///
    /// Calls `POST {base_url}/api/s/{site}/stat/alluser`. An unknown site
    /// yields an empty list. Records with an unparsable MAC are skipped.
    pub async fn list_clients(&self, site: &str) -> Result<Vec<Client>, ClientError> {
        let endpoint = format!("POST /api/s/{site}/stat/alluser");
        let url = self.config.endpoint(&format!("api/s/{site}/stat/alluser"));
        let query = ClientQuery::default();

        let resp = RetryPolicy::READS
            .send(&endpoint, || self.http.post(&url).json(&query).send())
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        let records = match self.decode::<ClientRecord>(&endpoint, resp).await {
            Ok(envelope) => envelope.data,
            Err(e) if e.api_message() == Some(NO_SITE_CONTEXT) => {
                tracing::debug!(site, "controller does not know the site");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut clients = Vec::with_capacity(records.len());
        for record in records {
            let id = record.id.clone();
            match Client::try_from(record) {
                Ok(client) => clients.push(client),
                Err(e) => tracing::warn!(site, client_id = %id, error = %e, "skipping client record"),
            }
        }
        Ok(clients)
    }

    /// Set the alias of one client.
    ///
    /// Calls `POST {base_url}/api/s/{site}/upd/user/{client_id}`. Not retried.
    /// Returns `false` when the controller acknowledged the call without
    /// returning the updated record.
    pub async fn set_client_alias(
        &self,
        site: &str,
        client_id: &str,
        alias: &str,
    ) -> Result<bool, ClientError> {
        let endpoint = format!("POST /api/s/{site}/upd/user/{client_id}");
        let url = self
            .config
            .endpoint(&format!("api/s/{site}/upd/user/{client_id}"));

        let resp = self
            .http
            .post(&url)
            .json(&SetAliasRequest { name: alias })
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        let envelope = self.decode::<serde_json::Value>(&endpoint, resp).await?;
        Ok(!envelope.data.is_empty())
    }

    /// Read a response into its envelope, mapping controller-level errors.
    async fn decode<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        resp: reqwest::Response,
    ) -> Result<Envelope<T>, ClientError> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| ClientError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;
        if self.config.debug {
            tracing::debug!(endpoint, status = status.as_u16(), body = %body, "controller response");
        }

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|env| env.meta.msg)
                .unwrap_or(body);
            if status == reqwest::StatusCode::UNAUTHORIZED || message == LOGIN_REQUIRED {
                return Err(ClientError::Unauthorized {
                    endpoint: endpoint.into(),
                    message,
                });
            }
            return Err(ClientError::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })?;
        if !envelope.meta.is_ok() {
            let message = envelope
                .meta
                .msg
                .unwrap_or_else(|| format!("rc={}", envelope.meta.rc));
            if message == LOGIN_REQUIRED {
                return Err(ClientError::Unauthorized {
                    endpoint: endpoint.into(),
                    message,
                });
            }
            return Err(ClientError::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message,
            });
        }
        Ok(envelope)
    }
}
