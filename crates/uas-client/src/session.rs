//! Blocking controller session.
//!
//! The sync engine is synchronous and strictly sequential. [`ControllerSession`]
//! owns a current-thread runtime and drives [`ControllerClient`] on it, so
//! every controller call of a run goes through one logical worker.

use tokio::runtime::{Builder, Runtime};
use uas_core::{AliasApplier, Client, ClientFetcher, ControllerError, Site, SiteFetcher};

use crate::{ClientError, ControllerClient, ControllerConfig};

/// A logged-in controller session.
#[derive(Debug)]
pub struct ControllerSession {
    runtime: Runtime,
    client: ControllerClient,
}

impl ControllerSession {
    /// Build the client and log in.
    ///
    /// # Errors
    ///
    /// Runtime start-up, client construction, or login failure.
    pub fn connect(config: ControllerConfig) -> Result<Self, ClientError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClientError::Runtime)?;
        let client = {
            let _guard = runtime.enter();
            ControllerClient::new(config)?
        };
        runtime.block_on(client.login())?;
        Ok(Self { runtime, client })
    }

    pub fn client(&self) -> &ControllerClient {
        &self.client
    }

    /// Log out and release the runtime.
    ///
    /// # Errors
    ///
    /// The logout call failed; the session is released regardless.
    pub fn disconnect(self) -> Result<(), ClientError> {
        self.runtime.block_on(self.client.logout())
    }
}

impl SiteFetcher for ControllerSession {
    fn fetch_sites(&self) -> Result<Vec<Site>, ControllerError> {
        self.runtime
            .block_on(self.client.list_sites())
            .map_err(ControllerError::from)
    }
}

impl ClientFetcher for ControllerSession {
    fn fetch_clients(&self, site_name: &str) -> Result<Vec<Client>, ControllerError> {
        self.runtime
            .block_on(self.client.list_clients(site_name))
            .map_err(ControllerError::from)
    }
}

impl AliasApplier for ControllerSession {
    fn apply_alias(
        &self,
        site_name: &str,
        client_internal_id: &str,
        alias: &str,
    ) -> Result<bool, ControllerError> {
        self.runtime
            .block_on(
                self.client
                    .set_client_alias(site_name, client_internal_id, alias),
            )
            .map_err(ControllerError::from)
    }
}
