//! # Controller Capability Traits
//!
//! The sync engine never talks to a controller directly. It depends on three
//! narrow capabilities, each implemented by the HTTP session for live runs
//! and by in-memory doubles in tests.
//!
//! Implementations are synchronous: the reconciliation pass is strictly
//! sequential, and the controller's per-site request context is stateful.

use crate::error::ControllerError;
use crate::model::{Client, Site};

/// Lists the sites managed by the controller.
pub trait SiteFetcher {
    /// Fetch every site, in the controller's own order.
    fn fetch_sites(&self) -> Result<Vec<Site>, ControllerError>;
}

/// Lists the clients known to one site.
pub trait ClientFetcher {
    /// Fetch every client the site has seen, in the controller's own order.
    ///
    /// An unknown site name yields an empty list, not an error.
    fn fetch_clients(&self, site_name: &str) -> Result<Vec<Client>, ControllerError>;
}

/// Assigns an alias to a client.
pub trait AliasApplier {
    /// Set the alias of the client with `client_internal_id` on `site_name`.
    ///
    /// `Ok(false)` means the controller accepted the request but reported
    /// that the update did not take effect.
    fn apply_alias(
        &self,
        site_name: &str,
        client_internal_id: &str,
        alias: &str,
    ) -> Result<bool, ControllerError>;
}

/// Everything the engine needs from a controller.
pub trait Controller: SiteFetcher + ClientFetcher + AliasApplier {}

impl<T: SiteFetcher + ClientFetcher + AliasApplier + ?Sized> Controller for T {}
