//! # uas-sync -- Alias Resolution and Synchronization
//!
//! Reconciles client aliases across the sites of one UniFi controller. A run
//! proceeds as follows:
//!
//! 1. [`verify_config`] validates the settings, reporting every issue.
//! 2. [`SiteRegistry`] fetches sites, drops excluded ones and orders the rest
//!    by priority.
//! 3. [`AliasResolver`] builds the [`GlobalAliasIndex`] once, from the
//!    per-site client lists cached in [`ClientStore`].
//! 4. [`SyncEngine`] resolves each site's alias map and applies it, reporting
//!    every decision through a [`Reporter`].
//!
//! The crate performs no I/O of its own: sites, clients and alias updates
//! go through the capability traits in `uas_core`.

pub mod config;
pub mod engine;
pub mod error;
pub mod phase;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod store;

pub use config::{
    keys, status_disabled, ConfigIssue, ConfigProvider, ControllerSettings, StaticConfig,
    SyncConfig, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS, REQUIRED_SETTINGS,
};
pub use engine::{
    verify_config, AliasDecision, ClientDecision, SiteOutcome, SyncEngine, SyncSummary,
};
pub use error::SyncError;
pub use phase::{PhaseLog, PhaseTransition, SyncPhase};
pub use registry::{prioritize, SitePriorityList, SiteRegistry};
pub use report::{MemoryReporter, Reporter, StatusEvent, StdoutReporter};
pub use resolver::{resolve_for_site, AliasBucket, AliasResolver, GlobalAliasIndex, ResolvedAliasMap};
pub use store::ClientStore;
