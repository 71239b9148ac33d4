//! # Sync Errors
//!
//! Fatal outcomes of a run. Per-client apply failures are not errors at this
//! level; they are reported and counted out by the engine.

use thiserror::Error;
use uas_core::ControllerError;

use crate::config::ConfigIssue;
use crate::phase::SyncPhase;
use crate::report::StatusEvent;

/// A run-terminating outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Configuration failed validation.
    #[error("invalid configuration: {} issue(s)", issues.len())]
    InvalidConfig {
        /// Every violated rule.
        issues: Vec<ConfigIssue>,
    },

    /// The controller reported no sites.
    #[error("no sites found")]
    NoSites,

    /// One site and no overrides leaves nothing to synchronize.
    #[error("only one site found")]
    SingleSite,

    /// No aliased client on any site and no overrides.
    #[error("no clients with an alias on any site")]
    NoAliases,

    /// A controller fetch failed.
    #[error("controller error: {0}")]
    Controller(#[from] ControllerError),

    /// The engine attempted an illegal phase transition.
    #[error("invalid phase transition from {from} to {to}")]
    InvalidTransition {
        /// Phase the run was in.
        from: SyncPhase,
        /// Phase it tried to enter.
        to: SyncPhase,
    },
}

impl SyncError {
    /// Process exit code: notices exit cleanly, broken configuration exits 2.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::SingleSite | Self::NoAliases => 0,
            Self::InvalidConfig { .. } => 2,
            Self::NoSites | Self::Controller(_) | Self::InvalidTransition { .. } => 1,
        }
    }

    /// Whether the run ended without anything to do rather than failing.
    pub fn is_notice(&self) -> bool {
        self.exit_code() == 0
    }

    /// The status line announcing this abort, if it has one.
    pub fn status_event(&self) -> Option<StatusEvent> {
        match self {
            Self::NoSites => Some(StatusEvent::NoSitesFound),
            Self::SingleSite => Some(StatusEvent::SingleSite),
            Self::NoAliases => Some(StatusEvent::NoAliasedClients),
            Self::Controller(err) => Some(StatusEvent::ControllerFailed {
                reason: err.to_string(),
            }),
            Self::InvalidConfig { .. } | Self::InvalidTransition { .. } => None,
        }
    }
}
