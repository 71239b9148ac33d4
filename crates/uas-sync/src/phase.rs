//! # Run Phases
//!
//! ```text
//! Init ──▶ Verify ──▶ DiscoverSites ──▶ Resolve(site) ──▶ Apply(site) ──▶ Done
//!                                            ▲                │
//!                                            └────────────────┘
//!
//! any non-terminal phase ──▶ Aborted (terminal)
//! ```
//!
//! The engine records every transition in a [`PhaseLog`]; the trail ends up
//! in the run summary.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::SyncError;

// ─── Phase ───────────────────────────────────────────────────────────

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "site", rename_all = "snake_case")]
pub enum SyncPhase {
    /// Engine constructed.
    Init,
    /// Configuration validated.
    Verify,
    /// Fetching and ordering sites.
    DiscoverSites,
    /// Computing the alias map of one site.
    Resolve(String),
    /// Applying aliases to one site.
    Apply(String),
    /// All sites processed (terminal).
    Done,
    /// Run stopped early (terminal).
    Aborted,
}

impl SyncPhase {
    /// Short machine-friendly name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Verify => "verify",
            Self::DiscoverSites => "discover_sites",
            Self::Resolve(_) => "resolve",
            Self::Apply(_) => "apply",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }

    /// Whether no further transitions are allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    fn can_advance_to(&self, next: &SyncPhase) -> bool {
        use SyncPhase::*;
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, Aborted) => true,
            (Init, Verify) => true,
            (Verify, DiscoverSites) => true,
            (DiscoverSites | Apply(_), Resolve(_)) => true,
            (DiscoverSites | Apply(_), Done) => true,
            (Resolve(resolving), Apply(applying)) => resolving == applying,
            _ => false,
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolve(site) | Self::Apply(site) => write!(f, "{}({site})", self.as_str()),
            _ => f.write_str(self.as_str()),
        }
    }
}

// ─── Phase Log ───────────────────────────────────────────────────────

/// One recorded transition.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseTransition {
    /// Phase entered.
    pub phase: SyncPhase,
    /// When it was entered.
    pub at: DateTime<Utc>,
}

/// Ordered trail of the phases a run went through.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseLog {
    transitions: Vec<PhaseTransition>,
}

impl PhaseLog {
    /// A log positioned at [`SyncPhase::Init`].
    pub fn new() -> Self {
        Self {
            transitions: vec![PhaseTransition {
                phase: SyncPhase::Init,
                at: Utc::now(),
            }],
        }
    }

    /// A log that has passed [`SyncPhase::Verify`].
    pub fn verified() -> Self {
        let mut log = Self::new();
        log.transitions.push(PhaseTransition {
            phase: SyncPhase::Verify,
            at: Utc::now(),
        });
        log
    }

    /// The phase the run is in.
    pub fn current(&self) -> &SyncPhase {
        // The log is never empty: `new` seeds it with `Init`.
        &self.transitions[self.transitions.len() - 1].phase
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidTransition`] when `next` is not reachable
    /// from the current phase.
    pub fn advance(&mut self, next: SyncPhase) -> Result<(), SyncError> {
        let current = self.current();
        if !current.can_advance_to(&next) {
            return Err(SyncError::InvalidTransition {
                from: current.clone(),
                to: next,
            });
        }
        tracing::debug!(from = %current, to = %next, "phase transition");
        self.transitions.push(PhaseTransition {
            phase: next,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Enter [`SyncPhase::Aborted`] unless already terminal.
    pub fn abort(&mut self) {
        if !self.current().is_terminal() {
            self.transitions.push(PhaseTransition {
                phase: SyncPhase::Aborted,
                at: Utc::now(),
            });
        }
    }

    /// Every phase entered, oldest first.
    pub fn phases(&self) -> impl Iterator<Item = &SyncPhase> {
        self.transitions.iter().map(|t| &t.phase)
    }

    /// The full trail with timestamps.
    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }
}

impl Default for PhaseLog {
    fn default() -> Self {
        Self::new()
    }
}
