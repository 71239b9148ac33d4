//! # Sync Engine
//!
//! Drives one run: verify configuration, discover and order sites, build the
//! global alias index, then resolve and apply aliases site by site.
//!
//! All per-run caches live in the engine itself, so two engines never share
//! state and nothing survives a run.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uas_core::{Client, Controller, MacAddress, Site};
use uuid::Uuid;

use crate::config::{status_disabled, ConfigProvider, SyncConfig};
use crate::error::SyncError;
use crate::phase::{PhaseLog, SyncPhase};
use crate::registry::{SitePriorityList, SiteRegistry};
use crate::report::{Reporter, StatusEvent};
use crate::resolver::{AliasResolver, ResolvedAliasMap};
use crate::store::ClientStore;

/// Reason given when the controller accepts an update without applying it.
const NOT_APPLIED: &str = "controller did not apply the update";

// ─── Verification ────────────────────────────────────────────────────

/// Validate the settings exposed by `provider`, reporting the outcome.
///
/// On failure every diagnostic is reported, followed by the termination
/// line. On success the verification line is reported, plus the dry-run
/// notice when applicable.
///
/// # Errors
///
/// [`SyncError::InvalidConfig`] carrying every violated rule.
pub fn verify_config<P, R>(provider: &P, reporter: &mut R) -> Result<SyncConfig, SyncError>
where
    P: ConfigProvider + ?Sized,
    R: Reporter + ?Sized,
{
    let quiet = status_disabled(provider);
    let mut emit = |event: StatusEvent| {
        if !quiet {
            reporter.report(&event);
        }
    };

    match SyncConfig::from_provider(provider) {
        Ok(config) => {
            emit(StatusEvent::ConfigVerified);
            if config.dry_run {
                emit(StatusEvent::DryRunEnabled);
            }
            tracing::info!(
                dry_run = config.dry_run,
                allow_overwrites = config.allow_overwrites,
                overrides = config.aliases.len(),
                "configuration verified"
            );
            Ok(config)
        }
        Err(issues) => {
            for issue in &issues {
                emit(StatusEvent::ConfigIssue {
                    issue: issue.to_string(),
                });
            }
            emit(StatusEvent::ConfigRejected);
            tracing::warn!(issues = issues.len(), "configuration rejected");
            Err(SyncError::InvalidConfig { issues })
        }
    }
}

// ─── Outcomes ────────────────────────────────────────────────────────

/// What happened to one client with a resolved alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AliasDecision {
    /// The client already carries the resolved alias.
    AlreadyAliased { alias: String },
    /// The alias was applied.
    Assigned {
        alias: String,
        previous: Option<String>,
    },
    /// Dry run: the alias would have been applied.
    WouldAssign {
        alias: String,
        previous: Option<String>,
    },
    /// The controller did not apply the alias.
    Failed { alias: String, reason: String },
    /// The client keeps its own alias because overwrites are off.
    NotOverwritten { existing: String, resolved: String },
}

impl AliasDecision {
    /// Whether the decision counts toward the site's assigned total.
    pub fn is_assignment(&self) -> bool {
        matches!(self, Self::Assigned { .. } | Self::WouldAssign { .. })
    }
}

/// A decision tagged with the client it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientDecision {
    pub mac: MacAddress,
    #[serde(flatten)]
    pub decision: AliasDecision,
}

/// Result of one site's apply pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteOutcome {
    pub site: String,
    /// Aliases applied (or, in dry run, that would have been).
    pub assigned: usize,
    /// One entry per client with a resolved alias, in discovery order.
    pub decisions: Vec<ClientDecision>,
}

impl SiteOutcome {
    /// Decisions that ended in a failed apply.
    pub fn failures(&self) -> impl Iterator<Item = &ClientDecision> {
        self.decisions
            .iter()
            .filter(|d| matches!(d.decision, AliasDecision::Failed { .. }))
    }
}

/// Record of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    /// Per-site outcomes in priority order.
    pub sites: Vec<SiteOutcome>,
    pub phases: PhaseLog,
}

impl SyncSummary {
    /// Aliases assigned across every site.
    pub fn total_assigned(&self) -> usize {
        self.sites.iter().map(|s| s.assigned).sum()
    }

    /// Failed applies across every site.
    pub fn total_failed(&self) -> usize {
        self.sites.iter().map(|s| s.failures().count()).sum()
    }
}

// ─── Engine ──────────────────────────────────────────────────────────

/// One synchronization run against one controller.
pub struct SyncEngine<'a, C: Controller + ?Sized, R: Reporter + ?Sized> {
    config: SyncConfig,
    controller: &'a C,
    reporter: &'a mut R,
    registry: SiteRegistry,
    store: ClientStore,
    resolver: AliasResolver,
    phases: PhaseLog,
    run_id: Uuid,
    started_at: DateTime<Utc>,
}

impl<'a, C: Controller + ?Sized, R: Reporter + ?Sized> SyncEngine<'a, C, R> {
    /// Prepare a run. `config` is already verified, so the engine starts
    /// past the verify phase.
    pub fn new(config: SyncConfig, controller: &'a C, reporter: &'a mut R) -> Self {
        Self {
            registry: SiteRegistry::from_config(&config),
            store: ClientStore::new(config.exclude_clients.clone()),
            resolver: AliasResolver::from_config(&config),
            config,
            controller,
            reporter,
            phases: PhaseLog::verified(),
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Phase trail so far, including after an aborted run.
    pub fn phases(&self) -> &PhaseLog {
        &self.phases
    }

    fn emit(&mut self, event: StatusEvent) {
        if !self.config.disable_status {
            self.reporter.report(&event);
        }
    }

    /// Run the full synchronization pass.
    ///
    /// # Errors
    ///
    /// Returns the pre-flight or controller failure that stopped the run,
    /// after reporting its status line.
    pub fn sync_all(&mut self) -> Result<SyncSummary, SyncError> {
        let span = tracing::info_span!(
            "sync_run",
            run_id = %self.run_id,
            dry_run = self.config.dry_run
        );
        let _entered = span.enter();
        tracing::info!("sync run started");

        match self.run() {
            Ok(sites) => {
                let summary = SyncSummary {
                    run_id: self.run_id,
                    started_at: self.started_at,
                    finished_at: Utc::now(),
                    dry_run: self.config.dry_run,
                    sites,
                    phases: self.phases.clone(),
                };
                tracing::info!(
                    sites = summary.sites.len(),
                    assigned = summary.total_assigned(),
                    failed = summary.total_failed(),
                    "sync run finished"
                );
                Ok(summary)
            }
            Err(err) => {
                if let Some(event) = err.status_event() {
                    self.emit(event);
                }
                let from = self.phases.current().to_string();
                self.phases.abort();
                if err.is_notice() {
                    tracing::info!(phase = %from, reason = %err, "sync run ended early");
                } else {
                    tracing::error!(phase = %from, error = %err, "sync run aborted");
                }
                Err(err)
            }
        }
    }

    fn run(&mut self) -> Result<Vec<SiteOutcome>, SyncError> {
        let sites = self.sites()?;
        let has_overrides = self.config.has_overrides();

        match sites.len() {
            0 => return Err(SyncError::NoSites),
            1 if !has_overrides => return Err(SyncError::SingleSite),
            _ => {}
        }

        self.emit(StatusEvent::SitesFound { count: sites.len() });
        if has_overrides {
            let overrides: Vec<StatusEvent> = self
                .config
                .aliases
                .iter()
                .map(|(mac, alias)| StatusEvent::OverrideEntry {
                    mac: mac.clone(),
                    alias: alias.clone(),
                })
                .collect();
            self.emit(StatusEvent::OverridesDefined {
                count: overrides.len(),
            });
            for event in overrides {
                self.emit(event);
            }
        }

        let index =
            self.resolver
                .build_global_alias_index(&sites, &mut self.store, self.controller)?;
        for event in index.status_events() {
            self.emit(event);
        }
        if index.aliased_total() == 0 && !has_overrides {
            return Err(SyncError::NoAliases);
        }

        for site in self.registry.excluded().to_vec() {
            self.emit(StatusEvent::ExcludingSite { site });
        }

        let mut outcomes = Vec::with_capacity(sites.len());
        for site in sites.iter() {
            outcomes.push(self.apply_to_site(site)?);
        }

        self.phases.advance(SyncPhase::Done)?;
        self.emit(StatusEvent::Done);
        Ok(outcomes)
    }

    /// Site priority order for this run. The first call enters site discovery.
    ///
    /// # Errors
    ///
    /// Site fetch failures and [`SyncError::NoSites`].
    pub fn sites(&mut self) -> Result<Rc<SitePriorityList>, SyncError> {
        if self.phases.current() == &SyncPhase::Verify {
            self.phases.advance(SyncPhase::DiscoverSites)?;
        }
        self.registry.get_sites(self.controller)
    }

    /// Aliases `site_name` should carry, building the index if needed.
    ///
    /// A site unknown to this run resolves to an empty map.
    ///
    /// # Errors
    ///
    /// Controller fetch failures.
    pub fn resolve_for_site(&mut self, site_name: &str) -> Result<ResolvedAliasMap, SyncError> {
        let sites = match self.registry.get_sites(self.controller) {
            Ok(sites) => sites,
            Err(SyncError::NoSites) => return Ok(ResolvedAliasMap::new()),
            Err(err) => return Err(err),
        };
        let index =
            self.resolver
                .build_global_alias_index(&sites, &mut self.store, self.controller)?;
        Ok(self.resolver.resolve_for_site(site_name, &sites, &index))
    }

    /// Resolve and apply aliases for one site.
    ///
    /// Individual apply failures are reported and counted out; they never
    /// stop the pass.
    ///
    /// # Errors
    ///
    /// Controller fetch failures and illegal phase transitions.
    pub fn apply_to_site(&mut self, site: &Site) -> Result<SiteOutcome, SyncError> {
        self.phases.advance(SyncPhase::Resolve(site.name.clone()))?;
        self.emit(StatusEvent::AssigningSite {
            site: site.name.clone(),
        });
        let resolved = self.resolve_for_site(&site.name)?;

        self.phases.advance(SyncPhase::Apply(site.name.clone()))?;
        let sites = self.registry.get_sites(self.controller)?;
        let clients = self
            .store
            .get_clients(&site.name, &sites, self.controller)?;

        let mut assigned: usize = 0;
        let mut decisions = Vec::new();
        for client in clients.iter() {
            let Some(alias) = resolved.get(&client.mac) else {
                continue;
            };
            let decision = self.decide(&site.name, client, alias);
            if decision.is_assignment() {
                assigned += 1;
            }
            decisions.push(ClientDecision {
                mac: client.mac.clone(),
                decision,
            });
        }

        self.emit(StatusEvent::ClientsAssigned { count: assigned });
        tracing::info!(site = %site.name, assigned, "site processed");
        Ok(SiteOutcome {
            site: site.name.clone(),
            assigned,
            decisions,
        })
    }

    fn decide(&mut self, site_name: &str, client: &Client, alias: &str) -> AliasDecision {
        let mac = client.mac.clone();
        let previous = client.alias().map(str::to_string);

        if previous.as_deref() == Some(alias) {
            self.emit(StatusEvent::AlreadyHasAlias {
                mac,
                alias: alias.to_string(),
            });
            return AliasDecision::AlreadyAliased {
                alias: alias.to_string(),
            };
        }

        if let (Some(existing), false) = (&previous, self.config.allow_overwrites) {
            self.emit(StatusEvent::NotOverwritten {
                mac,
                existing: existing.clone(),
                resolved: alias.to_string(),
            });
            return AliasDecision::NotOverwritten {
                existing: existing.clone(),
                resolved: alias.to_string(),
            };
        }

        if self.config.dry_run {
            self.emit(StatusEvent::WouldSetAlias {
                mac,
                alias: alias.to_string(),
                previous: previous.clone(),
            });
            return AliasDecision::WouldAssign {
                alias: alias.to_string(),
                previous,
            };
        }

        let result = self
            .controller
            .apply_alias(site_name, &client.internal_id, alias);
        match result {
            Ok(true) => {
                tracing::debug!(site = site_name, mac = %mac, alias, "alias applied");
                self.emit(StatusEvent::SettingAlias {
                    mac,
                    alias: alias.to_string(),
                    previous: previous.clone(),
                });
                AliasDecision::Assigned {
                    alias: alias.to_string(),
                    previous,
                }
            }
            outcome => {
                let reason = match outcome {
                    Err(err) => err.to_string(),
                    Ok(_) => NOT_APPLIED.to_string(),
                };
                tracing::warn!(site = site_name, mac = %mac, alias, reason = %reason, "alias not applied");
                self.emit(StatusEvent::ApplyFailed {
                    mac,
                    alias: alias.to_string(),
                    reason: reason.clone(),
                });
                AliasDecision::Failed {
                    alias: alias.to_string(),
                    reason,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{keys, StaticConfig};
    use crate::report::MemoryReporter;
    use std::cell::RefCell;
    use uas_core::{AliasApplier, ClientFetcher, ControllerError, SiteFetcher};

    struct TwoSites {
        applied: RefCell<Vec<(String, String, String)>>,
        accept: bool,
    }

    impl TwoSites {
        fn new(accept: bool) -> Self {
            Self {
                applied: RefCell::new(Vec::new()),
                accept,
            }
        }
    }

    impl SiteFetcher for TwoSites {
        fn fetch_sites(&self) -> Result<Vec<Site>, ControllerError> {
            Ok(vec![Site::new("1", "other"), Site::new("2", "default")])
        }
    }

    impl ClientFetcher for TwoSites {
        fn fetch_clients(&self, site_name: &str) -> Result<Vec<Client>, ControllerError> {
            let mac = MacAddress::new("aa:bb:cc:dd:ee:01").unwrap();
            Ok(match site_name {
                "default" => vec![Client::new(mac, "d1").with_alias("Printer")],
                _ => vec![Client::new(mac, "o1")],
            })
        }
    }

    impl AliasApplier for TwoSites {
        fn apply_alias(
            &self,
            site_name: &str,
            client_internal_id: &str,
            alias: &str,
        ) -> Result<bool, ControllerError> {
            self.applied.borrow_mut().push((
                site_name.to_string(),
                client_internal_id.to_string(),
                alias.to_string(),
            ));
            Ok(self.accept)
        }
    }

    fn config(live: bool) -> SyncConfig {
        let provider = StaticConfig::new()
            .with(keys::CONTROLLER, "example.com")
            .with(keys::USER, "u")
            .with(keys::PASSWORD, "p")
            .with(keys::DRY_RUN, !live);
        SyncConfig::from_provider(&provider).unwrap()
    }

    #[test]
    fn verify_reports_every_issue_then_terminates() {
        let mut reporter = MemoryReporter::new();
        let provider = StaticConfig::new().with(keys::CONTROLLER, "example.com");
        let err = verify_config(&provider, &mut reporter).unwrap_err();
        assert!(matches!(err, SyncError::InvalidConfig { ref issues } if issues.len() == 2));
        assert_eq!(
            reporter.lines(),
            vec![
                "Error: Required setting user was not defined: Username of admin user.",
                "Error: Required setting password was not defined: Password for admin user.",
                "Terminating for invalid config file.",
            ]
        );
    }

    #[test]
    fn verify_announces_dry_run() {
        let mut reporter = MemoryReporter::new();
        let provider = StaticConfig::new()
            .with(keys::CONTROLLER, "example.com")
            .with(keys::USER, "u")
            .with(keys::PASSWORD, "p");
        verify_config(&provider, &mut reporter).unwrap();
        assert_eq!(
            reporter.lines(),
            vec![
                "Environment and config file have been verified.",
                "Dry run mode enabled; aliases won't actually get synchronized.",
            ]
        );
    }

    #[test]
    fn verify_honors_disable_status() {
        let mut reporter = MemoryReporter::new();
        let provider = StaticConfig::new().with(keys::DISABLE_STATUS, true);
        assert!(verify_config(&provider, &mut reporter).is_err());
        assert!(reporter.events().is_empty());
    }

    #[test]
    fn live_apply_uses_site_and_internal_id() {
        let controller = TwoSites::new(true);
        let mut reporter = MemoryReporter::new();
        let summary = SyncEngine::new(config(true), &controller, &mut reporter)
            .sync_all()
            .unwrap();
        assert_eq!(summary.total_assigned(), 1);
        assert_eq!(
            controller.applied.borrow().as_slice(),
            &[("other".to_string(), "o1".to_string(), "Printer".to_string())]
        );
        assert!(reporter
            .lines()
            .contains(&"\tSetting alias for aa:bb:cc:dd:ee:01 to \"Printer\".".to_string()));
    }

    #[test]
    fn refused_apply_is_counted_out() {
        let controller = TwoSites::new(false);
        let mut reporter = MemoryReporter::new();
        let summary = SyncEngine::new(config(true), &controller, &mut reporter)
            .sync_all()
            .unwrap();
        assert_eq!(summary.total_assigned(), 0);
        assert_eq!(summary.total_failed(), 1);
        let lines = reporter.lines();
        assert!(lines.contains(
            &"\tWarning: Unable to set alias for aa:bb:cc:dd:ee:01 to \"Printer\" (controller did not apply the update).".to_string()
        ));
        assert_eq!(lines.last().map(String::as_str), Some("Done."));
    }

    #[test]
    fn phase_trail_is_recorded() {
        let controller = TwoSites::new(true);
        let mut reporter = MemoryReporter::new();
        let summary = SyncEngine::new(config(false), &controller, &mut reporter)
            .sync_all()
            .unwrap();
        let trail: Vec<String> = summary.phases.phases().map(ToString::to_string).collect();
        assert_eq!(
            trail,
            vec![
                "init",
                "verify",
                "discover_sites",
                "resolve(default)",
                "apply(default)",
                "resolve(other)",
                "apply(other)",
                "done"
            ]
        );
    }

    #[test]
    fn disable_status_silences_run() {
        let controller = TwoSites::new(true);
        let mut reporter = MemoryReporter::new();
        let mut cfg = config(false);
        cfg.disable_status = true;
        SyncEngine::new(cfg, &controller, &mut reporter)
            .sync_all()
            .unwrap();
        assert!(reporter.events().is_empty());
    }
}
