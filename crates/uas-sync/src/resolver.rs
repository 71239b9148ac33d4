//! # Alias Resolution
//!
//! Resolution runs in two steps.
//!
//! 1. [`GlobalAliasIndex::build`] collects, once per run, the aliased clients
//!    of every site into per-site buckets in priority order.
//! 2. [`resolve_for_site`] derives one site's `mac -> alias` map from the
//!    buckets of every *other* site, then overlays configured overrides.
//!
//! For a given mac, the highest-ranked other site that knows an alias wins,
//! except that a lower-ranked site never contributes an alias for a mac the
//! target site has already aliased itself. Overrides replace whatever was
//! resolved, unless the client is excluded.
//!
//! The overwrite policy plays no part here; it only gates the apply step.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use uas_core::{ClientFetcher, MacAddress};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::registry::SitePriorityList;
use crate::report::StatusEvent;
use crate::store::ClientStore;

/// Resolved aliases for one target site.
pub type ResolvedAliasMap = BTreeMap<MacAddress, String>;

// ─── Index ───────────────────────────────────────────────────────────

/// Aliased clients of one site, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct AliasBucket {
    site: String,
    client_count: usize,
    entries: Vec<(MacAddress, String)>,
    lookup: HashMap<MacAddress, usize>,
}

impl AliasBucket {
    fn new(site: impl Into<String>, client_count: usize) -> Self {
        Self {
            site: site.into(),
            client_count,
            entries: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    fn insert(&mut self, mac: MacAddress, alias: String) {
        if self.lookup.contains_key(&mac) {
            return;
        }
        self.lookup.insert(mac.clone(), self.entries.len());
        self.entries.push((mac, alias));
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    /// Clients seen on the site, aliased or not.
    pub fn client_count(&self) -> usize {
        self.client_count
    }

    /// Aliased clients, in discovery order.
    pub fn entries(&self) -> &[(MacAddress, String)] {
        &self.entries
    }

    pub fn alias(&self, mac: &MacAddress) -> Option<&str> {
        self.lookup.get(mac).map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, mac: &MacAddress) -> bool {
        self.lookup.contains_key(mac)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Aliases known to every site, one bucket per site in priority order.
#[derive(Debug, Clone, Default)]
pub struct GlobalAliasIndex {
    buckets: Vec<AliasBucket>,
}

impl GlobalAliasIndex {
    /// Collect the aliased clients of every site in `sites`.
    ///
    /// # Errors
    ///
    /// Propagates client fetch failures.
    pub fn build<F: ClientFetcher + ?Sized>(
        sites: &SitePriorityList,
        store: &mut ClientStore,
        fetcher: &F,
    ) -> Result<Self, SyncError> {
        let mut buckets = Vec::with_capacity(sites.len());
        for site in sites {
            let clients = store.get_clients(&site.name, sites, fetcher)?;
            let mut bucket = AliasBucket::new(site.name.clone(), clients.len());
            for client in clients.iter() {
                if let Some(alias) = client.alias() {
                    bucket.insert(client.mac.clone(), alias.to_string());
                }
            }
            buckets.push(bucket);
        }
        Ok(Self::from_buckets(buckets))
    }

    /// Assemble an index from buckets already in priority order.
    pub fn from_buckets(buckets: Vec<AliasBucket>) -> Self {
        Self { buckets }
    }

    pub fn bucket(&self, site: &str) -> Option<&AliasBucket> {
        self.buckets.iter().find(|b| b.site == site)
    }

    pub fn buckets(&self) -> &[AliasBucket] {
        &self.buckets
    }

    /// Aliased clients summed over every site.
    pub fn aliased_total(&self) -> usize {
        self.buckets.iter().map(AliasBucket::len).sum()
    }

    /// Per-site summary lines: client counts, then each aliased client.
    pub fn status_events(&self) -> Vec<StatusEvent> {
        let mut events = Vec::new();
        for bucket in &self.buckets {
            events.push(StatusEvent::SiteClients {
                site: bucket.site.clone(),
                clients: bucket.client_count,
                aliased: bucket.len(),
            });
            events.extend(
                bucket
                    .entries
                    .iter()
                    .map(|(mac, alias)| StatusEvent::AliasedClient {
                        mac: mac.clone(),
                        alias: alias.clone(),
                    }),
            );
        }
        events
    }
}

// ─── Resolution ──────────────────────────────────────────────────────

/// Compute the aliases `target` should carry.
///
/// A target absent from `sites` resolves to an empty map.
pub fn resolve_for_site(
    target: &str,
    sites: &SitePriorityList,
    index: &GlobalAliasIndex,
    overrides: &BTreeMap<MacAddress, String>,
    excluded: &BTreeSet<MacAddress>,
) -> ResolvedAliasMap {
    let mut resolved = ResolvedAliasMap::new();
    let Some(target_rank) = sites.rank(target) else {
        return resolved;
    };
    let own = index.bucket(target);

    for bucket in index.buckets() {
        let Some(source_rank) = sites.rank(&bucket.site) else {
            continue;
        };
        if source_rank == target_rank {
            continue;
        }
        let outranks_target = source_rank < target_rank;
        for (mac, alias) in bucket.entries() {
            if !outranks_target && own.is_some_and(|b| b.contains(mac)) {
                continue;
            }
            resolved
                .entry(mac.clone())
                .or_insert_with(|| alias.clone());
        }
    }

    for (mac, alias) in overrides {
        if excluded.contains(mac) {
            continue;
        }
        resolved.insert(mac.clone(), alias.clone());
    }

    tracing::debug!(site = target, resolved = resolved.len(), "aliases resolved");
    resolved
}

/// Run-scoped resolver holding the memoized index.
#[derive(Debug, Default)]
pub struct AliasResolver {
    overrides: BTreeMap<MacAddress, String>,
    excluded: BTreeSet<MacAddress>,
    index: Option<Rc<GlobalAliasIndex>>,
}

impl AliasResolver {
    pub fn new(overrides: BTreeMap<MacAddress, String>, excluded: BTreeSet<MacAddress>) -> Self {
        Self {
            overrides,
            excluded,
            index: None,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.aliases.clone(), config.exclude_clients.clone())
    }

    /// The index, if already built.
    pub fn index(&self) -> Option<Rc<GlobalAliasIndex>> {
        self.index.clone()
    }

    /// Build the index on first call; later calls return the same index.
    ///
    /// # Errors
    ///
    /// Propagates client fetch failures.
    pub fn build_global_alias_index<F: ClientFetcher + ?Sized>(
        &mut self,
        sites: &SitePriorityList,
        store: &mut ClientStore,
        fetcher: &F,
    ) -> Result<Rc<GlobalAliasIndex>, SyncError> {
        if let Some(index) = &self.index {
            return Ok(Rc::clone(index));
        }
        let index = Rc::new(GlobalAliasIndex::build(sites, store, fetcher)?);
        tracing::debug!(
            sites = index.buckets().len(),
            aliased = index.aliased_total(),
            "global alias index built"
        );
        self.index = Some(Rc::clone(&index));
        Ok(index)
    }

    /// Resolve `target` against `index` with this run's overrides.
    pub fn resolve_for_site(
        &self,
        target: &str,
        sites: &SitePriorityList,
        index: &GlobalAliasIndex,
    ) -> ResolvedAliasMap {
        resolve_for_site(target, sites, index, &self.overrides, &self.excluded)
    }
}
