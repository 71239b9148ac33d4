//! # Site Registry
//!
//! Fetches the controller's sites once per run, drops excluded ones and
//! orders the rest by priority:
//!
//! 1. configured priority sites, in configured order;
//! 2. the `default` site;
//! 3. everything else by name (byte order, ascending).

use std::collections::HashMap;
use std::rc::Rc;

use uas_core::{Site, SiteFetcher, DEFAULT_SITE_NAME};

use crate::config::SyncConfig;
use crate::error::SyncError;

// ─── Priority List ───────────────────────────────────────────────────

/// Sites in priority order, highest first, with an O(1) rank lookup.
#[derive(Debug, Clone, Default)]
pub struct SitePriorityList {
    sites: Vec<Site>,
    ranks: HashMap<String, usize>,
}

impl SitePriorityList {
    /// Wrap an already ordered sequence. Later duplicates of a name are dropped.
    pub fn new(ordered: Vec<Site>) -> Self {
        let mut sites = Vec::with_capacity(ordered.len());
        let mut ranks = HashMap::with_capacity(ordered.len());
        for site in ordered {
            if ranks.contains_key(&site.name) {
                continue;
            }
            ranks.insert(site.name.clone(), sites.len());
            sites.push(site);
        }
        Self { sites, ranks }
    }

    /// Rank of `name`; 0 is the highest priority.
    pub fn rank(&self, name: &str) -> Option<usize> {
        self.ranks.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ranks.contains_key(name)
    }

    /// Site record by name.
    pub fn get(&self, name: &str) -> Option<&Site> {
        self.rank(name).map(|rank| &self.sites[rank])
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Site> {
        self.sites.iter()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl<'a> IntoIterator for &'a SitePriorityList {
    type Item = &'a Site;
    type IntoIter = std::slice::Iter<'a, Site>;

    fn into_iter(self) -> Self::IntoIter {
        self.sites.iter()
    }
}

/// Order `sites` by priority.
///
/// Entries of `prioritized` that name no current site are ignored, as are
/// repeated entries.
pub fn prioritize(sites: Vec<Site>, prioritized: &[String]) -> Vec<Site> {
    let mut remaining = sites;
    let mut ordered = Vec::with_capacity(remaining.len());

    for name in prioritized {
        if let Some(pos) = remaining.iter().position(|s| &s.name == name) {
            ordered.push(remaining.remove(pos));
        }
    }

    if let Some(pos) = remaining.iter().position(|s| s.name == DEFAULT_SITE_NAME) {
        ordered.push(remaining.remove(pos));
    }

    remaining.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    ordered.extend(remaining);
    ordered
}

// ─── Registry ────────────────────────────────────────────────────────

/// Memoized site discovery for one run.
#[derive(Debug, Default)]
pub struct SiteRegistry {
    exclude: Vec<String>,
    prioritized: Vec<String>,
    raw: Option<Rc<[Site]>>,
    ordered: Option<Rc<SitePriorityList>>,
}

impl SiteRegistry {
    pub fn new(exclude: Vec<String>, prioritized: Vec<String>) -> Self {
        Self {
            exclude,
            prioritized,
            raw: None,
            ordered: None,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.exclude_sites.clone(),
            config.prioritized_sites.clone(),
        )
    }

    /// Configured site exclusions, in configured order.
    pub fn excluded(&self) -> &[String] {
        &self.exclude
    }

    /// The controller's site list with unnamed, unidentified and repeated
    /// sites removed.
    /// Fetched at most once.
    ///
    /// # Errors
    ///
    /// [`SyncError::NoSites`] when the controller reports no sites, or the
    /// fetch failure itself.
    pub fn raw_sites<F: SiteFetcher + ?Sized>(
        &mut self,
        fetcher: &F,
    ) -> Result<Rc<[Site]>, SyncError> {
        if let Some(raw) = &self.raw {
            return Ok(Rc::clone(raw));
        }

        let fetched = fetcher.fetch_sites()?;
        let fetched_count = fetched.len();
        let mut sites: Vec<Site> = Vec::with_capacity(fetched_count);
        for site in fetched {
            if site.name.is_empty() {
                tracing::warn!(site_id = %site.id, "dropping site without a name");
                continue;
            }
            if site.id.is_empty() {
                tracing::warn!(site = %site.name, "dropping site without an id");
                continue;
            }
            if sites.iter().any(|s| s.name == site.name) {
                tracing::warn!(site = %site.name, "dropping repeated site name");
                continue;
            }
            sites.push(site);
        }
        tracing::debug!(fetched = fetched_count, kept = sites.len(), "site list cached");

        if sites.is_empty() {
            return Err(SyncError::NoSites);
        }

        let raw: Rc<[Site]> = sites.into();
        self.raw = Some(Rc::clone(&raw));
        Ok(raw)
    }

    /// Non-excluded sites in priority order. Computed at most once.
    ///
    /// # Errors
    ///
    /// See [`SiteRegistry::raw_sites`].
    pub fn get_sites<F: SiteFetcher + ?Sized>(
        &mut self,
        fetcher: &F,
    ) -> Result<Rc<SitePriorityList>, SyncError> {
        if let Some(ordered) = &self.ordered {
            return Ok(Rc::clone(ordered));
        }

        let raw = self.raw_sites(fetcher)?;
        let kept: Vec<Site> = raw
            .iter()
            .filter(|s| !self.exclude.contains(&s.name))
            .cloned()
            .collect();
        let list = Rc::new(SitePriorityList::new(prioritize(kept, &self.prioritized)));
        tracing::debug!(
            sites = list.len(),
            excluded = raw.len() - list.len(),
            "site priority order computed"
        );

        self.ordered = Some(Rc::clone(&list));
        Ok(list)
    }
}
