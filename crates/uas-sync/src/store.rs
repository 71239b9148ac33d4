//! # Client Store
//!
//! Per-site client lists, fetched lazily and cached for the run. Excluded
//! clients are filtered out here so no other component ever sees them.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use uas_core::{Client, ClientFetcher, MacAddress};

use crate::error::SyncError;
use crate::registry::SitePriorityList;

/// Memoized client lists keyed by site name.
#[derive(Debug, Default)]
pub struct ClientStore {
    excluded: BTreeSet<MacAddress>,
    cache: HashMap<String, Rc<[Client]>>,
}

impl ClientStore {
    pub fn new(excluded: BTreeSet<MacAddress>) -> Self {
        Self {
            excluded,
            cache: HashMap::new(),
        }
    }

    /// Clients of `site_name`, in discovery order.
    ///
    /// A site absent from `sites` yields an empty list without any fetch.
    ///
    /// # Errors
    ///
    /// Propagates the fetch failure; nothing is cached in that case.
    pub fn get_clients<F: ClientFetcher + ?Sized>(
        &mut self,
        site_name: &str,
        sites: &SitePriorityList,
        fetcher: &F,
    ) -> Result<Rc<[Client]>, SyncError> {
        if !sites.contains(site_name) {
            return Ok(Rc::from(Vec::new()));
        }
        if let Some(clients) = self.cache.get(site_name) {
            return Ok(Rc::clone(clients));
        }

        let fetched = fetcher.fetch_clients(site_name)?;
        let fetched_count = fetched.len();
        let mut seen: HashSet<MacAddress> = HashSet::with_capacity(fetched_count);
        let mut clients = Vec::with_capacity(fetched_count);
        for client in fetched {
            if self.excluded.contains(&client.mac) {
                continue;
            }
            if !seen.insert(client.mac.clone()) {
                tracing::warn!(site = site_name, mac = %client.mac, "dropping repeated client");
                continue;
            }
            clients.push(client);
        }
        tracing::debug!(
            site = site_name,
            fetched = fetched_count,
            kept = clients.len(),
            "client list cached"
        );

        let clients: Rc<[Client]> = clients.into();
        self.cache
            .insert(site_name.to_string(), Rc::clone(&clients));
        Ok(clients)
    }

    /// Whether `site_name` has been fetched this run.
    pub fn is_cached(&self, site_name: &str) -> bool {
        self.cache.contains_key(site_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use uas_core::{ControllerError, Site};

    struct Clients {
        calls: Cell<usize>,
        fail: bool,
    }

    impl ClientFetcher for Clients {
        fn fetch_clients(&self, site_name: &str) -> Result<Vec<Client>, ControllerError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ControllerError::Transport {
                    operation: "stat/alluser".into(),
                    reason: "connection reset".into(),
                });
            }
            let mac = |s: &str| MacAddress::new(s).unwrap();
            Ok(match site_name {
                "default" => vec![
                    Client::new(mac("aa:aa:aa:aa:aa:01"), "1").with_alias("One"),
                    Client::new(mac("aa:aa:aa:aa:aa:02"), "2"),
                    Client::new(mac("aa:aa:aa:aa:aa:01"), "3").with_alias("Dup"),
                ],
                _ => Vec::new(),
            })
        }
    }

    fn sites() -> SitePriorityList {
        SitePriorityList::new(vec![Site::new("1", "default"), Site::new("2", "empty")])
    }

    fn fetcher() -> Clients {
        Clients {
            calls: Cell::new(0),
            fail: false,
        }
    }

    #[test]
    fn unknown_site_is_empty_without_fetch() {
        let fetcher = fetcher();
        let mut store = ClientStore::default();
        let clients = store.get_clients("other", &sites(), &fetcher).unwrap();
        assert!(clients.is_empty());
        assert_eq!(fetcher.calls.get(), 0);
    }

    #[test]
    fn repeated_macs_keep_first() {
        let fetcher = fetcher();
        let mut store = ClientStore::default();
        let clients = store.get_clients("default", &sites(), &fetcher).unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].alias(), Some("One"));
    }

    #[test]
    fn excluded_clients_are_filtered() {
        let fetcher = fetcher();
        let excluded = BTreeSet::from([MacAddress::new("aa:aa:aa:aa:aa:01").unwrap()]);
        let mut store = ClientStore::new(excluded);
        let clients = store.get_clients("default", &sites(), &fetcher).unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].internal_id, "2");
    }

    #[test]
    fn results_are_memoized_including_empty() {
        let fetcher = fetcher();
        let mut store = ClientStore::default();
        let sites = sites();
        store.get_clients("default", &sites, &fetcher).unwrap();
        store.get_clients("default", &sites, &fetcher).unwrap();
        store.get_clients("empty", &sites, &fetcher).unwrap();
        store.get_clients("empty", &sites, &fetcher).unwrap();
        assert_eq!(fetcher.calls.get(), 2);
        assert!(store.is_cached("empty"));
    }

    #[test]
    fn failures_are_not_cached() {
        let fetcher = Clients {
            calls: Cell::new(0),
            fail: true,
        };
        let mut store = ClientStore::default();
        let err = store.get_clients("default", &sites(), &fetcher).unwrap_err();
        assert!(matches!(err, SyncError::Controller(_)));
        assert!(!store.is_cached("default"));
    }
}
