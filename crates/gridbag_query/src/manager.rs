//! Registered queries kept current from change notifications
//!
//! Each registered query caches its matching items. Feeding committed changes
//! through [`QueryManager::apply`] updates the caches in place; queries whose
//! result cannot be patched locally (limited queries, recursive scopes after a
//! nesting change) are marked stale and re-run on their next read.

use crate::query::{ItemQuery, QueryScope, ScopeRank};
use crate::results::QueryResults;
use crate::source::ItemSource;
use gridbag_container::{Change, ItemInstance};
use gridbag_core::{ContainerId, ItemId};
use std::collections::BTreeMap;

struct Registered {
    query: ItemQuery,
    items: Vec<ItemInstance>,
    rank: ScopeRank,
    stale: bool,
    snapshot: Option<QueryResults>,
}

impl Registered {
    fn refresh<S: ItemSource + ?Sized>(&mut self, source: &S) {
        let collected = self.query.collect(source);
        self.items = collected.items;
        self.rank = collected.rank;
        self.query.finish(&mut self.items, &self.rank);
        self.stale = false;
        self.snapshot = None;
    }

    fn in_scope(&self, container: ContainerId) -> bool {
        match self.query.scope {
            QueryScope::All => true,
            _ => self.rank.contains(container),
        }
    }

    fn forget(&mut self, item: ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != item);
        before != self.items.len()
    }

    fn admit(&mut self, container: ContainerId, item: &ItemInstance) -> bool {
        if self.in_scope(container) && self.query.filter.matches(item) {
            self.items.push(item.clone());
            true
        } else {
            false
        }
    }

    /// Does the change concern anything this query reads?
    fn is_relevant(&self, change: &Change) -> bool {
        change.containers().into_iter().any(|c| self.in_scope(c))
            || change
                .item_id()
                .map(|id| self.items.iter().any(|i| i.id == id))
                .unwrap_or(false)
    }

    fn apply(&mut self, changes: &[Change]) {
        if self.stale {
            return;
        }
        let recursive = matches!(self.query.scope, QueryScope::Recursive(_));
        let limited = self.query.limit.is_some();
        if changes.iter().any(|c| {
            (recursive && c.alters_topology()) || (limited && self.is_relevant(c))
        }) {
            self.stale = true;
            self.snapshot = None;
            return;
        }

        let mut dirty = false;
        for change in changes {
            dirty |= match change {
                Change::ItemAdded { container, item } => self.admit(*container, item),
                Change::ItemUpdated { container, item } => {
                    let forgot = self.forget(item.id);
                    self.admit(*container, item) | forgot
                }
                Change::ItemMoved { to, item, .. } => {
                    let forgot = self.forget(item.id);
                    self.admit(*to, item) | forgot
                }
                Change::ItemRemoved { item, .. } => self.forget(*item),
                Change::ContainerDisposed { container } => {
                    let before = self.items.len();
                    self.items.retain(|i| i.container != *container);
                    before != self.items.len()
                }
                Change::ContainerCreated { .. }
                | Change::ContainerDetached { .. }
                | Change::ItemEquipped { .. }
                | Change::ItemUnequipped { .. } => false,
            };
        }
        if dirty {
            self.query.finish(&mut self.items, &self.rank);
            self.snapshot = None;
        }
    }

    fn results(&mut self) -> QueryResults {
        self.snapshot
            .get_or_insert_with(|| QueryResults::new(self.items.clone()))
            .clone()
    }
}

/// Named queries with incrementally maintained results
#[derive(Default)]
pub struct QueryManager {
    queries: BTreeMap<String, Registered>,
}

impl QueryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a query and run it once
    pub fn register<S: ItemSource + ?Sized>(
        &mut self,
        name: impl Into<String>,
        query: ItemQuery,
        source: &S,
    ) -> QueryResults {
        let mut registered = Registered {
            query,
            items: Vec::new(),
            rank: ScopeRank::default(),
            stale: true,
            snapshot: None,
        };
        registered.refresh(source);
        let results = registered.results();
        self.queries.insert(name.into(), registered);
        results
    }

    /// Drop a query; returns false if it was not registered
    pub fn unregister(&mut self, name: &str) -> bool {
        self.queries.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Names of registered queries, sorted
    pub fn names(&self) -> Vec<&str> {
        self.queries.keys().map(String::as_str).collect()
    }

    /// Does the query need a re-run before its results can be trusted?
    pub fn is_stale(&self, name: &str) -> bool {
        self.queries.get(name).map(|q| q.stale).unwrap_or(false)
    }

    /// Current results, re-running the query first if it went stale
    pub fn results<S: ItemSource + ?Sized>(&mut self, name: &str, source: &S) -> Option<QueryResults> {
        let registered = self.queries.get_mut(name)?;
        if registered.stale {
            log::trace!("Refreshing stale query '{}'", name);
            registered.refresh(source);
        }
        Some(registered.results())
    }

    /// Feed committed changes to every registered query
    pub fn apply(&mut self, changes: &[Change]) {
        for registered in self.queries.values_mut() {
            registered.apply(changes);
        }
    }

    /// Mark every query stale
    pub fn invalidate_all(&mut self) {
        for registered in self.queries.values_mut() {
            registered.stale = true;
            registered.snapshot = None;
        }
    }
}

impl core::fmt::Debug for QueryManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QueryManager")
            .field("queries", &self.names())
            .finish()
    }
}
