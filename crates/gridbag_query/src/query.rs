//! Item queries: scope, filter, order and limit

use crate::filter::ItemFilter;
use crate::results::QueryResults;
use crate::source::ItemSource;
use gridbag_container::ItemInstance;
use gridbag_core::{ContainerId, Tag};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

/// Which containers a query reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryScope {
    Container(ContainerId),
    Containers(Vec<ContainerId>),
    /// The container and every container nested below it through bag items
    Recursive(ContainerId),
    /// Every container in the source
    All,
}

/// Result ordering
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueryOrder {
    /// Scope order of the container, then row, then column
    #[default]
    Position,
    /// Items matching earlier tags first; the rest last
    TagPriority(Vec<Tag>),
    /// Largest stacks first
    CountDescending,
    /// By definition key
    Definition,
    /// Oldest instance first
    Insertion,
}

/// Rank of each container in scope order. Containers without a rank sort by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ScopeRank(HashMap<ContainerId, usize>);

impl ScopeRank {
    fn key(&self, container: ContainerId) -> (usize, u64) {
        (
            self.0.get(&container).copied().unwrap_or(usize::MAX),
            container.raw(),
        )
    }

    pub(crate) fn contains(&self, container: ContainerId) -> bool {
        self.0.contains_key(&container)
    }
}

impl QueryOrder {
    fn tag_rank(tags: &[Tag], item: &ItemInstance) -> usize {
        tags.iter()
            .position(|t| item.tags().has(t))
            .unwrap_or(tags.len())
    }

    pub(crate) fn compare(&self, a: &ItemInstance, b: &ItemInstance, rank: &ScopeRank) -> Ordering {
        let primary = match self {
            QueryOrder::Position => rank
                .key(a.container)
                .cmp(&rank.key(b.container))
                .then(a.placement.y.cmp(&b.placement.y))
                .then(a.placement.x.cmp(&b.placement.x)),
            QueryOrder::TagPriority(tags) => {
                Self::tag_rank(tags, a).cmp(&Self::tag_rank(tags, b))
            }
            QueryOrder::CountDescending => b.count.cmp(&a.count),
            QueryOrder::Definition => a.key().cmp(b.key()),
            QueryOrder::Insertion => Ordering::Equal,
        };
        primary.then(a.id.cmp(&b.id))
    }
}

/// Items collected for a query, before limiting
pub(crate) struct Collected {
    pub items: Vec<ItemInstance>,
    pub rank: ScopeRank,
}

/// A declarative item query
#[derive(Debug, Clone, PartialEq)]
pub struct ItemQuery {
    pub scope: QueryScope,
    pub filter: ItemFilter,
    pub order: QueryOrder,
    pub limit: Option<usize>,
}

impl ItemQuery {
    /// Every item in `scope`, by position
    pub fn new(scope: QueryScope) -> Self {
        Self {
            scope,
            filter: ItemFilter::All,
            order: QueryOrder::Position,
            limit: None,
        }
    }

    /// Query one container
    pub fn container(container: ContainerId) -> Self {
        Self::new(QueryScope::Container(container))
    }

    /// Query a container and everything nested in it
    pub fn recursive(container: ContainerId) -> Self {
        Self::new(QueryScope::Recursive(container))
    }

    /// Query every container
    pub fn everywhere() -> Self {
        Self::new(QueryScope::All)
    }

    /// Add a filter; repeated calls are combined with `and`
    pub fn filter(mut self, filter: ItemFilter) -> Self {
        self.filter = std::mem::take(&mut self.filter).and(filter);
        self
    }

    pub fn order(mut self, order: QueryOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Run against a source and snapshot the results
    pub fn run<S: ItemSource + ?Sized>(&self, source: &S) -> QueryResults {
        let Collected { mut items, rank } = self.collect(source);
        self.finish(&mut items, &rank);
        QueryResults::new(items)
    }

    /// Total stack count of matching items
    pub fn count<S: ItemSource + ?Sized>(&self, source: &S) -> u64 {
        let mut total = 0u64;
        let filter = &self.filter;
        source.read_consistent(&mut || {
            self.visit_scope(source, &mut |item| {
                if filter.matches(item) {
                    total += item.count as u64;
                }
            });
        });
        total
    }

    /// Sort and truncate
    pub(crate) fn finish(&self, items: &mut Vec<ItemInstance>, rank: &ScopeRank) {
        items.sort_by(|a, b| self.order.compare(a, b, rank));
        if let Some(limit) = self.limit {
            items.truncate(limit);
        }
    }

    pub(crate) fn collect<S: ItemSource + ?Sized>(&self, source: &S) -> Collected {
        let mut items = Vec::new();
        let mut visited = Vec::new();
        let filter = &self.filter;
        source.read_consistent(&mut || {
            visited = self.visit_scope(source, &mut |item| {
                if filter.matches(item) {
                    items.push(item.clone());
                }
            });
        });
        let rank = match self.scope {
            QueryScope::All => ScopeRank::default(),
            _ => ScopeRank(visited.into_iter().enumerate().map(|(i, c)| (c, i)).collect()),
        };
        Collected { items, rank }
    }

    /// Visit every item in scope; returns the containers visited, in order
    fn visit_scope<S: ItemSource + ?Sized>(
        &self,
        source: &S,
        visit: &mut dyn FnMut(&ItemInstance),
    ) -> Vec<ContainerId> {
        let mut visited = Vec::new();
        match &self.scope {
            QueryScope::Container(container) => {
                if source.visit_items(*container, visit) {
                    visited.push(*container);
                }
            }
            QueryScope::Containers(containers) => {
                let mut seen = HashSet::new();
                for container in containers {
                    if seen.insert(*container) && source.visit_items(*container, visit) {
                        visited.push(*container);
                    }
                }
            }
            QueryScope::All => {
                for container in source.container_ids() {
                    if source.visit_items(container, visit) {
                        visited.push(container);
                    }
                }
            }
            QueryScope::Recursive(root) => {
                let mut seen = HashSet::new();
                let mut queue = VecDeque::from([*root]);
                while let Some(container) = queue.pop_front() {
                    if !seen.insert(container) {
                        continue;
                    }
                    let mut children = Vec::new();
                    let found = source.visit_items(container, &mut |item| {
                        if let Some(child) = item.child_container {
                            children.push(child);
                        }
                        visit(item);
                    });
                    if found {
                        visited.push(container);
                        queue.extend(children);
                    }
                }
            }
        }
        visited
    }
}
