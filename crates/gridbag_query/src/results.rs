//! Query results

use gridbag_container::ItemInstance;
use gridbag_core::{DefinitionKey, ItemId};
use std::sync::Arc;

/// Snapshot of matching items taken when the query ran.
///
/// Cheap to clone and can be iterated any number of times; it holds no locks.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResults {
    items: Arc<[ItemInstance]>,
}

impl QueryResults {
    pub fn new(items: Vec<ItemInstance>) -> Self {
        Self {
            items: items.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ItemInstance> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[ItemInstance] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&ItemInstance> {
        self.items.first()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|i| i.id).collect()
    }

    /// Sum of stack counts
    pub fn total_count(&self) -> u64 {
        self.items.iter().map(|i| i.count as u64).sum()
    }

    /// Sum of stack counts for one definition
    pub fn count_of(&self, key: &DefinitionKey) -> u64 {
        self.items
            .iter()
            .filter(|i| i.key() == key)
            .map(|i| i.count as u64)
            .sum()
    }

    /// Are there at least `count` items in total?
    pub fn has_at_least(&self, count: u64) -> bool {
        self.total_count() >= count
    }
}

impl Default for QueryResults {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a QueryResults {
    type Item = &'a ItemInstance;
    type IntoIter = std::slice::Iter<'a, ItemInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
