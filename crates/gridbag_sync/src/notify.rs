//! Change notifications delivered after each commit

use crate::transaction::TransactionId;
use gridbag_container::Change;
use gridbag_core::{ContainerId, ItemId};

/// Everything one transaction changed, in application order
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotification {
    pub transaction: TransactionId,
    /// Affected containers, ascending
    pub containers: Vec<ContainerId>,
    pub changes: Vec<Change>,
}

impl ChangeNotification {
    pub fn new(transaction: TransactionId, changes: Vec<Change>) -> Self {
        let mut containers: Vec<_> = changes.iter().flat_map(Change::containers).collect();
        containers.sort();
        containers.dedup();
        Self {
            transaction,
            containers,
            changes,
        }
    }

    /// Did the transaction change `container`?
    pub fn touches(&self, container: ContainerId) -> bool {
        self.containers.binary_search(&container).is_ok()
    }

    /// Items added, updated, moved or removed
    pub fn items(&self) -> Vec<ItemId> {
        let mut items: Vec<_> = self.changes.iter().filter_map(Change::item_id).collect();
        items.sort();
        items.dedup();
        items
    }

    /// Did container nesting change?
    pub fn alters_topology(&self) -> bool {
        self.changes.iter().any(Change::alters_topology)
    }
}
