//! Change records produced by committed operations

use crate::instance::ItemInstance;
use gridbag_core::{ContainerId, DefinitionKey, ItemId, Tag};
use std::collections::HashMap;

/// One observable state change
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// A container came into existence, optionally carried by a bag item
    ContainerCreated {
        container: ContainerId,
        owner: Option<ItemId>,
        holder: Option<ContainerId>,
    },
    /// The bag carrying a container was destroyed; the container is now a root
    ContainerDetached {
        container: ContainerId,
        former_owner: ItemId,
    },
    /// A root container was disposed
    ContainerDisposed { container: ContainerId },
    /// A new instance was placed
    ItemAdded {
        container: ContainerId,
        item: ItemInstance,
    },
    /// An instance was destroyed
    ItemRemoved {
        container: ContainerId,
        item: ItemId,
        definition: DefinitionKey,
    },
    /// Count, rotation, placement or values changed in place
    ItemUpdated {
        container: ContainerId,
        item: ItemInstance,
    },
    /// An instance changed containers
    ItemMoved {
        from: ContainerId,
        to: ContainerId,
        item: ItemInstance,
    },
    /// An item entered an equipment container
    ItemEquipped {
        container: ContainerId,
        item: ItemId,
        slot: Tag,
    },
    /// An item left an equipment container (moved out or destroyed)
    ItemUnequipped {
        container: ContainerId,
        item: ItemId,
        slot: Tag,
    },
}

impl Change {
    /// Containers whose contents or existence changed
    pub fn containers(&self) -> Vec<ContainerId> {
        match self {
            Change::ContainerCreated { container, .. }
            | Change::ContainerDetached { container, .. }
            | Change::ContainerDisposed { container }
            | Change::ItemAdded { container, .. }
            | Change::ItemRemoved { container, .. }
            | Change::ItemUpdated { container, .. }
            | Change::ItemEquipped { container, .. }
            | Change::ItemUnequipped { container, .. } => vec![*container],
            Change::ItemMoved { from, to, .. } => vec![*from, *to],
        }
    }

    /// Item the change is about
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            Change::ItemAdded { item, .. }
            | Change::ItemUpdated { item, .. }
            | Change::ItemMoved { item, .. } => Some(item.id),
            Change::ItemRemoved { item, .. }
            | Change::ItemEquipped { item, .. }
            | Change::ItemUnequipped { item, .. } => Some(*item),
            Change::ContainerDetached { former_owner, .. } => Some(*former_owner),
            _ => None,
        }
    }

    /// Does this change alter container nesting?
    pub fn alters_topology(&self) -> bool {
        match self {
            Change::ContainerCreated { holder, .. } => holder.is_some(),
            Change::ContainerDetached { .. } | Change::ContainerDisposed { .. } => true,
            Change::ItemAdded { item, .. } | Change::ItemMoved { item, .. } => {
                item.child_container.is_some()
            }
            Change::ItemRemoved { .. }
            | Change::ItemUpdated { .. }
            | Change::ItemEquipped { .. }
            | Change::ItemUnequipped { .. } => false,
        }
    }

    /// Does this change put on or take off equipment?
    pub fn is_equipment_change(&self) -> bool {
        matches!(
            self,
            Change::ItemEquipped { .. } | Change::ItemUnequipped { .. }
        )
    }

    /// Keep an item -> container index in step with this change
    pub fn apply_to_index(&self, index: &mut HashMap<ItemId, ContainerId>) {
        match self {
            Change::ItemAdded { container, item } => {
                index.insert(item.id, *container);
            }
            Change::ItemMoved { to, item, .. } => {
                index.insert(item.id, *to);
            }
            Change::ItemRemoved { item, .. } => {
                index.remove(item);
            }
            _ => {}
        }
    }
}
