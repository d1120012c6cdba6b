//! Item instances

use gridbag_catalog::ItemDefinition;
use gridbag_core::{ContainerId, DefinitionKey, ItemId, Tag, TagSet, TagValues};
use gridbag_grid::{Footprint, Placement};
use std::sync::Arc;

/// A concrete stack of items living in one container
#[derive(Debug, Clone, PartialEq)]
pub struct ItemInstance {
    pub id: ItemId,
    pub definition: Arc<ItemDefinition>,
    /// Stack count, `1..=definition.max_stack`
    pub count: u32,
    /// Container holding this instance
    pub container: ContainerId,
    pub placement: Placement,
    /// Per-instance values (durability, charges, ...)
    pub tag_values: TagValues,
    /// Container carried by this item, if the item is a bag
    pub child_container: Option<ContainerId>,
    /// Slot of the equipment container holding this item
    pub equipped: Option<Tag>,
}

impl ItemInstance {
    /// New instance with the definition's default tag values
    pub fn new(
        id: ItemId,
        definition: Arc<ItemDefinition>,
        count: u32,
        container: ContainerId,
        placement: Placement,
    ) -> Self {
        let tag_values = definition.default_values.clone();
        Self {
            id,
            definition,
            count,
            container,
            placement,
            tag_values,
            child_container: None,
            equipped: None,
        }
    }

    #[inline]
    pub fn key(&self) -> &DefinitionKey {
        &self.definition.key
    }

    #[inline]
    pub fn tags(&self) -> &TagSet {
        &self.definition.tags
    }

    pub fn max_stack(&self) -> u32 {
        self.definition.max_stack
    }

    /// Unrotated footprint from the definition
    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.definition.width, self.definition.height)
            .unwrap_or_else(|_| Footprint::unit())
    }

    #[inline]
    pub fn is_equipped(&self) -> bool {
        self.equipped.is_some()
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.definition.max_stack
    }

    /// How many more items fit on this stack
    pub fn space_left(&self) -> u32 {
        self.definition.max_stack.saturating_sub(self.count)
    }

    /// Same definition and identical instance data
    pub fn can_stack_with(&self, other: &ItemInstance) -> bool {
        self.key() == other.key() && self.tag_values == other.tag_values
    }

    /// Would a freshly spawned item of `definition` stack onto this one?
    pub fn accepts_fresh(&self, definition: &ItemDefinition) -> bool {
        *self.key() == definition.key && self.tag_values == definition.default_values
    }
}
