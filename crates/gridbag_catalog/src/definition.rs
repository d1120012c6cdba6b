//! Item definitions

use crate::template::ContainerTemplate;
use gridbag_core::{DefinitionKey, InventoryError, Tag, TagSet, TagValues};
use serde::{Deserialize, Serialize};

/// What an item is, beyond its footprint and stack size
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    /// Plain item (materials, loot, currency)
    #[default]
    Basic,
    /// Used up on use (potions, food, ammo)
    Consumable,
    /// Can be equipped into the given slot
    Equippable { slot: Tag },
    /// Carries its own container (bags, pouches)
    Container(ContainerTemplate),
}

impl ItemKind {
    /// Container template, if this kind carries a container
    pub fn container_template(&self) -> Option<&ContainerTemplate> {
        match self {
            ItemKind::Container(template) => Some(template),
            _ => None,
        }
    }

    /// Slot an equippable item goes into
    pub fn equip_slot(&self) -> Option<&Tag> {
        match self {
            ItemKind::Equippable { slot } => Some(slot),
            _ => None,
        }
    }

    /// Short name of the variant
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Basic => "basic",
            ItemKind::Consumable => "consumable",
            ItemKind::Equippable { .. } => "equippable",
            ItemKind::Container(_) => "container",
        }
    }
}

fn default_extent() -> u32 {
    1
}

/// Item definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    /// Stable identifier
    pub key: DefinitionKey,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Footprint width in cells
    #[serde(default = "default_extent")]
    pub width: u32,
    /// Footprint height in cells
    #[serde(default = "default_extent")]
    pub height: u32,
    /// Maximum stack size (1 = not stackable)
    #[serde(default = "default_extent")]
    pub max_stack: u32,
    /// Whether the item may be rotated in a grid
    #[serde(default)]
    pub rotatable: bool,
    /// Classification tags
    #[serde(default)]
    pub tags: TagSet,
    /// Tag values every new instance starts with (durability, charges, ...)
    #[serde(default)]
    pub default_values: TagValues,
    /// Kind
    #[serde(default)]
    pub kind: ItemKind,
}

impl ItemDefinition {
    /// Create a new 1x1, non-stackable item definition
    pub fn new(key: impl Into<DefinitionKey>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: String::new(),
            width: 1,
            height: 1,
            max_stack: 1,
            rotatable: false,
            tags: TagSet::new(),
            default_values: TagValues::new(),
            kind: ItemKind::Basic,
        }
    }

    /// Set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Set footprint size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set max stack size
    pub fn with_max_stack(mut self, max: u32) -> Self {
        self.max_stack = max;
        self
    }

    /// Allow or forbid rotation
    pub fn with_rotation(mut self, rotatable: bool) -> Self {
        self.rotatable = rotatable;
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Set a default tag value
    pub fn with_value(mut self, tag: &str, value: f64) -> Self {
        self.default_values.set(tag, value);
        self
    }

    /// Set kind
    pub fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }

    /// Make this a container item
    pub fn with_container(self, template: ContainerTemplate) -> Self {
        self.with_kind(ItemKind::Container(template))
    }

    /// Make this an equippable item bound to `slot`
    pub fn equippable(self, slot: &str) -> Self {
        self.with_kind(ItemKind::Equippable {
            slot: Tag::new(slot),
        })
    }

    /// Check if item has a tag (hierarchical)
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.has(tag)
    }

    /// Check if stackable
    pub fn is_stackable(&self) -> bool {
        self.max_stack > 1
    }

    /// Does this item carry a container?
    pub fn is_container(&self) -> bool {
        matches!(self.kind, ItemKind::Container(_))
    }

    /// Reject definitions the engine cannot hold
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.width == 0 || self.height == 0 {
            return Err(InventoryError::InvalidFootprint {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_stack == 0 {
            return Err(InventoryError::InvalidAmount {
                requested: 0,
                available: 0,
            });
        }
        if let ItemKind::Container(template) = &self.kind {
            template.validate()?;
            // Every container item owns exactly one container
            if self.max_stack != 1 {
                return Err(InventoryError::InvalidAmount {
                    requested: self.max_stack,
                    available: 1,
                });
            }
        }
        Ok(())
    }
}
