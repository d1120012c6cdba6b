//! Container settings and compatibility rules

use gridbag_catalog::{ContainerStyle, ContainerTemplate, ItemDefinition};
use gridbag_core::{DefinitionKey, InventoryError, Tag, TagSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tile tag that blocks a cell
pub const LOCKED_TILE_TAG: &str = "Tile.Locked";

/// Which items a container accepts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilitySettings {
    /// Items must carry all of these tags
    #[serde(default)]
    pub required_tags: TagSet,
    /// Items carrying any of these tags are refused
    #[serde(default)]
    pub blocking_tags: TagSet,
    /// Items must match one of these type tags (empty = any)
    #[serde(default)]
    pub allowed_types: TagSet,
    /// Only these definitions are accepted (empty = any)
    #[serde(default)]
    pub whitelist: BTreeSet<DefinitionKey>,
    /// These definitions are never accepted
    #[serde(default)]
    pub blacklist: BTreeSet<DefinitionKey>,
}

impl CompatibilitySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requiring(mut self, tag: &str) -> Self {
        self.required_tags.insert(tag);
        self
    }

    pub fn blocking(mut self, tag: &str) -> Self {
        self.blocking_tags.insert(tag);
        self
    }

    pub fn allowing_type(mut self, tag: &str) -> Self {
        self.allowed_types.insert(tag);
        self
    }

    pub fn whitelisting(mut self, key: impl Into<DefinitionKey>) -> Self {
        self.whitelist.insert(key.into());
        self
    }

    pub fn blacklisting(mut self, key: impl Into<DefinitionKey>) -> Self {
        self.blacklist.insert(key.into());
        self
    }

    /// Does the definition pass every rule?
    pub fn accepts(&self, definition: &ItemDefinition) -> bool {
        if self.blacklist.contains(&definition.key) {
            return false;
        }
        if !self.whitelist.is_empty() && !self.whitelist.contains(&definition.key) {
            return false;
        }
        if !definition.tags.has_all(&self.required_tags) {
            return false;
        }
        if definition.tags.has_any(&self.blocking_tags) {
            return false;
        }
        self.allowed_types.is_empty() || definition.tags.has_any(&self.allowed_types)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.required_tags.is_empty()
            && self.blocking_tags.is_empty()
            && self.allowed_types.is_empty()
            && self.whitelist.is_empty()
            && self.blacklist.is_empty()
    }
}

/// Tags attached to a single tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileTags {
    pub x: u32,
    pub y: u32,
    pub tags: TagSet,
}

/// Shape, style and rules of a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSettings {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub style: ContainerStyle,
    #[serde(default)]
    pub tags: TagSet,
    #[serde(default)]
    pub compatibility: CompatibilitySettings,
    #[serde(default)]
    pub tile_tags: Vec<TileTags>,
    /// Equipment slot this container stands for. Only equippable items
    /// bound to a matching slot go in, and holding one equips it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_slot: Option<Tag>,
}

impl ContainerSettings {
    /// Spatial grid container
    pub fn grid(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            style: ContainerStyle::Grid,
            tags: TagSet::new(),
            compatibility: CompatibilitySettings::default(),
            tile_tags: Vec::new(),
            equipment_slot: None,
        }
    }

    /// Slot container: every item takes one cell
    pub fn traditional(width: u32, height: u32) -> Self {
        Self::grid(width, height).with_style(ContainerStyle::Traditional)
    }

    /// Unbounded list without a grid
    pub fn data_only() -> Self {
        Self::grid(0, 0).with_style(ContainerStyle::DataOnly)
    }

    /// Single-cell equipment slot (`Equipment.Slot.Head`, ...)
    pub fn equipment(slot: &str) -> Self {
        Self::traditional(1, 1).with_equipment_slot(slot)
    }

    /// Settings for the container spawned by a container item
    pub fn from_template(template: &ContainerTemplate) -> Self {
        Self {
            width: template.width,
            height: template.height,
            style: template.style,
            tags: template.tags.clone(),
            compatibility: CompatibilitySettings {
                required_tags: template.required_tags.clone(),
                blocking_tags: template.blocking_tags.clone(),
                ..CompatibilitySettings::default()
            },
            tile_tags: Vec::new(),
            equipment_slot: None,
        }
    }

    pub fn with_style(mut self, style: ContainerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn with_compatibility(mut self, compatibility: CompatibilitySettings) -> Self {
        self.compatibility = compatibility;
        self
    }

    /// Bind the container to an equipment slot
    pub fn with_equipment_slot(mut self, slot: &str) -> Self {
        self.equipment_slot = Some(Tag::new(slot));
        self
    }

    pub fn is_equipment(&self) -> bool {
        self.equipment_slot.is_some()
    }

    /// Attach a tag to one tile
    pub fn with_tile_tag(mut self, x: u32, y: u32, tag: &str) -> Self {
        match self.tile_tags.iter_mut().find(|t| t.x == x && t.y == y) {
            Some(tile) => {
                tile.tags.insert(tag);
            }
            None => self.tile_tags.push(TileTags {
                x,
                y,
                tags: TagSet::new().with(tag),
            }),
        }
        self
    }

    /// Lock a tile so no item can cover it
    pub fn with_locked_tile(self, x: u32, y: u32) -> Self {
        self.with_tile_tag(x, y, LOCKED_TILE_TAG)
    }

    /// Tags on the tile at `(x, y)`
    pub fn tile_tags_at(&self, x: u32, y: u32) -> Option<&TagSet> {
        self.tile_tags
            .iter()
            .find(|t| t.x == x && t.y == y)
            .map(|t| &t.tags)
    }

    /// Coordinates of locked tiles
    pub fn locked_tiles(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let locked = Tag::new(LOCKED_TILE_TAG);
        self.tile_tags
            .iter()
            .filter(move |t| t.tags.has(&locked))
            .map(|t| (t.x, t.y))
    }

    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.style.has_grid() && (self.width == 0 || self.height == 0) {
            return Err(InventoryError::InvalidFootprint {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}
