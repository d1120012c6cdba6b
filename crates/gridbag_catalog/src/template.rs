//! Container templates carried by container items (bags, pouches, chests)

use gridbag_core::{InventoryError, TagSet};
use serde::{Deserialize, Serialize};

/// How a container treats item dimensions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStyle {
    /// Spatial inventory: items occupy their full footprint
    #[default]
    Grid,
    /// Slot inventory: every item occupies a single cell, rotation is ignored
    Traditional,
    /// No grid, no capacity, no collisions
    DataOnly,
}

impl ContainerStyle {
    /// Does this style keep an occupancy grid?
    pub fn has_grid(self) -> bool {
        !matches!(self, ContainerStyle::DataOnly)
    }

    /// Do items keep their real footprint?
    pub fn is_spatial(self) -> bool {
        matches!(self, ContainerStyle::Grid)
    }
}

/// Shape and rules of the container spawned with a container item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerTemplate {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub style: ContainerStyle,
    /// Tags applied to the spawned container
    #[serde(default)]
    pub tags: TagSet,
    /// Items must carry all of these tags
    #[serde(default)]
    pub required_tags: TagSet,
    /// Items carrying any of these tags are refused
    #[serde(default)]
    pub blocking_tags: TagSet,
}

impl ContainerTemplate {
    /// Create a grid template
    pub fn grid(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            style: ContainerStyle::Grid,
            tags: TagSet::new(),
            required_tags: TagSet::new(),
            blocking_tags: TagSet::new(),
        }
    }

    /// Set style
    pub fn with_style(mut self, style: ContainerStyle) -> Self {
        self.style = style;
        self
    }

    /// Add a container tag
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Require a tag on every stored item
    pub fn requiring(mut self, tag: &str) -> Self {
        self.required_tags.insert(tag);
        self
    }

    /// Refuse items carrying a tag
    pub fn blocking(mut self, tag: &str) -> Self {
        self.blocking_tags.insert(tag);
        self
    }

    /// Grid styles need non-zero dimensions
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(ContainerTemplate::grid(4, 4).validate().is_ok());
        assert!(ContainerTemplate::grid(0, 4).validate().is_err());
        assert!(ContainerTemplate::grid(0, 0)
            .with_style(ContainerStyle::DataOnly)
            .validate()
            .is_ok());
    }
}
