//! Gridbag Catalog - Item Definitions
//!
//! Immutable definitions of item kinds, shared read-only by every container.
//!
//! # Features
//!
//! - Item definitions with grid footprints, stack limits and tags
//! - Item kinds as a tagged variant (basic, consumable, equippable, container)
//! - Container templates for items that carry their own grid
//! - Catalog loading from TOML for authoring tools
//!
//! # Example
//!
//! ```ignore
//! use gridbag_catalog::prelude::*;
//!
//! let rifle = ItemDefinition::new("rifle", "Rifle")
//!     .with_size(4, 2)
//!     .with_rotation(true)
//!     .with_tag("Item.Type.Weapon.Gun");
//!
//! let mut catalog = ItemCatalog::new();
//! catalog.register(rifle)?;
//! ```

pub mod catalog;
pub mod definition;
pub mod template;

pub mod prelude {
    pub use crate::catalog::{CatalogError, ItemCatalog};
    pub use crate::definition::{ItemDefinition, ItemKind};
    pub use crate::template::{ContainerStyle, ContainerTemplate};
}

pub use prelude::*;
