//! # gridbag_core - Inventory Engine Core
//!
//! Primitives shared by every gridbag crate:
//! - **Ids**: container and item identifiers plus a thread-safe generator
//! - **Tags**: hierarchical dotted tags and tag sets
//! - **Rotation**: quarter-turn rotation of grid footprints
//! - **Errors**: the domain error returned by every mutating operation

pub mod error;
pub mod id;
pub mod rotation;
pub mod tag;

pub use error::*;
pub use id::*;
pub use rotation::*;
pub use tag::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{InventoryError, Result};
    pub use crate::id::{ContainerId, DefinitionKey, IdGenerator, ItemId};
    pub use crate::rotation::Rotation;
    pub use crate::tag::{Tag, TagSet, TagValues};
}
