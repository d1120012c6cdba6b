//! # gridbag_container - Container Model
//!
//! Containers hold an ordered list of item instances plus the occupancy grid
//! derived from it. Containers nest through bag items; the nesting table
//! rejects cycles.
//!
//! [`ContainerArena`] is the single-threaded registry. Every operation it
//! applies is all-or-nothing and reports what changed as a list of
//! [`Change`] records.
//!
//! ```ignore
//! use gridbag_container::prelude::*;
//!
//! let mut arena = ContainerArena::new(catalog);
//! let backpack = arena.create_container(ContainerSettings::grid(6, 4))?;
//! let outcome = arena.add_item(backpack, "ammo_9mm", 45, PlacementRequest::Auto)?;
//! ```

pub mod arena;
pub mod change;
pub mod container;
pub mod instance;
pub mod operation;
pub mod settings;
pub mod topology;

pub use arena::{ContainerArena, Outcome};
pub use change::Change;
pub use container::Container;
pub use instance::ItemInstance;
pub use operation::{Operation, PlacementRequest};
pub use settings::{CompatibilitySettings, ContainerSettings, TileTags, LOCKED_TILE_TAG};
pub use topology::Topology;

pub mod prelude {
    pub use crate::arena::{ContainerArena, Outcome};
    pub use crate::change::Change;
    pub use crate::container::Container;
    pub use crate::instance::ItemInstance;
    pub use crate::operation::{Operation, PlacementRequest};
    pub use crate::settings::{CompatibilitySettings, ContainerSettings};
    pub use crate::topology::Topology;
}
