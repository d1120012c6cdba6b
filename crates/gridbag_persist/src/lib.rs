//! # gridbag_persist - Export, Import and Save Slots
//!
//! - Stable export records for containers and item stacks
//! - Import that re-validates every placement and ownership link
//! - JSON (human readable) and binary (compact) formats
//! - Named save slots in a directory, with rotating autosaves
//!
//! ```ignore
//! use gridbag_persist::prelude::*;
//!
//! let mut saves = SaveStore::new("saves").with_format(SaveFormat::Json);
//! saves.save("slot1", &SaveData::new("Camp", InventoryExport::from_store(&store)))?;
//! let store = saves.load("slot1")?.inventory.into_store(catalog, StoreConfig::default())?;
//! ```

pub mod error;
pub mod export;
pub mod save;

pub use error::{PersistError, Result};
pub use export::{ContainerRecord, InventoryExport, ItemRecord, EXPORT_VERSION};
pub use save::{SaveData, SaveFormat, SaveHeader, SaveSlot, SaveStore};

pub mod prelude {
    pub use crate::error::PersistError;
    pub use crate::export::{ContainerRecord, InventoryExport, ItemRecord};
    pub use crate::save::{SaveData, SaveFormat, SaveSlot, SaveStore};
}
