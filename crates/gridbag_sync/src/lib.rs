//! # gridbag_sync - Concurrent Inventory Store
//!
//! Thread-safe access to containers through atomic transactions.
//!
//! ## Architecture
//!
//! ```text
//! caller ──► Transaction ──► InventoryStore
//!                              │ plan lock set (containers, topology?)
//!                              │ FIFO gates, ascending container id
//!                              │ validate on working copies
//!                              │ write back + update index
//!                              ▼
//!                         ChangeNotification ──► observers / channels
//! ```
//!
//! - Transactions on disjoint containers run in parallel
//! - Transactions sharing a container run in arrival order
//! - A queued transaction can be withdrawn; a validating one commits or is
//!   rejected as a whole
//!
//! ```ignore
//! use gridbag_sync::prelude::*;
//!
//! let store = InventoryStore::new(catalog);
//! let backpack = store.create_container(ContainerSettings::grid(6, 4))?;
//! let tx = TransactionBuilder::new()
//!     .description("loot crate")
//!     .op(Operation::add(backpack, "ammo_9mm", 45))
//!     .op(Operation::add(backpack, "medkit", 1))
//!     .build();
//! store.execute(tx)?;
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod notify;
pub mod store;
pub mod transaction;

pub use config::{ConfigError, StoreConfig};
pub use error::{TransactionError, TransactionOutcome, WithdrawReason};
pub use gate::FifoGate;
pub use notify::ChangeNotification;
pub use store::{ContainerPhase, InventoryStore, StoreStats};
pub use transaction::{
    CancelToken, Transaction, TransactionBuilder, TransactionId, TransactionResult,
    TransactionState,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::StoreConfig;
    pub use crate::error::{TransactionError, WithdrawReason};
    pub use crate::notify::ChangeNotification;
    pub use crate::store::{ContainerPhase, InventoryStore};
    pub use crate::transaction::{CancelToken, Transaction, TransactionBuilder, TransactionResult};
    pub use gridbag_container::{ContainerSettings, Operation, PlacementRequest};
}
