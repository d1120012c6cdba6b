//! Save/load errors

use gridbag_core::InventoryError;
use thiserror::Error;

/// Persistence errors
#[derive(Debug, Error)]
pub enum PersistError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    /// Written by a newer version than this build understands
    #[error("Version mismatch: save version {found}, supported up to {supported}")]
    VersionMismatch { found: u32, supported: u32 },
    /// Slot not found
    #[error("Save slot not found: {0}")]
    SlotNotFound(String),
    /// Export content failed validation
    #[error("Invalid inventory data: {0}")]
    Invalid(#[from] InventoryError),
}

/// Result type alias
pub type Result<T> = core::result::Result<T, PersistError>;
