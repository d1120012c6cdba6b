//! Domain errors
//!
//! Every mutation-path error is recoverable: the operation is rejected and the
//! touched containers keep their previous state. Only [`InventoryError::Corrupted`]
//! is fatal for the container it names.

use crate::id::{ContainerId, DefinitionKey, ItemId};
use thiserror::Error;

/// Errors produced by the inventory engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Zero-sized footprint or grid
    #[error("invalid footprint {width}x{height}")]
    InvalidFootprint { width: u32, height: u32 },

    /// Grid has no valid placement for the item
    #[error("no free slot in container {container}")]
    NoFreeSlot { container: ContainerId },

    /// Stack would exceed its definition's max stack size
    #[error("stack limit of {max} exceeded for item {item}")]
    StackLimitExceeded { item: ItemId, max: u32 },

    /// Nesting would make a container contain itself
    #[error("container {container} cannot be nested inside {target}")]
    CyclicContainment {
        container: ContainerId,
        target: ContainerId,
    },

    /// Container is mid-transaction (only surfaced by non-blocking submission)
    #[error("container {0} is locked by another transaction")]
    ContainerLocked(ContainerId),

    /// Unknown item definition key
    #[error("item definition not found: {0}")]
    DefinitionNotFound(DefinitionKey),

    /// Item definition registered twice
    #[error("item definition already registered: {0}")]
    DuplicateDefinition(DefinitionKey),

    /// Unknown container
    #[error("container not found: {0}")]
    ContainerNotFound(ContainerId),

    /// Unknown item, or item not in the expected container
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// Split/consume/add amount out of range
    #[error("invalid amount {requested} (available {available})")]
    InvalidAmount { requested: u32, available: u32 },

    /// Rotation requested for an item that cannot rotate
    #[error("item definition {0} cannot be rotated")]
    RotationNotAllowed(DefinitionKey),

    /// Container compatibility rules refuse the item
    #[error("container {container} does not accept {definition}")]
    Incompatible {
        container: ContainerId,
        definition: DefinitionKey,
    },

    /// Stacks differ in definition or instance data
    #[error("stacks {source_item} and {target_item} cannot be merged")]
    StacksIncompatible { source_item: ItemId, target_item: ItemId },

    /// Container still holds items
    #[error("container {0} is not empty")]
    ContainerNotEmpty(ContainerId),

    /// Container is owned by an item and cannot be disposed directly
    #[error("container {0} is nested inside an item")]
    NotRootContainer(ContainerId),

    /// Occupancy grid disagrees with the item list
    #[error("container {container} is corrupted: {reason}")]
    Corrupted {
        container: ContainerId,
        reason: String,
    },
}

impl InventoryError {
    /// Is this error fatal for the container it concerns?
    pub fn is_fatal(&self) -> bool {
        matches!(self, InventoryError::Corrupted { .. })
    }
}

/// Result type alias
pub type Result<T> = core::result::Result<T, InventoryError>;
