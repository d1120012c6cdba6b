//! Transaction failures

use crate::transaction::TransactionId;
use gridbag_core::{InventoryError, ItemId};
use thiserror::Error;

/// Why a queued transaction left the queue without running
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WithdrawReason {
    #[error("cancelled while queued")]
    Cancelled,
    #[error("item {0} no longer exists")]
    ItemVanished(ItemId),
    #[error("the containers involved kept changing")]
    Contention,
}

/// A transaction that did not commit. Nothing it touched was changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// Validation failed
    #[error("transaction {id} rejected: {error}")]
    Rejected {
        id: TransactionId,
        error: InventoryError,
    },
    /// Left the queue before validating
    #[error("transaction {id} withdrawn: {reason}")]
    Withdrawn {
        id: TransactionId,
        reason: WithdrawReason,
    },
}

impl TransactionError {
    pub fn id(&self) -> TransactionId {
        match self {
            TransactionError::Rejected { id, .. } | TransactionError::Withdrawn { id, .. } => *id,
        }
    }

    /// The domain error behind a rejection
    pub fn inventory_error(&self) -> Option<&InventoryError> {
        match self {
            TransactionError::Rejected { error, .. } => Some(error),
            TransactionError::Withdrawn { .. } => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, TransactionError::Rejected { .. })
    }

    pub fn is_withdrawn(&self) -> bool {
        matches!(self, TransactionError::Withdrawn { .. })
    }
}

/// Result type for store transactions
pub type TransactionOutcome<T> = core::result::Result<T, TransactionError>;
