//! Transactions - ordered batches of operations
//!
//! A transaction is applied all-or-nothing against the containers it touches.
//! It may be withdrawn while queued (cancel token, vanished item) but once
//! validation starts it either commits or is rejected.

use core::fmt;
use gridbag_container::{Change, Operation};
use gridbag_core::{ContainerId, ItemId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Create a new unique transaction ID
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx{}", self.0)
    }
}

/// The state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    /// Operations are still being added
    Building,
    /// Waiting for its container gates
    Queued,
    /// Holding its gates, checking operations against working copies
    Validating,
    /// Writing results back and notifying observers
    Committing,
    /// Applied
    Committed,
    /// Validation failed; nothing changed
    Rejected,
    /// Left the queue before validating; nothing changed
    Withdrawn,
}

impl TransactionState {
    /// Has the transaction finished, one way or another?
    pub fn is_final(self) -> bool {
        matches!(
            self,
            TransactionState::Committed | TransactionState::Rejected | TransactionState::Withdrawn
        )
    }
}

/// Shared flag for withdrawing a queued transaction
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request withdrawal. Has no effect once validation has started.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A batch of operations applied atomically
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,
    /// Current state
    pub state: TransactionState,
    /// Operations in application order
    pub ops: Vec<Operation>,
    /// Human-readable description for debugging
    pub description: Option<String>,
    cancel: CancelToken,
}

impl Transaction {
    /// Create a new empty transaction
    pub fn new() -> Self {
        Self {
            id: TransactionId::new(),
            state: TransactionState::Building,
            ops: Vec::new(),
            description: None,
            cancel: CancelToken::new(),
        }
    }

    /// Create a transaction with a description
    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::new()
        }
    }

    /// Single-operation transaction
    pub fn single(op: Operation) -> Self {
        Self::new().with_op(op)
    }

    /// Add an operation
    pub fn add_op(&mut self, op: Operation) {
        debug_assert_eq!(self.state, TransactionState::Building);
        self.ops.push(op);
    }

    /// Add an operation (builder pattern)
    pub fn with_op(mut self, op: Operation) -> Self {
        self.add_op(op);
        self
    }

    /// Add multiple operations
    pub fn with_ops(mut self, ops: impl IntoIterator<Item = Operation>) -> Self {
        for op in ops {
            self.add_op(op);
        }
        self
    }

    /// Use an existing cancel token
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that withdraws this transaction while it is queued
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Mark the transaction as ready for execution
    pub fn submit(&mut self) {
        debug_assert_eq!(self.state, TransactionState::Building);
        self.state = TransactionState::Queued;
    }

    /// Check if the transaction is empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Get the number of operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Containers named directly by the operations
    pub fn named_containers(&self) -> Vec<ContainerId> {
        let mut containers: Vec<_> = self.ops.iter().flat_map(Operation::containers).collect();
        containers.sort();
        containers.dedup();
        containers
    }

    /// Existing items the operations refer to
    pub fn referenced_items(&self) -> Vec<ItemId> {
        let mut items: Vec<_> = self.ops.iter().flat_map(Operation::items).collect();
        items.sort();
        items.dedup();
        items
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for transactions with a fluent API
pub struct TransactionBuilder {
    transaction: Transaction,
}

impl TransactionBuilder {
    /// Start building a new transaction
    pub fn new() -> Self {
        Self {
            transaction: Transaction::new(),
        }
    }

    /// Set the description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.transaction.description = Some(desc.into());
        self
    }

    /// Add an operation
    pub fn op(mut self, op: Operation) -> Self {
        self.transaction.add_op(op);
        self
    }

    /// Add multiple operations
    pub fn ops(mut self, ops: impl IntoIterator<Item = Operation>) -> Self {
        for op in ops {
            self.transaction.add_op(op);
        }
        self
    }

    /// Attach a cancel token
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.transaction.cancel = token;
        self
    }

    /// Build and submit the transaction
    pub fn build(mut self) -> Transaction {
        self.transaction.submit();
        self.transaction
    }

    /// Build without submitting (stays in Building state)
    pub fn build_draft(self) -> Transaction {
        self.transaction
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a committed transaction
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionResult {
    /// The transaction that was applied
    pub id: TransactionId,
    /// Containers whose state changed
    pub containers: Vec<ContainerId>,
    /// Changes in application order
    pub changes: Vec<Change>,
    /// Instances created by the transaction
    pub created: Vec<ItemId>,
}

impl TransactionResult {
    /// Result of a transaction with no operations
    pub fn empty(id: TransactionId) -> Self {
        Self {
            id,
            containers: Vec::new(),
            changes: Vec::new(),
            created: Vec::new(),
        }
    }

    /// First created instance (new stack, split half)
    pub fn first_created(&self) -> Option<ItemId> {
        self.created.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_builder() {
        let item = ItemId::from_raw(7);
        let c = ContainerId::from_raw(1);
        let tx = TransactionBuilder::new()
            .description("restock")
            .op(Operation::add(c, "ammo", 10))
            .op(Operation::consume(item, 1))
            .op(Operation::merge(item, ItemId::from_raw(9)))
            .build();

        assert_eq!(tx.state, TransactionState::Queued);
        assert_eq!(tx.len(), 3);
        assert_eq!(tx.named_containers(), vec![c]);
        assert_eq!(tx.referenced_items(), vec![item, ItemId::from_raw(9)]);
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let tx = Transaction::new().with_cancel_token(token.clone());
        assert!(!tx.is_cancelled());
        token.cancel();
        assert!(tx.is_cancelled());
        assert!(tx.cancel_token().is_cancelled());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = TransactionId::new();
        let b = TransactionId::new();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }
}
