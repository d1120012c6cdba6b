//! Crafting errors

use crate::check::Requirement;
use gridbag_core::InventoryError;
use gridbag_sync::TransactionError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CraftError {
    /// The recipe has no ingredients, no outputs, or a zero count
    #[error("recipe '{recipe}' is malformed: {reason}")]
    InvalidRecipe { recipe: String, reason: String },

    /// Not enough matching items in scope
    #[error("recipe '{recipe}' is missing ingredients")]
    MissingIngredients {
        recipe: String,
        shortfalls: Vec<Requirement>,
    },

    /// The craft transaction did not commit (no room for outputs, or the
    /// ingredients changed after they were counted)
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Applying the craft to an arena failed
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

pub type Result<T> = core::result::Result<T, CraftError>;
