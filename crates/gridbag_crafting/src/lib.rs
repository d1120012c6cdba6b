//! # gridbag_crafting - Recipes over inventories
//!
//! - [`check_recipe`] counts ingredients in a query scope and reports what
//!   is missing per ingredient
//! - [`craft`] consumes the ingredients and adds the outputs in one
//!   transaction, so a craft either happens completely or not at all
//!
//! ```ignore
//! use gridbag_crafting::prelude::*;
//!
//! let bandage = Recipe::new("bandage")
//!     .with_ingredient(Ingredient::definition("cloth", 2))
//!     .with_output("bandage", 1);
//! craft(&store, &bandage, &QueryScope::Recursive(backpack), backpack)?;
//! ```

pub mod check;
pub mod craft;
pub mod error;
pub mod recipe;

pub use check::{check_recipe, RecipeCheck, Requirement};
pub use craft::{craft, craft_in_arena, plan_craft};
pub use error::{CraftError, Result};
pub use recipe::{Ingredient, Recipe, RecipeOutput};

pub mod prelude {
    pub use crate::check::{check_recipe, RecipeCheck};
    pub use crate::craft::craft;
    pub use crate::error::CraftError;
    pub use crate::recipe::{Ingredient, Recipe};
    pub use gridbag_query::QueryScope;
}
