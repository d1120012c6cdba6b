//! Recipes

use gridbag_core::DefinitionKey;
use gridbag_query::ItemFilter;

/// Items a recipe consumes: `count` units from stacks matching `filter`
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub filter: ItemFilter,
    pub count: u32,
}

impl Ingredient {
    pub fn new(filter: ItemFilter, count: u32) -> Self {
        Self { filter, count }
    }

    /// `count` units of one definition
    pub fn definition(key: impl Into<DefinitionKey>, count: u32) -> Self {
        Self::new(ItemFilter::definition(key), count)
    }

    /// `count` units of anything carrying `tag` (or a child tag)
    pub fn tagged(tag: &str, count: u32) -> Self {
        Self::new(ItemFilter::tag(tag), count)
    }
}

/// Items a recipe produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeOutput {
    pub definition: DefinitionKey,
    pub count: u32,
}

/// A crafting recipe
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub key: String,
    pub ingredients: Vec<Ingredient>,
    pub outputs: Vec<RecipeOutput>,
}

impl Recipe {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ingredients: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    pub fn with_output(mut self, definition: impl Into<DefinitionKey>, count: u32) -> Self {
        self.outputs.push(RecipeOutput {
            definition: definition.into(),
            count,
        });
        self
    }
}
