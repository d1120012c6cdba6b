//! Ingredient counting and stack allocation

use crate::recipe::Recipe;
use gridbag_core::ItemId;
use gridbag_query::{ItemQuery, ItemSource, QueryOrder, QueryScope};
use std::collections::{BTreeMap, HashMap};

/// How one ingredient fares against the items in scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    /// Index into `Recipe::ingredients`
    pub ingredient: usize,
    pub required: u32,
    /// Matching units left after earlier ingredients took their share
    pub available: u64,
}

impl Requirement {
    pub fn is_met(&self) -> bool {
        self.available >= u64::from(self.required)
    }

    /// Units still needed
    pub fn missing(&self) -> u64 {
        u64::from(self.required).saturating_sub(self.available)
    }
}

/// Result of checking a recipe against a scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeCheck {
    pub recipe: String,
    /// One entry per ingredient, in recipe order
    pub requirements: Vec<Requirement>,
    /// Units to take from each stack, ascending by item id
    pub allocation: BTreeMap<ItemId, u32>,
}

impl RecipeCheck {
    pub fn is_craftable(&self) -> bool {
        self.requirements.iter().all(Requirement::is_met)
    }

    /// Ingredients that are not covered
    pub fn shortfalls(&self) -> Vec<Requirement> {
        self.requirements.iter().filter(|r| !r.is_met()).copied().collect()
    }

    /// Total units missing across every ingredient
    pub fn total_missing(&self) -> u64 {
        self.requirements.iter().map(Requirement::missing).sum()
    }
}

/// Count the ingredients of `recipe` available in `scope`.
///
/// Ingredients matching the fewest units are served first, so a broad
/// ingredient ("any reagent") does not take the only stack a narrow one
/// ("herb") could use. Within an ingredient, stacks are drawn oldest first.
/// A stack is never counted twice. Requirements are reported in recipe order.
pub fn check_recipe<S: ItemSource + ?Sized>(
    recipe: &Recipe,
    source: &S,
    scope: &QueryScope,
) -> RecipeCheck {
    let items = ItemQuery::new(scope.clone())
        .order(QueryOrder::Insertion)
        .run(source);

    let matching: Vec<u64> = recipe
        .ingredients
        .iter()
        .map(|ingredient| {
            items
                .iter()
                .filter(|i| ingredient.filter.matches(i))
                .map(|i| u64::from(i.count))
                .sum()
        })
        .collect();
    let mut order: Vec<usize> = (0..recipe.ingredients.len()).collect();
    order.sort_by_key(|&index| (matching[index], index));

    let mut left: HashMap<ItemId, u32> = items.iter().map(|i| (i.id, i.count)).collect();
    let mut allocation = BTreeMap::new();
    let mut requirements = Vec::with_capacity(order.len());

    for index in order {
        let ingredient = &recipe.ingredients[index];
        let mut needed = ingredient.count;
        let mut available = 0u64;
        for item in items.iter().filter(|i| ingredient.filter.matches(i)) {
            let Some(remaining) = left.get_mut(&item.id) else {
                continue;
            };
            available += u64::from(*remaining);
            let taken = needed.min(*remaining);
            if taken > 0 {
                *remaining -= taken;
                needed -= taken;
                *allocation.entry(item.id).or_insert(0) += taken;
            }
        }
        requirements.push(Requirement {
            ingredient: index,
            required: ingredient.count,
            available,
        });
    }
    requirements.sort_by_key(|r| r.ingredient);

    RecipeCheck {
        recipe: recipe.key.clone(),
        requirements,
        allocation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::Ingredient;
    use gridbag_catalog::{ItemCatalog, ItemDefinition};
    use gridbag_container::{ContainerArena, ContainerSettings, PlacementRequest};
    use std::sync::Arc;

    fn arena() -> (ContainerArena, gridbag_core::ContainerId) {
        let mut catalog = ItemCatalog::new();
        for definition in [
            ItemDefinition::new("herb", "Herb").with_tag("Item.Reagent.Herb").with_max_stack(10),
            ItemDefinition::new("salt", "Salt").with_tag("Item.Reagent.Mineral").with_max_stack(10),
        ] {
            catalog.register(definition).unwrap();
        }
        let mut arena = ContainerArena::new(Arc::new(catalog));
        let c = arena.create_container(ContainerSettings::grid(3, 3)).unwrap();
        (arena, c)
    }

    #[test]
    fn test_broad_ingredient_listed_first_leaves_narrow_stacks() {
        let (mut arena, c) = arena();
        // Herbs are older, so a recipe-order walk would hand them to the broad slot
        let herbs = arena.add_item(c, "herb", 2, PlacementRequest::Auto).unwrap().created[0];
        let salt = arena.add_item(c, "salt", 2, PlacementRequest::Auto).unwrap().created[0];
        let recipe = Recipe::new("tonic")
            .with_ingredient(Ingredient::tagged("Item.Reagent", 2))
            .with_ingredient(Ingredient::definition("herb", 2))
            .with_output("herb", 1);

        let check = check_recipe(&recipe, &arena, &QueryScope::Container(c));
        assert!(check.is_craftable());
        assert_eq!(check.allocation.get(&herbs), Some(&2));
        assert_eq!(check.allocation.get(&salt), Some(&2));
        let indices: Vec<_> = check.requirements.iter().map(|r| r.ingredient).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_shortfall_is_reported_per_ingredient() {
        let (mut arena, c) = arena();
        arena.add_item(c, "herb", 3, PlacementRequest::Auto).unwrap();
        let recipe = Recipe::new("tonic")
            .with_ingredient(Ingredient::tagged("Item.Reagent", 2))
            .with_ingredient(Ingredient::definition("herb", 2))
            .with_output("herb", 1);

        // Both ingredients match the same three herbs; recipe order breaks the tie
        let check = check_recipe(&recipe, &arena, &QueryScope::Container(c));
        assert_eq!(
            check.shortfalls(),
            vec![Requirement {
                ingredient: 1,
                required: 2,
                available: 1
            }]
        );
        assert_eq!(check.total_missing(), 1);
    }
}
