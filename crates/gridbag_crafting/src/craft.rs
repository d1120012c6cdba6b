//! Atomic crafting
//!
//! A craft is one batch: consume the allocated ingredient stacks, then add
//! every output to the output container. Consumption runs first so freed
//! cells can hold the outputs. If any step fails, nothing changes.

use crate::check::{check_recipe, RecipeCheck};
use crate::error::{CraftError, Result};
use crate::recipe::Recipe;
use gridbag_container::{ContainerArena, Operation, Outcome};
use gridbag_core::ContainerId;
use gridbag_query::{ItemSource, QueryScope};
use gridbag_sync::{InventoryStore, Transaction, TransactionResult};

fn validate(recipe: &Recipe) -> Result<()> {
    let invalid = |reason: &str| CraftError::InvalidRecipe {
        recipe: recipe.key.clone(),
        reason: reason.to_string(),
    };
    if recipe.ingredients.is_empty() {
        return Err(invalid("no ingredients"));
    }
    if recipe.outputs.is_empty() {
        return Err(invalid("no outputs"));
    }
    if recipe.ingredients.iter().any(|i| i.count == 0) || recipe.outputs.iter().any(|o| o.count == 0) {
        return Err(invalid("zero count"));
    }
    Ok(())
}

/// Check `recipe` against `scope` and turn the allocation into operations
pub fn plan_craft<S: ItemSource + ?Sized>(
    recipe: &Recipe,
    source: &S,
    scope: &QueryScope,
    output: ContainerId,
) -> Result<Vec<Operation>> {
    validate(recipe)?;
    let check = check_recipe(recipe, source, scope);
    if !check.is_craftable() {
        return Err(missing(check));
    }

    let consume = check
        .allocation
        .iter()
        .map(|(&item, &amount)| Operation::consume(item, amount));
    let produce = recipe
        .outputs
        .iter()
        .map(|o| Operation::add(output, o.definition.clone(), o.count));
    Ok(consume.chain(produce).collect())
}

fn missing(check: RecipeCheck) -> CraftError {
    log::debug!(
        "Recipe '{}' is short {} unit(s)",
        check.recipe,
        check.total_missing()
    );
    CraftError::MissingIngredients {
        shortfalls: check.shortfalls(),
        recipe: check.recipe,
    }
}

/// Craft through the store as a single transaction.
///
/// Ingredients are counted from a query snapshot. If another transaction
/// consumes them before this one validates, the craft is rejected as a whole.
pub fn craft(
    store: &InventoryStore,
    recipe: &Recipe,
    scope: &QueryScope,
    output: ContainerId,
) -> Result<TransactionResult> {
    let ops = plan_craft(recipe, store, scope, output)?;
    let tx = Transaction::with_description(format!("craft {}", recipe.key)).with_ops(ops);
    let result = store.execute(tx)?;
    log::debug!("Crafted '{}' into container {}", recipe.key, output);
    Ok(result)
}

/// Craft directly on an arena; all-or-nothing like `ContainerArena::apply_all`
pub fn craft_in_arena(
    arena: &mut ContainerArena,
    recipe: &Recipe,
    scope: &QueryScope,
    output: ContainerId,
) -> Result<Outcome> {
    let ops = plan_craft(recipe, arena, scope, output)?;
    Ok(arena.apply_all(&ops)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::Ingredient;
    use gridbag_catalog::{ItemCatalog, ItemDefinition};
    use gridbag_container::{ContainerSettings, PlacementRequest};
    use gridbag_core::InventoryError;
    use std::sync::Arc;

    fn arena() -> (ContainerArena, ContainerId) {
        let mut catalog = ItemCatalog::new();
        for definition in [
            ItemDefinition::new("herb", "Herb").with_tag("Item.Reagent.Herb").with_max_stack(10),
            ItemDefinition::new("salt", "Salt").with_tag("Item.Reagent.Mineral").with_max_stack(10),
            ItemDefinition::new("potion", "Potion").with_max_stack(5),
            ItemDefinition::new("crate", "Crate").with_size(2, 2),
        ] {
            catalog.register(definition).unwrap();
        }
        let mut arena = ContainerArena::new(Arc::new(catalog));
        let c = arena.create_container(ContainerSettings::grid(2, 2)).unwrap();
        (arena, c)
    }

    fn salve() -> Recipe {
        Recipe::new("salve")
            .with_ingredient(Ingredient::definition("herb", 3))
            .with_ingredient(Ingredient::tagged("Item.Reagent", 1))
            .with_output("potion", 1)
    }

    #[test]
    fn test_plan_consumes_then_adds() {
        let (mut arena, c) = arena();
        let herbs = arena.add_item(c, "herb", 3, PlacementRequest::Auto).unwrap().created[0];
        let salt = arena.add_item(c, "salt", 2, PlacementRequest::Auto).unwrap().created[0];

        let ops = plan_craft(&salve(), &arena, &QueryScope::Container(c), c).unwrap();
        assert_eq!(
            ops,
            vec![
                Operation::consume(herbs, 3),
                Operation::consume(salt, 1),
                Operation::add(c, "potion", 1),
            ]
        );
    }

    #[test]
    fn test_broad_ingredient_takes_leftovers() {
        let (mut arena, c) = arena();
        let herbs = arena.add_item(c, "herb", 4, PlacementRequest::Auto).unwrap().created[0];

        // The fourth herb satisfies the reagent slot
        craft_in_arena(&mut arena, &salve(), &QueryScope::Container(c), c).unwrap();
        assert!(arena.item(herbs).is_err());
        let potions = arena.container(c).unwrap().items().iter().filter(|i| i.key().as_str() == "potion").count();
        assert_eq!(potions, 1);
    }

    #[test]
    fn test_craft_without_room_changes_nothing() {
        let (mut arena, c) = arena();
        let herbs = arena.add_item(c, "herb", 4, PlacementRequest::Auto).unwrap().created[0];
        let big = Recipe::new("big")
            .with_ingredient(Ingredient::definition("herb", 1))
            .with_output("crate", 1);

        let err = craft_in_arena(&mut arena, &big, &QueryScope::Container(c), c).unwrap_err();
        assert!(matches!(err, CraftError::Inventory(InventoryError::NoFreeSlot { .. })));
        assert_eq!(arena.item(herbs).unwrap().count, 4);
    }

    #[test]
    fn test_malformed_recipes() {
        let (arena, c) = arena();
        let scope = QueryScope::Container(c);
        for recipe in [
            Recipe::new("empty").with_output("potion", 1),
            Recipe::new("pointless").with_ingredient(Ingredient::definition("herb", 1)),
            Recipe::new("zero")
                .with_ingredient(Ingredient::definition("herb", 0))
                .with_output("potion", 1),
        ] {
            assert!(matches!(
                plan_craft(&recipe, &arena, &scope, c),
                Err(CraftError::InvalidRecipe { .. })
            ));
        }
    }
}
