use std::collections::{BTreeMap, HashSet};

use crate::model::{MatchOutcome, MatchedDepletion, Recipe, RecipeType, SalesAggregate};
use crate::normalize::normalize;

/// Cross-reference aggregated sales against the menu-item catalog.
///
/// Lookup is by value: every recipe whose normalized name is a sales key
/// matches, so two recipes sharing a key both receive the same quantity.
/// Recipes without sales are simply absent from the result.
pub fn match_recipes(recipes: &[Recipe], sales: &SalesAggregate) -> MatchOutcome {
    let menu: Vec<&Recipe> = recipes
        .iter()
        .filter(|r| r.recipe_type == RecipeType::MenuItem)
        .collect();

    let mut matched = Vec::new();
    let mut hits: BTreeMap<String, usize> = BTreeMap::new();
    let mut known: HashSet<String> = HashSet::with_capacity(menu.len());

    for recipe in &menu {
        let key = normalize(&recipe.name);
        if let Some(quantity) = sales.get(&key) {
            if quantity > 0.0 {
                matched.push(MatchedDepletion {
                    recipe: (*recipe).clone(),
                    quantity,
                });
                *hits.entry(key.clone()).or_insert(0) += 1;
            }
        }
        known.insert(key);
    }

    let unmatched: Vec<String> = sales
        .keys()
        .filter(|k| !known.contains(*k))
        .map(String::from)
        .collect();

    let collisions: Vec<String> = hits
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(k, _)| k)
        .collect();
    for key in &collisions {
        log::warn!("several menu items normalize to \"{key}\"; each will be depleted by the same quantity");
    }

    MatchOutcome {
        matched,
        unmatched,
        collisions,
    }
}
