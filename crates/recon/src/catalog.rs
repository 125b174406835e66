//! Product and recipe maintenance: checked input shapes, and the two
//! multi-call flows (compose a recipe from ingredients, edit ingredient
//! quantities) driven through a backend trait.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{BackendFailure, CompositionError, ValidationError};
use crate::model::{
    IngredientKind, Product, Recipe, RecipeDetail, RecipeId, RecipeIngredientId, RecipeType, Unit,
};

pub const CREATE_RECIPE_FALLBACK_MESSAGE: &str = "Failed to create recipe";
pub const UPDATE_INGREDIENTS_FALLBACK_MESSAGE: &str = "Failed to update ingredients";

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// A product to create. Stock and cost are required, as on the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub unit: Unit,
    pub stock_quantity: f64,
    pub unit_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

impl NewProduct {
    /// Trim text fields and reject blank names and negative amounts. Blank
    /// category or barcode become absent.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::MissingProductName);
        }
        non_negative(self.stock_quantity, "Stock quantity")?;
        non_negative(self.unit_cost, "Unit cost")?;
        Ok(Self {
            name,
            category: trimmed_or_none(self.category),
            barcode: trimmed_or_none(self.barcode),
            ..self
        })
    }
}

/// Fields to change on an existing product. Stock is not editable here;
/// it moves only through depletion and replenishment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<f64>,
    /// An empty string clears the category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// An empty string clears the barcode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validated(self) -> Result<Self, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        let name = match self.name {
            Some(n) if n.trim().is_empty() => return Err(ValidationError::MissingProductName),
            other => other.map(|n| n.trim().to_string()),
        };
        if let Some(cost) = self.unit_cost {
            non_negative(cost, "Unit cost")?;
        }
        Ok(Self {
            name,
            category: self.category.map(|c| c.trim().to_string()),
            barcode: self.barcode.map(|b| b.trim().to_string()),
            ..self
        })
    }
}

fn non_negative(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NegativeAmount(field))
    }
}

fn trimmed_or_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

/// `product:ID` or `recipe:ID`, where a recipe ingredient is a prepped item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IngredientRef {
    pub kind: IngredientKind,
    pub id: i64,
}

impl std::str::FromStr for IngredientRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expected = || format!("expected product:ID or recipe:ID, got \"{s}\"");
        let (kind, id) = s.trim().split_once(':').ok_or_else(expected)?;
        let kind = match kind.trim().to_ascii_lowercase().as_str() {
            "product" | "p" => IngredientKind::Product,
            "recipe" | "prepped" | "r" => IngredientKind::Recipe,
            _ => return Err(expected()),
        };
        let id = id.trim().parse().map_err(|_| expected())?;
        Ok(Self { kind, id })
    }
}

impl std::fmt::Display for IngredientRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngredientLine {
    pub ingredient: IngredientRef,
    pub quantity: f64,
}

/// A recipe to create, ingredients in the order they will be added.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub name: String,
    pub recipe_type: RecipeType,
    pub ingredients: Vec<IngredientLine>,
}

/// An ingredient line checked against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedIngredient {
    pub kind: IngredientKind,
    pub id: i64,
    pub name: String,
    pub quantity: f64,
}

/// A checked `NewRecipe`, ready to send.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipePlan {
    pub name: String,
    pub recipe_type: RecipeType,
    pub ingredients: Vec<ResolvedIngredient>,
}

/// Check a new recipe against the product list and the prepped items.
///
/// Prepped items may only be made of products. Menu items may use both.
pub fn validate_new_recipe(
    draft: &NewRecipe,
    products: &[Product],
    prepped: &[Recipe],
) -> Result<RecipePlan, ValidationError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingRecipeName);
    }
    if draft.ingredients.is_empty() {
        return Err(ValidationError::NoIngredientSelected);
    }
    if draft
        .ingredients
        .iter()
        .any(|l| !(l.quantity.is_finite() && l.quantity > 0.0))
    {
        return Err(ValidationError::MissingIngredientQuantity);
    }

    let mut seen = HashSet::new();
    let mut ingredients = Vec::with_capacity(draft.ingredients.len());
    for line in &draft.ingredients {
        let IngredientRef { kind, id } = line.ingredient;
        let name = match kind {
            IngredientKind::Product => products
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.name.clone())
                .ok_or(ValidationError::UnknownProduct(id))?,
            IngredientKind::Recipe => {
                if draft.recipe_type == RecipeType::PreppedItem {
                    return Err(ValidationError::PreppedInPreppedItem);
                }
                prepped
                    .iter()
                    .find(|r| r.id == id && r.recipe_type == RecipeType::PreppedItem)
                    .map(|r| r.name.clone())
                    .ok_or(ValidationError::UnknownPreppedItem(id))?
            }
        };
        if !seen.insert(line.ingredient) {
            return Err(ValidationError::DuplicateIngredient(name));
        }
        ingredients.push(ResolvedIngredient {
            kind,
            id,
            name,
            quantity: line.quantity,
        });
    }

    Ok(RecipePlan {
        name: name.to_string(),
        recipe_type: draft.recipe_type,
        ingredients,
    })
}

/// Rename or retype an existing recipe. Ingredient lines are edited
/// separately through [`update_ingredient_quantities`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_type: Option<RecipeType>,
}

impl RecipePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.recipe_type.is_none()
    }

    pub fn validated(self) -> Result<Self, ValidationError> {
        match self.name {
            Some(n) if n.trim().is_empty() => Err(ValidationError::MissingRecipeName),
            name => Ok(Self {
                name: name.map(|n| n.trim().to_string()),
                ..self
            }),
        }
    }
}

/// A new quantity for one existing ingredient line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientEdit {
    pub line: RecipeIngredientId,
    pub name: String,
    pub quantity: f64,
}

/// Check quantity edits against the recipe's current ingredient lines.
pub fn validate_quantity_edits(
    detail: &RecipeDetail,
    edits: &[(RecipeIngredientId, f64)],
) -> Result<Vec<IngredientEdit>, ValidationError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(edits.len());
    for &(line, quantity) in edits {
        let current = detail
            .recipe_ingredients
            .iter()
            .find(|ri| ri.id == line)
            .ok_or(ValidationError::UnknownIngredientLine {
                recipe: detail.recipe.id,
                line,
            })?;
        if !(quantity.is_finite() && quantity > 0.0) {
            return Err(ValidationError::MissingIngredientQuantity);
        }
        if !seen.insert(line) {
            return Err(ValidationError::DuplicateIngredient(current.display_name().to_string()));
        }
        out.push(IngredientEdit {
            line,
            name: current.display_name().to_string(),
            quantity,
        });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Backend flows
// ---------------------------------------------------------------------------

/// Recipe mutations that span several calls. Implemented by the REST
/// client and by test fakes.
pub trait CatalogBackend {
    fn create_recipe(&self, name: &str, recipe_type: RecipeType) -> Result<Recipe, BackendFailure>;

    fn add_ingredient(
        &self,
        recipe_id: RecipeId,
        kind: IngredientKind,
        ingredient_id: i64,
        quantity: f64,
    ) -> Result<(), BackendFailure>;

    fn set_ingredient_quantity(
        &self,
        recipe_id: RecipeId,
        line: RecipeIngredientId,
        quantity: f64,
    ) -> Result<(), BackendFailure>;
}

impl<B: CatalogBackend + ?Sized> CatalogBackend for &B {
    fn create_recipe(&self, name: &str, recipe_type: RecipeType) -> Result<Recipe, BackendFailure> {
        (**self).create_recipe(name, recipe_type)
    }

    fn add_ingredient(
        &self,
        recipe_id: RecipeId,
        kind: IngredientKind,
        ingredient_id: i64,
        quantity: f64,
    ) -> Result<(), BackendFailure> {
        (**self).add_ingredient(recipe_id, kind, ingredient_id, quantity)
    }

    fn set_ingredient_quantity(
        &self,
        recipe_id: RecipeId,
        line: RecipeIngredientId,
        quantity: f64,
    ) -> Result<(), BackendFailure> {
        (**self).set_ingredient_quantity(recipe_id, line, quantity)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComposedRecipe {
    pub recipe: Recipe,
    pub ingredients: Vec<ResolvedIngredient>,
}

/// Validate, create the recipe, then add its ingredients one by one.
///
/// Stops at the first failed ingredient. The recipe and the ingredients
/// added before it stay on the server and are named in the error.
pub fn create_recipe<B: CatalogBackend + ?Sized>(
    draft: &NewRecipe,
    products: &[Product],
    prepped: &[Recipe],
    backend: &B,
) -> Result<ComposedRecipe, CompositionError> {
    let plan = validate_new_recipe(draft, products, prepped)?;

    let recipe = backend
        .create_recipe(&plan.name, plan.recipe_type)
        .map_err(|failure| CompositionError::RecipeRejected {
            status: failure.status,
            message: failure.message_or(CREATE_RECIPE_FALLBACK_MESSAGE),
        })?;
    log::debug!("created recipe {} ({})", recipe.id, recipe.name);

    let mut added: Vec<ResolvedIngredient> = Vec::with_capacity(plan.ingredients.len());
    for ingredient in plan.ingredients {
        if let Err(failure) =
            backend.add_ingredient(recipe.id, ingredient.kind, ingredient.id, ingredient.quantity)
        {
            let message = failure.message_or(CREATE_RECIPE_FALLBACK_MESSAGE);
            log::warn!(
                "recipe {} left with {} of its ingredients: {}",
                recipe.name,
                added.len(),
                message
            );
            return Err(CompositionError::IngredientRejected {
                recipe,
                failed: ingredient,
                status: failure.status,
                message,
                added,
            });
        }
        added.push(ingredient);
    }

    log::info!("created recipe {} with {} ingredient(s)", recipe.name, added.len());
    Ok(ComposedRecipe {
        recipe,
        ingredients: added,
    })
}

/// Validate, then apply each quantity edit in the order given. Fail-fast.
pub fn update_ingredient_quantities<B: CatalogBackend + ?Sized>(
    detail: &RecipeDetail,
    edits: &[(RecipeIngredientId, f64)],
    backend: &B,
) -> Result<Vec<IngredientEdit>, CompositionError> {
    let edits = validate_quantity_edits(detail, edits)?;

    let mut updated = Vec::with_capacity(edits.len());
    for edit in &edits {
        if let Err(failure) = backend.set_ingredient_quantity(detail.recipe.id, edit.line, edit.quantity) {
            return Err(CompositionError::QuantityRejected {
                failed: edit.line,
                status: failure.status,
                message: failure.message_or(UPDATE_INGREDIENTS_FALLBACK_MESSAGE),
                updated,
            });
        }
        updated.push(edit.line);
    }
    Ok(edits)
}
