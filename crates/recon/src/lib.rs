//! `galley-recon`: sales-report reconciliation engine.
//!
//! Pure engine crate: receives parsed CSV rows and the recipe catalog, returns
//! matched/unmatched sales, keeps the editable depletion staging, and drives
//! sequential submission through a backend trait. Product and recipe edits
//! are checked here too. No CLI or network code.

pub mod aggregate;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod replenish;
pub mod staging;
pub mod submit;

pub use aggregate::{aggregate, aggregate_with_stats, AggregateStats};
pub use catalog::{
    create_recipe, update_ingredient_quantities, validate_new_recipe, validate_quantity_edits,
    CatalogBackend, ComposedRecipe, IngredientEdit, IngredientLine, IngredientRef, NewProduct,
    NewRecipe, ProductPatch, RecipePatch, RecipePlan, ResolvedIngredient,
};
pub use engine::{parse_sales_csv, read_sales_csv, reconcile, SalesUpload};
pub use error::{BackendFailure, CompositionError, ReconError, SubmitError, ValidationError};
pub use matcher::match_recipes;
pub use model::{
    CsvRow, IngredientKind, IngredientSummary, MatchOutcome, MatchedDepletion, Product, ProductId,
    Recipe, RecipeDetail, RecipeId, RecipeIngredient, RecipeIngredientId, RecipeType, ReconReport,
    SalesAggregate, Unit,
};
pub use normalize::normalize;
pub use replenish::{
    group_by_category, submit_replenish, validate_replenish, CategoryGroup, ReplenishBackend,
    ReplenishStaging, ScanOutcome, UnknownProductDraft,
};
pub use staging::{preview, DepletionStaging, Preview, StagingSet, StagingState, UploadId};
pub use submit::{submit, validate, DepletionBackend, StagedLine, SubmitReport};
