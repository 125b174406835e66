use thiserror::Error;

use crate::catalog::ResolvedIngredient;
use crate::model::{ProductId, Recipe, RecipeId, RecipeIngredientId};
use crate::submit::StagedLine;

/// File-level failures. Row-level problems never surface here; the
/// aggregator drops bad rows instead.
#[derive(Debug, Error)]
pub enum ReconError {
    /// The sales file could not be read at all.
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },
    /// The CSV parser rejected the file.
    #[error("CSV parsing error: {0}")]
    CsvParse(String),
}

/// Rejected before any backend call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no recipe selected")]
    NoRecipeSelected,
    #[error("invalid quantity for {0}")]
    InvalidQuantity(String),
    #[error("unknown recipe id {0}")]
    UnknownRecipe(RecipeId),
    #[error("No products selected")]
    NoProductSelected,
    #[error("Quantity is required for {0}")]
    MissingProductQuantity(String),
    #[error("Quantity must be greater than zero for {0}")]
    NonPositiveProductQuantity(String),
    #[error("unknown product id {0}")]
    UnknownProduct(ProductId),
    #[error("Name is required")]
    MissingProductName,
    #[error("{0} must be zero or more")]
    NegativeAmount(&'static str),
    #[error("Recipe name is required")]
    MissingRecipeName,
    #[error("Please select at least one ingredient")]
    NoIngredientSelected,
    #[error("All ingredients must have a quantity")]
    MissingIngredientQuantity,
    #[error("unknown prepped item id {0}")]
    UnknownPreppedItem(RecipeId),
    #[error("Prepped items can only use products as ingredients")]
    PreppedInPreppedItem,
    #[error("{0} is listed more than once")]
    DuplicateIngredient(String),
    #[error("recipe {recipe} has no ingredient line {line}")]
    UnknownIngredientLine {
        recipe: RecipeId,
        line: RecipeIngredientId,
    },
    #[error("nothing to update")]
    EmptyUpdate,
}

/// What a backend reports when a single mutation fails.
///
/// `message` is `None` when the response carried nothing decodable; callers
/// substitute their own fallback text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", .message.as_deref().unwrap_or("request failed"))]
pub struct BackendFailure {
    pub status: Option<u16>,
    pub message: Option<String>,
}

impl BackendFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    /// A failure with no usable message.
    pub fn opaque(status: Option<u16>) -> Self {
        Self {
            status,
            message: None,
        }
    }

    pub fn message_or(&self, fallback: &str) -> String {
        match self.message.as_deref() {
            Some(msg) if !msg.trim().is_empty() => msg.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Outcome of a failed submission batch.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A backend call failed. Lines in `completed` were already applied
    /// server-side and are not rolled back.
    #[error("{message}")]
    Backend {
        failed: StagedLine,
        /// HTTP status of the failed call, when there was one.
        status: Option<u16>,
        message: String,
        completed: Vec<StagedLine>,
    },
}

/// Outcome of a failed recipe composition.
#[derive(Debug, Error)]
pub enum CompositionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The recipe itself was not created; nothing was written.
    #[error("{message}")]
    RecipeRejected { status: Option<u16>, message: String },
    /// The recipe exists but an ingredient call failed. `added` lines stay on
    /// the server.
    #[error("{message}")]
    IngredientRejected {
        recipe: Recipe,
        failed: ResolvedIngredient,
        status: Option<u16>,
        message: String,
        added: Vec<ResolvedIngredient>,
    },
    /// A quantity edit failed. Lines in `updated` were already changed.
    #[error("{message}")]
    QuantityRejected {
        failed: RecipeIngredientId,
        status: Option<u16>,
        message: String,
        updated: Vec<RecipeIngredientId>,
    },
}
