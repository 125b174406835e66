//! Sequential, fail-fast submission of staged depletions.

use serde::Serialize;

use crate::error::{BackendFailure, SubmitError, ValidationError};
use crate::model::{Recipe, RecipeId};
use crate::staging::StagingSet;

pub const DEPLETE_FALLBACK_MESSAGE: &str = "Failed to deplete inventory";

/// The one mutation submission needs. Implemented by the REST client and
/// by test fakes.
pub trait DepletionBackend {
    fn deplete(&self, recipe_id: RecipeId, quantity: f64) -> Result<(), BackendFailure>;
}

impl<B: DepletionBackend + ?Sized> DepletionBackend for &B {
    fn deplete(&self, recipe_id: RecipeId, quantity: f64) -> Result<(), BackendFailure> {
        (**self).deplete(recipe_id, quantity)
    }
}

/// One instruction as sent (or about to be sent) to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedLine {
    pub id: RecipeId,
    pub name: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReport {
    /// Every line, in the order it was applied.
    pub lines: Vec<StagedLine>,
    pub submitted_at: String,
}

/// Check the staging against the catalog without touching the backend.
///
/// Returns the resolved lines in selection order.
pub fn validate<'a>(
    staging: &StagingSet,
    catalog: &'a [Recipe],
) -> Result<Vec<(&'a Recipe, f64)>, ValidationError> {
    if staging.is_empty() {
        return Err(ValidationError::NoRecipeSelected);
    }

    let mut lines = Vec::with_capacity(staging.len());
    for &id in staging.selected_recipe_ids() {
        let recipe = catalog
            .iter()
            .find(|r| r.id == id)
            .ok_or(ValidationError::UnknownRecipe(id))?;
        let quantity = staging
            .quantity(id)
            .filter(|q| q.is_finite() && *q > 0.0)
            .ok_or_else(|| ValidationError::InvalidQuantity(recipe.name.clone()))?;
        lines.push((recipe, quantity));
    }
    Ok(lines)
}

/// Validate, then deplete each selected recipe in selection order.
///
/// Stops at the first backend failure. Earlier calls are not rolled back;
/// they are reported in `SubmitError::Backend { completed, .. }`. The staging is
/// left as it was either way.
pub fn submit<B: DepletionBackend + ?Sized>(
    staging: &StagingSet,
    catalog: &[Recipe],
    backend: &B,
) -> Result<SubmitReport, SubmitError> {
    let lines = validate(staging, catalog)?;

    let mut completed: Vec<StagedLine> = Vec::with_capacity(lines.len());
    for (recipe, quantity) in lines {
        let line = StagedLine {
            id: recipe.id,
            name: recipe.name.clone(),
            quantity,
        };
        log::debug!("depleting recipe {} ({}) by {}", line.id, line.name, line.quantity);

        if let Err(failure) = backend.deplete(line.id, line.quantity) {
            let message = failure.message_or(DEPLETE_FALLBACK_MESSAGE);
            log::warn!(
                "depletion stopped at {} after {} success(es): {}",
                line.name,
                completed.len(),
                message
            );
            return Err(SubmitError::Backend {
                failed: line,
                status: failure.status,
                message,
                completed,
            });
        }
        completed.push(line);
    }

    log::info!("depleted {} recipe(s)", completed.len());
    Ok(SubmitReport {
        lines: completed,
        submitted_at: chrono::Utc::now().to_rfc3339(),
    })
}
