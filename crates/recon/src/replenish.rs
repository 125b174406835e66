//! Replenishment staging: products picked by hand or by barcode scan, each
//! with a quantity to add to stock.
//!
//! Barcodes the backend does not recognize are collected as drafts so the
//! operator can create those products afterwards.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{BackendFailure, SubmitError, ValidationError};
use crate::model::{Product, ProductId};
use crate::submit::{StagedLine, SubmitReport};

pub const REPLENISH_FALLBACK_MESSAGE: &str = "Failed to replenish inventory";
pub const NO_CATEGORY: &str = "No Category";

/// Name used in messages when a selected product is not in the catalog.
const UNNAMED_PRODUCT: &str = "a product";

pub trait ReplenishBackend {
    /// `Ok(None)` when no product carries this barcode.
    fn product_by_barcode(&self, code: &str) -> Result<Option<Product>, BackendFailure>;
    fn replenish(&self, product_id: ProductId, quantity: f64) -> Result<(), BackendFailure>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownProductDraft {
    pub barcode: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Nothing was scanned ("Barcode cannot be empty").
    Empty,
    Selected(ProductId),
    AlreadySelected(ProductId),
    /// No product for this barcode. `newly_added` is false when the barcode
    /// was already in the draft list.
    Unknown { barcode: String, newly_added: bool },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplenishStaging {
    selected: Vec<ProductId>,
    quantities: BTreeMap<ProductId, f64>,
    drafts: Vec<UnknownProductDraft>,
}

impl ReplenishStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_product_ids(&self) -> &[ProductId] {
        &self.selected
    }

    pub fn quantity(&self, id: ProductId) -> Option<f64> {
        self.quantities.get(&id).copied()
    }

    pub fn drafts(&self) -> &[UnknownProductDraft] {
        &self.drafts
    }

    pub fn is_selected(&self, id: ProductId) -> bool {
        self.selected.contains(&id)
    }

    pub fn select(&mut self, id: ProductId) -> bool {
        if self.is_selected(id) {
            return false;
        }
        self.selected.push(id);
        true
    }

    pub fn deselect(&mut self, id: ProductId) -> bool {
        let before = self.selected.len();
        self.selected.retain(|&p| p != id);
        self.selected.len() != before
    }

    pub fn set_quantity(&mut self, id: ProductId, quantity: f64) -> bool {
        if !self.is_selected(id) {
            return false;
        }
        self.quantities.insert(id, quantity);
        true
    }

    /// Look up a scanned barcode and stage the result.
    ///
    /// Any lookup failure is treated like an unknown barcode.
    pub fn scan<B: ReplenishBackend + ?Sized>(&mut self, code: &str, backend: &B) -> ScanOutcome {
        let code = code.trim();
        if code.is_empty() {
            return ScanOutcome::Empty;
        }

        let found = match backend.product_by_barcode(code) {
            Ok(found) => found,
            Err(e) => {
                log::debug!("barcode lookup for {code} failed: {e}");
                None
            }
        };

        match found {
            Some(product) if self.select(product.id) => ScanOutcome::Selected(product.id),
            Some(product) => ScanOutcome::AlreadySelected(product.id),
            None => {
                let newly_added = !self.drafts.iter().any(|d| d.barcode == code);
                if newly_added {
                    self.drafts.push(UnknownProductDraft {
                        barcode: code.to_string(),
                        name: String::new(),
                    });
                }
                ScanOutcome::Unknown {
                    barcode: code.to_string(),
                    newly_added,
                }
            }
        }
    }

    pub fn rename_draft(&mut self, barcode: &str, name: impl Into<String>) -> bool {
        match self.drafts.iter_mut().find(|d| d.barcode == barcode) {
            Some(draft) => {
                draft.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn remove_draft(&mut self, barcode: &str) -> Option<UnknownProductDraft> {
        let pos = self.drafts.iter().position(|d| d.barcode == barcode)?;
        Some(self.drafts.remove(pos))
    }
}

/// Resolve every selected product to a `(id, name, quantity)` line, or
/// reject the batch before any backend call.
pub fn validate_replenish(
    staging: &ReplenishStaging,
    catalog: &[Product],
) -> Result<Vec<StagedLine>, ValidationError> {
    if staging.selected.is_empty() {
        return Err(ValidationError::NoProductSelected);
    }

    let mut lines = Vec::with_capacity(staging.selected.len());
    for &id in &staging.selected {
        let name = catalog
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| UNNAMED_PRODUCT.to_string());

        let quantity = match staging.quantity(id) {
            Some(q) if q.is_finite() && q != 0.0 => q,
            _ => return Err(ValidationError::MissingProductQuantity(name)),
        };
        if quantity < 0.0 {
            return Err(ValidationError::NonPositiveProductQuantity(name));
        }
        lines.push(StagedLine { id, name, quantity });
    }
    Ok(lines)
}

/// Replenish each selected product in selection order, stopping at the
/// first failure.
pub fn submit_replenish<B: ReplenishBackend + ?Sized>(
    staging: &ReplenishStaging,
    catalog: &[Product],
    backend: &B,
) -> Result<SubmitReport, SubmitError> {
    let lines = validate_replenish(staging, catalog)?;

    let mut completed = Vec::with_capacity(lines.len());
    for line in lines {
        if let Err(failure) = backend.replenish(line.id, line.quantity) {
            let message = failure.message_or(REPLENISH_FALLBACK_MESSAGE);
            log::warn!("replenishment stopped at {}: {}", line.name, message);
            return Err(SubmitError::Backend {
                failed: line,
                status: failure.status,
                message,
                completed,
            });
        }
        completed.push(line);
    }

    log::info!("replenished {} product(s)", completed.len());
    Ok(SubmitReport {
        lines: completed,
        submitted_at: chrono::Utc::now().to_rfc3339(),
    })
}

// ---------------------------------------------------------------------------
// Catalog grouping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup<'a> {
    pub name: String,
    pub products: Vec<&'a Product>,
}

/// Group products by trimmed category, blank ones under [`NO_CATEGORY`].
/// Groups and products are sorted by name, case-insensitively, with
/// [`NO_CATEGORY`] always last.
pub fn group_by_category(products: &[Product]) -> Vec<CategoryGroup<'_>> {
    let mut groups: HashMap<String, Vec<&Product>> = HashMap::new();
    for product in products {
        let category = product
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(NO_CATEGORY);
        groups.entry(category.to_string()).or_default().push(product);
    }

    let mut out: Vec<CategoryGroup<'_>> = groups
        .into_iter()
        .map(|(name, mut products)| {
            products.sort_by_cached_key(|p| (p.name.to_lowercase(), p.name.clone()));
            CategoryGroup { name, products }
        })
        .collect();

    out.sort_by_cached_key(|g| (g.name == NO_CATEGORY, g.name.to_lowercase(), g.name.clone()));
    out
}
