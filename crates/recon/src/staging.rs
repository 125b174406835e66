//! Depletion staging: the editable set of (recipe, quantity) instructions
//! an operator reviews before submitting.
//!
//! State machine:
//!
//! ```text
//!   Empty ──csv_parsed(matches ≠ ∅)──▶ CsvSeeded ──manual edit──▶ Edited
//!     │                                    ▲                       │
//!     └───────────manual edit──────────────┼──────────────▶ Edited │
//!                                          └──new upload seeds─────┘
//! ```
//!
//! Seeding is tied to an [`UploadId`]. Recomputing matches for the same
//! upload (for example after the catalog reloads) never reseeds, so manual
//! edits layered on top of a seed survive. A fresh upload gets a fresh id
//! and seeds again once it has matches.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{MatchOutcome, MatchedDepletion, RecipeId};

pub const DEFAULT_PREVIEW_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// StagingSet
// ---------------------------------------------------------------------------

/// Selected recipes (in selection order) and their quantities.
///
/// Quantities are kept when a recipe is deselected, so reselecting it
/// restores the previous value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StagingSet {
    selected_recipe_ids: Vec<RecipeId>,
    quantities: BTreeMap<RecipeId, f64>,
}

impl StagingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_recipe_ids(&self) -> &[RecipeId] {
        &self.selected_recipe_ids
    }

    pub fn quantities(&self) -> &BTreeMap<RecipeId, f64> {
        &self.quantities
    }

    pub fn quantity(&self, id: RecipeId) -> Option<f64> {
        self.quantities.get(&id).copied()
    }

    pub fn is_selected(&self, id: RecipeId) -> bool {
        self.selected_recipe_ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected_recipe_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_recipe_ids.is_empty()
    }

    /// Append to the selection. Returns false if already selected.
    pub fn select(&mut self, id: RecipeId) -> bool {
        if self.is_selected(id) {
            return false;
        }
        self.selected_recipe_ids.push(id);
        true
    }

    /// Remove from the selection. Returns false if it was not selected.
    pub fn deselect(&mut self, id: RecipeId) -> bool {
        let before = self.selected_recipe_ids.len();
        self.selected_recipe_ids.retain(|&r| r != id);
        self.selected_recipe_ids.len() != before
    }

    /// Replace the selection, dropping duplicates but keeping first-seen order.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = RecipeId>) {
        self.selected_recipe_ids.clear();
        for id in ids {
            self.select(id);
        }
    }

    /// Overwrite the quantity of a selected recipe. Returns false (and
    /// stores nothing) if the recipe is not selected.
    pub fn set_quantity(&mut self, id: RecipeId, quantity: f64) -> bool {
        if !self.is_selected(id) {
            return false;
        }
        self.quantities.insert(id, quantity);
        true
    }

    /// Selection and quantities taken wholesale from match results.
    fn seed(&mut self, matched: &[MatchedDepletion]) {
        self.set_selection(matched.iter().map(|m| m.recipe.id));
        self.quantities = matched.iter().map(|m| (m.recipe.id, m.quantity)).collect();
    }
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

/// Display-only view of a long list: the first `limit` entries unless
/// expanded. Never affects what gets submitted.
#[derive(Debug, Serialize)]
pub struct Preview<'a, T> {
    pub items: &'a [T],
    pub total: usize,
    /// Entries not shown ("+N more").
    pub hidden: usize,
    /// Whether a see-more/see-less toggle applies at all.
    pub expandable: bool,
    pub expanded: bool,
}

pub fn preview<T>(items: &[T], limit: usize, expanded: bool) -> Preview<'_, T> {
    let expandable = items.len() > limit;
    let shown = if expanded || !expandable { items.len() } else { limit };
    Preview {
        items: &items[..shown],
        total: items.len(),
        hidden: items.len() - shown,
        expandable,
        expanded,
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UploadId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingState {
    Empty,
    CsvSeeded,
    Edited,
}

#[derive(Debug, Clone)]
pub struct DepletionStaging {
    staging: StagingSet,
    state: StagingState,
    next_upload: u64,
    current_upload: Option<UploadId>,
    seeded_upload: Option<UploadId>,
    outcome: MatchOutcome,
    preview_limit: usize,
    show_all_matched: bool,
    show_all_unmatched: bool,
}

impl Default for DepletionStaging {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_LIMIT)
    }
}

impl DepletionStaging {
    pub fn new(preview_limit: usize) -> Self {
        Self {
            staging: StagingSet::new(),
            state: StagingState::Empty,
            next_upload: 0,
            current_upload: None,
            seeded_upload: None,
            outcome: MatchOutcome::default(),
            preview_limit,
            show_all_matched: false,
            show_all_unmatched: false,
        }
    }

    pub fn staging(&self) -> &StagingSet {
        &self.staging
    }

    pub fn state(&self) -> StagingState {
        self.state
    }

    pub fn current_upload(&self) -> Option<UploadId> {
        self.current_upload
    }

    pub fn matched(&self) -> &[MatchedDepletion] {
        &self.outcome.matched
    }

    pub fn unmatched(&self) -> &[String] {
        &self.outcome.unmatched
    }

    // ── Upload events ───────────────────────────────────────────────

    /// A new file was picked. Results from any earlier upload are dropped;
    /// the staged selection is left alone until the new parse seeds it.
    pub fn begin_upload(&mut self) -> UploadId {
        let id = UploadId(self.next_upload);
        self.next_upload += 1;
        self.current_upload = Some(id);
        self.outcome = MatchOutcome::default();
        self.show_all_matched = false;
        self.show_all_unmatched = false;
        id
    }

    /// The parse for `upload` finished. Returns true if it seeded the
    /// staging. Results for a superseded upload are ignored.
    pub fn csv_parsed(&mut self, upload: UploadId, outcome: MatchOutcome) -> bool {
        if self.current_upload != Some(upload) {
            log::debug!("ignoring results for superseded upload {:?}", upload);
            return false;
        }
        self.outcome = outcome;
        self.try_seed()
    }

    /// Matches were recomputed for the current upload without a new file.
    /// Seeds only if this upload has not seeded yet.
    pub fn refresh_matches(&mut self, outcome: MatchOutcome) -> bool {
        self.outcome = outcome;
        self.try_seed()
    }

    fn try_seed(&mut self) -> bool {
        let Some(upload) = self.current_upload else {
            return false;
        };
        if self.outcome.matched.is_empty() || self.seeded_upload == Some(upload) {
            return false;
        }
        self.staging.seed(&self.outcome.matched);
        self.seeded_upload = Some(upload);
        self.state = StagingState::CsvSeeded;
        log::info!(
            "staged {} menu item(s) from CSV upload {:?}",
            self.outcome.matched.len(),
            upload
        );
        true
    }

    // ── Manual edits ────────────────────────────────────────────────

    pub fn select(&mut self, id: RecipeId) -> bool {
        self.edited(|s| s.select(id))
    }

    pub fn deselect(&mut self, id: RecipeId) -> bool {
        self.edited(|s| s.deselect(id))
    }

    pub fn toggle(&mut self, id: RecipeId) -> bool {
        if self.staging.is_selected(id) {
            self.deselect(id);
            false
        } else {
            self.select(id);
            true
        }
    }

    /// Replace the whole selection (multi-select widget semantics).
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = RecipeId>) {
        self.staging.set_selection(ids);
        self.state = StagingState::Edited;
    }

    pub fn set_quantity(&mut self, id: RecipeId, quantity: f64) -> bool {
        self.edited(|s| s.set_quantity(id, quantity))
    }

    fn edited(&mut self, f: impl FnOnce(&mut StagingSet) -> bool) -> bool {
        let changed = f(&mut self.staging);
        if changed {
            self.state = StagingState::Edited;
        }
        changed
    }

    /// Discard everything (the operator navigated away).
    pub fn reset(&mut self) {
        *self = Self {
            next_upload: self.next_upload,
            ..Self::new(self.preview_limit)
        };
    }

    // ── Read model ──────────────────────────────────────────────────

    pub fn matched_preview(&self) -> Preview<'_, MatchedDepletion> {
        preview(&self.outcome.matched, self.preview_limit, self.show_all_matched)
    }

    pub fn unmatched_preview(&self) -> Preview<'_, String> {
        preview(&self.outcome.unmatched, self.preview_limit, self.show_all_unmatched)
    }

    pub fn toggle_matched_preview(&mut self) {
        self.show_all_matched = !self.show_all_matched;
    }

    pub fn toggle_unmatched_preview(&mut self) {
        self.show_all_unmatched = !self.show_all_unmatched;
    }
}
