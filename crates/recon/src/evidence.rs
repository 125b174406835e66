use crate::aggregate::AggregateStats;
use crate::engine::SalesUpload;
use crate::model::{MatchOutcome, ReconSummary, SalesAggregate};

/// Compute the results-panel numbers for one upload.
pub fn compute_summary(
    upload: &SalesUpload,
    stats: &AggregateStats,
    sales: &SalesAggregate,
    outcome: &MatchOutcome,
) -> ReconSummary {
    let units_unmatched: f64 = outcome
        .unmatched
        .iter()
        .filter_map(|k| sales.get(k))
        .sum();

    ReconSummary {
        file_name: upload.file_name.clone(),
        source_hash: upload.source_hash.clone(),
        rows_parsed: upload.rows.len(),
        rows_skipped: stats.rows_skipped(),
        distinct_items: sales.len(),
        matched: outcome.matched.len(),
        unmatched: outcome.unmatched.len(),
        // Counted per matched recipe, so colliding names count twice.
        units_matched: outcome.matched.iter().map(|m| m.quantity).sum(),
        units_unmatched,
    }
}
