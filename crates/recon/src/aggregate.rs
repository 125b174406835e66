use serde::Serialize;

use crate::model::{CsvRow, SalesAggregate};
use crate::normalize::normalize;

/// Header aliases for the item-name column, tried in order.
pub const NAME_ALIASES: [&str; 3] = ["item", "Item", "ITEM"];

/// Header aliases for the units-sold column, tried in order.
pub const QUANTITY_ALIASES: [&str; 4] = ["items sold", "Items Sold", "items_sold", "quantity"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    pub rows_seen: usize,
    pub rows_used: usize,
    pub missing_name: usize,
    pub missing_quantity: usize,
    pub bad_quantity: usize,
}

impl AggregateStats {
    pub fn rows_skipped(&self) -> usize {
        self.missing_name + self.missing_quantity + self.bad_quantity
    }
}

/// Sum units sold per normalized item name. Malformed rows are dropped.
pub fn aggregate(rows: &[CsvRow]) -> SalesAggregate {
    aggregate_with_stats(rows).0
}

/// Same as [`aggregate`], also counting why rows were dropped.
pub fn aggregate_with_stats(rows: &[CsvRow]) -> (SalesAggregate, AggregateStats) {
    let mut sales = SalesAggregate::new();
    let mut stats = AggregateStats {
        rows_seen: rows.len(),
        ..Default::default()
    };

    for row in rows {
        let Some(raw_name) = resolve_cell(row, &NAME_ALIASES) else {
            stats.missing_name += 1;
            continue;
        };
        let Some(raw_qty) = resolve_cell(row, &QUANTITY_ALIASES) else {
            stats.missing_quantity += 1;
            continue;
        };
        let Some(qty) = parse_quantity(raw_qty) else {
            stats.bad_quantity += 1;
            continue;
        };

        sales.add(normalize(raw_name), qty);
        stats.rows_used += 1;
    }

    if stats.rows_skipped() > 0 {
        log::debug!(
            "dropped {} of {} sales rows ({} without item, {} without quantity, {} bad quantity)",
            stats.rows_skipped(),
            stats.rows_seen,
            stats.missing_name,
            stats.missing_quantity,
            stats.bad_quantity,
        );
    }

    (sales, stats)
}

/// First non-blank cell among `aliases`. Exact header matches are tried
/// before case-insensitive ones.
fn resolve_cell<'a>(row: &'a CsvRow, aliases: &[&str]) -> Option<&'a str> {
    let non_blank = |v: &&str| !v.trim().is_empty();
    aliases
        .iter()
        .filter_map(|a| row.get(a))
        .find(non_blank)
        .or_else(|| {
            aliases
                .iter()
                .filter_map(|a| row.get_ignore_case(a))
                .find(non_blank)
        })
}

/// Parse a units-sold cell. Thousands separators are stripped; anything
/// that is not a finite number above zero is rejected.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|q| q.is_finite() && *q > 0.0)
}
