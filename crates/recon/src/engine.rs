use std::path::Path;

use crate::aggregate::aggregate_with_stats;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::matcher::match_recipes;
use crate::model::{CsvRow, Recipe, ReconMeta, ReconReport};

/// A parsed POS export, ready for aggregation.
#[derive(Debug, Clone)]
pub struct SalesUpload {
    pub file_name: Option<String>,
    /// blake3 of the raw file bytes (with algorithm prefix).
    pub source_hash: String,
    pub rows: Vec<CsvRow>,
}

/// Parse CSV bytes into header-keyed rows.
///
/// The first record is the header row. A UTF-8 BOM is stripped, ragged
/// rows are accepted (missing cells are simply absent), and blank lines are
/// skipped. Cells that are not valid UTF-8 (e.g. a Windows-1252 export) are
/// decoded lossily, so only a structural reader failure fails the file.
pub fn parse_sales_csv(data: &[u8]) -> Result<Vec<CsvRow>, ReconError> {
    let data = data.strip_prefix(b"\xef\xbb\xbf").unwrap_or(data);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| ReconError::CsvParse(e.to_string()))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    let mut rows = Vec::new();
    let mut lossy = 0usize;

    for record in reader.byte_records() {
        let record = record.map_err(|e| ReconError::CsvParse(e.to_string()))?;

        let mut row = CsvRow::new();
        for (i, h) in headers.iter().enumerate() {
            if let Some(val) = record.get(i) {
                let text = String::from_utf8_lossy(val);
                if matches!(text, std::borrow::Cow::Owned(_)) {
                    lossy += 1;
                }
                row.insert(h.clone(), text.into_owned());
            }
        }
        rows.push(row);
    }

    if lossy > 0 {
        log::debug!("{lossy} CSV cell(s) were not valid UTF-8 and were decoded lossily");
    }

    Ok(rows)
}

/// Read and parse a sales CSV from disk.
pub fn read_sales_csv(path: &Path) -> Result<SalesUpload, ReconError> {
    let data = std::fs::read(path).map_err(|e| ReconError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let rows = parse_sales_csv(&data)?;
    log::debug!("parsed {} rows from {}", rows.len(), path.display());

    Ok(SalesUpload {
        file_name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
        source_hash: hash_bytes(&data),
        rows,
    })
}

impl SalesUpload {
    /// Build an upload from in-memory bytes (e.g. stdin).
    pub fn from_bytes(file_name: Option<String>, data: &[u8]) -> Result<Self, ReconError> {
        Ok(Self {
            file_name,
            source_hash: hash_bytes(data),
            rows: parse_sales_csv(data)?,
        })
    }
}

/// Aggregate, match, and summarize an upload against the catalog.
pub fn reconcile(upload: &SalesUpload, catalog: &[Recipe]) -> ReconReport {
    let (sales, stats) = aggregate_with_stats(&upload.rows);
    let outcome = match_recipes(catalog, &sales);
    let summary = compute_summary(upload, &stats, &sales, &outcome);

    ReconReport {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        sales,
        outcome,
    }
}

/// blake3 of bytes, with algorithm prefix.
pub fn hash_bytes(data: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(data).to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecipeType;

    fn cheeseburger() -> Recipe {
        Recipe {
            id: 1,
            name: "Cheeseburger".into(),
            recipe_type: RecipeType::MenuItem,
        }
    }

    #[test]
    fn parse_basic() {
        let csv = "\
Item,Items Sold
Cheeseburger,12
Fries,\"1,204\"
";
        let rows = parse_sales_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Item"), Some("Cheeseburger"));
        assert_eq!(rows[1].get("Items Sold"), Some("1,204"));
    }

    #[test]
    fn parse_strips_bom_and_skips_blank_lines() {
        let csv = "\u{feff}Item,Items Sold\n\nCheeseburger,2\n\n";
        let rows = parse_sales_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Item"), Some("Cheeseburger"));
    }

    #[test]
    fn parse_tolerates_ragged_rows() {
        let csv = "Item,Items Sold,Notes\nBurger,3\nFries,2,extra,more\n";
        let rows = parse_sales_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Notes"), None);
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn non_utf8_cells_do_not_sink_the_upload() {
        // "Jalape\xf1o" is Windows-1252 for "Jalapeño".
        let data = b"Item,Items Sold\nCheeseburger,12\nJalape\xf1o Poppers,3\nFries,4\n";
        let upload = SalesUpload::from_bytes(None, data).unwrap();
        assert_eq!(upload.rows.len(), 3);
        assert_eq!(upload.rows[1].get("Item"), Some("Jalape\u{fffd}o Poppers"));

        let report = reconcile(&upload, &[cheeseburger()]);
        assert_eq!(report.sales.get("cheeseburger"), Some(12.0));
        assert_eq!(report.sales.get("fries"), Some(4.0));
        assert_eq!(report.outcome.matched[0].quantity, 12.0);
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let err = read_sales_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, ReconError::Io { .. }));
    }

    #[test]
    fn end_to_end_scenario() {
        let csv = "\
Item,Items Sold
Cheeseburger,12
cheeseburger,3
Unknown Combo,5
";
        let upload = SalesUpload::from_bytes(Some("sales.csv".into()), csv.as_bytes()).unwrap();
        let report = reconcile(&upload, &[cheeseburger()]);

        assert_eq!(report.sales.get("cheeseburger"), Some(15.0));
        assert_eq!(report.sales.get("unknown combo"), Some(5.0));
        assert_eq!(report.sales.len(), 2);

        assert_eq!(report.outcome.matched.len(), 1);
        assert_eq!(report.outcome.matched[0].recipe.id, 1);
        assert_eq!(report.outcome.matched[0].quantity, 15.0);
        assert_eq!(report.outcome.unmatched, vec!["unknown combo".to_string()]);

        assert_eq!(report.summary.rows_parsed, 3);
        assert_eq!(report.summary.matched, 1);
        assert_eq!(report.summary.unmatched, 1);
        assert_eq!(report.summary.file_name.as_deref(), Some("sales.csv"));
        assert!(report.summary.source_hash.starts_with("blake3:"));
    }

    #[test]
    fn read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pos-export.csv");
        std::fs::write(&path, "item,quantity\nLatte,4\n").unwrap();

        let upload = read_sales_csv(&path).unwrap();
        assert_eq!(upload.file_name.as_deref(), Some("pos-export.csv"));
        assert_eq!(upload.rows.len(), 1);
    }

    #[test]
    fn report_json_shape() {
        let upload = SalesUpload::from_bytes(None, b"Item,Items Sold\nCheeseburger,2\nMystery,1\n").unwrap();
        let report = reconcile(&upload, &[cheeseburger()]);
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["meta"]["engine_version"].is_string());
        assert_eq!(json["summary"]["matched"], 1);
        assert_eq!(json["matched"][0]["recipe"]["id"], 1);
        assert_eq!(json["unmatched"][0], "mystery");
        assert!(json.get("collisions").is_none());
    }
}
