//! `galley replenish`: stage stock additions by product id or barcode.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use galley_recon::{
    submit_replenish, validate_replenish, ReplenishStaging, ScanOutcome, StagedLine, SubmitError,
    UnknownProductDraft, ValidationError,
};

use crate::util::{
    column_width, confirm, format_quantity, pad_right, parse_assignment, parse_barcode_arg,
    print_json,
};
use crate::{api_client, load_settings, write_output_file, CliError};

#[derive(Args)]
pub struct ReplenishArgs {
    /// Look up a product by barcode and stage it, optionally with a quantity. Repeatable.
    #[arg(long = "barcode", value_name = "CODE[=QTY]")]
    barcodes: Vec<String>,

    /// Stage product ID with quantity QTY. Repeatable.
    #[arg(long = "set", value_name = "ID=QTY")]
    set: Vec<String>,

    /// Write barcodes with no matching product to this JSON file
    #[arg(long, value_name = "FILE")]
    drafts_out: Option<PathBuf>,

    /// Submit without asking for confirmation
    #[arg(long, short = 'y')]
    yes: bool,

    /// Output the submission result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ReplenishOutput<'a> {
    ok: bool,
    lines: &'a [StagedLine],
    #[serde(skip_serializing_if = "Option::is_none")]
    submitted_at: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<&'a StagedLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    drafts: &'a [UnknownProductDraft],
}

pub fn cmd_replenish(args: ReplenishArgs) -> Result<(), CliError> {
    let scans = args
        .barcodes
        .iter()
        .map(|raw| parse_barcode_arg(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let assignments = args
        .set
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Vec<_>, _>>()?;
    if scans.is_empty() && assignments.is_empty() {
        return Err(CliError::usage("nothing to replenish")
            .with_hint("pass --barcode CODE[=QTY] and/or --set ID=QTY"));
    }

    let settings = load_settings()?;
    let client = api_client(&settings)?;
    let products = client.list_products().map_err(CliError::client)?;

    let mut staging = ReplenishStaging::new();
    for (code, qty) in &scans {
        let id = match staging.scan(code, &client) {
            ScanOutcome::Empty => {
                eprintln!("warning: Barcode cannot be empty");
                continue;
            }
            ScanOutcome::Selected(id) => {
                eprintln!("{}: {}", code, product_name(&products, id));
                id
            }
            ScanOutcome::AlreadySelected(id) => {
                eprintln!("{}: {} (already staged)", code, product_name(&products, id));
                id
            }
            ScanOutcome::Unknown { barcode, newly_added } => {
                if newly_added {
                    eprintln!("{}: no product with this barcode", barcode);
                }
                if let Some(qty) = qty {
                    eprintln!(
                        "warning: {}: quantity {} ignored, no product with this barcode",
                        barcode,
                        format_quantity(*qty)
                    );
                }
                continue;
            }
        };
        if let Some(qty) = qty {
            staging.set_quantity(id, *qty);
        }
    }

    for (id, qty) in assignments {
        if !products.iter().any(|p| p.id == id) {
            return Err(CliError::validation(ValidationError::UnknownProduct(id)));
        }
        staging.select(id);
        staging.set_quantity(id, qty);
    }

    report_drafts(staging.drafts(), args.drafts_out.as_deref())?;

    if staging.selected_product_ids().is_empty() && !staging.drafts().is_empty() {
        if args.json {
            print_json(&ReplenishOutput {
                ok: true,
                lines: &[],
                submitted_at: None,
                failed: None,
                error: None,
                drafts: staging.drafts(),
            })?;
        }
        return Ok(());
    }

    let lines = validate_replenish(&staging, &products).map_err(CliError::validation)?;

    if !args.json || !args.yes {
        eprintln!("About to add stock:");
        let width = column_width(lines.iter().map(|l| l.name.as_str()), 8, 40);
        for line in &lines {
            eprintln!("  {}  {:>8}", pad_right(&line.name, width), format_quantity(line.quantity));
        }
    }
    if !args.yes && !confirm(&format!("Replenish {} product(s)?", lines.len()))? {
        eprintln!("Aborted; nothing was submitted.");
        return Ok(());
    }

    match submit_replenish(&staging, &products, &client) {
        Ok(report) => {
            if args.json {
                print_json(&ReplenishOutput {
                    ok: true,
                    lines: &report.lines,
                    submitted_at: Some(&report.submitted_at),
                    failed: None,
                    error: None,
                    drafts: staging.drafts(),
                })?;
            } else {
                println!("Inventory replenished for {} product(s).", report.lines.len());
            }
            Ok(())
        }
        Err(SubmitError::Backend { failed, status, message, completed }) => {
            if args.json {
                print_json(&ReplenishOutput {
                    ok: false,
                    lines: &completed,
                    submitted_at: None,
                    failed: Some(&failed),
                    error: Some(&message),
                    drafts: staging.drafts(),
                })?;
            } else {
                for line in &completed {
                    eprintln!("  added  {} x {}", line.name, format_quantity(line.quantity));
                }
                eprintln!("  failed {} x {}", failed.name, format_quantity(failed.quantity));
            }
            Err(CliError::submit(SubmitError::Backend { failed, status, message, completed }))
        }
        Err(e) => Err(CliError::submit(e)),
    }
}

fn product_name(products: &[galley_recon::Product], id: i64) -> &str {
    products
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.name.as_str())
        .unwrap_or("unlisted product")
}

/// Unknown barcodes go to `--drafts-out` when given, otherwise to stderr.
fn report_drafts(
    drafts: &[UnknownProductDraft],
    out: Option<&std::path::Path>,
) -> Result<(), CliError> {
    if drafts.is_empty() {
        return Ok(());
    }
    match out {
        Some(path) => {
            let json = serde_json::to_string_pretty(drafts)
                .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
            write_output_file(path, &json)?;
            eprintln!("{} unknown barcode(s) written to {}", drafts.len(), path.display());
        }
        None => {
            eprintln!("{} unknown barcode(s):", drafts.len());
            for draft in drafts {
                eprintln!("  {}", draft.barcode);
            }
            eprintln!("hint:  pass --drafts-out FILE to save them for product creation");
        }
    }
    Ok(())
}
