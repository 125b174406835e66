//! `galley deplete`: reconcile a POS sales export and deplete inventory.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

use galley_recon::{
    read_sales_csv, reconcile, submit, validate, DepletionStaging, MatchedDepletion, Preview,
    RecipeType, ReconReport, StagedLine, SubmitError,
};

use crate::util::{column_width, confirm, format_quantity, pad_right, parse_assignment, print_json};
use crate::{api_client, load_settings, CliError};

#[derive(Subcommand)]
pub enum DepleteCommands {
    /// Show which menu items a sales CSV matches, without changing anything
    #[command(after_help = "\
Examples:
  galley deplete preview sales.csv
  galley deplete preview sales.csv --all
  galley deplete preview sales.csv --json")]
    Preview {
        /// POS export with an item column and a units-sold column
        csv: PathBuf,

        /// List every matched and unmatched item instead of the first few
        #[arg(long)]
        all: bool,

        /// Output the full reconciliation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stage depletions (from a CSV and/or by hand) and submit them
    #[command(after_help = "\
Examples:
  galley deplete run --csv sales.csv
  galley deplete run --csv sales.csv --set 12=40 --drop 7 --yes
  galley deplete run --set 3=2 --set 5=1.5 --json --yes")]
    Run {
        /// Seed the staging from this sales CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Stage recipe ID with quantity QTY (adds it if not staged). Repeatable.
        #[arg(long = "set", value_name = "ID=QTY")]
        set: Vec<String>,

        /// Remove recipe ID from the staging. Repeatable.
        #[arg(long = "drop", value_name = "ID")]
        drop: Vec<i64>,

        /// Submit without asking for confirmation
        #[arg(long, short = 'y')]
        yes: bool,

        /// Output the submission result as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn cmd_deplete(cmd: DepleteCommands) -> Result<(), CliError> {
    match cmd {
        DepleteCommands::Preview { csv, all, json } => cmd_deplete_preview(&csv, all, json),
        DepleteCommands::Run { csv, set, drop, yes, json } => {
            cmd_deplete_run(csv.as_deref(), &set, &drop, yes, json)
        }
    }
}

fn cmd_deplete_preview(csv: &Path, all: bool, json: bool) -> Result<(), CliError> {
    let settings = load_settings()?;
    // Read the file first so a bad CSV fails without touching the network.
    let upload = read_sales_csv(csv).map_err(CliError::csv)?;

    let client = api_client(&settings)?;
    let menu = client
        .list_recipes(Some(RecipeType::MenuItem))
        .map_err(CliError::client)?;
    let report = reconcile(&upload, &menu);

    if json {
        return print_json(&report);
    }

    let mut staging = DepletionStaging::new(settings.preview_limit);
    let id = staging.begin_upload();
    staging.csv_parsed(id, report.outcome.clone());
    if all {
        staging.toggle_matched_preview();
        staging.toggle_unmatched_preview();
    }

    print_summary(&report);
    print_matched(&staging.matched_preview());
    print_unmatched(&staging.unmatched_preview(), &report);
    Ok(())
}

fn print_summary(report: &ReconReport) {
    let s = &report.summary;
    println!(
        "{}: {} rows parsed, {} item(s) sold{}",
        s.file_name.as_deref().unwrap_or("<stdin>"),
        s.rows_parsed,
        s.distinct_items,
        if s.rows_skipped > 0 {
            format!(" ({} row(s) skipped)", s.rows_skipped)
        } else {
            String::new()
        }
    );
    println!(
        "{} matched menu item(s), {} unmatched sales name(s)",
        s.matched, s.unmatched
    );
    for key in &report.outcome.collisions {
        println!("warning: several menu items are named \"{}\"; each will be depleted", key);
    }
}

fn print_matched(preview: &Preview<'_, MatchedDepletion>) {
    if preview.total == 0 {
        return;
    }
    println!();
    println!("Matched ({}):", preview.total);
    let width = column_width(preview.items.iter().map(|m| m.recipe.name.as_str()), 8, 40);
    for m in preview.items {
        println!(
            "  {}  {:>8}  (recipe {})",
            pad_right(&m.recipe.name, width),
            format_quantity(m.quantity),
            m.recipe.id
        );
    }
    print_more(preview.hidden);
}

fn print_unmatched(preview: &Preview<'_, String>, report: &ReconReport) {
    if preview.total == 0 {
        return;
    }
    println!();
    println!("Unmatched ({}):", preview.total);
    let width = column_width(preview.items.iter().map(String::as_str), 8, 40);
    for name in preview.items {
        let qty = report.sales.get(name).unwrap_or(0.0);
        println!("  {}  {:>8}", pad_right(name, width), format_quantity(qty));
    }
    print_more(preview.hidden);
}

fn print_more(hidden: usize) {
    if hidden > 0 {
        println!("  +{} more (use --all to list them)", hidden);
    }
}

#[derive(Serialize)]
struct RunOutput<'a> {
    ok: bool,
    lines: &'a [StagedLine],
    #[serde(skip_serializing_if = "Option::is_none")]
    submitted_at: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<&'a StagedLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

fn cmd_deplete_run(
    csv: Option<&Path>,
    set: &[String],
    drop: &[i64],
    yes: bool,
    json: bool,
) -> Result<(), CliError> {
    let assignments = set
        .iter()
        .map(String::as_str)
        .map(parse_assignment)
        .collect::<Result<Vec<_>, _>>()?;
    if csv.is_none() && assignments.is_empty() {
        return Err(CliError::usage("nothing to deplete")
            .with_hint("pass --csv FILE and/or --set ID=QTY"));
    }

    let settings = load_settings()?;
    let upload = csv
        .map(|path| read_sales_csv(path).map_err(CliError::csv))
        .transpose()?;

    let client = api_client(&settings)?;
    let menu = client
        .list_recipes(Some(RecipeType::MenuItem))
        .map_err(CliError::client)?;

    let mut staging = DepletionStaging::new(settings.preview_limit);
    if let Some(upload) = &upload {
        let report = reconcile(upload, &menu);
        let id = staging.begin_upload();
        if !staging.csv_parsed(id, report.outcome) {
            eprintln!(
                "{}: no menu items matched",
                upload.file_name.as_deref().unwrap_or("sales CSV")
            );
        }
    }
    for &id in drop {
        if !staging.deselect(id) {
            log::warn!("--drop {}: recipe was not staged", id);
        }
    }
    for (id, qty) in assignments {
        staging.select(id);
        staging.set_quantity(id, qty);
    }

    let lines = validate(staging.staging(), &menu).map_err(CliError::validation)?;

    if !json || !yes {
        eprintln!("About to deplete inventory for:");
        let width = column_width(lines.iter().map(|(r, _)| r.name.as_str()), 8, 40);
        for (recipe, qty) in &lines {
            eprintln!("  {}  {:>8}", pad_right(&recipe.name, width), format_quantity(*qty));
        }
    }
    if !yes && !confirm(&format!("Deplete {} recipe(s)?", lines.len()))? {
        eprintln!("Aborted; nothing was submitted.");
        return Ok(());
    }

    match submit(staging.staging(), &menu, &client) {
        Ok(report) => {
            if json {
                print_json(&RunOutput {
                    ok: true,
                    lines: &report.lines,
                    submitted_at: Some(&report.submitted_at),
                    failed: None,
                    error: None,
                })?;
            } else {
                println!("Inventory depleted for {} recipe(s).", report.lines.len());
            }
            Ok(())
        }
        Err(SubmitError::Backend { failed, status, message, completed }) => {
            if json {
                print_json(&RunOutput {
                    ok: false,
                    lines: &completed,
                    submitted_at: None,
                    failed: Some(&failed),
                    error: Some(&message),
                })?;
            } else {
                for line in &completed {
                    eprintln!("  depleted {} x {}", line.name, format_quantity(line.quantity));
                }
                eprintln!("  failed   {} x {}", failed.name, format_quantity(failed.quantity));
            }
            Err(CliError::submit(SubmitError::Backend { failed, status, message, completed }))
        }
        Err(e) => Err(CliError::submit(e)),
    }
}
