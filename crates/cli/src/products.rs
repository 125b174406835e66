//! `galley products`: list, create, edit and delete products.

use clap::Subcommand;

use galley_recon::{group_by_category, NewProduct, Product, ProductPatch, Unit, ValidationError};

use crate::util::{column_width, confirm, format_quantity, pad_right, print_json};
use crate::{api_client, load_settings, CliError};

#[derive(Subcommand)]
pub enum ProductsCommands {
    /// List products grouped by category
    List {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a product
    #[command(after_help = "\
Examples:
  galley products create --name \"Brioche Buns\" --unit pcs --stock 48 --cost 0.45 --category Bakery
  galley products create --name Cheddar --stock 0 --cost 0.31 --barcode 0123456789012")]
    Create {
        #[arg(long)]
        name: String,

        /// `oz` or `pcs`
        #[arg(long, default_value = "oz")]
        unit: Unit,

        /// Stock on hand
        #[arg(long, value_name = "QTY")]
        stock: f64,

        /// Cost per unit
        #[arg(long, value_name = "COST")]
        cost: f64,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        barcode: Option<String>,

        /// Output the created product as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a product's name, unit, cost, category or barcode
    #[command(after_help = "\
Examples:
  galley products edit 12 --cost 0.5
  galley products edit 12 --category \"\"   # clear the category")]
    Edit {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        /// `oz` or `pcs`
        #[arg(long)]
        unit: Option<Unit>,

        /// Cost per unit
        #[arg(long, value_name = "COST")]
        cost: Option<f64>,

        /// New category; an empty value clears it
        #[arg(long)]
        category: Option<String>,

        /// New barcode; an empty value clears it
        #[arg(long)]
        barcode: Option<String>,

        /// Output the updated product as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a product
    Delete {
        id: i64,

        /// Delete without asking for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

pub fn cmd_products(cmd: ProductsCommands) -> Result<(), CliError> {
    match cmd {
        ProductsCommands::List { json } => cmd_list(json),
        ProductsCommands::Create { name, unit, stock, cost, category, barcode, json } => {
            let product = NewProduct {
                name,
                unit,
                stock_quantity: stock,
                unit_cost: cost,
                category,
                barcode,
            }
            .validated()
            .map_err(CliError::validation)?;
            cmd_create(product, json)
        }
        ProductsCommands::Edit { id, name, unit, cost, category, barcode, json } => {
            let patch = ProductPatch {
                name,
                unit,
                unit_cost: cost,
                category,
                barcode,
            };
            if patch.is_empty() {
                return Err(CliError::usage("nothing to change")
                    .with_hint("pass at least one of --name, --unit, --cost, --category, --barcode"));
            }
            let patch = patch.validated().map_err(CliError::validation)?;
            cmd_edit(id, patch, json)
        }
        ProductsCommands::Delete { id, yes } => cmd_delete(id, yes),
    }
}

fn cmd_list(json: bool) -> Result<(), CliError> {
    let settings = load_settings()?;
    let products = api_client(&settings)?
        .list_products()
        .map_err(CliError::client)?;
    let groups = group_by_category(&products);

    if json {
        return print_json(&groups);
    }
    let width = column_width(products.iter().map(|p| p.name.as_str()), 8, 48);
    for group in &groups {
        println!("{}", group.name);
        for p in &group.products {
            println!(
                "  {:>6}  {}  {:>8} {:<4}  {}",
                p.id,
                pad_right(&p.name, width),
                p.stock_quantity.map(format_quantity).unwrap_or_default(),
                p.unit.map(|u| u.to_string()).unwrap_or_default(),
                p.barcode.as_deref().unwrap_or("")
            );
        }
    }
    Ok(())
}

fn cmd_create(product: NewProduct, json: bool) -> Result<(), CliError> {
    let settings = load_settings()?;
    let created = api_client(&settings)?
        .create_product(&product)
        .map_err(|e| CliError::client_or(e, "Failed to create product"))?;

    if json {
        return print_json(&created);
    }
    println!("Created product {} (id {}).", created.name, created.id);
    Ok(())
}

fn cmd_edit(id: i64, patch: ProductPatch, json: bool) -> Result<(), CliError> {
    let settings = load_settings()?;
    let updated = api_client(&settings)?
        .update_product(id, &patch)
        .map_err(|e| CliError::client_or(e, "Failed to update product"))?;

    if json {
        return match updated {
            Some(product) => print_json(&product),
            None => print_json(&serde_json::json!({ "id": id, "updated": patch })),
        };
    }
    println!("Updated product {}.", describe(updated.as_ref(), id));
    Ok(())
}

fn cmd_delete(id: i64, yes: bool) -> Result<(), CliError> {
    let settings = load_settings()?;
    let client = api_client(&settings)?;
    let products = client.list_products().map_err(CliError::client)?;
    let product = products
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| CliError::validation(ValidationError::UnknownProduct(id)))?;

    if !yes && !confirm(&format!("Delete {}?", describe(Some(product), id)))? {
        eprintln!("Aborted; nothing was deleted.");
        return Ok(());
    }
    client
        .delete_product(id)
        .map_err(|e| CliError::client_or(e, "Failed to delete product"))?;
    println!("Deleted product {}.", describe(Some(product), id));
    Ok(())
}

fn describe(product: Option<&Product>, id: i64) -> String {
    match product {
        Some(p) => format!("{} (id {})", p.name, p.id),
        None => format!("id {}", id),
    }
}
