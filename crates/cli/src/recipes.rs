//! `galley recipes`: list and show recipes, compose new ones from products
//! and prepped items, edit them, delete them.

use clap::Subcommand;

use galley_recon::{
    create_recipe, update_ingredient_quantities, validate_new_recipe, validate_quantity_edits,
    NewRecipe, RecipeDetail, RecipePatch, RecipeType, ValidationError,
};

use crate::util::{
    column_width, confirm, format_quantity, pad_right, parse_assignment, parse_ingredient_arg,
    print_json,
};
use crate::{api_client, load_settings, CliError};

#[derive(Subcommand)]
pub enum RecipesCommands {
    /// List recipes, optionally of one type
    #[command(after_help = "\
Examples:
  galley recipes list
  galley recipes list --type prepped_item
  galley recipes list --type menu_item --json")]
    List {
        /// `menu_item` or `prepped_item` (default: all)
        #[arg(long = "type", value_name = "TYPE")]
        recipe_type: Option<RecipeType>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one recipe with its ingredient lines
    Show {
        id: i64,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a recipe and add its ingredients
    #[command(after_help = "\
Ingredients are KIND:ID=QTY, where KIND is `product` or `recipe` (a prepped
item). Prepped items can only be made of products.

Examples:
  galley recipes create --name \"Loaded Fries\" --ingredient product:9=6 --ingredient recipe:20=1.5
  galley recipes create --name Aioli --type prepped_item --ingredient product:31=8 --yes")]
    Create {
        #[arg(long)]
        name: String,

        /// `menu_item` or `prepped_item`
        #[arg(long = "type", value_name = "TYPE", default_value = "menu_item")]
        recipe_type: RecipeType,

        /// Ingredient line. Repeatable; added in the order given.
        #[arg(long = "ingredient", value_name = "KIND:ID=QTY")]
        ingredients: Vec<String>,

        /// Create without asking for confirmation
        #[arg(long, short = 'y')]
        yes: bool,

        /// Output the created recipe as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rename or retype a recipe, or change ingredient quantities
    #[command(after_help = "\
LINE is the ingredient line id shown by `galley recipes show`.

Examples:
  galley recipes edit 30 --name \"Fries Supreme\"
  galley recipes edit 30 --quantity 300=1.25 --quantity 301=2")]
    Edit {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        /// `menu_item` or `prepped_item`
        #[arg(long = "type", value_name = "TYPE")]
        recipe_type: Option<RecipeType>,

        /// New quantity for ingredient line LINE. Repeatable.
        #[arg(long = "quantity", value_name = "LINE=QTY")]
        quantities: Vec<String>,
    },

    /// Delete a recipe
    Delete {
        id: i64,

        /// Delete without asking for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

pub fn cmd_recipes(cmd: RecipesCommands) -> Result<(), CliError> {
    match cmd {
        RecipesCommands::List { recipe_type, json } => cmd_list(recipe_type, json),
        RecipesCommands::Show { id, json } => cmd_show(id, json),
        RecipesCommands::Create { name, recipe_type, ingredients, yes, json } => {
            let ingredients = ingredients
                .iter()
                .map(|raw| parse_ingredient_arg(raw))
                .collect::<Result<Vec<_>, _>>()?;
            cmd_create(NewRecipe { name, recipe_type, ingredients }, yes, json)
        }
        RecipesCommands::Edit { id, name, recipe_type, quantities } => {
            let edits = quantities
                .iter()
                .map(|raw| parse_assignment(raw))
                .collect::<Result<Vec<_>, _>>()?;
            cmd_edit(id, RecipePatch { name, recipe_type }, &edits)
        }
        RecipesCommands::Delete { id, yes } => cmd_delete(id, yes),
    }
}

fn cmd_list(recipe_type: Option<RecipeType>, json: bool) -> Result<(), CliError> {
    let settings = load_settings()?;
    let recipes = api_client(&settings)?
        .list_recipes(recipe_type)
        .map_err(CliError::client)?;

    if json {
        return print_json(&recipes);
    }
    if recipes.is_empty() {
        eprintln!("no recipes");
        return Ok(());
    }
    let width = column_width(recipes.iter().map(|r| r.name.as_str()), 8, 48);
    for r in &recipes {
        println!("{:>6}  {}  {}", r.id, pad_right(&r.name, width), r.recipe_type);
    }
    Ok(())
}

fn find_detail(details: Vec<RecipeDetail>, id: i64) -> Result<RecipeDetail, CliError> {
    details
        .into_iter()
        .find(|d| d.recipe.id == id)
        .ok_or_else(|| CliError::validation(ValidationError::UnknownRecipe(id)))
}

fn cmd_show(id: i64, json: bool) -> Result<(), CliError> {
    let settings = load_settings()?;
    let details = api_client(&settings)?
        .list_recipe_details(None)
        .map_err(CliError::client)?;
    let detail = find_detail(details, id)?;

    if json {
        return print_json(&detail);
    }
    println!("{} (id {}, {})", detail.recipe.name, detail.recipe.id, detail.recipe.recipe_type);
    if detail.recipe_ingredients.is_empty() {
        println!("  no ingredients");
        return Ok(());
    }
    let width = column_width(detail.recipe_ingredients.iter().map(|ri| ri.display_name()), 8, 40);
    for ri in &detail.recipe_ingredients {
        let unit = ri
            .ingredient
            .as_ref()
            .and_then(|i| i.unit)
            .map(|u| u.to_string())
            .unwrap_or_default();
        println!(
            "  {:>6}  {}  {:>8} {}",
            ri.id,
            pad_right(ri.display_name(), width),
            format_quantity(ri.quantity),
            unit
        );
    }
    Ok(())
}

fn cmd_create(draft: NewRecipe, yes: bool, json: bool) -> Result<(), CliError> {
    let settings = load_settings()?;
    let client = api_client(&settings)?;
    let products = client.list_products().map_err(CliError::client)?;
    let prepped = client
        .list_recipes(Some(RecipeType::PreppedItem))
        .map_err(CliError::client)?;

    let plan = validate_new_recipe(&draft, &products, &prepped).map_err(CliError::validation)?;

    if !json || !yes {
        eprintln!("About to create {} \"{}\" with:", plan.recipe_type, plan.name);
        let width = column_width(plan.ingredients.iter().map(|i| i.name.as_str()), 8, 40);
        for i in &plan.ingredients {
            eprintln!(
                "  {:<7}  {}  {:>8}",
                i.kind.to_string(),
                pad_right(&i.name, width),
                format_quantity(i.quantity)
            );
        }
    }
    if !yes && !confirm("Create this recipe?")? {
        eprintln!("Aborted; nothing was created.");
        return Ok(());
    }

    let composed =
        create_recipe(&draft, &products, &prepped, &client).map_err(CliError::composition)?;
    if json {
        return print_json(&composed);
    }
    println!(
        "Created recipe {} (id {}) with {} ingredient(s).",
        composed.recipe.name,
        composed.recipe.id,
        composed.ingredients.len()
    );
    Ok(())
}

fn cmd_edit(id: i64, patch: RecipePatch, edits: &[(i64, f64)]) -> Result<(), CliError> {
    if patch.is_empty() && edits.is_empty() {
        return Err(CliError::usage("nothing to change")
            .with_hint("pass --name, --type or --quantity LINE=QTY"));
    }
    let patch = patch.validated().map_err(CliError::validation)?;

    let settings = load_settings()?;
    let client = api_client(&settings)?;
    let details = client.list_recipe_details(None).map_err(CliError::client)?;
    let detail = find_detail(details, id)?;
    // Both checks run before the first write.
    validate_quantity_edits(&detail, edits).map_err(CliError::validation)?;

    if !patch.is_empty() {
        client
            .update_recipe(id, &patch)
            .map_err(|e| CliError::client_or(e, "Failed to update recipe"))?;
        println!(
            "Updated recipe {} (id {}).",
            patch.name.as_deref().unwrap_or(&detail.recipe.name),
            id
        );
    }
    if !edits.is_empty() {
        let applied = update_ingredient_quantities(&detail, edits, &client)
            .map_err(CliError::composition)?;
        for edit in &applied {
            eprintln!("  {}  {}", edit.name, format_quantity(edit.quantity));
        }
        println!("Updated {} ingredient quantity(ies).", applied.len());
    }
    Ok(())
}

fn cmd_delete(id: i64, yes: bool) -> Result<(), CliError> {
    let settings = load_settings()?;
    let client = api_client(&settings)?;
    let recipes = client.list_recipes(None).map_err(CliError::client)?;
    let recipe = recipes
        .iter()
        .find(|r| r.id == id)
        .ok_or_else(|| CliError::validation(ValidationError::UnknownRecipe(id)))?;

    if !yes && !confirm(&format!("Delete recipe {} (id {})?", recipe.name, id))? {
        eprintln!("Aborted; nothing was deleted.");
        return Ok(());
    }
    client
        .delete_recipe(id)
        .map_err(|e| CliError::client_or(e, "Failed to delete recipe"))?;
    println!("Deleted recipe {} (id {}).", recipe.name, id);
    Ok(())
}
