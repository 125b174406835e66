// End-to-end tests for product, recipe and account maintenance commands.

use std::process::{Command, Output};

use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn galley(server: &MockServer, dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_galley"));
    cmd.env("GALLEY_CONFIG_DIR", dir.path())
        .env("GALLEY_API_URL", server.base_url())
        .env("GALLEY_TOKEN", "tok")
        .env_remove("GALLEY_LOG");
    cmd
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn mock_catalog(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/products");
        then.status(200).json_body(json!([
            { "id": 4, "name": "Buns", "unit": "pcs", "stock_quantity": "40.0", "unit_cost": "0.45" },
            { "id": 9, "name": "Potatoes", "unit": "oz" }
        ]));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/recipes")
            .query_param("recipe_type", "prepped_item");
        then.status(200).json_body(json!([{ "id": 20, "name": "Aioli" }]));
    });
}

#[test]
fn product_create_sends_the_product_body() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    let create = server.mock(|when, then| {
        when.method(POST).path("/products").json_body(json!({
            "product": {
                "name": "Brioche Buns",
                "unit": "pcs",
                "stock_quantity": 48.0,
                "unit_cost": 0.45,
                "category": "Bakery"
            }
        }));
        then.status(201).json_body(json!({ "id": 12, "name": "Brioche Buns", "unit": "pcs" }));
    });

    let out = galley(&server, &dir)
        .args([
            "products", "create", "--name", " Brioche Buns ", "--unit", "pcs", "--stock", "48",
            "--cost", "0.45", "--category", "Bakery", "--json",
        ])
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    create.assert();
    let product: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(product["id"], 12);
}

#[test]
fn product_create_rejects_negative_cost_offline() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    let create = server.mock(|when, then| {
        when.method(POST).path("/products");
        then.status(201);
    });

    let out = galley(&server, &dir)
        .args(["products", "create", "--name", "Buns", "--stock", "1", "--cost=-2"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(4), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("Unit cost must be zero or more"));
    create.assert_calls(0);
}

#[test]
fn product_edit_and_delete() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_catalog(&server);
    let edit = server.mock(|when, then| {
        when.method("PATCH")
            .path("/products/4")
            .json_body(json!({ "product": { "unit_cost": 0.5, "category": "" } }));
        then.status(200).json_body(json!({ "id": 4, "name": "Buns" }));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/products/4");
        then.status(500);
    });

    let out = galley(&server, &dir)
        .args(["products", "edit", "4", "--cost", "0.5", "--category", ""])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    edit.assert();
    assert!(String::from_utf8_lossy(&out.stdout).contains("Updated product Buns (id 4)."));

    let out = galley(&server, &dir)
        .args(["products", "delete", "4", "--yes"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(5), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("Failed to delete product"));
    delete.assert();
}

#[test]
fn deleting_an_unlisted_product_makes_no_call() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_catalog(&server);
    let delete = server.mock(|when, then| {
        when.method(DELETE).path_includes("/products/");
        then.status(204);
    });

    let out = galley(&server, &dir)
        .args(["products", "delete", "55", "--yes"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(4), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("unknown product id 55"));
    delete.assert_calls(0);
}

#[test]
fn recipe_create_mixes_products_and_prepped_items() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_catalog(&server);
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/recipes")
            .json_body(json!({ "recipe": { "name": "Loaded Fries", "recipe_type": "menu_item" } }));
        then.status(201)
            .json_body(json!({ "id": 30, "name": "Loaded Fries", "recipe_type": "menu_item" }));
    });
    let potatoes = server.mock(|when, then| {
        when.method(POST).path("/recipes/30/recipe_ingredients").json_body(json!({
            "recipe_ingredient": { "ingredient_id": 9, "ingredient_type": "Product", "quantity": 6 }
        }));
        then.status(201).json_body(json!({ "id": 300 }));
    });
    let aioli = server.mock(|when, then| {
        when.method(POST).path("/recipes/30/recipe_ingredients").json_body(json!({
            "recipe_ingredient": { "ingredient_id": 20, "ingredient_type": "Recipe", "quantity": 1.5 }
        }));
        then.status(201).json_body(json!({ "id": 301 }));
    });

    let out = galley(&server, &dir)
        .args([
            "recipes", "create", "--name", "Loaded Fries", "--ingredient", "product:9=6",
            "--ingredient", "recipe:20=1.5", "--yes", "--json",
        ])
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    create.assert();
    potatoes.assert();
    aioli.assert();
    let result: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(result["recipe"]["id"], 30);
    assert_eq!(result["ingredients"][1]["name"], "Aioli");
}

#[test]
fn prepped_item_cannot_contain_a_prepped_item() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_catalog(&server);
    let create = server.mock(|when, then| {
        when.method(POST).path("/recipes");
        then.status(201);
    });

    let out = galley(&server, &dir)
        .args([
            "recipes", "create", "--name", "Garlic Aioli", "--type", "prepped_item",
            "--ingredient", "recipe:20=1", "--yes",
        ])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(4), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("Prepped items can only use products as ingredients"));
    create.assert_calls(0);
}

#[test]
fn recipe_create_needs_an_ingredient() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_catalog(&server);

    let out = galley(&server, &dir)
        .args(["recipes", "create", "--name", "Air", "--yes"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(4), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("Please select at least one ingredient"));
}

#[test]
fn recipe_edit_renames_then_updates_quantities() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    server.mock(|when, then| {
        when.method(GET).path("/recipes");
        then.status(200).json_body(json!([{
            "id": 30, "name": "Loaded Fries", "recipe_type": "menu_item",
            "recipe_ingredients": [
                { "id": 300, "quantity": "6.0", "ingredient": { "name": "Potatoes", "unit": "oz" } },
                { "id": 301, "quantity": "1.5", "ingredient": { "name": "Aioli" } }
            ]
        }]));
    });
    let rename = server.mock(|when, then| {
        when.method("PATCH")
            .path("/recipes/30")
            .json_body(json!({ "recipe": { "name": "Fries Supreme" } }));
        then.status(200).json_body(json!({ "id": 30, "name": "Fries Supreme" }));
    });
    let quantity = server.mock(|when, then| {
        when.method("PATCH")
            .path("/recipes/30/recipe_ingredients/301")
            .json_body(json!({ "recipe_ingredient": { "quantity": 2 } }));
        then.status(200).json_body(json!({ "id": 301 }));
    });

    let out = galley(&server, &dir)
        .args(["recipes", "edit", "30", "--name", "Fries Supreme", "--quantity", "301=2"])
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    rename.assert();
    quantity.assert();
}

#[test]
fn recipe_edit_checks_lines_before_writing() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    server.mock(|when, then| {
        when.method(GET).path("/recipes");
        then.status(200).json_body(json!([{ "id": 30, "name": "Loaded Fries" }]));
    });
    let rename = server.mock(|when, then| {
        when.method("PATCH").path_includes("/recipes/30");
        then.status(200);
    });

    let out = galley(&server, &dir)
        .args(["recipes", "edit", "30", "--name", "Fries Supreme", "--quantity", "999=2"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(4), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("recipe 30 has no ingredient line 999"));
    rename.assert_calls(0);
}

#[test]
fn recipe_delete_keeps_server_message() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    server.mock(|when, then| {
        when.method(GET).path("/recipes");
        then.status(200).json_body(json!([{ "id": 30, "name": "Loaded Fries" }]));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/recipes/30");
        then.status(422).json_body(json!({ "error": "Recipe is used by Combo #2" }));
    });

    let out = galley(&server, &dir)
        .args(["recipes", "delete", "30", "--yes"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(5), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("Recipe is used by Combo #2"));
    delete.assert();
}

#[test]
fn recipe_show_lists_ingredient_lines() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    server.mock(|when, then| {
        when.method(GET).path("/recipes");
        then.status(200).json_body(json!([{
            "id": 30, "name": "Loaded Fries", "recipe_type": "menu_item",
            "recipe_ingredients": [
                { "id": 300, "quantity": "6.0", "ingredient": { "name": "Potatoes", "unit": "oz" } }
            ]
        }]));
    });

    let out = galley(&server, &dir)
        .args(["recipes", "show", "30"])
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Loaded Fries (id 30, menu_item)"));
    assert!(stdout.contains("300"));
    assert!(stdout.contains("Potatoes"));
}

#[test]
fn account_update_keeps_unchanged_fields() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    server.mock(|when, then| {
        when.method(GET).path("/me");
        then.status(200).json_body(json!({
            "id": 1, "name": "Corner Diner", "email": "ops@corner.test",
            "logo_url": "https://cdn.test/logo.png"
        }));
    });
    let update = server.mock(|when, then| {
        when.method("PATCH").path("/me").json_body(json!({
            "name": "Corner Diner & Bar",
            "email": "ops@corner.test",
            "logo_url": "https://cdn.test/logo.png"
        }));
        then.status(200).json_body(json!({ "id": 1, "name": "Corner Diner & Bar" }));
    });

    let out = galley(&server, &dir)
        .args(["account", "update", "--name", "Corner Diner & Bar"])
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    update.assert();
    assert!(String::from_utf8_lossy(&out.stdout).contains("Settings updated successfully"));
}
