// End-to-end tests for `galley replenish` and `galley products list`,
// isolated through GALLEY_CONFIG_DIR.

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

fn mock_products(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path("/products");
        then.status(200).json_body(json!([
            { "id": 4, "name": "Buns", "unit": "pcs", "category": "Bakery", "barcode": "0123" },
            { "id": 9, "name": "cheddar", "unit": "oz", "category": "Dairy" },
            { "id": 7, "name": "Napkins" }
        ]));
    })
}

#[test]
fn barcode_and_id_lines_are_submitted_in_order() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_products(&server);
    server.mock(|when, then| {
        when.method(GET).path("/products/by-barcode/0123");
        then.status(200)
            .json_body(json!({ "id": 4, "name": "Buns", "unit": "pcs", "barcode": "0123" }));
    });
    let buns = server.mock(|when, then| {
        when.method(POST)
            .path("/products/4/replenish")
            .json_body(json!({ "quantity": 24 }));
        then.status(204);
    });
    let cheddar = server.mock(|when, then| {
        when.method(POST)
            .path("/products/9/replenish")
            .json_body(json!({ "quantity": 3.5 }));
        then.status(204);
    });

    let out = galley(&server, &dir)
        .args(["replenish", "--barcode", "0123=24", "--set", "9=3.5", "--yes", "--json"])
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    buns.assert();
    cheddar.assert();
    let result: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(result["ok"], true);
    assert_eq!(result["lines"][0]["name"], "Buns");
    assert_eq!(result["lines"][1]["name"], "cheddar");
    assert_eq!(result["drafts"], json!([]));
}

#[test]
fn unknown_barcodes_become_drafts() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_products(&server);
    server.mock(|when, then| {
        when.method(GET).path("/products/by-barcode/777");
        then.status(404).json_body(json!({ "error": "Not found" }));
    });
    let replenish = server.mock(|when, then| {
        when.method(POST).path_includes("/replenish");
        then.status(204);
    });
    let drafts_path = dir.path().join("drafts.json");

    let out = galley(&server, &dir)
        .args(["replenish", "--barcode", "777", "--barcode", "777", "--drafts-out"])
        .arg(&drafts_path)
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    replenish.assert_calls(0);
    let drafts: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&drafts_path).unwrap()).unwrap();
    assert_eq!(drafts, json!([{ "barcode": "777", "name": "" }]));
}

#[test]
fn quantity_on_unknown_barcode_is_reported_not_dropped() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_products(&server);
    server.mock(|when, then| {
        when.method(GET).path("/products/by-barcode/777");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/products/by-barcode/0123");
        then.status(200).json_body(json!({ "id": 4, "name": "Buns" }));
    });
    let buns = server.mock(|when, then| {
        when.method(POST)
            .path("/products/4/replenish")
            .json_body(json!({ "quantity": 6 }));
        then.status(204);
    });

    let out = galley(&server, &dir)
        .args(["replenish", "--barcode", "777=12", "--barcode", "0123=6", "--yes"])
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    buns.assert();
    assert!(
        stderr(&out).contains("warning: 777: quantity 12 ignored, no product with this barcode"),
        "stderr: {}",
        stderr(&out)
    );
}

#[test]
fn missing_quantity_names_the_product() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_products(&server);
    server.mock(|when, then| {
        when.method(GET).path("/products/by-barcode/0123");
        then.status(200).json_body(json!({ "id": 4, "name": "Buns" }));
    });

    let out = galley(&server, &dir)
        .args(["replenish", "--barcode", "0123", "--yes"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(4), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("Quantity is required for Buns"));
}

#[test]
fn set_for_unlisted_product_is_rejected() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_products(&server);

    let out = galley(&server, &dir)
        .args(["replenish", "--set", "55=1", "--yes"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(4), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("unknown product id 55"));
}

#[test]
fn replenish_failure_keeps_server_message() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_products(&server);
    server.mock(|when, then| {
        when.method(POST).path("/products/4/replenish");
        then.status(500);
    });

    let out = galley(&server, &dir)
        .args(["replenish", "--set", "4=10", "--yes"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(5), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("Failed to replenish inventory"));
}

#[test]
fn products_are_grouped_by_category() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_products(&server);

    let out = galley(&server, &dir)
        .args(["products", "list", "--json"])
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let groups: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let names: Vec<&str> = groups
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Bakery", "Dairy", "No Category"]);
}
