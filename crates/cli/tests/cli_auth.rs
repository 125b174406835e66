// End-to-end tests for `galley login` / `galley logout`. Both only touch
// files under GALLEY_CONFIG_DIR.

use std::process::{Command, Output};

use httpmock::prelude::*;
use tempfile::TempDir;

fn galley(server: &MockServer, dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_galley"));
    cmd.env("GALLEY_CONFIG_DIR", dir.path())
        .env("GALLEY_API_URL", server.base_url())
        .env_remove("GALLEY_TOKEN")
        .env_remove("GALLEY_LOG");
    cmd
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn login_then_logout_manages_the_token_file() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();

    let out = galley(&server, &dir)
        .args(["login", "--token", "secret", "--api-url", "https://inventory.test"])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let auth: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("auth.json")).unwrap())
            .unwrap();
    assert_eq!(auth["token"], "secret");
    let config = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(config.contains("https://inventory.test"), "{config}");

    let out = galley(&server, &dir).arg("logout").output().unwrap();
    assert!(out.status.success());
    assert!(!dir.path().join("auth.json").exists());
}

#[test]
fn login_rejects_a_bad_api_url_without_writing_anything() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();

    for bad in ["inventory.test", "ftp://inventory.test"] {
        let out = galley(&server, &dir)
            .args(["login", "--token", "secret", "--api-url", bad])
            .output()
            .unwrap();

        assert_eq!(out.status.code(), Some(2), "stderr: {}", stderr(&out));
        assert!(stderr(&out).contains("invalid API URL"), "{}", stderr(&out));
    }
    assert!(!dir.path().join("auth.json").exists());
    assert!(!dir.path().join("config.toml").exists());
}
