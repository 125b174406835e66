//! `galley login` and `galley logout`: API token storage.

use std::io::{self, Write};

use galley_client::{delete_auth, parse_base_url, save_auth, AuthCredentials};
use galley_config::Settings;

use crate::CliError;

pub fn cmd_login(token: Option<String>, api_url: Option<String>) -> Result<(), CliError> {
    // Nothing is written when the URL is bad.
    if let Some(url) = &api_url {
        parse_base_url(url).map_err(|e| {
            CliError::usage(e.to_string()).with_hint("expected e.g. https://inventory.example.com")
        })?;
    }

    // Resolve token: --token flag > interactive prompt > piped stdin
    let token = match token {
        Some(t) => t,
        None => read_token()?,
    };
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(CliError::usage("no token provided").with_hint("pass --token or pipe it on stdin"));
    }

    let creds = AuthCredentials {
        token,
        saved_at: Some(chrono::Utc::now().to_rfc3339()),
    };
    let path = save_auth(&creds).map_err(CliError::client)?;
    eprintln!("Token saved to {}", path.display());

    if let Some(url) = api_url {
        // Persist only what is in the file; environment overrides stay out of it.
        let config_path = Settings::config_path()
            .ok_or_else(|| CliError::general("could not determine config directory"))?;
        let mut settings = Settings::load_from(&config_path).map_err(CliError::config)?;
        settings.api_url = url.trim().to_string();
        let path = settings.save().map_err(CliError::config)?;
        eprintln!("API URL set to {} in {}", settings.api_url, path.display());
    }
    Ok(())
}

fn read_token() -> Result<String, CliError> {
    if atty::is(atty::Stream::Stdin) {
        eprint!("Inventory API token: ");
        io::stderr().flush().ok();
    }
    let mut buf = String::new();
    io::stdin()
        .read_line(&mut buf)
        .map_err(|e| CliError::general(e.to_string()))?;
    Ok(buf)
}

pub fn cmd_logout() -> Result<(), CliError> {
    if delete_auth().map_err(CliError::client)? {
        eprintln!("Logged out");
    } else {
        eprintln!("No saved token");
    }
    if std::env::var(galley_client::TOKEN_ENV).is_ok_and(|t| !t.trim().is_empty()) {
        eprintln!("note: {} is still set in the environment", galley_client::TOKEN_ENV);
    }
    Ok(())
}
