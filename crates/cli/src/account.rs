//! `galley account`: the restaurant profile behind `/me`.

use std::path::{Path, PathBuf};

use base64::Engine;
use clap::Subcommand;

use galley_client::{Account, AccountUpdate};

use crate::util::print_json;
use crate::{api_client, load_settings, CliError};

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Show the restaurant name, email and logo
    Show {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Change the restaurant name, email or logo
    #[command(after_help = "\
Examples:
  galley account update --name \"Corner Diner & Bar\"
  galley account update --logo ./logo.png
  galley account update --logo-url https://cdn.example.com/logo.png")]
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Image file to upload as the logo (png, jpg, gif, webp, svg)
        #[arg(long, value_name = "FILE", conflicts_with = "logo_url")]
        logo: Option<PathBuf>,

        /// Logo already hosted elsewhere
        #[arg(long, value_name = "URL")]
        logo_url: Option<String>,

        /// Output the saved account as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn cmd_account(cmd: AccountCommands) -> Result<(), CliError> {
    match cmd {
        AccountCommands::Show { json } => {
            let settings = load_settings()?;
            let account = api_client(&settings)?
                .get_account()
                .map_err(CliError::client)?;
            if json {
                return print_json(&account);
            }
            print_account(&account);
            Ok(())
        }
        AccountCommands::Update { name, email, logo, logo_url, json } => {
            let logo_url = match logo {
                Some(path) => Some(logo_data_url(&path)?),
                None => logo_url,
            };
            let update = AccountUpdate { name, email, logo_url };
            check_update(&update)?;

            let settings = load_settings()?;
            let client = api_client(&settings)?;
            let current = client.get_account().map_err(CliError::client)?;
            let body = update.merged_over(&current);
            let saved = client
                .update_account(&body)
                .map_err(|e| CliError::client_or(e, "Failed to update settings"))?;

            if json {
                return match saved {
                    Some(account) => print_json(&account),
                    None => print_json(&body),
                };
            }
            println!("Settings updated successfully");
            Ok(())
        }
    }
}

fn print_account(account: &Account) {
    println!("name:   {}", account.name);
    println!("email:  {}", account.email);
    match account.logo_url.as_deref() {
        Some(url) if url.starts_with("data:") => println!("logo:   (uploaded image)"),
        Some(url) => println!("logo:   {}", url),
        None => println!("logo:   (none)"),
    }
}

fn check_update(update: &AccountUpdate) -> Result<(), CliError> {
    if update.is_empty() {
        return Err(CliError::usage("nothing to change")
            .with_hint("pass --name, --email, --logo or --logo-url"));
    }
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(CliError::usage("name cannot be empty"));
    }
    if let Some(email) = update.email.as_deref() {
        if !email.trim().contains('@') {
            return Err(CliError::usage(format!("invalid email \"{}\"", email.trim())));
        }
    }
    Ok(())
}

/// Inline an image file as a `data:` URL.
fn logo_data_url(path: &Path) -> Result<String, CliError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => {
            return Err(CliError::usage(format!(
                "unsupported logo file type: {}",
                path.display()
            ))
            .with_hint("use a png, jpg, gif, webp or svg image"))
        }
    };
    let bytes = std::fs::read(path)
        .map_err(|e| CliError::general(format!("cannot read {}: {}", path.display(), e)))?;
    let b64 = base64::engine::general_purpose::STANDARD;
    Ok(format!("data:{};base64,{}", mime, b64.encode(bytes)))
}
