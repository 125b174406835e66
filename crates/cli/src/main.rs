// galley CLI - sales-report depletion, stock replenishment and catalog upkeep against the inventory API

mod account;
mod auth;
mod deplete;
mod exit_codes;
mod products;
mod recipes;
mod replenish;
mod util;

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use galley_client::{ApiClient, ClientError};
use galley_config::{ConfigError, Settings};
use galley_recon::{CompositionError, ReconError, SubmitError, ValidationError};

use exit_codes::{
    client_exit_code, EXIT_BACKEND, EXIT_CONFIG, EXIT_CSV, EXIT_ERROR, EXIT_NOT_AUTH,
    EXIT_SUCCESS, EXIT_USAGE, EXIT_VALIDATION,
};

use account::AccountCommands;
use deplete::DepleteCommands;
use products::ProductsCommands;
use recipes::RecipesCommands;

const LOG_ENV: &str = "GALLEY_LOG";

#[derive(Parser)]
#[command(name = "galley")]
#[command(about = "Deplete inventory from POS sales reports and replenish stock")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log filter (e.g. `debug`, `galley_client=trace`). Overrides $GALLEY_LOG; default `warn`.
    #[arg(long, global = true, value_name = "FILTER")]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a sales CSV against menu items and deplete their ingredients
    Deplete {
        #[command(subcommand)]
        command: DepleteCommands,
    },

    /// List, create, edit and delete recipes
    Recipes {
        #[command(subcommand)]
        command: RecipesCommands,
    },

    /// List, create, edit and delete products
    Products {
        #[command(subcommand)]
        command: ProductsCommands,
    },

    /// Show or change the restaurant account
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },

    /// Add stock to products picked by id or by barcode
    #[command(after_help = "\
Examples:
  galley replenish --barcode 0123456789012=24
  galley replenish --set 4=12 --set 9=3.5 --yes
  galley replenish --barcode 0123 --barcode 777 --set 4=24 --drafts-out new-products.json")]
    Replenish(replenish::ReplenishArgs),

    /// Save an API token for later commands
    #[command(after_help = "\
Examples:
  galley login --token eyJhbGciOi...
  galley login --api-url https://inventory.example.com
  echo $TOKEN | galley login")]
    Login {
        /// Bearer token (prompted for when omitted and stdin is a TTY)
        #[arg(long)]
        token: Option<String>,

        /// Also store this API base URL in config.toml
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },

    /// Remove the saved API token
    Logout,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GALLEY_GIT_HASH"), ")",
        "\nengine:  galley-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("GALLEY_TARGET"),
    )
}

fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(f) => EnvFilter::try_new(f).unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    // Logs go to stderr; stdout carries command output only.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    let result = match cli.command {
        Commands::Deplete { command } => deplete::cmd_deplete(command),
        Commands::Recipes { command } => recipes::cmd_recipes(command),
        Commands::Products { command } => products::cmd_products(command),
        Commands::Account { command } => account::cmd_account(command),
        Commands::Replenish(args) => replenish::cmd_replenish(args),
        Commands::Login { token, api_url } => auth::cmd_login(token, api_url),
        Commands::Logout => auth::cmd_logout(),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn csv(err: ReconError) -> Self {
        Self::new(EXIT_CSV, err.to_string())
    }

    pub fn config(err: ConfigError) -> Self {
        Self::new(EXIT_CONFIG, err.to_string()).with_hint(format!(
            "check {} or the GALLEY_* environment variables",
            Settings::config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "config.toml".into())
        ))
    }

    pub fn validation(err: ValidationError) -> Self {
        Self::new(EXIT_VALIDATION, err.to_string())
    }

    /// Create error from an API client error with the registry's exit code.
    pub fn client(err: ClientError) -> Self {
        let code = client_exit_code(&err);
        let hint = match &err {
            ClientError::NotAuthenticated => Some("run `galley login` or set GALLEY_TOKEN".to_string()),
            ClientError::Network(_) => Some("is the inventory API running? check `api_url` in config.toml".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Create error from a failed submission batch.
    pub fn submit(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(v) => Self::validation(v),
            SubmitError::Backend { status: Some(401), message, .. } => Self {
                code: EXIT_NOT_AUTH,
                message,
                hint: Some("run `galley login` or set GALLEY_TOKEN".into()),
            },
            SubmitError::Backend { failed, message, completed, .. } => {
                let hint = if completed.is_empty() {
                    None
                } else {
                    Some(format!(
                        "{} line(s) before \"{}\" were already applied; do not resubmit them",
                        completed.len(),
                        failed.name
                    ))
                };
                Self { code: EXIT_BACKEND, message, hint }
            }
        }
    }

    /// Like [`CliError::client`], with `fallback` standing in for an empty
    /// server message.
    pub fn client_or(err: ClientError, fallback: &str) -> Self {
        match err {
            ClientError::Http { status, error: None } => Self::client(ClientError::Http {
                status,
                error: Some(fallback.to_string()),
            }),
            other => Self::client(other),
        }
    }

    /// Create error from a failed recipe composition or ingredient edit.
    pub fn composition(err: CompositionError) -> Self {
        let auth = |message: String| Self {
            code: EXIT_NOT_AUTH,
            message,
            hint: Some("run `galley login` or set GALLEY_TOKEN".into()),
        };
        match err {
            CompositionError::Validation(v) => Self::validation(v),
            CompositionError::RecipeRejected { status: Some(401), message }
            | CompositionError::IngredientRejected { status: Some(401), message, .. }
            | CompositionError::QuantityRejected { status: Some(401), message, .. } => auth(message),
            CompositionError::RecipeRejected { message, .. } => Self::new(EXIT_BACKEND, message),
            CompositionError::IngredientRejected { recipe, failed, message, added, .. } => {
                Self::new(EXIT_BACKEND, message).with_hint(format!(
                    "recipe \"{}\" (id {}) was created with {} ingredient(s) but not \"{}\"; \
                     remove it with `galley recipes delete {}` before retrying",
                    recipe.name,
                    recipe.id,
                    added.len(),
                    failed.name,
                    recipe.id
                ))
            }
            CompositionError::QuantityRejected { message, updated, .. } => {
                let err = Self::new(EXIT_BACKEND, message);
                if updated.is_empty() {
                    err
                } else {
                    err.with_hint(format!("{} quantity edit(s) before it were already applied", updated.len()))
                }
            }
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ── Shared command plumbing ─────────────────────────────────────────

pub(crate) fn load_settings() -> Result<Settings, CliError> {
    Settings::load().map_err(CliError::config)
}

pub(crate) fn api_client(settings: &Settings) -> Result<ApiClient, CliError> {
    let token = galley_client::resolve_token();
    if token.is_none() {
        log::debug!("no API token configured; sending unauthenticated requests");
    }
    ApiClient::new(
        &settings.api_url,
        token,
        Duration::from_secs(settings.request_timeout_secs),
    )
    .map_err(CliError::client)
}

pub(crate) fn write_output_file(path: &Path, contents: &str) -> Result<(), CliError> {
    std::fs::write(path, contents)
        .map_err(|e| CliError::general(format!("cannot write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use galley_recon::StagedLine;

    fn line(id: i64, name: &str) -> StagedLine {
        StagedLine { id, name: name.into(), quantity: 1.0 }
    }

    #[test]
    fn partial_failure_hints_at_applied_lines() {
        let err = CliError::submit(SubmitError::Backend {
            failed: line(2, "Fries"),
            status: Some(409),
            message: "Not enough potatoes".into(),
            completed: vec![line(1, "Cheeseburger")],
        });
        assert_eq!(err.code, EXIT_BACKEND);
        assert_eq!(err.message, "Not enough potatoes");
        assert!(err.hint.unwrap().contains("1 line(s) before \"Fries\""));
    }

    #[test]
    fn unauthorized_mid_batch_is_auth_error() {
        let err = CliError::submit(SubmitError::Backend {
            failed: line(1, "Cheeseburger"),
            status: Some(401),
            message: "Unauthorized".into(),
            completed: vec![],
        });
        assert_eq!(err.code, EXIT_NOT_AUTH);
    }

    #[test]
    fn validation_before_network_has_its_own_code() {
        let err = CliError::submit(SubmitError::Validation(ValidationError::NoRecipeSelected));
        assert_eq!(err.code, EXIT_VALIDATION);
        assert_eq!(err.message, "no recipe selected");
    }

    #[test]
    fn partial_recipe_names_the_cleanup() {
        use galley_recon::{IngredientKind, Recipe, RecipeType, ResolvedIngredient};

        let err = CliError::composition(CompositionError::IngredientRejected {
            recipe: Recipe { id: 40, name: "Burger Deluxe".into(), recipe_type: RecipeType::MenuItem },
            failed: ResolvedIngredient {
                kind: IngredientKind::Recipe,
                id: 20,
                name: "Aioli".into(),
                quantity: 0.5,
            },
            status: Some(422),
            message: "Failed to create recipe".into(),
            added: vec![],
        });
        assert_eq!(err.code, EXIT_BACKEND);
        assert!(err.hint.unwrap().contains("galley recipes delete 40"));
    }

    #[test]
    fn silent_http_failure_uses_the_fallback() {
        let err = CliError::client_or(ClientError::Http { status: 500, error: None }, "Failed to delete recipe");
        assert_eq!(err.code, EXIT_BACKEND);
        assert_eq!(err.message, "Failed to delete recipe");

        let kept = CliError::client_or(
            ClientError::Http { status: 422, error: Some("Recipe is in use".into()) },
            "Failed to delete recipe",
        );
        assert_eq!(kept.message, "Recipe is in use");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
