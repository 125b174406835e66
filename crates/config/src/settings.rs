// Application settings
// Loaded from <config_dir>/galley/config.toml, then overridden from the environment

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides the whole config directory (settings and credentials).
pub const CONFIG_DIR_ENV: &str = "GALLEY_CONFIG_DIR";
pub const API_URL_ENV: &str = "GALLEY_API_URL";
pub const PREVIEW_LIMIT_ENV: &str = "GALLEY_PREVIEW_LIMIT";

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("cannot read {path}: {message}")]
    Read { path: String, message: String },
    #[error("invalid settings in {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("cannot write {path}: {message}")]
    Write { path: String, message: String },
}

/// `$GALLEY_CONFIG_DIR`, else `<config_dir>/galley`.
pub fn config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|c| c.join("galley")),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the inventory API
    pub api_url: String,

    /// Entries shown in matched/unmatched previews before "+N more"
    pub preview_limit: usize,

    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            preview_limit: 10,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|d| d.join("config.toml"))
    }

    /// Load settings from disk and the environment. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = match Self::config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Load one settings file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let settings: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        settings.check()?;
        Ok(settings)
    }

    /// Apply `GALLEY_API_URL` / `GALLEY_PREVIEW_LIMIT` as seen through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(PREVIEW_LIMIT_ENV).filter(|v| !v.trim().is_empty()) {
            self.preview_limit = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: PREVIEW_LIMIT_ENV.into(),
                message: format!("expected a positive integer, got \"{}\"", raw),
            })?;
        }
        self.check()
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "api_url".into(),
                message: "must not be empty".into(),
            });
        }
        if self.preview_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "preview_limit".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Save current settings to the default location.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |e: &dyn std::fmt::Display| ConfigError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(&e))?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| write_err(&e))?;
        fs::write(path, contents).map_err(|e| write_err(&e))
    }
}
