//! Token storage.
//!
//! Reads/writes auth.json in the galley config directory (0600 on Unix).
//! `GALLEY_TOKEN` in the environment takes precedence over the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::client::ClientError;

pub const TOKEN_ENV: &str = "GALLEY_TOKEN";

/// Authentication credentials stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredentials {
    /// Bearer token for the inventory API
    pub token: String,
    /// When the token was saved (RFC 3339), for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

impl AuthCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            saved_at: None,
        }
    }
}

/// Returns the path to the auth credentials file.
pub fn auth_file_path() -> Option<PathBuf> {
    galley_config::config_dir().map(|d| d.join("auth.json"))
}

/// Load saved auth credentials from the default location.
/// Returns None if nothing is saved or the file is invalid.
pub fn load_auth() -> Option<AuthCredentials> {
    load_auth_from(&auth_file_path()?)
}

pub fn load_auth_from(path: &Path) -> Option<AuthCredentials> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<AuthCredentials>(&contents) {
        Ok(creds) if !creds.token.trim().is_empty() => Some(creds),
        Ok(_) => None,
        Err(e) => {
            log::warn!("ignoring unreadable credentials at {}: {}", path.display(), e);
            None
        }
    }
}

/// The token to send: `GALLEY_TOKEN` if set and non-blank, else the saved one.
pub fn resolve_token() -> Option<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            return Some(token.trim().to_string());
        }
    }
    load_auth().map(|c| c.token)
}

/// Save auth credentials to the default location.
pub fn save_auth(creds: &AuthCredentials) -> Result<PathBuf, ClientError> {
    let path = auth_file_path()
        .ok_or_else(|| ClientError::Io("could not determine config directory".into()))?;
    save_auth_to(&path, creds)?;
    Ok(path)
}

/// Write credentials, creating the parent directory. 0600 on Unix.
pub fn save_auth_to(path: &Path, creds: &AuthCredentials) -> Result<(), ClientError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ClientError::Io(format!("failed to create config directory: {}", e)))?;
    }

    let contents = serde_json::to_string_pretty(creds)
        .map_err(|e| ClientError::Parse(format!("failed to serialize credentials: {}", e)))?;

    std::fs::write(path, contents)
        .map_err(|e| ClientError::Io(format!("failed to write auth file: {}", e)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)
            .map_err(|e| ClientError::Io(format!("failed to set file permissions: {}", e)))?;
    }

    Ok(())
}

/// Delete saved credentials. Returns whether a file was removed.
pub fn delete_auth() -> Result<bool, ClientError> {
    match auth_file_path() {
        Some(path) => delete_auth_at(&path),
        None => Ok(false),
    }
}

pub fn delete_auth_at(path: &Path) -> Result<bool, ClientError> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path)
        .map_err(|e| ClientError::Io(format!("failed to delete auth file: {}", e)))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_missing_optional_fields() {
        let parsed: AuthCredentials = serde_json::from_str(r#"{"token":"tok"}"#).unwrap();
        assert_eq!(parsed.token, "tok");
        assert!(parsed.saved_at.is_none());
    }

    #[test]
    fn auth_file_path_lives_in_config_dir() {
        let path = auth_file_path().unwrap();
        assert_eq!(path.parent(), galley_config::config_dir().as_deref());
        assert!(path.ends_with("auth.json"));
    }

    #[test]
    fn save_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("auth.json");

        let creds = AuthCredentials {
            token: "tok123".into(),
            saved_at: Some("2026-01-05T10:00:00+00:00".into()),
        };
        save_auth_to(&path, &creds).unwrap();
        assert_eq!(load_auth_from(&path), Some(creds));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        assert!(delete_auth_at(&path).unwrap());
        assert!(!delete_auth_at(&path).unwrap());
        assert!(load_auth_from(&path).is_none());
    }

    #[test]
    fn garbage_and_blank_tokens_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");

        std::fs::write(&path, "not json").unwrap();
        assert!(load_auth_from(&path).is_none());

        std::fs::write(&path, r#"{"token":"  "}"#).unwrap();
        assert!(load_auth_from(&path).is_none());
    }
}
