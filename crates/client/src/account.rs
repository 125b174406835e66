//! Restaurant account shown and edited through `/me`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Account fields to change. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    /// An `https://` URL or a `data:` URL with the image inlined.
    pub logo_url: Option<String>,
}

/// Body of `PATCH /me`. The endpoint replaces all three fields at once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountBody {
    pub name: String,
    pub email: String,
    pub logo_url: Option<String>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Fill unset fields from `current`.
    pub fn merged_over(&self, current: &Account) -> AccountBody {
        AccountBody {
            name: self
                .name
                .as_deref()
                .map(str::trim)
                .unwrap_or(&current.name)
                .to_string(),
            email: self
                .email
                .as_deref()
                .map(str::trim)
                .unwrap_or(&current.email)
                .to_string(),
            logo_url: self.logo_url.clone().or_else(|| current.logo_url.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> Account {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "Corner Diner",
            "email": "ops@corner.test",
            "logo_url": "https://cdn.test/logo.png",
            "created_at": "2026-01-02T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn unset_fields_keep_current_values() {
        let update = AccountUpdate {
            name: Some(" Corner Diner & Bar ".into()),
            ..AccountUpdate::default()
        };
        let body = update.merged_over(&current());
        assert_eq!(body.name, "Corner Diner & Bar");
        assert_eq!(body.email, "ops@corner.test");
        assert_eq!(body.logo_url.as_deref(), Some("https://cdn.test/logo.png"));
    }

    #[test]
    fn account_without_logo_decodes() {
        let account: Account =
            serde_json::from_str(r#"{"id":1,"name":"Corner Diner","email":"a@b.test"}"#).unwrap();
        assert!(account.logo_url.is_none());
        assert!(AccountUpdate::default().is_empty());
    }
}
