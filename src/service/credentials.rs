use crate::db::{DbCredentials, SyncStorage};
use crate::error::{FieldErrors, SyncError};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

/// Options an administrator may set for an organization. Anything else in
/// the submitted form is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialsUpdate {
    pub integration: Option<bool>,
    pub show_links: Option<bool>,
    pub owner: Option<String>,
    pub key: Option<String>,
}

impl CredentialsUpdate {
    pub const OPTIONS: [&'static str; 4] = ["integration", "show_links", "owner", "key"];

    /// Parse a submitted form. Booleans may come as JSON booleans or as the
    /// strings an HTML checkbox produces (`on`, `true`, `1`, ...).
    pub fn from_options(options: &Map<String, Value>) -> Result<Self, SyncError> {
        let mut update = Self::default();
        for (name, value) in options {
            match name.as_str() {
                "integration" => update.integration = Some(parse_flag(name, value)?),
                "show_links" => update.show_links = Some(parse_flag(name, value)?),
                "owner" => update.owner = Some(parse_text(name, value)?),
                "key" => update.key = Some(parse_text(name, value)?),
                other => return Err(SyncError::UnknownOption(other.to_string())),
            }
        }
        Ok(update)
    }

    pub fn apply(self, creds: &mut DbCredentials) {
        if let Some(integration) = self.integration {
            creds.integration = integration;
        }
        if let Some(show_links) = self.show_links {
            creds.show_links = show_links;
        }
        if let Some(owner) = self.owner {
            creds.owner = Some(owner);
        }
        if let Some(key) = self.key {
            creds.api_key = Some(key);
        }
    }
}

fn parse_flag(name: &str, value: &Value) -> Result<bool, SyncError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "1" | "yes" => Ok(true),
            "false" | "off" | "0" | "no" | "" => Ok(false),
            _ => Err(SyncError::invalid(name, "Expected a boolean")),
        },
        _ => Err(SyncError::invalid(name, "Expected a boolean")),
    }
}

fn parse_text(name: &str, value: &Value) -> Result<String, SyncError> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(SyncError::invalid(name, "Expected a string")),
    }
}

/// An enabled integration needs both the owner account and the API key.
pub fn validate(creds: &DbCredentials) -> Result<(), SyncError> {
    let mut errors = FieldErrors::new();
    if creds.integration {
        if creds.owner.as_deref().is_none_or(str::is_empty) {
            errors.insert("owner".to_string(), vec!["Required".to_string()]);
        }
        if creds.api_key.as_deref().is_none_or(str::is_empty) {
            errors.insert("key".to_string(), vec!["Required".to_string()]);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SyncError::Validation(errors))
    }
}

/// Load (or start) the organization's credentials, apply `update`,
/// validate, and persist. Nothing is written when validation fails.
pub async fn update_credentials(
    storage: &SyncStorage,
    organization_id: &str,
    update: CredentialsUpdate,
) -> Result<DbCredentials, SyncError> {
    let mut creds = storage
        .find_credentials(organization_id)
        .await?
        .unwrap_or_else(|| DbCredentials::new(organization_id));
    update.apply(&mut creds);
    validate(&creds)?;
    storage.save_credentials(&creds).await?;
    info!(
        org = organization_id,
        integration = creds.integration,
        owner = creds.owner.as_deref().unwrap_or("<none>"),
        "data.world credentials saved"
    );
    Ok(creds)
}

/// Credentials as shown on the settings page; the key itself never leaves.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CredentialsView {
    pub organization_id: String,
    pub integration: bool,
    pub show_links: bool,
    pub owner: Option<String>,
    pub has_key: bool,
}

impl From<&DbCredentials> for CredentialsView {
    fn from(c: &DbCredentials) -> Self {
        Self {
            organization_id: c.organization_id.clone(),
            integration: c.integration,
            show_links: c.show_links,
            owner: c.owner.clone(),
            has_key: c.api_key.as_deref().is_some_and(|k| !k.is_empty()),
        }
    }
}
