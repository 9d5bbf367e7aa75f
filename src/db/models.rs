use crate::api::DataworldAuth;
use crate::error::SyncError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Last known outcome of syncing one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SyncState {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "up-to-date")]
    UpToDate,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "deleted")]
    Deleted,
}

impl SyncState {
    pub const ALL: [SyncState; 4] = [
        SyncState::Pending,
        SyncState::UpToDate,
        SyncState::Failed,
        SyncState::Deleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SyncState::Pending => "pending",
            SyncState::UpToDate => "up-to-date",
            SyncState::Failed => "failed",
            SyncState::Deleted => "deleted",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncState {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| SyncError::InvalidState(s.to_string()))
    }
}

/// Per-organization data.world binding.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbCredentials {
    pub organization_id: String,
    pub integration: bool,
    pub show_links: bool,
    pub owner: Option<String>,
    pub api_key: Option<String>,
}

impl DbCredentials {
    pub fn new(organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            ..Default::default()
        }
    }

    /// Auth for outbound calls, only when integration is on and both owner
    /// and key are set.
    pub fn auth(&self) -> Option<DataworldAuth> {
        if !self.integration {
            return None;
        }
        match (self.owner.as_deref(), self.api_key.as_deref()) {
            (Some(owner), Some(key)) if !owner.is_empty() && !key.is_empty() => {
                Some(DataworldAuth {
                    owner: owner.to_string(),
                    key: key.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Per-dataset link to its data.world counterpart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncRecord {
    pub package_id: String,
    pub organization_id: String,
    pub owner: String,
    /// Remote slug; `None` until a create has been attempted.
    pub remote_id: Option<String>,
    pub state: SyncState,
    /// Raw body of the last remote response.
    pub message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SyncRecord {
    pub fn pending(
        package_id: impl Into<String>,
        organization_id: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            package_id: package_id.into(),
            organization_id: organization_id.into(),
            owner: owner.into(),
            remote_id: None,
            state: SyncState::Pending,
            message: None,
            updated_at: Utc::now(),
        }
    }

    pub fn linked_id(&self) -> Option<&str> {
        self.remote_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Per-resource link to a data.world file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct ResourceLink {
    pub resource_id: String,
    pub dataset_id: String,
    /// Remote file name.
    #[sqlx(rename = "id")]
    pub remote_name: String,
    /// Source URL at the time of the push.
    pub url: String,
}
