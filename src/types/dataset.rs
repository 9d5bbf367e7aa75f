use serde::{Deserialize, Serialize};

/// Lifecycle state of a host dataset.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatasetState {
    #[default]
    Active,
    Draft,
    Deleted,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub name: String,
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// A file or link attached to a dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Fully materialized dataset as the host catalog's `package_show` returns it.
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub license_id: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub state: DatasetState,
    #[serde(default)]
    pub owner_org: Option<String>,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    "dataset".to_string()
}

impl Dataset {
    /// Title shown to users; falls back to the URL name when the title is blank.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => &self.name,
        }
    }

    pub fn is_plain_dataset(&self) -> bool {
        self.kind == "dataset"
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }
}
