use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    Open,
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileSource {
    pub url: String,
}

/// One entry of a data.world dataset's file list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: FileSource,
}

/// Document PUT to `/datasets/{owner}/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteDataset {
    pub title: String,
    pub description: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub license: String,
    pub visibility: Visibility,
    pub files: Vec<RemoteFile>,
}

/// Body for `POST /datasets/{owner}/{name}/files`.
#[derive(Debug, Clone, Serialize)]
pub struct FileBatch<'a> {
    pub files: &'a [RemoteFile],
}
