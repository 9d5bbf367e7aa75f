#![allow(dead_code)]

use datadotworld_sync::SyncError;
use datadotworld_sync::api::{ApiResponse, DatasetSource, DataworldAuth, RemoteCatalog};
use datadotworld_sync::db::{DbCredentials, SyncStorage};
use datadotworld_sync::types::{Dataset, RemoteDataset, RemoteFile, Resource, Tag};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const ORG: &str = "org-1";
pub const OWNER: &str = "acme";

/// Remote calls as the fake catalog saw them.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(String),
    Put(String, Value),
    Delete(String),
    AddFiles(String, Vec<String>),
    DeleteFile(String, String),
    SyncFiles(String),
}

impl Call {
    pub fn is_put(&self) -> bool {
        matches!(self, Call::Put(..))
    }
}

#[derive(Default)]
struct CatalogInner {
    calls: Mutex<Vec<Call>>,
    scripted: Mutex<HashMap<&'static str, VecDeque<ApiResponse>>>,
}

/// In-process data.world. Every call is recorded; responses are scripted per
/// operation and fall back to a plain success.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    inner: Arc<CatalogInner>,
}

impl FakeCatalog {
    /// Queue `resp` for the next call of `op` (`get`, `put`, `delete`,
    /// `add_files`, `delete_file`, `sync_files`).
    pub fn respond(&self, op: &'static str, resp: ApiResponse) -> &Self {
        self.inner
            .scripted
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(resp);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.inner.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call, op: &'static str, default: ApiResponse) -> ApiResponse {
        self.inner.calls.lock().unwrap().push(call);
        self.inner
            .scripted
            .lock()
            .unwrap()
            .get_mut(op)
            .and_then(VecDeque::pop_front)
            .unwrap_or(default)
    }
}

impl RemoteCatalog for FakeCatalog {
    async fn get_dataset(&self, _auth: &DataworldAuth, id: &str) -> Result<ApiResponse, SyncError> {
        Ok(self.record(
            Call::Get(id.to_string()),
            "get",
            ApiResponse::new(404, r#"{"message":"not found"}"#),
        ))
    }

    async fn put_dataset(
        &self,
        auth: &DataworldAuth,
        id: &str,
        doc: &RemoteDataset,
    ) -> Result<ApiResponse, SyncError> {
        let created = json!({
            "message": "Dataset created successfully.",
            "uri": format!("https://data.world/{}/{}", auth.owner, id),
        });
        Ok(self.record(
            Call::Put(id.to_string(), serde_json::to_value(doc)?),
            "put",
            ApiResponse::new(200, created.to_string()),
        ))
    }

    async fn delete_dataset(
        &self,
        _auth: &DataworldAuth,
        id: &str,
    ) -> Result<ApiResponse, SyncError> {
        Ok(self.record(
            Call::Delete(id.to_string()),
            "delete",
            ApiResponse::new(200, r#"{"message":"Dataset has been successfully deleted."}"#),
        ))
    }

    async fn add_files(
        &self,
        _auth: &DataworldAuth,
        name: &str,
        files: &[RemoteFile],
    ) -> Result<ApiResponse, SyncError> {
        let names = files.iter().map(|f| f.name.clone()).collect();
        Ok(self.record(
            Call::AddFiles(name.to_string(), names),
            "add_files",
            ApiResponse::new(200, r#"{"message":"Dataset successfully updated."}"#),
        ))
    }

    async fn delete_file(
        &self,
        _auth: &DataworldAuth,
        name: &str,
        file: &str,
    ) -> Result<ApiResponse, SyncError> {
        Ok(self.record(
            Call::DeleteFile(name.to_string(), file.to_string()),
            "delete_file",
            ApiResponse::new(200, r#"{"message":"File successfully deleted."}"#),
        ))
    }

    async fn sync_files(&self, _auth: &DataworldAuth, name: &str) -> Result<ApiResponse, SyncError> {
        Ok(self.record(
            Call::SyncFiles(name.to_string()),
            "sync_files",
            ApiResponse::new(200, r#"{"message":"Sync started."}"#),
        ))
    }
}

/// In-process host catalog.
#[derive(Clone, Default)]
pub struct FakeSource {
    datasets: Arc<Mutex<HashMap<String, Dataset>>>,
}

impl FakeSource {
    pub fn put(&self, dataset: Dataset) {
        self.datasets
            .lock()
            .unwrap()
            .insert(dataset.id.clone(), dataset);
    }

    pub fn purge(&self, id: &str) {
        self.datasets.lock().unwrap().remove(id);
    }
}

impl DatasetSource for FakeSource {
    async fn package_show(&self, id: &str) -> Result<Option<Dataset>, SyncError> {
        Ok(self.datasets.lock().unwrap().get(id).cloned())
    }
}

pub async fn memory_storage() -> SyncStorage {
    SyncStorage::connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory store")
}

/// Store with `ORG` bound to `OWNER` and the integration on.
pub async fn linked_storage() -> SyncStorage {
    let storage = memory_storage().await;
    storage
        .save_credentials(&DbCredentials {
            organization_id: ORG.to_string(),
            integration: true,
            show_links: true,
            owner: Some(OWNER.to_string()),
            api_key: Some("dw-key".to_string()),
        })
        .await
        .expect("failed to save credentials");
    storage
}

pub fn dataset(id: &str, title: &str) -> Dataset {
    Dataset {
        id: id.to_string(),
        name: id.to_string(),
        title: Some(title.to_string()),
        notes: Some("Readings from **every** station.".to_string()),
        tags: vec![Tag::from("air"), Tag::from("Quality")],
        license_id: Some("cc-by".to_string()),
        private: false,
        resources: vec![resource("r1", "https://example.org/data/readings.csv")],
        owner_org: Some(ORG.to_string()),
        kind: "dataset".to_string(),
        ..Default::default()
    }
}

pub fn resource(id: &str, url: &str) -> Resource {
    Resource {
        id: id.to_string(),
        url: Some(url.to_string()),
        name: None,
        format: Some("CSV".to_string()),
        description: None,
    }
}
