//! Outbound HTTP: the data.world client and the host catalog client.
//!
//! Both sit behind a trait so the sync service can be driven by in-process
//! fakes in tests.

pub mod ckan;
pub mod dataworld_api;
pub mod endpoints;

pub use ckan::{CkanClient, DatasetSource};
pub use dataworld_api::{DataworldApi, USER_AGENT};
pub use endpoints::{Endpoint, generate_link};

use crate::error::SyncError;
use crate::types::{RemoteDataset, RemoteFile};
use reqwest::StatusCode;
use serde_json::Value;
use std::future::Future;
use tracing::debug;

/// Slug that never exists; probed to check a key without side effects.
pub const PROBE_DATASET: &str = "definitely-fake-dataset-name";

/// Owner account and API key of one organization's data.world binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataworldAuth {
    pub owner: String,
    pub key: String,
}

/// Raw outcome of a remote call. Interpretation is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: body.into(),
        }
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    pub fn outcome(&self) -> CallOutcome {
        CallOutcome::from(self.status)
    }
}

/// How the sync state machine reads an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    /// 404
    NotFound,
    /// 429 or 5xx; worth trying again on the next event.
    Deferred,
    /// Any other status; needs an operator.
    Rejected,
}

impl From<StatusCode> for CallOutcome {
    fn from(status: StatusCode) -> Self {
        match status {
            s if s.is_success() => CallOutcome::Success,
            StatusCode::NOT_FOUND => CallOutcome::NotFound,
            StatusCode::TOO_MANY_REQUESTS => CallOutcome::Deferred,
            s if s.is_server_error() => CallOutcome::Deferred,
            _ => CallOutcome::Rejected,
        }
    }
}

/// data.world dataset and file operations.
pub trait RemoteCatalog: Send + Sync {
    fn get_dataset(
        &self,
        auth: &DataworldAuth,
        id: &str,
    ) -> impl Future<Output = Result<ApiResponse, SyncError>> + Send;

    /// Create or replace; PUT is idempotent on the identifier.
    fn put_dataset(
        &self,
        auth: &DataworldAuth,
        id: &str,
        doc: &RemoteDataset,
    ) -> impl Future<Output = Result<ApiResponse, SyncError>> + Send;

    fn delete_dataset(
        &self,
        auth: &DataworldAuth,
        id: &str,
    ) -> impl Future<Output = Result<ApiResponse, SyncError>> + Send;

    fn add_files(
        &self,
        auth: &DataworldAuth,
        name: &str,
        files: &[RemoteFile],
    ) -> impl Future<Output = Result<ApiResponse, SyncError>> + Send;

    fn delete_file(
        &self,
        auth: &DataworldAuth,
        name: &str,
        file: &str,
    ) -> impl Future<Output = Result<ApiResponse, SyncError>> + Send;

    /// Ask data.world to re-fetch every file from its source URL.
    fn sync_files(
        &self,
        auth: &DataworldAuth,
        name: &str,
    ) -> impl Future<Output = Result<ApiResponse, SyncError>> + Send;
}

/// Probe the key with a GET on a dataset that cannot exist.
///
/// Only a 401 counts as invalid; 404, 5xx and even 200 are treated as valid.
/// This does not catch a wrong owner slug.
pub async fn verify_credentials<C: RemoteCatalog>(
    api: &C,
    auth: &DataworldAuth,
) -> Result<bool, SyncError> {
    let resp = api.get_dataset(auth, PROBE_DATASET).await?;
    debug!(owner = %auth.owner, status = %resp.status, "credential probe");
    Ok(resp.status != StatusCode::UNAUTHORIZED)
}

/// Remote identifier from a create response: last path segment of `uri`.
pub fn identifier_from_response(resp: &ApiResponse) -> Option<String> {
    let uri = resp.json()?.get("uri")?.as_str()?.to_string();
    uri.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
