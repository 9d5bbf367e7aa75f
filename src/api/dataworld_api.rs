use super::endpoints::Endpoint;
use super::{ApiResponse, DataworldAuth, RemoteCatalog};
use crate::error::SyncError;
use crate::types::remote::FileBatch;
use crate::types::{RemoteDataset, RemoteFile};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use tracing::debug;
use url::Url;

pub const USER_AGENT: &str = concat!("datadotworld-sync/", env!("CARGO_PKG_VERSION"));

/// Stateless data.world client: one authenticated request per call, no
/// retries. Status codes are handed back untouched.
#[derive(Clone)]
pub struct DataworldApi {
    client: reqwest::Client,
    api_root: Url,
}

impl DataworldApi {
    pub fn new(api_root: Url) -> Result<Self, SyncError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self { client, api_root })
    }

    pub fn with_client(client: reqwest::Client, api_root: Url) -> Self {
        Self { client, api_root }
    }

    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    fn request(
        &self,
        method: Method,
        auth: &DataworldAuth,
        endpoint: Endpoint<'_>,
    ) -> Result<RequestBuilder, SyncError> {
        let url = endpoint.url(&self.api_root)?;
        debug!(%method, %url, "data.world request");
        Ok(self.client.request(method, url).bearer_auth(&auth.key))
    }

    async fn send(req: RequestBuilder) -> Result<ApiResponse, SyncError> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok(ApiResponse { status, body })
    }
}

impl RemoteCatalog for DataworldApi {
    async fn get_dataset(&self, auth: &DataworldAuth, id: &str) -> Result<ApiResponse, SyncError> {
        let endpoint = Endpoint::Dataset {
            owner: &auth.owner,
            id,
        };
        Self::send(self.request(Method::GET, auth, endpoint)?).await
    }

    async fn put_dataset(
        &self,
        auth: &DataworldAuth,
        id: &str,
        doc: &RemoteDataset,
    ) -> Result<ApiResponse, SyncError> {
        let endpoint = Endpoint::Dataset {
            owner: &auth.owner,
            id,
        };
        Self::send(self.request(Method::PUT, auth, endpoint)?.json(doc)).await
    }

    async fn delete_dataset(
        &self,
        auth: &DataworldAuth,
        id: &str,
    ) -> Result<ApiResponse, SyncError> {
        let endpoint = Endpoint::Dataset {
            owner: &auth.owner,
            id,
        };
        Self::send(self.request(Method::DELETE, auth, endpoint)?).await
    }

    async fn add_files(
        &self,
        auth: &DataworldAuth,
        name: &str,
        files: &[RemoteFile],
    ) -> Result<ApiResponse, SyncError> {
        let endpoint = Endpoint::Files {
            owner: &auth.owner,
            name,
        };
        let body = FileBatch { files };
        Self::send(self.request(Method::POST, auth, endpoint)?.json(&body)).await
    }

    async fn delete_file(
        &self,
        auth: &DataworldAuth,
        name: &str,
        file: &str,
    ) -> Result<ApiResponse, SyncError> {
        let endpoint = Endpoint::File {
            owner: &auth.owner,
            name,
            file,
        };
        Self::send(self.request(Method::DELETE, auth, endpoint)?).await
    }

    async fn sync_files(&self, auth: &DataworldAuth, name: &str) -> Result<ApiResponse, SyncError> {
        let endpoint = Endpoint::Sync {
            owner: &auth.owner,
            name,
        };
        Self::send(self.request(Method::GET, auth, endpoint)?).await
    }
}
