use crate::error::SyncError;
use crate::types::Dataset;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::future::Future;
use tracing::warn;
use url::Url;

/// Lookup of host datasets by id or name.
pub trait DatasetSource: Send + Sync {
    /// `None` when the host does not know the dataset.
    fn package_show(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Dataset>, SyncError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ActionEnvelope<T> {
    success: bool,
    result: Option<T>,
}

/// Host catalog action API client (`/api/3/action/...`).
#[derive(Clone)]
pub struct CkanClient {
    client: reqwest::Client,
    root: Url,
}

impl CkanClient {
    pub fn new(root: Url, api_key: Option<&str>) -> Result<Self, SyncError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let mut value = HeaderValue::from_str(key)
                .map_err(|_| SyncError::invalid("ckan_api_key", "not a valid header value"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let client = reqwest::Client::builder()
            .user_agent(super::USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self { client, root })
    }

    fn action_url(&self, action: &str) -> Result<Url, SyncError> {
        let mut url = self.root.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::UrlParse(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["api", "3", "action", action]);
        Ok(url)
    }
}

impl DatasetSource for CkanClient {
    async fn package_show(&self, id: &str) -> Result<Option<Dataset>, SyncError> {
        let url = self.action_url("package_show")?;
        let resp = self.client.get(url).query(&[("id", id)]).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            s if !s.is_success() => {
                warn!(dataset = id, status = %s, "package_show failed");
                return Err(SyncError::HostStatus(s));
            }
            _ => {}
        }
        let envelope: ActionEnvelope<Dataset> = resp.json().await?;
        if !envelope.success {
            return Ok(None);
        }
        Ok(envelope.result)
    }
}
