use super::sync::{SkipReason, Synchronizer};
use crate::api::{CallOutcome, DataworldAuth, DatasetSource, RemoteCatalog};
use crate::db::{ResourceLink, SyncState};
use crate::error::SyncError;
use crate::mapper::remote_file;
use crate::types::Resource;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceEvent {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOutcome {
    Skipped(SkipReason),
    /// New remote file posted.
    Pushed,
    /// Old remote file removed and the new one posted.
    Replaced,
    /// Remote file removed along with its link.
    Removed,
    /// data.world refused a call; the link is left as it was.
    Failed(StatusCode),
}

impl<C, S> Synchronizer<C, S>
where
    C: RemoteCatalog,
    S: DatasetSource,
{
    /// Mirror one resource change at file granularity.
    ///
    /// data.world has no partial file update, so an update removes the old
    /// file and posts a new one. Nothing happens until the parent dataset
    /// has been linked.
    pub async fn sync_resource(
        &self,
        dataset_id: &str,
        resource_id: &str,
        event: ResourceEvent,
    ) -> Result<ResourceOutcome, SyncError> {
        let Some(record) = self
            .storage()
            .find_sync_record(dataset_id)
            .await?
            .filter(|r| r.linked_id().is_some() && r.state != SyncState::Deleted)
        else {
            return Ok(ResourceOutcome::Skipped(SkipReason::NotLinked));
        };
        let Some(auth) = self.auth_for(&record.organization_id).await? else {
            return Ok(ResourceOutcome::Skipped(SkipReason::NoCredentials));
        };
        let remote_name = record.linked_id().unwrap_or_default();

        let dataset = self.source().package_show(dataset_id).await?;
        let resource = dataset.as_ref().and_then(|d| d.resource(resource_id));
        let link = self.storage().find_resource_link(resource_id).await?;

        match (event, resource) {
            (ResourceEvent::Deleted, _) | (_, None) => match link {
                Some(link) => self.remove_file(&auth, remote_name, &link).await,
                None => Ok(ResourceOutcome::Skipped(SkipReason::NotLinked)),
            },
            (_, Some(resource)) => {
                let replaced = match link {
                    Some(link) => match self.remove_file(&auth, remote_name, &link).await? {
                        ResourceOutcome::Removed => true,
                        other => return Ok(other),
                    },
                    None => false,
                };
                match self.push_file(&auth, remote_name, dataset_id, resource).await? {
                    ResourceOutcome::Pushed if replaced => Ok(ResourceOutcome::Replaced),
                    other => Ok(other),
                }
            }
        }
    }

    /// Ask data.world to re-fetch every file of a linked dataset.
    pub async fn sync_files(&self, dataset_id: &str) -> Result<Option<StatusCode>, SyncError> {
        let Some(record) = self.storage().find_sync_record(dataset_id).await? else {
            return Ok(None);
        };
        let (Some(remote_name), Some(auth)) = (
            record.linked_id(),
            self.auth_for(&record.organization_id).await?,
        ) else {
            return Ok(None);
        };
        let resp = self.catalog().sync_files(&auth, remote_name).await?;
        info!(dataset = dataset_id, status = %resp.status, body = %resp.body, "file sync requested");
        Ok(Some(resp.status))
    }

    async fn push_file(
        &self,
        auth: &DataworldAuth,
        remote_name: &str,
        dataset_id: &str,
        resource: &Resource,
    ) -> Result<ResourceOutcome, SyncError> {
        let file = remote_file(resource);
        let resp = self
            .catalog()
            .add_files(auth, remote_name, std::slice::from_ref(&file))
            .await?;
        if resp.outcome() != CallOutcome::Success {
            warn!(resource = %resource.id, status = %resp.status, body = %resp.body, "file push failed");
            return Ok(ResourceOutcome::Failed(resp.status));
        }

        self.storage()
            .save_resource_link(&ResourceLink {
                resource_id: resource.id.clone(),
                dataset_id: dataset_id.to_string(),
                remote_name: file.name.clone(),
                url: file.source.url.clone(),
            })
            .await?;
        info!(resource = %resource.id, file = %file.name, "file pushed");

        let sync = self.catalog().sync_files(auth, remote_name).await?;
        if sync.outcome() != CallOutcome::Success {
            warn!(dataset = remote_name, status = %sync.status, "file sync request failed");
        }
        Ok(ResourceOutcome::Pushed)
    }

    /// A 404 means the file is already gone; the link is dropped either way.
    async fn remove_file(
        &self,
        auth: &DataworldAuth,
        remote_name: &str,
        link: &ResourceLink,
    ) -> Result<ResourceOutcome, SyncError> {
        let resp = self
            .catalog()
            .delete_file(auth, remote_name, &link.remote_name)
            .await?;
        match resp.outcome() {
            CallOutcome::Success | CallOutcome::NotFound => {
                self.storage().remove_resource_link(&link.resource_id).await?;
                info!(resource = %link.resource_id, file = %link.remote_name, "file removed");
                Ok(ResourceOutcome::Removed)
            }
            _ => {
                warn!(resource = %link.resource_id, status = %resp.status, body = %resp.body, "file removal failed");
                Ok(ResourceOutcome::Failed(resp.status))
            }
        }
    }
}
