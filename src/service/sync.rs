use crate::api::{
    ApiResponse, CallOutcome, DataworldAuth, DatasetSource, RemoteCatalog,
    identifier_from_response,
};
use crate::db::{SyncRecord, SyncState, SyncStorage};
use crate::error::SyncError;
use crate::mapper::{dataworld_name, format_dataset};
use crate::service::dirty::is_changed;
use crate::types::{Dataset, DatasetState, RemoteDataset};
use chrono::Utc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Host type other than `dataset`.
    NotADataset,
    Draft,
    /// Organization missing, integration off, or owner/key unset.
    NoCredentials,
    /// Nothing on data.world to act on.
    NotLinked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Skipped(SkipReason),
    /// Dirty-check found the remote copy already current; nothing written.
    Unchanged,
    /// A remote write was attempted; `state` is what got stored.
    Applied { action: SyncAction, state: SyncState },
    /// Remote delete confirmed.
    Removed,
}

/// Drives one dataset change event against data.world.
///
/// Holds no per-dataset state between calls; everything is read from the
/// host and the store at the start of each call.
pub struct Synchronizer<C, S> {
    storage: SyncStorage,
    catalog: C,
    source: S,
    retain_deleted: bool,
}

impl<C, S> Synchronizer<C, S>
where
    C: RemoteCatalog,
    S: DatasetSource,
{
    pub fn new(storage: SyncStorage, catalog: C, source: S) -> Self {
        Self {
            storage,
            catalog,
            source,
            retain_deleted: false,
        }
    }

    /// Keep the record in `deleted` state after a confirmed remote delete
    /// instead of removing it.
    pub fn retain_deleted(mut self, retain: bool) -> Self {
        self.retain_deleted = retain;
        self
    }

    pub fn storage(&self) -> &SyncStorage {
        &self.storage
    }

    pub(crate) fn catalog(&self) -> &C {
        &self.catalog
    }

    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    /// Entry point for a dataset create/update/delete event.
    ///
    /// A dataset the host no longer knows is handled as deleted, using the
    /// organization remembered on its sync record.
    pub async fn sync(&self, dataset_id: &str) -> Result<SyncOutcome, SyncError> {
        match self.source.package_show(dataset_id).await? {
            Some(dataset) => self.sync_dataset(&dataset).await,
            None => self.sync_purged(dataset_id).await,
        }
    }

    pub async fn sync_dataset(&self, dataset: &Dataset) -> Result<SyncOutcome, SyncError> {
        if !dataset.is_plain_dataset() {
            return Ok(SyncOutcome::Skipped(SkipReason::NotADataset));
        }
        if dataset.state == DatasetState::Draft {
            return Ok(SyncOutcome::Skipped(SkipReason::Draft));
        }
        let Some(org_id) = dataset.owner_org.as_deref() else {
            return Ok(SyncOutcome::Skipped(SkipReason::NoCredentials));
        };
        let Some(auth) = self.auth_for(org_id).await? else {
            debug!(dataset = %dataset.id, org = org_id, "integration disabled; skipping");
            return Ok(SyncOutcome::Skipped(SkipReason::NoCredentials));
        };

        let record = self.storage.find_sync_record(&dataset.id).await?;

        if dataset.state == DatasetState::Deleted {
            return match record.filter(is_live_link) {
                Some(mut record) => self.delete(&auth, &mut record).await,
                None => Ok(SyncOutcome::Skipped(SkipReason::NotLinked)),
            };
        }

        let doc = format_dataset(dataset);
        let mut record = match record {
            Some(record) => record,
            None => {
                let record = SyncRecord::pending(&dataset.id, org_id, &auth.owner);
                self.storage.save_sync_record(&record).await?;
                record
            }
        };

        if record.linked_id().is_some() {
            info!(dataset = %dataset.id, "performing update");
            self.update(&auth, &doc, &mut record).await
        } else {
            info!(dataset = %dataset.id, "performing create");
            self.create(&auth, &doc, &mut record).await
        }
    }

    async fn sync_purged(&self, dataset_id: &str) -> Result<SyncOutcome, SyncError> {
        let Some(mut record) = self
            .storage
            .find_sync_record(dataset_id)
            .await?
            .filter(is_live_link)
        else {
            return Ok(SyncOutcome::Skipped(SkipReason::NotLinked));
        };
        let Some(auth) = self.auth_for(&record.organization_id).await? else {
            return Ok(SyncOutcome::Skipped(SkipReason::NoCredentials));
        };
        self.delete(&auth, &mut record).await
    }

    pub(crate) async fn auth_for(&self, org_id: &str) -> Result<Option<DataworldAuth>, SyncError> {
        Ok(self
            .storage
            .find_credentials(org_id)
            .await?
            .and_then(|creds| creds.auth()))
    }

    /// PUT under the record's identifier, or a slug of the title when it has
    /// none yet. The identifier is kept even when the call fails so the next
    /// event goes through update (and its 404 fallback).
    async fn create(
        &self,
        auth: &DataworldAuth,
        doc: &RemoteDataset,
        record: &mut SyncRecord,
    ) -> Result<SyncOutcome, SyncError> {
        let id = record
            .linked_id()
            .map(str::to_string)
            .unwrap_or_else(|| dataworld_name(&doc.title));

        let resp = self.catalog.put_dataset(auth, &id, doc).await?;
        let state = match resp.outcome() {
            CallOutcome::Success => {
                let adopted = identifier_from_response(&resp).unwrap_or_else(|| id.clone());
                info!(dataset = %record.package_id, remote = %adopted, "created on data.world");
                record.remote_id = Some(adopted);
                SyncState::UpToDate
            }
            outcome => {
                record.remote_id = Some(id);
                self.failure_state(record, SyncAction::Create, outcome, &resp)
            }
        };
        self.finish(record, state, resp).await?;
        Ok(SyncOutcome::Applied {
            action: SyncAction::Create,
            state,
        })
    }

    async fn update(
        &self,
        auth: &DataworldAuth,
        doc: &RemoteDataset,
        record: &mut SyncRecord,
    ) -> Result<SyncOutcome, SyncError> {
        let id = record.linked_id().unwrap_or_default().to_string();

        if !self.is_update_required(auth, doc, &id).await? {
            debug!(dataset = %record.package_id, remote = %id, "remote copy is current");
            return Ok(SyncOutcome::Unchanged);
        }

        let resp = self.catalog.put_dataset(auth, &id, doc).await?;
        let state = match resp.outcome() {
            CallOutcome::Success => {
                info!(dataset = %record.package_id, remote = %id, "updated on data.world");
                SyncState::UpToDate
            }
            CallOutcome::NotFound => {
                warn!(dataset = %record.package_id, remote = %id, "remote dataset missing; creating");
                return self.create(auth, doc, record).await;
            }
            outcome => self.failure_state(record, SyncAction::Update, outcome, &resp),
        };
        self.finish(record, state, resp).await?;
        Ok(SyncOutcome::Applied {
            action: SyncAction::Update,
            state,
        })
    }

    async fn delete(
        &self,
        auth: &DataworldAuth,
        record: &mut SyncRecord,
    ) -> Result<SyncOutcome, SyncError> {
        let id = record.linked_id().unwrap_or_default().to_string();
        warn!(dataset = %record.package_id, remote = %id, "deleting from data.world");

        let resp = self.catalog.delete_dataset(auth, &id).await?;
        match resp.outcome() {
            CallOutcome::Success if self.retain_deleted => {
                self.finish(record, SyncState::Deleted, resp).await?;
                Ok(SyncOutcome::Removed)
            }
            CallOutcome::Success => {
                self.storage.remove_sync_record(&record.package_id).await?;
                info!(dataset = %record.package_id, "sync record removed");
                Ok(SyncOutcome::Removed)
            }
            outcome => {
                let state = self.failure_state(record, SyncAction::Delete, outcome, &resp);
                self.finish(record, state, resp).await?;
                Ok(SyncOutcome::Applied {
                    action: SyncAction::Delete,
                    state,
                })
            }
        }
    }

    /// Dirty-check. A failed fetch means "write anyway".
    async fn is_update_required(
        &self,
        auth: &DataworldAuth,
        doc: &RemoteDataset,
        id: &str,
    ) -> Result<bool, SyncError> {
        let remote = self.catalog.get_dataset(auth, id).await?;
        if remote.outcome() != CallOutcome::Success {
            warn!(remote = %id, status = %remote.status, "unable to fetch dataset for dirty check");
            return Ok(true);
        }
        let Some(remote_doc) = remote.json() else {
            return Ok(true);
        };
        Ok(is_changed(doc, &remote_doc))
    }

    fn failure_state(
        &self,
        record: &SyncRecord,
        action: SyncAction,
        outcome: CallOutcome,
        resp: &ApiResponse,
    ) -> SyncState {
        match outcome {
            CallOutcome::Deferred => {
                warn!(
                    dataset = %record.package_id,
                    ?action,
                    status = %resp.status,
                    "data.world deferred the request; will retry on next event"
                );
                SyncState::Pending
            }
            _ => {
                error!(
                    dataset = %record.package_id,
                    ?action,
                    status = %resp.status,
                    body = %resp.body,
                    "data.world rejected the request"
                );
                SyncState::Failed
            }
        }
    }

    async fn finish(
        &self,
        record: &mut SyncRecord,
        state: SyncState,
        resp: ApiResponse,
    ) -> Result<(), SyncError> {
        record.state = state;
        record.message = Some(resp.body);
        record.updated_at = Utc::now();
        self.storage.save_sync_record(record).await
    }
}

/// A record pointing at a remote dataset that has not been deleted yet.
fn is_live_link(record: &SyncRecord) -> bool {
    record.linked_id().is_some() && record.state != SyncState::Deleted
}
