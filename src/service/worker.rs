use super::resources::{ResourceEvent, ResourceOutcome};
use super::sync::{SyncOutcome, Synchronizer};
use crate::api::{DatasetSource, RemoteCatalog};
use crate::db::{SyncState, SyncStorage};
use crate::error::SyncError;
use futures::stream::StreamExt;
use governor::{Quota, RateLimiter};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};

/// Pending tasks beyond this are refused rather than buffered.
pub const QUEUE_CAPACITY: usize = 1000;

/// Unit of background work submitted by the host hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Task {
    SyncDataset {
        dataset_id: String,
    },
    SyncResource {
        dataset_id: String,
        resource_id: String,
        event: ResourceEvent,
    },
    SyncFiles {
        dataset_id: String,
    },
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::SyncDataset { .. } => "datadotworld.synchronize",
            Task::SyncResource { .. } => "datadotworld.synchronize_resource",
            Task::SyncFiles { .. } => "datadotworld.sync_files",
        }
    }

    pub fn dataset_id(&self) -> &str {
        match self {
            Task::SyncDataset { dataset_id }
            | Task::SyncResource { dataset_id, .. }
            | Task::SyncFiles { dataset_id } => dataset_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Dataset(SyncOutcome),
    Resource(ResourceOutcome),
    /// `None` when the dataset is not linked.
    Files(Option<StatusCode>),
}

/// Where hooks hand off work. How it gets executed is up to the implementor.
pub trait TaskQueue: Send + Sync {
    fn submit(&self, task: Task) -> Result<(), SyncError>;
}

/// Sending side of the in-process sync worker.
#[derive(Clone)]
pub struct SyncWorkerHandle {
    tx: mpsc::Sender<Task>,
}

impl SyncWorkerHandle {
    /// A handle plus the raw receiving end, for callers that drain the queue
    /// themselves.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Task>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl TaskQueue for SyncWorkerHandle {
    fn submit(&self, task: Task) -> Result<(), SyncError> {
        self.tx.try_send(task).map_err(|e| {
            warn!("Failed to submit sync task (channel closed/full): {}", e);
            SyncError::QueueClosed
        })
    }
}

impl<C, S> Synchronizer<C, S>
where
    C: RemoteCatalog,
    S: DatasetSource,
{
    pub async fn run(&self, task: &Task) -> Result<TaskOutcome, SyncError> {
        match task {
            Task::SyncDataset { dataset_id } => self.sync(dataset_id).await.map(TaskOutcome::Dataset),
            Task::SyncResource {
                dataset_id,
                resource_id,
                event,
            } => self
                .sync_resource(dataset_id, resource_id, *event)
                .await
                .map(TaskOutcome::Resource),
            Task::SyncFiles { dataset_id } => {
                self.sync_files(dataset_id).await.map(TaskOutcome::Files)
            }
        }
    }
}

/// Spawn the background worker: tasks are admitted through a rate limiter
/// and run with at most `concurrency` in flight. No ordering is kept between
/// tasks, even for the same dataset.
pub fn spawn<C, S>(
    sync: Arc<Synchronizer<C, S>>,
    concurrency: usize,
    rate_per_minute: u32,
) -> SyncWorkerHandle
where
    C: RemoteCatalog + 'static,
    S: DatasetSource + 'static,
{
    let (handle, rx) = SyncWorkerHandle::channel(QUEUE_CAPACITY);
    let concurrency = concurrency.max(1);
    let rate = NonZeroU32::new(rate_per_minute).unwrap_or(NonZeroU32::MIN);
    let limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rate)));

    tokio::spawn(async move {
        info!(
            "Sync worker started: Concurrency={}, RateLimit={}/min",
            concurrency, rate
        );

        let mut pipeline = ReceiverStream::new(rx)
            .map(|task| {
                let lim = limiter.clone();
                let sync = sync.clone();
                async move {
                    lim.until_ready().await;
                    let result = sync.run(&task).await;
                    (task, result)
                }
            })
            .buffer_unordered(concurrency);

        while let Some((task, result)) = pipeline.next().await {
            match result {
                Ok(outcome) => {
                    info!(task = task.name(), dataset = task.dataset_id(), ?outcome, "task done");
                }
                // Transport and store errors leave the record as it was; the
                // next event for the dataset retries.
                Err(e) => {
                    error!(task = task.name(), dataset = task.dataset_id(), error = %e, "task aborted");
                }
            }
        }
        info!("Sync worker stopped");
    });

    handle
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    pub queued: usize,
    /// Refused by a full or closed queue; still `failed` in the store.
    pub refused: usize,
}

/// Re-enqueue every `failed` record, optionally for one organization only.
///
/// Submission can be partial: a record the queue refuses is counted and
/// skipped, and the rest are still tried.
pub async fn push_failed(
    storage: &SyncStorage,
    queue: &dyn TaskQueue,
    organization_id: Option<&str>,
) -> Result<PushReport, SyncError> {
    let failed = storage
        .list_by_state(SyncState::Failed, organization_id)
        .await?;
    let mut report = PushReport::default();
    for record in failed {
        match queue.submit(Task::SyncDataset {
            dataset_id: record.package_id,
        }) {
            Ok(()) => report.queued += 1,
            Err(_) => report.refused += 1,
        }
    }
    info!(queued = report.queued, refused = report.refused, "re-pushing failed datasets");
    Ok(report)
}
