use crate::error::SyncError;
use crate::middleware::RequireAdminKey;
use crate::server::router::AppState;
use crate::service::{ResourceEvent, Task};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct ResourceHook {
    pub dataset_id: String,
    pub event: ResourceEvent,
}

pub(crate) fn enqueue(state: &AppState, task: Task) -> Result<(StatusCode, Json<Value>), SyncError> {
    let name = task.name();
    let dataset_id = task.dataset_id().to_string();
    state.queue.submit(task)?;
    debug!(task = name, dataset = %dataset_id, "task queued");
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"queued": name, "dataset_id": dataset_id})),
    ))
}

/// POST /hooks/datasets/{id} -> host created, updated or deleted a dataset.
pub async fn dataset_hook(
    _auth: RequireAdminKey,
    State(state): State<AppState>,
    Path(dataset_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), SyncError> {
    enqueue(&state, Task::SyncDataset { dataset_id })
}

/// POST /hooks/resources/{id} -> a resource of a dataset changed.
pub async fn resource_hook(
    _auth: RequireAdminKey,
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
    Json(hook): Json<ResourceHook>,
) -> Result<(StatusCode, Json<Value>), SyncError> {
    enqueue(
        &state,
        Task::SyncResource {
            dataset_id: hook.dataset_id,
            resource_id,
            event: hook.event,
        },
    )
}
