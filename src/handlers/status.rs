use super::hooks::enqueue;
use crate::api::generate_link;
use crate::db::{SyncRecord, SyncState};
use crate::error::SyncError;
use crate::middleware::RequireAdminKey;
use crate::server::router::AppState;
use crate::service::{Task, push_failed as requeue_failed};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Default, Deserialize)]
pub struct OrgFilter {
    pub org_id: Option<String>,
}

/// GET /dataworld/{state}
pub async fn list_all(
    _auth: RequireAdminKey,
    State(state): State<AppState>,
    Path(sync_state): Path<String>,
) -> Result<Json<Vec<SyncRecord>>, SyncError> {
    let sync_state: SyncState = sync_state.parse()?;
    Ok(Json(state.storage.list_by_state(sync_state, None).await?))
}

/// GET /dataworld/{org_id}/{state}
pub async fn list_for_org(
    _auth: RequireAdminKey,
    State(state): State<AppState>,
    Path((org_id, sync_state)): Path<(String, String)>,
) -> Result<Json<Vec<SyncRecord>>, SyncError> {
    let sync_state: SyncState = sync_state.parse()?;
    Ok(Json(
        state
            .storage
            .list_by_state(sync_state, Some(&org_id))
            .await?,
    ))
}

/// GET /dataworld/{org_id}/summary
pub async fn summary(
    _auth: RequireAdminKey,
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> Result<Json<Value>, SyncError> {
    let counts = state.storage.count_by_state(&org_id).await?;
    let total: i64 = counts.values().sum();
    Ok(Json(json!({
        "organization_id": org_id,
        "counts": counts,
        "total": total,
    })))
}

/// POST /dataworld/push-failed -> re-enqueue every failed dataset.
pub async fn push_failed(
    _auth: RequireAdminKey,
    State(state): State<AppState>,
    Query(filter): Query<OrgFilter>,
) -> Result<(StatusCode, Json<Value>), SyncError> {
    let report =
        requeue_failed(&state.storage, state.queue.as_ref(), filter.org_id.as_deref()).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"queued": report.queued, "refused": report.refused})),
    ))
}

/// POST /dataworld/datasets/{id}/sync-files
pub async fn sync_files(
    _auth: RequireAdminKey,
    State(state): State<AppState>,
    Path(dataset_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), SyncError> {
    enqueue(&state, Task::SyncFiles { dataset_id })
}

/// GET /dataworld/link/{owner}
pub async fn owner_link(
    _auth: RequireAdminKey,
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Json<Value> {
    Json(json!({"url": generate_link(&state.web_url, &owner, None)}))
}

/// GET /dataworld/link/{owner}/{dataset}
///
/// With `?org_id=`, the link is withheld (`null`) unless that organization
/// has `show_links` on.
pub async fn dataset_link(
    _auth: RequireAdminKey,
    State(state): State<AppState>,
    Path((owner, dataset)): Path<(String, String)>,
    Query(filter): Query<OrgFilter>,
) -> Result<Json<Value>, SyncError> {
    if let Some(org_id) = filter.org_id.as_deref() {
        let shown = state
            .storage
            .find_credentials(org_id)
            .await?
            .is_some_and(|c| c.show_links);
        if !shown {
            return Ok(Json(json!({"url": null})));
        }
    }
    Ok(Json(
        json!({"url": generate_link(&state.web_url, &owner, Some(&dataset))}),
    ))
}
