use crate::api::{DataworldAuth, verify_credentials};
use crate::db::DbCredentials;
use crate::error::SyncError;
use crate::middleware::RequireAdminKey;
use crate::server::router::AppState;
use crate::service::{CredentialsUpdate, CredentialsView, update_credentials};
use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Map, Value, json};
use tracing::info;

/// GET /organizations/{org_id}/dataworld
pub async fn show_credentials(
    _auth: RequireAdminKey,
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> Result<Json<CredentialsView>, SyncError> {
    let creds = state
        .storage
        .find_credentials(&org_id)
        .await?
        .unwrap_or_else(|| DbCredentials::new(&org_id));
    Ok(Json(CredentialsView::from(&creds)))
}

/// POST /organizations/{org_id}/dataworld
pub async fn save_credentials(
    _auth: RequireAdminKey,
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(options): Json<Map<String, Value>>,
) -> Result<Json<CredentialsView>, SyncError> {
    let update = CredentialsUpdate::from_options(&options)?;
    let creds = update_credentials(&state.storage, &org_id, update).await?;
    Ok(Json(CredentialsView::from(&creds)))
}

/// GET /organizations/{org_id}/dataworld/verify
///
/// Probes the stored key even while the integration is switched off, so it
/// can be checked before enabling.
pub async fn verify(
    _auth: RequireAdminKey,
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> Result<Json<Value>, SyncError> {
    let creds = state
        .storage
        .find_credentials(&org_id)
        .await?
        .ok_or_else(|| SyncError::OrganizationNotFound(org_id.clone()))?;

    let (Some(owner), Some(key)) = (
        creds.owner.filter(|o| !o.is_empty()),
        creds.api_key.filter(|k| !k.is_empty()),
    ) else {
        return Ok(Json(json!({"valid": false})));
    };

    let valid = verify_credentials(&state.api, &DataworldAuth { owner, key }).await?;
    info!(org = %org_id, valid, "credentials verified");
    Ok(Json(json!({"valid": valid})))
}
