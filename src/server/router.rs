use crate::api::DataworldApi;
use crate::db::SyncStorage;
use crate::handlers::{credentials, hooks, status};
use crate::service::TaskQueue;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use url::Url;

/// Hook payloads and settings forms are small.
const BODY_LIMIT: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub storage: SyncStorage,
    pub queue: Arc<dyn TaskQueue>,
    pub api: DataworldApi,
    pub web_url: Url,
    pub admin_key: Arc<str>,
}

impl AppState {
    pub fn new(
        storage: SyncStorage,
        queue: Arc<dyn TaskQueue>,
        api: DataworldApi,
        web_url: Url,
        admin_key: Arc<str>,
    ) -> Self {
        Self {
            storage,
            queue,
            api,
            web_url,
            admin_key,
        }
    }
}

pub fn sync_router(state: AppState) -> Router {
    Router::new()
        .route("/hooks/datasets/{id}", post(hooks::dataset_hook))
        .route("/hooks/resources/{id}", post(hooks::resource_hook))
        .route(
            "/organizations/{org_id}/dataworld",
            get(credentials::show_credentials).post(credentials::save_credentials),
        )
        .route(
            "/organizations/{org_id}/dataworld/verify",
            get(credentials::verify),
        )
        .route("/dataworld/push-failed", post(status::push_failed))
        .route(
            "/dataworld/datasets/{id}/sync-files",
            post(status::sync_files),
        )
        .route("/dataworld/link/{owner}", get(status::owner_link))
        .route("/dataworld/link/{owner}/{dataset}", get(status::dataset_link))
        // `{scope}` is a state on its own, or an organization id when a state follows.
        .route("/dataworld/{scope}", get(status::list_all))
        .route("/dataworld/{scope}/summary", get(status::summary))
        .route("/dataworld/{scope}/{state}", get(status::list_for_org))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}
