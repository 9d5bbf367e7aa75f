use datadotworld_sync::api::{CkanClient, DataworldApi};
use datadotworld_sync::db::SyncStorage;
use datadotworld_sync::server::{AppState, sync_router};
use datadotworld_sync::service::{Synchronizer, worker};
use datadotworld_sync::Config;
use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        api_url = %cfg.api_url,
        ckan_url = %cfg.ckan_url,
        loglevel = %cfg.loglevel,
        concurrency = cfg.worker_concurrency,
        rate_per_minute = cfg.worker_rate_per_minute,
    );
    if cfg.admin_key.is_empty() {
        warn!("DWSYNC_ADMIN_KEY is empty; every admin and hook request will be rejected");
    }

    let storage = SyncStorage::connect(&cfg.database_url).await?;
    let api = DataworldApi::new(cfg.api_url.clone())?;
    let ckan = CkanClient::new(cfg.ckan_url.clone(), cfg.ckan_api_key.as_deref())?;

    let synchronizer = Synchronizer::new(storage.clone(), api.clone(), ckan)
        .retain_deleted(cfg.retain_deleted_records);
    let handle = worker::spawn(
        Arc::new(synchronizer),
        cfg.worker_concurrency,
        cfg.worker_rate_per_minute,
    );

    let state = AppState::new(
        storage,
        Arc::new(handle),
        api,
        cfg.web_url.clone(),
        Arc::from(cfg.admin_key.as_str()),
    );
    let app = sync_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
