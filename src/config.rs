use crate::error::SyncError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment prefix for every setting, e.g. `DWSYNC_DATABASE_URL`.
pub const ENV_PREFIX: &str = "DWSYNC_";

/// Runtime configuration, loaded once in `main` and handed to each component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    pub admin_key: String,
    pub api_url: Url,
    pub web_url: Url,
    pub ckan_url: Url,
    pub ckan_api_key: Option<String>,
    pub worker_concurrency: usize,
    pub worker_rate_per_minute: u32,
    pub retain_deleted_records: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite:datadotworld.sqlite".to_string(),
            loglevel: "info".to_string(),
            admin_key: String::new(),
            api_url: Url::parse("https://api.data.world/v0").expect("static url"),
            web_url: Url::parse("https://data.world").expect("static url"),
            ckan_url: Url::parse("http://localhost:5000").expect("static url"),
            ckan_api_key: None,
            worker_concurrency: 4,
            worker_rate_per_minute: 60,
            retain_deleted_records: false,
        }
    }
}

impl Config {
    /// Defaults overlaid with `DWSYNC_*` environment variables.
    pub fn load() -> Result<Self, SyncError> {
        Self::figment().extract().map_err(SyncError::from)
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed(ENV_PREFIX))
    }
}
