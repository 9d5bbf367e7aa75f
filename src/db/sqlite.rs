use crate::db::models::{DbCredentials, ResourceLink, SyncRecord, SyncState};
use crate::db::schema::SQLITE_INIT;
use crate::error::SyncError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::collections::BTreeMap;
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

const SYNC_RECORD_COLUMNS: &str =
    "package_id, organization_id, owner, id, state, message, updated_at";

#[derive(Clone)]
pub struct SyncStorage {
    pool: SqlitePool,
}

impl SyncStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, SyncError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to `:memory:` is a separate database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 8 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_opts)
            .await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), SyncError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    // ---- credentials ----

    pub async fn find_credentials(
        &self,
        organization_id: &str,
    ) -> Result<Option<DbCredentials>, SyncError> {
        let creds = sqlx::query_as::<_, DbCredentials>(
            r#"SELECT organization_id, integration, show_links, owner, api_key
               FROM datadotworld_credentials WHERE organization_id = ?"#,
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(creds)
    }

    /// Upsert by organization id.
    pub async fn save_credentials(&self, creds: &DbCredentials) -> Result<(), SyncError> {
        sqlx::query(
            r#"
            INSERT INTO datadotworld_credentials (
                organization_id, integration, show_links, owner, api_key
            ) VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(organization_id) DO UPDATE SET
                integration=excluded.integration,
                show_links=excluded.show_links,
                owner=excluded.owner,
                api_key=excluded.api_key
            "#,
        )
        .bind(&creds.organization_id)
        .bind(creds.integration)
        .bind(creds.show_links)
        .bind(&creds.owner)
        .bind(&creds.api_key)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Cascade for a deleted organization.
    pub async fn remove_credentials(&self, organization_id: &str) -> Result<(), SyncError> {
        sqlx::query("DELETE FROM datadotworld_credentials WHERE organization_id = ?")
            .bind(organization_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ---- sync records ----

    pub async fn find_sync_record(&self, package_id: &str) -> Result<Option<SyncRecord>, SyncError> {
        let row = sqlx::query(&format!(
            "SELECT {SYNC_RECORD_COLUMNS} FROM datadotworld_extras WHERE package_id = ?"
        ))
        .bind(package_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_record).transpose()
    }

    /// Upsert by package id; `updated_at` is written as given.
    pub async fn save_sync_record(&self, record: &SyncRecord) -> Result<(), SyncError> {
        sqlx::query(
            r#"
            INSERT INTO datadotworld_extras (
                package_id, organization_id, owner, id, state, message, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(package_id) DO UPDATE SET
                organization_id=excluded.organization_id,
                owner=excluded.owner,
                id=excluded.id,
                state=excluded.state,
                message=excluded.message,
                updated_at=excluded.updated_at
            "#,
        )
        .bind(&record.package_id)
        .bind(&record.organization_id)
        .bind(&record.owner)
        .bind(&record.remote_id)
        .bind(record.state.as_str())
        .bind(&record.message)
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_sync_record(&self, package_id: &str) -> Result<(), SyncError> {
        sqlx::query("DELETE FROM datadotworld_extras WHERE package_id = ?")
            .bind(package_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records in `state`, optionally limited to one organization, oldest first.
    pub async fn list_by_state(
        &self,
        state: SyncState,
        organization_id: Option<&str>,
    ) -> Result<Vec<SyncRecord>, SyncError> {
        let rows = match organization_id {
            Some(org) => {
                sqlx::query(&format!(
                    r#"SELECT {SYNC_RECORD_COLUMNS} FROM datadotworld_extras
                       WHERE state = ? AND organization_id = ? ORDER BY updated_at"#
                ))
                .bind(state.as_str())
                .bind(org)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    r#"SELECT {SYNC_RECORD_COLUMNS} FROM datadotworld_extras
                       WHERE state = ? ORDER BY updated_at"#
                ))
                .bind(state.as_str())
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(Self::row_to_record).collect()
    }

    /// Count per state for one organization; every state is present.
    pub async fn count_by_state(
        &self,
        organization_id: &str,
    ) -> Result<BTreeMap<SyncState, i64>, SyncError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"SELECT state, COUNT(*) FROM datadotworld_extras
               WHERE organization_id = ? GROUP BY state"#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts: BTreeMap<SyncState, i64> =
            SyncState::ALL.into_iter().map(|s| (s, 0)).collect();
        for (state, n) in rows {
            counts.insert(state.parse()?, n);
        }
        Ok(counts)
    }

    // ---- resource links ----

    pub async fn find_resource_link(
        &self,
        resource_id: &str,
    ) -> Result<Option<ResourceLink>, SyncError> {
        let link = sqlx::query_as::<_, ResourceLink>(
            r#"SELECT resource_id, dataset_id, id, url
               FROM datadotworld_resources WHERE resource_id = ?"#,
        )
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    pub async fn save_resource_link(&self, link: &ResourceLink) -> Result<(), SyncError> {
        sqlx::query(
            r#"
            INSERT INTO datadotworld_resources (resource_id, dataset_id, id, url)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(resource_id) DO UPDATE SET
                dataset_id=excluded.dataset_id,
                id=excluded.id,
                url=excluded.url
            "#,
        )
        .bind(&link.resource_id)
        .bind(&link.dataset_id)
        .bind(&link.remote_name)
        .bind(&link.url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_resource_link(&self, resource_id: &str) -> Result<(), SyncError> {
        sqlx::query("DELETE FROM datadotworld_resources WHERE resource_id = ?")
            .bind(resource_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_record(row: SqliteRow) -> Result<SyncRecord, SyncError> {
        let package_id: String = row.try_get("package_id")?;
        let organization_id: String = row.try_get("organization_id")?;
        let owner: String = row.try_get("owner")?;
        let remote_id: Option<String> = row.try_get("id")?;
        let state_str: String = row.try_get("state")?;
        let message: Option<String> = row.try_get("message")?;
        let updated_str: String = row.try_get("updated_at")?;

        let state = state_str.parse()?;
        let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
            .with_timezone(&Utc);

        Ok(SyncRecord {
            package_id,
            organization_id,
            owner,
            remote_id,
            state,
            message,
            updated_at,
        })
    }
}
