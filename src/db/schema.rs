//! SQL DDL for the sync side tables.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `datadotworld_credentials`: one row per organization (`organization_id` PK)
/// - `datadotworld_extras`: one row per dataset (`package_id` PK); `id` is the
///   remote slug, `state` one of `pending|up-to-date|failed|deleted`
/// - `datadotworld_resources`: one row per pushed resource (`resource_id` PK)
/// - `idx_extras_org_state` backs the per-organization status listing
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS datadotworld_credentials (
    organization_id TEXT PRIMARY KEY NOT NULL,
    integration INTEGER NOT NULL DEFAULT 0,
    show_links INTEGER NOT NULL DEFAULT 0,
    owner TEXT NULL,
    api_key TEXT NULL
);

CREATE TABLE IF NOT EXISTS datadotworld_extras (
    package_id TEXT PRIMARY KEY NOT NULL,
    organization_id TEXT NOT NULL,
    owner TEXT NOT NULL, -- data.world account the dataset lives under
    id TEXT NULL,
    state TEXT NOT NULL DEFAULT 'pending',
    message TEXT NULL,
    updated_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_extras_org_state ON datadotworld_extras(organization_id, state);

CREATE TABLE IF NOT EXISTS datadotworld_resources (
    resource_id TEXT PRIMARY KEY NOT NULL,
    dataset_id TEXT NOT NULL,
    id TEXT NOT NULL,
    url TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_resources_dataset ON datadotworld_resources(dataset_id);
"#;
