//! Satellite tables kept next to the host catalog.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows, and the sync state enum
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: queries over the three tables

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbCredentials, ResourceLink, SyncRecord, SyncState};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, SyncStorage};
