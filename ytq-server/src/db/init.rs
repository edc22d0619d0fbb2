//! Database initialization
//!
//! Creates every table the server uses. Idempotent; runs on each startup.

use crate::error::Result;
use sqlx::{Pool, Sqlite};
use tracing::info;

const SCHEMA: &[(&str, &str)] = &[
    (
        "settings",
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "queue_items",
        r#"
        CREATE TABLE IF NOT EXISTS queue_items (
            slot TEXT NOT NULL CHECK (slot IN ('pending', 'current', 'history')),
            position INTEGER NOT NULL,
            entry_id TEXT NOT NULL,
            item_ref TEXT NOT NULL,
            display_title TEXT NOT NULL,
            submitter_identity TEXT NOT NULL,
            submitter_name TEXT NOT NULL,
            submitted_at TEXT NOT NULL,
            PRIMARY KEY (slot, position)
        )
        "#,
    ),
    (
        "identities",
        r#"
        CREATE TABLE IF NOT EXISTS identities (
            identity TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            last_name_change_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "throttles",
        r#"
        CREATE TABLE IF NOT EXISTS throttles (
            identity TEXT PRIMARY KEY,
            last_submit_at TEXT NOT NULL
        )
        "#,
    ),
];

/// Initialize all required database structures
pub async fn initialize_database(pool: &Pool<Sqlite>) -> Result<()> {
    info!("Initializing database structures");

    for (table, ddl) in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
        tracing::debug!("Table '{}' ready", table);
    }

    info!("Database initialization complete");
    Ok(())
}
