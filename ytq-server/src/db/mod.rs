//! Database access layer
//!
//! SQLite schema, settings key/value access, and the snapshot gateway.

pub mod init;
pub mod settings;
pub mod snapshot;

pub use init::initialize_database;
pub use snapshot::SqlitePersistence;

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the database file and initialize the schema
pub async fn connect(path: &Path) -> Result<Pool<Sqlite>> {
    ytq_common::config::ensure_parent_dir(path)?;

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    info!("Connected to database: {}", path.display());
    initialize_database(&pool).await?;
    Ok(pool)
}
