//! Settings database access
//!
//! Key/value store for runtime configuration. The queue policy lives here so
//! host changes survive restarts.

use crate::error::{Error, Result};
use crate::queue::Policy;
use sqlx::{Executor, Pool, Sqlite};
use std::str::FromStr;

pub const SUBMIT_THROTTLE_KEY: &str = "submit_throttle_seconds";
pub const NAME_COOLDOWN_KEY: &str = "name_cooldown_seconds";
pub const HISTORY_CAPACITY_KEY: &str = "history_capacity";
pub const PENDING_CAPACITY_KEY: &str = "pending_capacity";

/// Set when at least one snapshot has been written
pub const SNAPSHOT_SAVED_AT_KEY: &str = "snapshot_saved_at";

/// Load the persisted policy, falling back per field to `defaults`
pub async fn load_policy(db: &Pool<Sqlite>, defaults: Policy) -> Result<Policy> {
    Ok(Policy {
        submit_throttle_seconds: get_setting(db, SUBMIT_THROTTLE_KEY)
            .await?
            .unwrap_or(defaults.submit_throttle_seconds),
        name_cooldown_seconds: get_setting(db, NAME_COOLDOWN_KEY)
            .await?
            .unwrap_or(defaults.name_cooldown_seconds),
        history_capacity: get_setting(db, HISTORY_CAPACITY_KEY)
            .await?
            .unwrap_or(defaults.history_capacity),
        pending_capacity: get_setting(db, PENDING_CAPACITY_KEY)
            .await?
            .unwrap_or(defaults.pending_capacity),
    })
}

/// Generic setting getter
///
/// Returns None if the key is absent; a value that does not parse is an error.
pub async fn get_setting<'e, T, E>(db: E, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    E: Executor<'e, Database = Sqlite>,
{
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key.to_owned())
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter (insert or update)
pub async fn set_setting<'e, T, E>(db: E, key: &str, value: T) -> Result<()>
where
    T: ToString,
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key.to_owned())
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}
