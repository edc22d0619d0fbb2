//! SQLite-backed queue snapshots
//!
//! A snapshot replaces every queue, identity and throttle row inside one
//! transaction, so a reader never sees a half-written state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Sqlite};
use tracing::debug;
use uuid::Uuid;

use super::settings::{
    self, HISTORY_CAPACITY_KEY, NAME_COOLDOWN_KEY, PENDING_CAPACITY_KEY, SNAPSHOT_SAVED_AT_KEY,
    SUBMIT_THROTTLE_KEY,
};
use crate::error::{Error, Result};
use crate::persistence::PersistenceGateway;
use crate::queue::{IdentityRecord, Policy, QueueItem, StateSnapshot, ThrottleRecord};

const SLOT_PENDING: &str = "pending";
const SLOT_CURRENT: &str = "current";
const SLOT_HISTORY: &str = "history";

#[derive(Debug, FromRow)]
struct QueueItemRow {
    slot: String,
    entry_id: String,
    item_ref: String,
    display_title: String,
    submitter_identity: String,
    submitter_name: String,
    submitted_at: DateTime<Utc>,
}

impl QueueItemRow {
    fn into_item(self) -> Result<QueueItem> {
        let entry_id = Uuid::parse_str(&self.entry_id)
            .map_err(|e| Error::Internal(format!("Invalid queue entry UUID: {}", e)))?;

        Ok(QueueItem {
            entry_id,
            item_ref: self.item_ref,
            display_title: self.display_title,
            submitter_identity: self.submitter_identity,
            submitter_name: self.submitter_name,
            submitted_at: self.submitted_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct IdentityRow {
    identity: String,
    name: String,
    last_name_change_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ThrottleRow {
    identity: String,
    last_submit_at: DateTime<Utc>,
}

/// Persistence gateway over a SQLite pool
#[derive(Clone)]
pub struct SqlitePersistence {
    db: Pool<Sqlite>,
}

impl SqlitePersistence {
    /// Wrap a pool whose schema is already initialized
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.db
    }
}

#[async_trait]
impl PersistenceGateway for SqlitePersistence {
    async fn load(&self) -> Result<Option<StateSnapshot>> {
        let saved_at: Option<String> = settings::get_setting(&self.db, SNAPSHOT_SAVED_AT_KEY).await?;
        if saved_at.is_none() {
            return Ok(None);
        }

        let policy = settings::load_policy(&self.db, Policy::default()).await?;

        let rows: Vec<QueueItemRow> = sqlx::query_as(
            r#"
            SELECT slot, entry_id, item_ref, display_title,
                   submitter_identity, submitter_name, submitted_at
            FROM queue_items
            ORDER BY slot, position
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut snapshot = StateSnapshot {
            policy,
            ..Default::default()
        };
        for row in rows {
            let slot = row.slot.clone();
            let item = row.into_item()?;
            match slot.as_str() {
                SLOT_PENDING => snapshot.pending.push(item),
                SLOT_HISTORY => snapshot.history.push(item),
                SLOT_CURRENT => snapshot.current = Some(item),
                other => {
                    return Err(Error::Internal(format!("Unknown queue slot '{}'", other)));
                }
            }
        }

        let identities: Vec<IdentityRow> =
            sqlx::query_as("SELECT identity, name, last_name_change_at FROM identities")
                .fetch_all(&self.db)
                .await?;
        snapshot.identities = identities
            .into_iter()
            .map(|r| IdentityRecord {
                identity: r.identity,
                name: r.name,
                last_name_change_at: r.last_name_change_at,
            })
            .collect();

        let throttles: Vec<ThrottleRow> =
            sqlx::query_as("SELECT identity, last_submit_at FROM throttles")
                .fetch_all(&self.db)
                .await?;
        snapshot.throttles = throttles
            .into_iter()
            .map(|r| ThrottleRecord {
                identity: r.identity,
                last_submit_at: r.last_submit_at,
            })
            .collect();

        debug!(
            pending = snapshot.pending.len(),
            history = snapshot.history.len(),
            "Loaded queue snapshot"
        );
        Ok(Some(snapshot))
    }

    async fn snapshot(&self, state: &StateSnapshot) -> Result<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM queue_items").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM identities").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM throttles").execute(&mut *tx).await?;

        let slots = state
            .pending
            .iter()
            .enumerate()
            .map(|(i, item)| (SLOT_PENDING, i, item))
            .chain(state.current.iter().map(|item| (SLOT_CURRENT, 0, item)))
            .chain(
                state
                    .history
                    .iter()
                    .enumerate()
                    .map(|(i, item)| (SLOT_HISTORY, i, item)),
            );

        for (slot, position, item) in slots {
            sqlx::query(
                r#"
                INSERT INTO queue_items (
                    slot, position, entry_id, item_ref, display_title,
                    submitter_identity, submitter_name, submitted_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(slot)
            .bind(position as i64)
            .bind(item.entry_id.to_string())
            .bind(item.item_ref.clone())
            .bind(item.display_title.clone())
            .bind(item.submitter_identity.clone())
            .bind(item.submitter_name.clone())
            .bind(item.submitted_at)
            .execute(&mut *tx)
            .await?;
        }

        for record in &state.identities {
            sqlx::query(
                "INSERT INTO identities (identity, name, last_name_change_at) VALUES (?, ?, ?)",
            )
            .bind(record.identity.clone())
            .bind(record.name.clone())
            .bind(record.last_name_change_at)
            .execute(&mut *tx)
            .await?;
        }

        for record in &state.throttles {
            sqlx::query("INSERT INTO throttles (identity, last_submit_at) VALUES (?, ?)")
                .bind(record.identity.clone())
                .bind(record.last_submit_at)
                .execute(&mut *tx)
                .await?;
        }

        let policy = state.policy;
        settings::set_setting(&mut *tx, SUBMIT_THROTTLE_KEY, policy.submit_throttle_seconds).await?;
        settings::set_setting(&mut *tx, NAME_COOLDOWN_KEY, policy.name_cooldown_seconds).await?;
        settings::set_setting(&mut *tx, HISTORY_CAPACITY_KEY, policy.history_capacity).await?;
        settings::set_setting(&mut *tx, PENDING_CAPACITY_KEY, policy.pending_capacity).await?;
        settings::set_setting(&mut *tx, SNAPSHOT_SAVED_AT_KEY, Utc::now().to_rfc3339()).await?;

        tx.commit().await?;
        Ok(())
    }
}
