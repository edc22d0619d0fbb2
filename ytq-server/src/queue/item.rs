//! Queue items and item-reference parsing

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::error::{QueueError, QueueResult};

/// Length of a canonical item id
pub const ITEM_ID_LEN: usize = 11;

static BARE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("static pattern"));

static LINK_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[?&]v=|youtu\.be/|/embed/|/shorts/|/live/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)")
        .expect("static pattern")
});

/// One submitted item
///
/// Immutable once created. `entry_id` distinguishes items that share an
/// `item_ref`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub entry_id: Uuid,
    pub item_ref: String,
    pub display_title: String,
    pub submitter_identity: String,
    pub submitter_name: String,
    pub submitted_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn new(
        item_ref: impl Into<String>,
        display_title: impl Into<String>,
        submitter_identity: impl Into<String>,
        submitter_name: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            item_ref: item_ref.into(),
            display_title: display_title.into(),
            submitter_identity: submitter_identity.into(),
            submitter_name: submitter_name.into(),
            submitted_at,
        }
    }
}

/// Extract the canonical item id from a pasted link or bare id
///
/// Accepts:
/// - bare ids (`dQw4w9WgXcQ`)
/// - `youtu.be/<id>`
/// - `youtube.com/watch?v=<id>`, `/embed/<id>`, `/shorts/<id>`, `/live/<id>`
/// - any absolute URL whose `v` query parameter is a valid id
pub fn parse_item_ref(input: &str) -> QueueResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QueueError::InvalidReference("empty reference".to_string()));
    }

    if BARE_ID.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    if let Ok(url) = Url::parse(trimmed) {
        let from_query = url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .filter(|value| BARE_ID.is_match(value));
        if let Some(id) = from_query {
            return Ok(id);
        }
    }

    LINK_ID
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| QueueError::InvalidReference(trimmed.to_string()))
}

/// Display title used when no real title is available
pub fn fallback_title(item_ref: &str) -> String {
    format!("Video {}", item_ref)
}
