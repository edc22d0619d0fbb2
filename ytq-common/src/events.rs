//! Event types broadcast to connected clients
//!
//! Events are notifications: they carry enough to update a status line, and
//! clients fetch `/api/state` for the full picture.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// YTQ event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QueueEvent {
    /// Pending sequence changed
    QueueChanged {
        trigger: QueueChangeTrigger,
        pending_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Now-playing slot was replaced (None when playback went idle)
    CurrentChanged {
        current: Option<NowPlayingInfo>,
        timestamp: DateTime<Utc>,
    },

    /// Runtime policy changed
    PolicyChanged {
        submit_throttle_seconds: u64,
        name_cooldown_seconds: u64,
        history_capacity: usize,
        pending_capacity: usize,
        timestamp: DateTime<Utc>,
    },

    /// Playback surface reported progress
    ProgressUpdated {
        item_ref: String,
        position_seconds: f64,
        duration_seconds: f64,
        ended: bool,
        timestamp: DateTime<Utc>,
    },
}

impl QueueEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            QueueEvent::QueueChanged { .. } => "QueueChanged",
            QueueEvent::CurrentChanged { .. } => "CurrentChanged",
            QueueEvent::PolicyChanged { .. } => "PolicyChanged",
            QueueEvent::ProgressUpdated { .. } => "ProgressUpdated",
        }
    }
}

/// Minimal description of the now-playing item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlayingInfo {
    pub entry_id: Uuid,
    pub item_ref: String,
    pub display_title: String,
    pub submitter_name: String,
}

/// Why the queue changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum QueueChangeTrigger {
    UserEnqueue,
    HostAdvance,
    HostRewind,
    HostSelect,
    HostResume,
    HostRemove,
    HostClear,
    PlaybackEnded,
}

impl std::fmt::Display for QueueChangeTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueChangeTrigger::UserEnqueue => write!(f, "UserEnqueue"),
            QueueChangeTrigger::HostAdvance => write!(f, "HostAdvance"),
            QueueChangeTrigger::HostRewind => write!(f, "HostRewind"),
            QueueChangeTrigger::HostSelect => write!(f, "HostSelect"),
            QueueChangeTrigger::HostResume => write!(f, "HostResume"),
            QueueChangeTrigger::HostRemove => write!(f, "HostRemove"),
            QueueChangeTrigger::HostClear => write!(f, "HostClear"),
            QueueChangeTrigger::PlaybackEnded => write!(f, "PlaybackEnded"),
        }
    }
}
