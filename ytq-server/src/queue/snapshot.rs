//! Serializable views of the queue domain

use serde::{Deserialize, Serialize};

use super::controller::{PlaybackProgress, PlaybackStatus};
use super::identity::IdentityRecord;
use super::item::QueueItem;
use super::policy::Policy;
use super::throttle::ThrottleRecord;

/// Everything the persistence gateway stores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub pending: Vec<QueueItem>,
    pub current: Option<QueueItem>,
    /// Most recent first
    pub history: Vec<QueueItem>,
    pub policy: Policy,
    pub identities: Vec<IdentityRecord>,
    pub throttles: Vec<ThrottleRecord>,
}

/// Read-only state returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueState {
    pub status: PlaybackStatus,
    pub current: Option<QueueItem>,
    pub pending: Vec<QueueItem>,
    pub history: Vec<QueueItem>,
    pub policy: Policy,
    pub progress: Option<PlaybackProgress>,
}
