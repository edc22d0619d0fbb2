//! Queue-domain rejections
//!
//! Every gate returns one of these with enough data for the caller to react
//! without re-querying. None of them are fatal.

use thiserror::Error;

/// Typed rejection from a queue-domain operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Submission attempted inside the per-identity throttle window
    #[error("Submission throttled, retry in {remaining_seconds}s")]
    ThrottleActive { remaining_seconds: u64 },

    /// Name change attempted inside the per-identity cooldown window
    #[error("Name change on cooldown for {remaining_seconds}s (current name: {current_name})")]
    CooldownActive {
        remaining_seconds: u64,
        current_name: String,
    },

    /// Item reference could not be parsed
    #[error("Invalid item reference: {0}")]
    InvalidReference(String),

    /// Proposed name violates the format policy
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Submission without an active name and without a proposed one
    #[error("A name is required before submitting")]
    NameRequired,

    /// Non-host attempted a privileged operation
    #[error("Host access required")]
    Unauthorized,

    /// Rewind with empty history
    #[error("No history to rewind to")]
    NoHistory,

    /// Remove with no matching pending item
    #[error("Not found: {0}")]
    NotFound(String),

    /// Pending sequence at capacity
    #[error("Queue is full ({capacity} pending items)")]
    QueueFull { capacity: usize },
}

impl QueueError {
    /// Stable machine-readable code used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            QueueError::ThrottleActive { .. } => "throttle_active",
            QueueError::CooldownActive { .. } => "cooldown_active",
            QueueError::InvalidReference(_) => "invalid_reference",
            QueueError::InvalidName(_) => "invalid_name",
            QueueError::NameRequired => "name_required",
            QueueError::Unauthorized => "unauthorized",
            QueueError::NoHistory => "no_history",
            QueueError::NotFound(_) => "not_found",
            QueueError::QueueFull { .. } => "queue_full",
        }
    }
}

/// Result alias for queue-domain operations
pub type QueueResult<T> = std::result::Result<T, QueueError>;
