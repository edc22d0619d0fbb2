//! Error types for ytq-server
//!
//! Queue-domain rejections keep their own type (`QueueError`); this enum wraps
//! them alongside infrastructure failures.

use thiserror::Error;

use crate::queue::QueueError;

/// Main error type for ytq-server
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Queue-domain rejection
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ytq_common::Error> for Error {
    fn from(err: ytq_common::Error) -> Self {
        match err {
            ytq_common::Error::Io(e) => Error::Io(e),
            ytq_common::Error::Config(msg) => Error::Config(msg),
            other => Error::Internal(other.to_string()),
        }
    }
}

/// Convenience Result type using ytq-server Error
pub type Result<T> = std::result::Result<T, Error>;
