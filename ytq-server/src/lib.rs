//! # YTQ Server Library (ytq-server)
//!
//! Shared playback queue: submitters enqueue items by reference, a host
//! controls playback, and every client follows along over SSE.
//!
//! **Architecture:** pure queue domain (`queue`) owned by a single
//! mutex-guarded `QueueService`; title lookup (`title`) and SQLite snapshots
//! (`persistence`, `db`) run outside the lock; axum HTTP surface in `api`.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod persistence;
pub mod queue;
pub mod service;
pub mod state;
pub mod title;

pub use error::{Error, Result};
pub use service::QueueService;
pub use state::SharedState;
