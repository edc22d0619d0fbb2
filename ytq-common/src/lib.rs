//! # YTQ Common Library
//!
//! Shared code for the YTQ shared-queue service including:
//! - Error types
//! - Bootstrap configuration loading (TOML + platform config directories)
//! - Event types broadcast to connected clients
//! - Host key hashing and verification
//! - Timestamp helpers

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
