//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared types
//!
//! The server wraps these with Axum-specific middleware and responses.

pub mod auth;
pub mod types;

pub use auth::{generate_host_key, hash_host_key, verify_host_key, HostAuthError};
pub use types::{ErrorResponse, OkResponse};
