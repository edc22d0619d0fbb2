//! HTTP API
//!
//! Public endpoints are open to every submitter; host endpoints require the
//! `X-Host-Key` header.

pub mod auth_middleware;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod server;
pub mod sse;

pub use error::ApiError;
pub use identity::ForwardedForPolicy;
pub use server::{build_router, run, AppContext};
