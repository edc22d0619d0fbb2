//! Shared API response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error response body
///
/// Every rejected request answers with this shape so clients can react to
/// the typed `details` (remaining wait, current name) without re-querying.
///
/// # Examples
///
/// ```
/// use ytq_common::api::types::ErrorResponse;
///
/// let error = ErrorResponse::new("no_history", "Nothing to rewind to");
/// assert!(!error.ok);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub ok: bool,
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    /// Create new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create error response with details
    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            ok: false,
            error: error.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

/// Success envelope wrapping an operation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse<T> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> OkResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}
