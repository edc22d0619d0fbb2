//! HTTP mapping for queue-domain rejections

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use ytq_common::api::ErrorResponse;

use crate::queue::QueueError;

/// Error returned by handlers
#[derive(Debug)]
pub enum ApiError {
    Queue(QueueError),
    Internal(String),
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        ApiError::Queue(err)
    }
}

impl From<crate::error::Error> for ApiError {
    fn from(err: crate::error::Error) -> Self {
        match err {
            crate::error::Error::Queue(e) => ApiError::Queue(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Status code for a queue rejection
pub fn status_for(err: &QueueError) -> StatusCode {
    match err {
        QueueError::ThrottleActive { .. } | QueueError::CooldownActive { .. } => {
            StatusCode::TOO_MANY_REQUESTS
        }
        QueueError::InvalidReference(_) | QueueError::InvalidName(_) | QueueError::NameRequired => {
            StatusCode::BAD_REQUEST
        }
        QueueError::Unauthorized => StatusCode::UNAUTHORIZED,
        QueueError::NoHistory | QueueError::QueueFull { .. } => StatusCode::CONFLICT,
        QueueError::NotFound(_) => StatusCode::NOT_FOUND,
    }
}

fn details_for(err: &QueueError) -> Option<serde_json::Value> {
    match err {
        QueueError::ThrottleActive { remaining_seconds } => {
            Some(json!({ "remaining_seconds": remaining_seconds }))
        }
        QueueError::CooldownActive {
            remaining_seconds,
            current_name,
        } => Some(json!({
            "remaining_seconds": remaining_seconds,
            "current_name": current_name,
        })),
        QueueError::QueueFull { capacity } => Some(json!({ "capacity": capacity })),
        QueueError::NotFound(item_ref) => Some(json!({ "item_ref": item_ref })),
        _ => None,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Queue(err) => {
                let status = status_for(&err);
                let body = match details_for(&err) {
                    Some(details) => ErrorResponse::with_details(err.code(), err.to_string(), details),
                    None => ErrorResponse::new(err.code(), err.to_string()),
                };
                (status, Json(body)).into_response()
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("internal_error", "Internal server error")),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&QueueError::ThrottleActive { remaining_seconds: 3 }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status_for(&QueueError::NameRequired), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&QueueError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&QueueError::NoHistory), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&QueueError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_cooldown_details() {
        let details = details_for(&QueueError::CooldownActive {
            remaining_seconds: 3599,
            current_name: "Ann".to_string(),
        })
        .unwrap();
        assert_eq!(details["remaining_seconds"], 3599);
        assert_eq!(details["current_name"], "Ann");
    }
}
