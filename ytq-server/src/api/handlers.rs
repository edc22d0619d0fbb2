//! HTTP request handlers
//!
//! Thin wrappers: parse the request, call `QueueService`, shape the reply.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use ytq_common::api::{verify_host_key, OkResponse};

use super::error::ApiError;
use super::identity::SubmitterIdentity;
use super::server::AppContext;
use crate::queue::{
    Policy, PolicyUpdate, ProgressOutcome, ProgressReport, QueueError, QueueItem, QueueState,
};
use crate::service::EnqueueOutcome;

type ApiResult<T> = Result<Json<OkResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(OkResponse::new(data)))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    /// Pasted link or bare id
    #[serde(alias = "url", alias = "video_id")]
    pub item_ref: String,
    #[serde(default, alias = "nickname")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    #[serde(alias = "nickname")]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct NameResponse {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ItemRefRequest {
    #[serde(alias = "url", alias = "video_id")]
    pub item_ref: String,
}

#[derive(Debug, Serialize)]
pub struct CurrentResponse {
    pub current: Option<QueueItem>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: usize,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub removed: QueueItem,
}

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub policy: Policy,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    /// `recorded`, `advanced` or `ignored`
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<QueueItem>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyHostRequest {
    #[serde(alias = "password")]
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyHostResponse {
    pub host: bool,
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "ytq-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Public Endpoints
// ============================================================================

/// GET /api/state - Current, pending, history, policy and progress
pub async fn get_state(State(ctx): State<AppContext>) -> ApiResult<QueueState> {
    ok(ctx.service.state().await)
}

/// POST /api/enqueue - Submit an item
pub async fn enqueue(
    State(ctx): State<AppContext>,
    SubmitterIdentity(identity): SubmitterIdentity,
    Json(req): Json<EnqueueRequest>,
) -> ApiResult<EnqueueOutcome> {
    let outcome = ctx
        .service
        .enqueue(&identity, &req.item_ref, req.name.as_deref())
        .await?;
    ok(outcome)
}

/// POST /api/name - Register a display name for the caller
pub async fn register_name(
    State(ctx): State<AppContext>,
    SubmitterIdentity(identity): SubmitterIdentity,
    Json(req): Json<NameRequest>,
) -> ApiResult<NameResponse> {
    let name = ctx.service.register_name(&identity, &req.name).await?;
    ok(NameResponse { name })
}

/// GET /api/policy - Current runtime policy
pub async fn get_policy(State(ctx): State<AppContext>) -> ApiResult<PolicyResponse> {
    ok(PolicyResponse {
        policy: ctx.service.policy().await,
    })
}

/// POST /api/host/verify - Check a host key
pub async fn verify_host(
    State(ctx): State<AppContext>,
    Json(req): Json<VerifyHostRequest>,
) -> ApiResult<VerifyHostResponse> {
    verify_host_key(Some(&req.key), &ctx.host_key_hash).map_err(|_| QueueError::Unauthorized)?;
    ok(VerifyHostResponse { host: true })
}

// ============================================================================
// Host Endpoints
// ============================================================================

/// POST /api/advance - Skip to the next pending item
pub async fn advance(State(ctx): State<AppContext>) -> ApiResult<CurrentResponse> {
    ok(CurrentResponse {
        current: ctx.service.advance().await,
    })
}

/// POST /api/rewind - Go back to the most recent history item
pub async fn rewind(State(ctx): State<AppContext>) -> ApiResult<CurrentResponse> {
    let current = ctx.service.rewind().await?;
    ok(CurrentResponse {
        current: Some(current),
    })
}

/// POST /api/select - Play an item now, bypassing the queue
pub async fn select(
    State(ctx): State<AppContext>,
    SubmitterIdentity(identity): SubmitterIdentity,
    Json(req): Json<ItemRefRequest>,
) -> ApiResult<CurrentResponse> {
    let current = ctx.service.select_direct(&identity, &req.item_ref).await?;
    ok(CurrentResponse {
        current: Some(current),
    })
}

/// POST /api/resume - Start from the pending head when idle
pub async fn resume(State(ctx): State<AppContext>) -> ApiResult<CurrentResponse> {
    ok(CurrentResponse {
        current: ctx.service.resume().await,
    })
}

/// POST /api/clear - Empty the pending sequence
pub async fn clear(State(ctx): State<AppContext>) -> ApiResult<ClearResponse> {
    ok(ClearResponse {
        cleared: ctx.service.clear_pending().await,
    })
}

/// POST /api/remove - Remove the first pending item with a reference
pub async fn remove(
    State(ctx): State<AppContext>,
    Json(req): Json<ItemRefRequest>,
) -> ApiResult<RemoveResponse> {
    let removed = ctx.service.remove_by_ref(&req.item_ref).await?;
    ok(RemoveResponse { removed })
}

/// POST /api/progress - Playback surface progress report
pub async fn progress(
    State(ctx): State<AppContext>,
    Json(report): Json<ProgressReport>,
) -> ApiResult<ProgressResponse> {
    let response = match ctx.service.report_progress(report).await {
        ProgressOutcome::Recorded(_) => ProgressResponse {
            outcome: "recorded",
            current: None,
        },
        ProgressOutcome::Advanced(current) => ProgressResponse {
            outcome: "advanced",
            current,
        },
        ProgressOutcome::Ignored => ProgressResponse {
            outcome: "ignored",
            current: None,
        },
    };
    ok(response)
}

/// POST /api/policy - Partial policy update
pub async fn update_policy(
    State(ctx): State<AppContext>,
    Json(update): Json<PolicyUpdate>,
) -> ApiResult<PolicyResponse> {
    let policy = ctx.service.update_policy(update).await;
    ok(PolicyResponse { policy })
}
