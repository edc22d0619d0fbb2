//! HTTP server setup and routing
//!
//! Sets up the Axum router: public queue endpoints, host-only endpoints
//! behind `HostAuthLayer`, and the SSE stream.

use crate::error::{Error, Result};
use crate::service::QueueService;
use crate::state::SharedState;
use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::auth_middleware::HostAuthLayer;
use super::identity::ForwardedForPolicy;
use super::{handlers, sse};

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub service: Arc<QueueService>,
    pub state: Arc<SharedState>,
    /// SHA-256 hex digest of the host key
    pub host_key_hash: Arc<str>,
    pub forwarded_for: ForwardedForPolicy,
}

impl AppContext {
    pub fn new(service: Arc<QueueService>, host_key_hash: impl Into<Arc<str>>) -> Self {
        let state = Arc::clone(service.shared_state());
        Self {
            service,
            state,
            host_key_hash: host_key_hash.into(),
            forwarded_for: ForwardedForPolicy::Trust,
        }
    }

    pub fn with_trust_forwarded_for(mut self, trust: bool) -> Self {
        self.forwarded_for = if trust {
            ForwardedForPolicy::Trust
        } else {
            ForwardedForPolicy::Ignore
        };
        self
    }
}

impl FromRef<AppContext> for ForwardedForPolicy {
    fn from_ref(ctx: &AppContext) -> Self {
        ctx.forwarded_for
    }
}

/// Build the application router
pub fn build_router(ctx: AppContext) -> Router {
    let host_routes = Router::new()
        .route("/api/advance", post(handlers::advance))
        .route("/api/rewind", post(handlers::rewind))
        .route("/api/select", post(handlers::select))
        .route("/api/resume", post(handlers::resume))
        .route("/api/clear", post(handlers::clear))
        .route("/api/remove", post(handlers::remove))
        .route("/api/progress", post(handlers::progress))
        .route("/api/policy", post(handlers::update_policy))
        .route_layer(HostAuthLayer::new(Arc::clone(&ctx.host_key_hash)));

    Router::new()
        // Health endpoint
        .route("/health", get(handlers::health))
        // Public queue endpoints
        .route("/api/state", get(handlers::get_state))
        .route("/api/enqueue", post(handlers::enqueue))
        .route("/api/name", post(handlers::register_name))
        .route("/api/policy", get(handlers::get_policy))
        .route("/api/host/verify", post(handlers::verify_host))
        // SSE event stream
        .route("/api/events", get(sse::event_stream))
        .merge(host_routes)
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run HTTP API server until `shutdown` resolves
pub async fn run(
    bind_address: &str,
    port: u16,
    ctx: AppContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", bind_address, port)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid bind address {}:{}: {}", bind_address, port, e)))?;

    let app = build_router(ctx);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
