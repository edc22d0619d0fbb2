//! Host authentication layer
//!
//! Privileged routes require the plain host key in the `X-Host-Key` header.
//! The key is hashed and compared against the stored digest using
//! `ytq_common::api::verify_host_key`.

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, warn};
use ytq_common::api::auth::HOST_KEY_HEADER;
use ytq_common::api::{verify_host_key, HostAuthError};

use super::error::ApiError;
use crate::queue::QueueError;

/// Tower layer guarding host-only routes
#[derive(Clone)]
pub struct HostAuthLayer {
    host_key_hash: Arc<str>,
}

impl HostAuthLayer {
    pub fn new(host_key_hash: Arc<str>) -> Self {
        Self { host_key_hash }
    }
}

impl<S> Layer<S> for HostAuthLayer {
    type Service = HostAuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HostAuthMiddleware {
            inner,
            host_key_hash: Arc::clone(&self.host_key_hash),
        }
    }
}

/// Tower service that rejects requests without a valid host key
#[derive(Clone)]
pub struct HostAuthMiddleware<S> {
    inner: S,
    host_key_hash: Arc<str>,
}

impl<S> Service<Request> for HostAuthMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let verdict = check_host(&request, &self.host_key_hash);

        // Swap in the clone so the instance polled ready handles this call
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match verdict {
                Ok(()) => inner.call(request).await,
                Err(e) => {
                    warn!(path = %request.uri().path(), reason = %e, "Host access denied");
                    Ok(ApiError::from(QueueError::Unauthorized).into_response())
                }
            }
        })
    }
}

/// Check the host key header on a request
pub fn check_host<B>(request: &axum::http::Request<B>, host_key_hash: &str) -> Result<(), HostAuthError> {
    let provided = request
        .headers()
        .get(HOST_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    verify_host_key(provided, host_key_hash)?;
    debug!(path = %request.uri().path(), "Host access granted");
    Ok(())
}
