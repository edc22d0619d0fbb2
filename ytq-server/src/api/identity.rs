//! Submitter identity extraction
//!
//! The identity is an opaque key for the queue domain. Here it is the first
//! `X-Forwarded-For` entry (when trusted), else the peer address, else
//! `0.0.0.0`.
//!
//! `X-Forwarded-For` is client-controlled unless a reverse proxy rewrites it.
//! Exposed directly, run with `ForwardedForPolicy::Ignore` or any client can
//! step around the submission throttle and name cooldown.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::request::Parts,
};
use std::convert::Infallible;
use std::net::SocketAddr;

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_IDENTITY: &str = "0.0.0.0";

/// Whether `X-Forwarded-For` may name the submitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardedForPolicy {
    /// Behind a proxy that sets the header
    Trust,
    /// Peer address only
    Ignore,
}

/// Opaque submitter key for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitterIdentity(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for SubmitterIdentity
where
    ForwardedForPolicy: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if ForwardedForPolicy::from_ref(state) == ForwardedForPolicy::Trust {
            let forwarded = parts
                .headers
                .get(FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());

            if let Some(first) = forwarded {
                return Ok(Self(first.to_string()));
            }
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(Self(peer.unwrap_or_else(|| UNKNOWN_IDENTITY.to_string())))
    }
}
