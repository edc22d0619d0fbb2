//! Display-title resolution
//!
//! Best effort: any failure is logged and replaced by the synthetic
//! `"Video <id>"` title. Never called while the queue lock is held.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::queue::fallback_title;

const OEMBED_URL: &str = "https://www.youtube.com/oembed";
const WATCH_URL: &str = "https://www.youtube.com/watch";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(6);
const USER_AGENT: &str = concat!("ytq/", env!("CARGO_PKG_VERSION"));

/// Resolves a display title for an item reference
#[async_trait]
pub trait TitleResolver: Send + Sync {
    /// Look up the title; errors are the caller's to default
    async fn lookup(&self, item_ref: &str) -> Result<String>;

    /// Title for `item_ref`, falling back to the synthetic title
    async fn resolve(&self, item_ref: &str) -> String {
        match self.lookup(item_ref).await {
            Ok(title) => title,
            Err(e) => {
                warn!(item_ref = %item_ref, error = %e, "Title lookup failed, using fallback");
                fallback_title(item_ref)
            }
        }
    }
}

/// Always answers with the synthetic title
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticTitleResolver;

#[async_trait]
impl TitleResolver for SyntheticTitleResolver {
    async fn lookup(&self, item_ref: &str) -> Result<String> {
        Ok(fallback_title(item_ref))
    }
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
}

/// Looks titles up through the public oEmbed endpoint
pub struct OEmbedTitleResolver {
    http_client: reqwest::Client,
    endpoint: String,
}

impl OEmbedTitleResolver {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(OEMBED_URL)
    }

    /// Use a different oEmbed endpoint
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl TitleResolver for OEmbedTitleResolver {
    async fn lookup(&self, item_ref: &str) -> Result<String> {
        let watch_url = format!("{}?v={}", WATCH_URL, item_ref);
        debug!(item_ref = %item_ref, "Querying oEmbed");

        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("url", watch_url.as_str()), ("format", "json")])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!("oEmbed returned {}", status)));
        }

        let body: OEmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Http(format!("Invalid oEmbed body: {}", e)))?;

        body.title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Http("oEmbed response has no title".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingResolver;

    #[async_trait]
    impl TitleResolver for FailingResolver {
        async fn lookup(&self, _item_ref: &str) -> Result<String> {
            Err(Error::Http("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_synthetic_title() {
        assert_eq!(SyntheticTitleResolver.resolve("dQw4w9WgXcQ").await, "Video dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn test_failure_falls_back() {
        assert_eq!(FailingResolver.resolve("dQw4w9WgXcQ").await, "Video dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        // Port 9 (discard) on localhost refuses connections
        let resolver = OEmbedTitleResolver::with_endpoint("http://127.0.0.1:9/oembed").unwrap();
        assert_eq!(resolver.resolve("dQw4w9WgXcQ").await, "Video dQw4w9WgXcQ");
    }
}
