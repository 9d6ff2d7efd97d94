//! Issuer public-key sets (JWKS).
//!
//! Signature verification fetches the key set named by a credential's
//! `issuerPublicKeyUrl` claim. [`CachingKeySetFetcher`] keeps fetched sets
//! for a configurable lifetime; with a zero lifetime every verification
//! fetches afresh.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use parking_lot::Mutex;

use crate::config::KeySetConfig;
use crate::error::ClientError;
use crate::retry::RetryPolicy;

const ENDPOINT: &str = "GET {issuerPublicKeyUrl}";

/// Source of issuer key sets.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    /// Fetch and parse the key set at `url`.
    async fn fetch(&self, url: &str) -> Result<JwkSet, ClientError>;
}

/// Fetches key sets over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpKeySetFetcher {
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpKeySetFetcher {
    /// Build a fetcher with the configured request timeout.
    pub fn new(config: &KeySetConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            retry: RetryPolicy::with_retries(config.max_retries),
        })
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    async fn fetch(&self, url: &str) -> Result<JwkSet, ClientError> {
        let parsed = url::Url::parse(url).map_err(|e| ClientError::InvalidRequest {
            endpoint: ENDPOINT.into(),
            reason: format!("invalid key set URL {url}: {e}"),
        })?;
        let resp = self
            .retry
            .send(ENDPOINT, || self.http.get(parsed.clone()).send())
            .await
            .map_err(|e| ClientError::Http {
                endpoint: ENDPOINT.into(),
                source: e,
            })?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                endpoint: ENDPOINT.into(),
                status,
                body,
            });
        }
        let set: JwkSet = resp.json().await.map_err(|e| ClientError::Deserialization {
            endpoint: ENDPOINT.into(),
            source: e,
        })?;
        tracing::debug!(url, keys = set.keys.len(), "fetched issuer key set");
        Ok(set)
    }
}

/// Wraps a fetcher with a per-URL time-to-live cache.
pub struct CachingKeySetFetcher {
    inner: Arc<dyn KeySetFetcher>,
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, JwkSet)>>,
}

impl CachingKeySetFetcher {
    /// Cache `inner`'s results for `ttl`.
    pub fn new(inner: Arc<dyn KeySetFetcher>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, url: &str) -> Option<JwkSet> {
        let entries = self.entries.lock();
        entries
            .get(url)
            .filter(|(fetched_at, _)| fetched_at.elapsed() < self.ttl)
            .map(|(_, set)| set.clone())
    }
}

#[async_trait]
impl KeySetFetcher for CachingKeySetFetcher {
    async fn fetch(&self, url: &str) -> Result<JwkSet, ClientError> {
        if let Some(set) = self.cached(url) {
            tracing::trace!(url, "issuer key set cache hit");
            return Ok(set);
        }
        let set = self.inner.fetch(url).await?;
        self.entries
            .lock()
            .insert(url.to_string(), (Instant::now(), set.clone()));
        Ok(set)
    }
}
