//! HTTP client for the data provider
//!
//! This module handles all provider requests, including:
//! - Building the shared HTTP client
//! - Consulting the permanent response cache before touching the network
//! - Unwrapping the provider's response envelope
//! - Decoding payloads into typed snapshots, histories and reports
//!
//! There is no retry and no backoff: a failed request is returned to the
//! caller as an error and nothing is cached for it.

use crate::config::ProviderConfig;
use crate::model::{AccountRef, ActivityHistory, MatchReport, ProfileSnapshot};
use crate::provider::Endpoints;
use crate::storage::{fingerprint, CacheStore};
use crate::CrawlError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Header carrying the static API credential
pub const API_KEY_HEADER: &str = "x-api-key";

/// The provider wraps every payload in an envelope; only `Response` is kept
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: Option<serde_json::Value>,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `timeout` - Optional per-request timeout; `None` waits indefinitely
pub fn build_http_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder.build()
}

/// Cache-through client for the three provider resources
pub struct ProviderClient {
    http: Client,
    endpoints: Endpoints,
    api_key: String,
    cache: Arc<dyn CacheStore>,
    cache_hits: AtomicU64,
    network_fetches: AtomicU64,
}

impl ProviderClient {
    /// Creates a client from provider configuration and a cache backend
    pub fn new(config: &ProviderConfig, cache: Arc<dyn CacheStore>) -> Result<Self, CrawlError> {
        Ok(Self {
            http: build_http_client(config.timeout())?,
            endpoints: Endpoints::new(&config.base_url, &config.title)?,
            api_key: config.api_key.clone(),
            cache,
            cache_hits: AtomicU64::new(0),
            network_fetches: AtomicU64::new(0),
        })
    }

    /// Fetches the account snapshot (characters and collectibles)
    pub async fn get_profile(&self, account: &AccountRef) -> Result<ProfileSnapshot, CrawlError> {
        let url = self.endpoints.profile(account)?;
        self.fetch_json(&url).await
    }

    /// Fetches the first page of one character's match history
    pub async fn get_activity_history(
        &self,
        account: &AccountRef,
        character_id: &str,
    ) -> Result<ActivityHistory, CrawlError> {
        let url = self.endpoints.activity_history(account, character_id)?;
        self.fetch_json(&url).await
    }

    /// Fetches the full report of one match
    pub async fn get_match_report(&self, match_id: &str) -> Result<MatchReport, CrawlError> {
        let url = self.endpoints.match_report(match_id)?;
        self.fetch_json(&url).await
    }

    /// Number of requests answered from the cache
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Number of requests that went to the network
    pub fn network_fetches(&self) -> u64 {
        self.network_fetches.load(Ordering::Relaxed)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, CrawlError> {
        let payload = self.fetch(url).await?;
        serde_json::from_slice(&payload).map_err(|e| CrawlError::Malformed {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Returns the `Response` payload for `url`, from the cache when possible
    ///
    /// A cache hit returns exactly the bytes stored by the first fetch and
    /// never reaches the network.
    pub async fn fetch(&self, url: &Url) -> Result<Vec<u8>, CrawlError> {
        let key = fingerprint(url.as_str());

        if let Some(payload) = self.cache.get(&key)? {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("Cache hit for {}", url);
            return Ok(payload);
        }

        tracing::debug!("Fetching {}", url);
        self.network_fetches.fetch_add(1, Ordering::Relaxed);

        let response = self
            .http
            .get(url.clone())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .send()
            .await
            .map_err(|source| CrawlError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| CrawlError::Http {
            url: url.to_string(),
            source,
        })?;

        let envelope: Envelope =
            serde_json::from_slice(&body).map_err(|e| CrawlError::Malformed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let data = envelope.response.ok_or_else(|| CrawlError::Malformed {
            url: url.to_string(),
            message: "response envelope has no Response field".to_string(),
        })?;

        let payload = serde_json::to_vec(&data)?;
        self.cache.put(&key, url.as_str(), &payload)?;

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCache;

    fn config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            base_url: base_url.to_string(),
            api_key: String::new(),
            title: "Destiny2".to_string(),
            collectible_id: "319846607".to_string(),
            request_timeout: 0,
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(None).is_ok());
        assert!(build_http_client(Some(Duration::from_secs(5))).is_ok());
    }

    #[tokio::test]
    async fn test_cached_payload_skips_network() {
        let cache = Arc::new(MemoryCache::new());
        // Nothing listens on port 9; only a cache hit can succeed
        let client = ProviderClient::new(&config("http://127.0.0.1:9"), cache.clone()).unwrap();
        let url = client.endpoints.match_report("77").unwrap();
        let payload = br#"{"entries":[]}"#;
        cache
            .put(&fingerprint(url.as_str()), url.as_str(), payload)
            .unwrap();

        let report = client.get_match_report("77").await.unwrap();

        assert!(report.entries.is_empty());
        assert_eq!(client.cache_hits(), 1);
        assert_eq!(client.network_fetches(), 0);
    }

    #[tokio::test]
    async fn test_malformed_cached_payload() {
        let cache = Arc::new(MemoryCache::new());
        let client = ProviderClient::new(&config("http://127.0.0.1:9"), cache.clone()).unwrap();
        let url = client.endpoints.match_report("78").unwrap();
        cache
            .put(&fingerprint(url.as_str()), url.as_str(), br#"{"nope":1}"#)
            .unwrap();

        let result = client.get_match_report("78").await;
        assert!(matches!(result, Err(CrawlError::Malformed { .. })));
    }
}
