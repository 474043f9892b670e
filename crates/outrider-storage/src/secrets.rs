//! Secret retrieval with a component-owned TTL cache
//!
//! The cache is an explicit value (`{value, fetched_at}` per secret) held
//! by the decorator, not module state. Duplicate fetches under concurrency
//! are tolerated; the cache only saves round trips, it is not
//! correctness-critical.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{Result, StorageError};

/// Default lifetime of a cached secret value.
pub const DEFAULT_SECRET_TTL: Duration = Duration::from_secs(300);

/// Trait for secret retrieval
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret value by identifier
    async fn get_secret(&self, id: &str) -> Result<String>;
}

/// Secret store client over the secrets REST API
#[derive(Debug, Clone)]
pub struct RestSecretStore {
    base_url: String,
    api_token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SecretResponse {
    value: String,
}

impl RestSecretStore {
    /// Create a new client
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn secret_url(&self, id: &str) -> String {
        format!("{}/v1/secrets/{}", self.base_url, id)
    }
}

#[async_trait]
impl SecretStore for RestSecretStore {
    async fn get_secret(&self, id: &str) -> Result<String> {
        let url = self.secret_url(id);
        debug!(secret = id, "fetching secret");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| StorageError::Secret(format!("fetch failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(StorageError::Secret(format!(
                "secret '{}' fetch returned {}",
                id, status
            )));
        }

        let secret: SecretResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Secret(format!("invalid secret response: {}", e)))?;

        let value = secret.value.trim().to_string();
        if value.is_empty() {
            return Err(StorageError::EmptySecret(id.to_string()));
        }

        Ok(value)
    }
}

struct CachedSecret {
    value: String,
    fetched_at: Instant,
}

/// TTL cache decorating any [`SecretStore`].
pub struct SecretCache {
    inner: Arc<dyn SecretStore>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedSecret>>,
}

impl SecretCache {
    /// Wrap a store with the default TTL
    pub fn new(inner: Arc<dyn SecretStore>) -> Self {
        Self {
            inner,
            ttl: DEFAULT_SECRET_TTL,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Set the cache TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[async_trait]
impl SecretStore for SecretCache {
    async fn get_secret(&self, id: &str) -> Result<String> {
        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(id) {
                if cached.fetched_at.elapsed() < self.ttl {
                    debug!(secret = id, age = ?cached.fetched_at.elapsed(), "secret served from cache");
                    return Ok(cached.value.clone());
                }
            }
        }

        // Stale or missing: fetch outside the lock. Two callers racing here
        // both fetch; last write wins and both values are valid.
        let value = self.inner.get_secret(id).await?;
        info!(secret = id, "secret refreshed");

        let mut entries = self.entries.write().await;
        entries.insert(
            id.to_string(),
            CachedSecret {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(value)
    }
}
