use super::redis_client::RedisClient;
use super::resp::RedisError;
use async_trait::async_trait;
use cachedns_application::ports::CacheStore;
use cachedns_domain::{CacheKey, CachedEntry, DomainError};
use std::time::Duration;
use tracing::debug;

/// `CacheStore` backed by Redis. Keys are the question name, values the
/// JSON form of `CachedEntry`.
pub struct RedisCacheStore {
    client: RedisClient,
    timeout_ms: u64,
}

impl RedisCacheStore {
    pub fn new(client: RedisClient, timeout: Duration) -> Self {
        Self {
            client,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn connect(url: &str, pool_size: usize, timeout: Duration) -> Result<Self, DomainError> {
        let client = RedisClient::from_url(url, pool_size, timeout)
            .map_err(|e| DomainError::CacheRead(e.to_string()))?;
        Ok(Self::new(client, timeout))
    }

    pub fn client(&self) -> &RedisClient {
        &self.client
    }

    pub async fn ping(&self) -> Result<(), DomainError> {
        self.client
            .ping()
            .await
            .map_err(|e| self.map_error(e, DomainError::CacheRead))
    }

    fn map_error(&self, error: RedisError, wrap: fn(String) -> DomainError) -> DomainError {
        match error {
            RedisError::Timeout => DomainError::CacheTimeout(self.timeout_ms),
            other => wrap(other.to_string()),
        }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedEntry>, DomainError> {
        let Some(raw) = self
            .client
            .get(key.as_str())
            .await
            .map_err(|e| self.map_error(e, DomainError::CacheRead))?
        else {
            debug!(key = %key, "Redis miss");
            return Ok(None);
        };

        serde_json::from_slice::<CachedEntry>(&raw)
            .map(Some)
            .map_err(|e| DomainError::CorruptCacheEntry(format!("{}: {}", key, e)))
    }

    async fn set(
        &self,
        key: &CacheKey,
        entry: &CachedEntry,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let value =
            serde_json::to_vec(entry).map_err(|e| DomainError::CacheWrite(e.to_string()))?;
        self.client
            .set_px(key.as_str(), &value, ttl)
            .await
            .map_err(|e| self.map_error(e, DomainError::CacheWrite))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
