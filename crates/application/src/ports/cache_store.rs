use async_trait::async_trait;
use cachedns_domain::{CacheKey, CachedEntry, DomainError};
use std::time::Duration;

/// Key-value store holding one `CachedEntry` per question name.
///
/// Implementations are shared by every in-flight request and must be safe
/// to call concurrently without outside locking.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` is a miss. Errors are reported, never retried.
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedEntry>, DomainError>;

    /// Writes the entry with an absolute lifetime of `ttl`.
    async fn set(&self, key: &CacheKey, entry: &CachedEntry, ttl: Duration)
        -> Result<(), DomainError>;

    fn backend_name(&self) -> &'static str;
}
