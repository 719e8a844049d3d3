use crate::ports::{CacheStore, UpstreamResolver};
use crate::services::{
    wait_for_leader, DispatchStats, DispatchStatsSnapshot, InflightLeaderGuard, InflightRegistry,
    InflightRole,
};
use cachedns_domain::{CacheKey, CachedEntry, DnsQuery, DomainError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How a query was answered.
#[derive(Debug, Clone)]
pub enum QueryResolution {
    /// Found in the cache store.
    Cached(Arc<CachedEntry>),
    /// Joined another request's upstream resolution for the same key.
    Coalesced(Arc<CachedEntry>),
    /// Resolved upstream by this request; the bytes are the resolver's
    /// response, to be relayed as is.
    Forwarded(Arc<[u8]>),
}

impl QueryResolution {
    pub fn is_cache_hit(&self) -> bool {
        matches!(self, QueryResolution::Cached(_))
    }
}

enum Lookup {
    Hit(Arc<CachedEntry>),
    Miss,
    Unavailable,
}

pub struct HandleDnsQueryUseCase {
    cache: Arc<dyn CacheStore>,
    upstream: Arc<dyn UpstreamResolver>,
    entry_ttl: Duration,
    inflight: InflightRegistry,
    stats: Arc<DispatchStats>,
}

impl HandleDnsQueryUseCase {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        upstream: Arc<dyn UpstreamResolver>,
        entry_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            upstream,
            entry_ttl,
            inflight: InflightRegistry::new(),
            stats: Arc::new(DispatchStats::new()),
        }
    }

    pub fn with_stats(mut self, stats: Arc<DispatchStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }

    pub async fn execute(&self, query: &DnsQuery) -> Result<QueryResolution, DomainError> {
        self.stats.record_query();
        let key = query.cache_key();

        loop {
            let first = self.lookup(&key).await;
            if let Lookup::Hit(entry) = &first {
                self.stats.record_hit();
                debug!(domain = %query.domain, id = query.id, "Cache HIT");
                return Ok(QueryResolution::Cached(Arc::clone(entry)));
            }

            match self.inflight.register_or_join(&key) {
                InflightRole::Leader(guard) => {
                    // A previous leader may have stored and unregistered since
                    // the first lookup.
                    if matches!(first, Lookup::Miss) {
                        if let Lookup::Hit(entry) = self.lookup(&key).await {
                            self.stats.record_hit();
                            debug!(
                                domain = %query.domain,
                                id = query.id,
                                "Cache HIT after election"
                            );
                            guard.publish(Ok(Arc::clone(&entry)));
                            return Ok(QueryResolution::Cached(entry));
                        }
                    }
                    self.stats.record_miss();
                    return self.resolve_as_leader(query, guard).await;
                }
                InflightRole::Follower(rx) => match wait_for_leader(rx).await {
                    Some(Ok(entry)) => {
                        self.stats.record_coalesced();
                        debug!(domain = %query.domain, id = query.id, "Joined in-flight resolution");
                        return Ok(QueryResolution::Coalesced(entry));
                    }
                    Some(Err(e)) => return Err(e),
                    None => {
                        debug!(domain = %query.domain, "In-flight leader abandoned, retrying");
                    }
                },
            }
        }
    }

    /// A read error or an unreadable entry is reported as `Unavailable` and
    /// handled like a miss by the caller.
    async fn lookup(&self, key: &CacheKey) -> Lookup {
        match self.cache.get(key).await {
            Ok(Some(entry)) => match entry.addresses() {
                Ok(_) => Lookup::Hit(Arc::new(entry)),
                Err(e) => {
                    self.stats.record_cache_read_error();
                    warn!(key = %key, error = %e, "Ignoring cached entry");
                    Lookup::Unavailable
                }
            },
            Ok(None) => Lookup::Miss,
            Err(e) => {
                self.stats.record_cache_read_error();
                warn!(
                    key = %key,
                    backend = self.cache.backend_name(),
                    error = %e,
                    "Cache lookup failed, treating as miss"
                );
                Lookup::Unavailable
            }
        }
    }

    async fn resolve_as_leader(
        &self,
        query: &DnsQuery,
        guard: InflightLeaderGuard,
    ) -> Result<QueryResolution, DomainError> {
        debug!(domain = %query.domain, id = query.id, "Cache MISS");

        let response = match self.upstream.resolve(query).await {
            Ok(response) => response,
            Err(e) => {
                self.stats.record_upstream_failure();
                warn!(
                    domain = %query.domain,
                    server = self.upstream.server(),
                    error = %e,
                    "Upstream resolution failed"
                );
                guard.publish(Err(e.clone()));
                return Err(e);
            }
        };
        self.stats.record_upstream();

        let entry = Arc::new(response.to_cached_entry(query));
        if let Err(e) = self.cache.set(guard.key(), &entry, self.entry_ttl).await {
            self.stats.record_cache_write_error();
            warn!(
                key = %guard.key(),
                backend = self.cache.backend_name(),
                error = %e,
                "Failed to store response in cache"
            );
        }

        guard.publish(Ok(entry));
        Ok(QueryResolution::Forwarded(response.wire))
    }
}
