use async_trait::async_trait;
use cachedns_application::ports::{CacheStore, UpstreamResolver, UpstreamResponse};
use cachedns_domain::{CacheKey, CachedEntry, DnsQuery, DomainError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct MockCacheStore {
    entries: Mutex<HashMap<String, CachedEntry>>,
    ttls: Mutex<HashMap<String, Duration>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    gets: AtomicUsize,
    sets: AtomicUsize,
    slow_gets: AtomicUsize,
    slow_get_delay: Mutex<Duration>,
}

impl MockCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, entry: CachedEntry) {
        self.entries.lock().unwrap().insert(key.to_string(), entry);
    }

    pub fn entry(&self, key: &str) -> Option<CachedEntry> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.ttls.lock().unwrap().get(key).copied()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The next `count` reads take their snapshot immediately but only
    /// return after `delay`, like a reply still on the wire.
    pub fn slow_down_gets(&self, count: usize, delay: Duration) {
        *self.slow_get_delay.lock().unwrap() = delay;
        self.slow_gets.store(count, Ordering::SeqCst);
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for MockCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedEntry>, DomainError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DomainError::CacheRead("connection refused".to_string()));
        }
        let snapshot = self.entries.lock().unwrap().get(key.as_str()).cloned();
        let slow = self
            .slow_gets
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if slow {
            let delay = *self.slow_get_delay.lock().unwrap();
            tokio::time::sleep(delay).await;
        }
        Ok(snapshot)
    }

    async fn set(
        &self,
        key: &CacheKey,
        entry: &CachedEntry,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::CacheWrite("connection refused".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), entry.clone());
        self.ttls.lock().unwrap().insert(key.to_string(), ttl);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

pub struct MockUpstreamResolver {
    responses: Mutex<HashMap<String, UpstreamResponse>>,
    error: Mutex<Option<DomainError>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockUpstreamResolver {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            error: Mutex::new(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_response(&self, domain: &str, response: UpstreamResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(domain.to_string(), response);
    }

    pub fn set_error(&self, error: Option<DomainError>) {
        *self.error.lock().unwrap() = error;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockUpstreamResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpstreamResolver for MockUpstreamResolver {
    async fn resolve(&self, query: &DnsQuery) -> Result<UpstreamResponse, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }

        self.responses
            .lock()
            .unwrap()
            .get(query.domain.as_ref())
            .cloned()
            .ok_or_else(|| DomainError::UpstreamTimeout {
                server: self.server().to_string(),
            })
    }

    fn server(&self) -> &str {
        "192.0.2.53:53"
    }
}

