use super::memory::InMemoryCacheStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(60);
const MIN_PURGE_INTERVAL: Duration = Duration::from_millis(1);

/// Periodically drops expired entries from the in-memory store, so names
/// that are never queried again do not stay resident.
pub struct CachePurgeJob {
    store: Arc<InMemoryCacheStore>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl CachePurgeJob {
    pub fn new(store: Arc<InMemoryCacheStore>) -> Self {
        Self {
            store,
            interval: DEFAULT_PURGE_INTERVAL,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(self) -> JoinHandle<()> {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting cache purge job"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval.max(MIN_PURGE_INTERVAL));
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        debug!("CachePurgeJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let removed = self.store.purge_expired();
                        if removed > 0 {
                            debug!(
                                entries_removed = removed,
                                cache_size = self.store.len(),
                                "Expired cache entries purged"
                            );
                        }
                    }
                }
            }
        })
    }
}
