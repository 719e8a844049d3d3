use cachedns_domain::{CacheKey, CachedEntry, DomainError};
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use tokio::sync::watch;

/// What a leader hands to the requests that joined its resolution.
pub type InflightOutcome = Result<Arc<CachedEntry>, DomainError>;

type InflightSender = Arc<watch::Sender<Option<InflightOutcome>>>;
type InflightMap = DashMap<CacheKey, InflightSender, FxBuildHasher>;

/// Single-flight registry: at most one upstream resolution per cache key.
#[derive(Default)]
pub struct InflightRegistry {
    inflight: Arc<InflightMap>,
}

pub enum InflightRole {
    Leader(InflightLeaderGuard),
    Follower(watch::Receiver<Option<InflightOutcome>>),
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(DashMap::with_hasher(FxBuildHasher)),
        }
    }

    /// The first caller for a key becomes the leader; everyone arriving
    /// while the leader holds its guard subscribes to its outcome.
    pub fn register_or_join(&self, key: &CacheKey) -> InflightRole {
        match self.inflight.entry(key.clone()) {
            dashmap::Entry::Occupied(e) => {
                let rx = e.get().subscribe();
                drop(e);
                InflightRole::Follower(rx)
            }
            dashmap::Entry::Vacant(e) => {
                let (tx, _) = watch::channel(None::<InflightOutcome>);
                let tx = Arc::new(tx);
                e.insert(Arc::clone(&tx));
                InflightRole::Leader(InflightLeaderGuard {
                    inflight: Arc::clone(&self.inflight),
                    key: key.clone(),
                    tx,
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }
}

/// Held by the leader for the duration of its resolution.
///
/// Dropping it without calling `publish` (the leader's future was cancelled)
/// wakes the followers with `None` so they can retry on their own.
pub struct InflightLeaderGuard {
    inflight: Arc<InflightMap>,
    key: CacheKey,
    tx: InflightSender,
}

impl InflightLeaderGuard {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn publish(self, outcome: InflightOutcome) {
        self.unregister();
        let _ = self.tx.send(Some(outcome));
    }

    fn unregister(&self) -> bool {
        self.inflight
            .remove_if(&self.key, |_, tx| Arc::ptr_eq(tx, &self.tx))
            .is_some()
    }
}

impl Drop for InflightLeaderGuard {
    fn drop(&mut self) {
        if self.unregister() {
            let _ = self.tx.send(None);
        }
    }
}

/// Waits for the leader. `None` means it went away without an outcome.
pub async fn wait_for_leader(
    mut rx: watch::Receiver<Option<InflightOutcome>>,
) -> Option<InflightOutcome> {
    if rx.changed().await.is_ok() {
        return rx.borrow().clone();
    }
    rx.borrow().clone()
}
