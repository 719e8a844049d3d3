use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,

    Memory,
}

impl CacheBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Redis => "redis",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Connection string, e.g. `redis://:secret@127.0.0.1:6379/0`.
    /// The `REDIS_URI` environment variable takes precedence over the file.
    #[serde(default)]
    pub url: Option<String>,

    /// Lifetime of a cache entry in the store.
    #[serde(default = "default_entry_ttl_secs")]
    pub entry_ttl_secs: u64,

    /// TTL written into answers synthesized from the cache. Independent of
    /// the entry's remaining lifetime.
    #[serde(default = "default_answer_ttl_secs")]
    pub answer_ttl_secs: u32,

    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,

    /// Maximum idle connections kept to the store.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// How often the memory backend sweeps out expired entries.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

impl CacheConfig {
    pub fn entry_ttl(&self) -> Duration {
        Duration::from_secs(self.entry_ttl_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            url: None,
            entry_ttl_secs: default_entry_ttl_secs(),
            answer_ttl_secs: default_answer_ttl_secs(),
            operation_timeout_ms: default_operation_timeout_ms(),
            pool_size: default_pool_size(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

fn default_entry_ttl_secs() -> u64 {
    60
}

fn default_answer_ttl_secs() -> u32 {
    300
}

fn default_operation_timeout_ms() -> u64 {
    500
}

fn default_pool_size() -> usize {
    8
}

fn default_purge_interval_secs() -> u64 {
    60
}
