use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Malformed DNS query: {0}")]
    MalformedQuery(String),

    #[error("Failed to encode DNS response: {0}")]
    EncodeFailed(String),

    #[error("Timeout waiting for upstream {server}")]
    UpstreamTimeout { server: String },

    #[error("Upstream {server} network error: {reason}")]
    UpstreamNetwork { server: String, reason: String },

    #[error("Invalid DNS response: {0}")]
    InvalidUpstreamResponse(String),

    #[error("Cache read error: {0}")]
    CacheRead(String),

    #[error("Cache write error: {0}")]
    CacheWrite(String),

    #[error("Cache operation timed out after {0} ms")]
    CacheTimeout(u64),

    #[error("Corrupt cache entry: {0}")]
    CorruptCacheEntry(String),
}

impl DomainError {
    /// Errors raised while talking to the upstream resolver. The request is
    /// dropped without a reply when one of these reaches the listener.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            DomainError::UpstreamTimeout { .. }
                | DomainError::UpstreamNetwork { .. }
                | DomainError::InvalidUpstreamResponse(_)
        )
    }
}
