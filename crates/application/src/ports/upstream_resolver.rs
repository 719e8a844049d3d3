use async_trait::async_trait;
use cachedns_domain::{CachedEntry, DnsQuery, DomainError, HeaderFlags};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// A decoded upstream answer.
///
/// `wire` is the response exactly as the resolver sent it and is relayed to
/// the client untouched; the other fields are what ends up in the cache.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub wire: Arc<[u8]>,
    pub header: HeaderFlags,
    pub question: Option<String>,
    pub addresses: Vec<Ipv4Addr>,
}

impl UpstreamResponse {
    /// Cache value for this response. Falls back to the client's question
    /// name when the resolver echoed no question section.
    pub fn to_cached_entry(&self, query: &DnsQuery) -> CachedEntry {
        let question = self
            .question
            .clone()
            .unwrap_or_else(|| query.domain.to_string());
        CachedEntry::new(self.header, question, self.addresses.clone())
    }
}

#[async_trait]
pub trait UpstreamResolver: Send + Sync {
    async fn resolve(&self, query: &DnsQuery) -> Result<UpstreamResponse, DomainError>;

    /// Address of the resolver, for logs.
    fn server(&self) -> &str;
}
