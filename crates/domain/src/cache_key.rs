use super::DnsQuery;
use std::fmt;
use std::sync::Arc;

/// Cache key for a query.
///
/// Built from the question name only, byte-for-byte as the client sent it:
/// `Example.com.` and `example.com` are different keys. The record type and
/// class are NOT part of the key, so an `AAAA` query for a name shares the
/// entry written by an `A` query for the same name. Known bug.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(Arc<str>);

impl CacheKey {
    pub fn new(domain: impl Into<Arc<str>>) -> Self {
        Self(domain.into())
    }

    pub fn from_query(query: &DnsQuery) -> Self {
        Self(Arc::clone(&query.domain))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
