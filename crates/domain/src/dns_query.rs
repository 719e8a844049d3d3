use super::{CacheKey, RecordType};
use std::sync::Arc;

/// Class code for the Internet class.
pub const CLASS_IN: u16 = 1;

/// A parsed client query.
///
/// `wire` holds the datagram exactly as received so the upstream forward can
/// send it unchanged, transaction id included.
#[derive(Debug, Clone)]
pub struct DnsQuery {
    pub id: u16,
    pub domain: Arc<str>,
    pub record_type: RecordType,
    pub class: u16,
    pub wire: Arc<[u8]>,
}

impl DnsQuery {
    pub fn new(
        id: u16,
        domain: impl Into<Arc<str>>,
        record_type: RecordType,
        wire: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            id,
            domain: domain.into(),
            record_type,
            class: CLASS_IN,
            wire: wire.into(),
        }
    }

    pub fn with_class(mut self, class: u16) -> Self {
        self.class = class;
        self
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from_query(self)
    }
}
