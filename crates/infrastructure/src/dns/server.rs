use crate::dns::forwarding::{MessageBuilder, QueryParser};
use cachedns_application::use_cases::{HandleDnsQueryUseCase, QueryResolution};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Turns one client datagram into at most one reply datagram.
pub struct DnsServerHandler {
    use_case: Arc<HandleDnsQueryUseCase>,
    answer_ttl: u32,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>, answer_ttl: u32) -> Self {
        Self {
            use_case,
            answer_ttl,
        }
    }

    pub fn use_case(&self) -> &Arc<HandleDnsQueryUseCase> {
        &self.use_case
    }

    /// `None` means nothing is sent back: the datagram did not decode, the
    /// upstream failed, or the reply could not be encoded.
    pub async fn handle_datagram(&self, bytes: &[u8], client: SocketAddr) -> Option<Vec<u8>> {
        let query = match QueryParser::parse(bytes) {
            Ok(query) => query,
            Err(e) => {
                warn!(client = %client, len = bytes.len(), error = %e, "Dropping malformed query");
                return None;
            }
        };

        debug!(
            domain = %query.domain,
            record_type = %query.record_type,
            id = query.id,
            client = %client,
            "DNS query received"
        );

        let entry = match self.use_case.execute(&query).await {
            Ok(QueryResolution::Forwarded(wire)) => return Some(wire.to_vec()),
            Ok(QueryResolution::Cached(entry)) | Ok(QueryResolution::Coalesced(entry)) => entry,
            Err(e) if e.is_upstream_failure() => {
                warn!(
                    domain = %query.domain,
                    id = query.id,
                    client = %client,
                    error = %e,
                    "Upstream failed, no reply sent"
                );
                return None;
            }
            Err(e) => {
                error!(
                    domain = %query.domain,
                    id = query.id,
                    client = %client,
                    error = %e,
                    "Dropping query, no reply sent"
                );
                return None;
            }
        };

        match MessageBuilder::build_cached_response(&query, &entry, self.answer_ttl) {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(domain = %query.domain, id = query.id, error = %e, "Failed to encode response");
                None
            }
        }
    }
}
