use super::response_parser::ResponseParser;
use crate::dns::transport::DnsTransport;
use async_trait::async_trait;
use cachedns_application::ports::{UpstreamResolver, UpstreamResponse};
use cachedns_domain::{DnsQuery, DomainError};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Forwards client queries, bytes unchanged, to one fixed upstream resolver.
pub struct UdpForwarder {
    transport: Arc<dyn DnsTransport>,
    server: String,
    timeout: Duration,
}

impl UdpForwarder {
    pub fn new(transport: Arc<dyn DnsTransport>, timeout: Duration) -> Self {
        let server = transport.server_addr().to_string();
        Self {
            transport,
            server,
            timeout,
        }
    }
}

#[async_trait]
impl UpstreamResolver for UdpForwarder {
    async fn resolve(&self, query: &DnsQuery) -> Result<UpstreamResponse, DomainError> {
        let response = self.transport.send(&query.wire, self.timeout).await?;

        debug!(
            domain = %query.domain,
            id = query.id,
            server = %self.server,
            protocol = response.protocol_used,
            bytes = response.bytes.len(),
            "Upstream answered"
        );

        ResponseParser::parse(&response.bytes)
    }

    fn server(&self) -> &str {
        &self.server
    }
}
