use super::header;
use super::DNS_HEADER_LEN;
use cachedns_application::ports::UpstreamResponse;
use cachedns_domain::DomainError;
use hickory_proto::op::Message;
use hickory_proto::rr::RData;
use std::sync::Arc;
use tracing::debug;

pub struct ResponseParser;

impl ResponseParser {
    /// Keeps the raw bytes for pass-through and extracts what the cache
    /// stores: header flags, the first question name, and IPv4 answers.
    /// Every other answer type is dropped.
    pub fn parse(response_bytes: &[u8]) -> Result<UpstreamResponse, DomainError> {
        if response_bytes.len() < DNS_HEADER_LEN {
            return Err(DomainError::InvalidUpstreamResponse(format!(
                "response too short: {} bytes",
                response_bytes.len()
            )));
        }

        let message = Message::from_vec(response_bytes).map_err(|e| {
            DomainError::InvalidUpstreamResponse(format!("Failed to parse DNS response: {}", e))
        })?;

        let flags = header::read_flags(response_bytes).ok_or_else(|| {
            DomainError::InvalidUpstreamResponse("truncated header".to_string())
        })?;

        let question = message.queries.first().map(|q| q.name().to_ascii());

        let mut addresses = Vec::new();
        let mut discarded = 0usize;
        for record in &message.answers {
            match &record.data {
                RData::A(a) => addresses.push(a.0),
                _ => discarded += 1,
            }
        }

        debug!(
            rcode = flags.rcode,
            addresses = addresses.len(),
            discarded = discarded,
            truncated = message.metadata.truncation,
            "DNS response parsed"
        );

        Ok(UpstreamResponse {
            wire: Arc::from(response_bytes),
            header: flags,
            question,
            addresses,
        })
    }
}
