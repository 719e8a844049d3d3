use super::header;
use super::record_type_map::RecordTypeMapper;
use super::DNS_HEADER_LEN;
use cachedns_domain::{DnsQuery, DomainError};
use hickory_proto::op::Message;

/// Decodes client datagrams into `DnsQuery`.
pub struct QueryParser;

impl QueryParser {
    /// Only the first question is used. The name keeps the case and the
    /// trailing dot it had on the wire; the raw bytes ride along for the
    /// upstream forward.
    pub fn parse(bytes: &[u8]) -> Result<DnsQuery, DomainError> {
        if bytes.len() < DNS_HEADER_LEN {
            return Err(DomainError::MalformedQuery(format!(
                "datagram too short: {} bytes",
                bytes.len()
            )));
        }

        let message = Message::from_vec(bytes)
            .map_err(|e| DomainError::MalformedQuery(format!("failed to decode: {}", e)))?;

        let question = message
            .queries
            .first()
            .ok_or_else(|| DomainError::MalformedQuery("no question section".to_string()))?;

        let id = header::message_id(bytes)
            .ok_or_else(|| DomainError::MalformedQuery("missing id".to_string()))?;

        Ok(DnsQuery::new(
            id,
            question.name().to_ascii(),
            RecordTypeMapper::from_hickory(question.query_type()),
            bytes,
        )
        .with_class(u16::from(question.query_class())))
    }
}
