//! DNS Message Builder
//!
//! Builds wire-format messages with `hickory-proto`: fresh recursive queries,
//! and responses synthesized from a cache entry.

use super::header;
use super::record_type_map::RecordTypeMapper;
use cachedns_domain::{CachedEntry, DnsQuery, DomainError, RecordType};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{rdata, DNSClass, Name, RData, Record};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

pub struct MessageBuilder;

impl MessageBuilder {
    /// Build a recursive query with a single question.
    pub fn build_query(
        id: u16,
        domain: &str,
        record_type: &RecordType,
    ) -> Result<Vec<u8>, DomainError> {
        let name = Name::from_str(domain).map_err(|e| {
            DomainError::EncodeFailed(format!("Invalid domain '{}': {}", domain, e))
        })?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(RecordTypeMapper::to_hickory(record_type));
        query.set_query_class(DNSClass::IN);

        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.metadata.recursion_desired = true;
        message.add_query(query);

        Self::serialize_message(&message)
    }

    /// Synthesize a response for `query` from a cached entry.
    ///
    /// The id is the incoming query's. The question is rebuilt as
    /// `(entry.question, A, IN)` whatever the client asked, one A record per
    /// cached address follows with `answer_ttl`, and the header flags are
    /// the snapshot taken from the upstream response.
    pub fn build_cached_response(
        query: &DnsQuery,
        entry: &CachedEntry,
        answer_ttl: u32,
    ) -> Result<Vec<u8>, DomainError> {
        let addresses = entry.addresses()?;
        let name = Name::from_str(&entry.question).map_err(|e| {
            DomainError::EncodeFailed(format!("Invalid cached name '{}': {}", entry.question, e))
        })?;

        let mut question = Query::new();
        question.set_name(name.clone());
        question.set_query_type(RecordTypeMapper::to_hickory(&RecordType::A));
        question.set_query_class(DNSClass::IN);

        let mut message = Message::new(query.id, MessageType::Response, OpCode::Query);
        message.add_query(question);
        for ip in addresses {
            message.add_answer(Record::from_rdata(
                name.clone(),
                answer_ttl,
                RData::A(rdata::A(ip)),
            ));
        }

        let mut bytes = Self::serialize_message(&message)?;
        header::write_flags(&mut bytes, &entry.header);
        Ok(bytes)
    }

    fn serialize_message(message: &Message) -> Result<Vec<u8>, DomainError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message.emit(&mut encoder).map_err(|e| {
            DomainError::EncodeFailed(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }
}
