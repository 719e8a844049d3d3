use super::DomainError;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Header bits captured from the upstream response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFlags {
    pub response: bool,
    pub opcode: u8,
    pub rcode: u16,
    pub recursion_desired: bool,
}

impl Default for HeaderFlags {
    fn default() -> Self {
        Self {
            response: true,
            opcode: 0,
            rcode: 0,
            recursion_desired: true,
        }
    }
}

/// The value stored in the cache for one question name.
///
/// Only IPv4 address answers survive; they are kept in presentation form
/// (`"93.184.216.34"`) so the stored value stays readable from a store CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEntry {
    pub header: HeaderFlags,
    pub question: String,
    pub answers: Vec<String>,
}

impl CachedEntry {
    pub fn new(header: HeaderFlags, question: impl Into<String>, answers: Vec<Ipv4Addr>) -> Self {
        Self {
            header,
            question: question.into(),
            answers: answers.iter().map(|ip| ip.to_string()).collect(),
        }
    }

    /// Parses the stored answers back into addresses. A single unparsable
    /// string invalidates the whole entry.
    pub fn addresses(&self) -> Result<Vec<Ipv4Addr>, DomainError> {
        self.answers
            .iter()
            .map(|s| {
                s.parse::<Ipv4Addr>().map_err(|_| {
                    DomainError::CorruptCacheEntry(format!(
                        "invalid IP address in cached response: {}",
                        s
                    ))
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
