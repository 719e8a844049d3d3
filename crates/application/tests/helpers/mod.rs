#![allow(dead_code)]

mod mock_ports;

pub use mock_ports::{MockCacheStore, MockUpstreamResolver};

use cachedns_application::ports::UpstreamResponse;
use cachedns_domain::{DnsQuery, HeaderFlags, RecordType};
use std::net::Ipv4Addr;
use std::sync::Arc;

pub fn query(id: u16, domain: &str) -> DnsQuery {
    DnsQuery::new(id, domain, RecordType::A, vec![0u8; 12])
}

pub fn upstream_response(domain: &str, ips: &[&str]) -> UpstreamResponse {
    let wire: Arc<[u8]> = Arc::from(format!("wire:{}", domain).into_bytes());
    UpstreamResponse {
        wire,
        header: HeaderFlags::default(),
        question: Some(domain.to_string()),
        addresses: ips.iter().map(|ip| ip.parse::<Ipv4Addr>().unwrap()).collect(),
    }
}
