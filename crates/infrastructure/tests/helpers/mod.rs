#![allow(dead_code)]

pub mod dns_server_mock;
pub mod redis_mock;

pub use dns_server_mock::MockDnsServer;
pub use redis_mock::MockRedisServer;

/// Wire response for an A query: id and question copied from `query`,
/// followed by one A record per address.
pub fn a_response(query: &[u8], addresses: &[[u8; 4]], rcode: u8) -> Vec<u8> {
    let mut response = Vec::with_capacity(512);
    response.extend_from_slice(&query[0..2]);
    response.push(0x81);
    response.push(0x80 | (rcode & 0x0F));
    response.extend_from_slice(&[0x00, 0x01]);
    response.extend_from_slice(&(addresses.len() as u16).to_be_bytes());
    response.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    response.extend_from_slice(question_section(query));
    for ip in addresses {
        response.extend_from_slice(&[
            0xc0, 0x0c, // name pointer to the question
            0x00, 0x01, // A
            0x00, 0x01, // IN
            0x00, 0x00, 0x00, 0x3c, // TTL 60
            0x00, 0x04,
        ]);
        response.extend_from_slice(ip);
    }
    response
}

/// The first question of a query: QNAME through QCLASS.
pub fn question_section(query: &[u8]) -> &[u8] {
    let mut pos = 12;
    while pos < query.len() && query[pos] != 0 {
        pos += query[pos] as usize + 1;
    }
    let end = (pos + 5).min(query.len());
    &query[12..end]
}
