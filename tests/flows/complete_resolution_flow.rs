#[path = "../common/mod.rs"]
mod common;

use common::{query_a, start_server, FakeUpstream, ServerOptions, EXAMPLE_IP};
use futures::future::join_all;
use hickory_proto::op::Message;
use hickory_proto::rr::RData;
use std::net::Ipv4Addr;
use std::time::Duration;

fn a_records(reply: &[u8]) -> Vec<(Ipv4Addr, u32)> {
    let message = Message::from_vec(reply).unwrap();
    message
        .answers
        .iter()
        .filter_map(|record| match &record.data {
            RData::A(a) => Some((a.0, record.ttl)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_miss_then_hit_for_example_com() {
    let upstream = FakeUpstream::answering(Duration::ZERO).await;
    let server = start_server(upstream.addr(), ServerOptions::default());

    let first = query_a(server.addr, 0x1111, "example.com.").await.unwrap();
    assert_eq!(&first[..2], &[0x11, 0x11]);
    assert_eq!(a_records(&first), vec![(EXAMPLE_IP, 60)]);
    assert_eq!(upstream.query_count(), 1);

    let second = query_a(server.addr, 0x2222, "example.com.").await.unwrap();
    assert_eq!(&second[..2], &[0x22, 0x22]);
    assert_eq!(second[2] & 0x80, 0x80, "QR must be set");
    assert_eq!(a_records(&second), vec![(EXAMPLE_IP, 300)]);
    assert_eq!(upstream.query_count(), 1, "second answer must come from cache");

    let stats = server.stats.snapshot();
    assert_eq!(stats.queries, 2);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_misses, 1);

    server.stop().await;
}

#[tokio::test]
async fn test_cached_answer_uses_configured_ttl() {
    let upstream = FakeUpstream::answering(Duration::ZERO).await;
    let server = start_server(
        upstream.addr(),
        ServerOptions {
            answer_ttl: 42,
            ..ServerOptions::default()
        },
    );

    query_a(server.addr, 1, "ttl.example.").await.unwrap();
    let cached = query_a(server.addr, 2, "ttl.example.").await.unwrap();
    assert_eq!(a_records(&cached), vec![(EXAMPLE_IP, 42)]);

    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_clients_share_one_upstream_exchange() {
    let upstream = FakeUpstream::answering(Duration::from_millis(300)).await;
    let server = start_server(upstream.addr(), ServerOptions::default());

    let replies = join_all((0..32u16).map(|i| query_a(server.addr, 0x4000 + i, "stampede.example.")))
        .await;

    for (i, reply) in replies.iter().enumerate() {
        let reply = reply.as_ref().expect("every client gets an answer");
        let id = u16::from_be_bytes([reply[0], reply[1]]);
        assert_eq!(id, 0x4000 + i as u16);
        assert_eq!(a_records(reply).len(), 1);
    }
    assert_eq!(upstream.query_count(), 1);
    assert_eq!(server.stats.snapshot().upstream_resolutions, 1);

    server.stop().await;
}

#[tokio::test]
async fn test_distinct_names_are_resolved_separately() {
    let upstream = FakeUpstream::answering(Duration::ZERO).await;
    let server = start_server(upstream.addr(), ServerOptions::default());

    query_a(server.addr, 1, "a.example.").await.unwrap();
    query_a(server.addr, 2, "b.example.").await.unwrap();
    query_a(server.addr, 3, "a.example.").await.unwrap();

    assert_eq!(upstream.query_count(), 2);

    server.stop().await;
}
