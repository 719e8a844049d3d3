#![allow(dead_code)]

use cachedns_application::ports::CacheStore;
use cachedns_application::services::DispatchStats;
use cachedns_application::use_cases::HandleDnsQueryUseCase;
use cachedns_domain::RecordType;
use cachedns_infrastructure::dns::forwarding::MessageBuilder;
use cachedns_infrastructure::dns::transport::UdpTransport;
use cachedns_infrastructure::dns::{
    DnsServerHandler, InMemoryCacheStore, ListenerConfig, UdpForwarder, UdpListener,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const EXAMPLE_IP: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);

/// Upstream resolver stand-in that answers every A query with `EXAMPLE_IP`.
pub struct FakeUpstream {
    addr: SocketAddr,
    queries: Arc<AtomicUsize>,
    stop: CancellationToken,
}

impl FakeUpstream {
    pub async fn answering(delay: Duration) -> Self {
        Self::spawn(Some(delay)).await
    }

    pub async fn silent() -> Self {
        Self::spawn(None).await
    }

    async fn spawn(delay: Option<Duration>) -> Self {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let addr = socket.local_addr().unwrap();
        let queries = Arc::new(AtomicUsize::new(0));
        let stop = CancellationToken::new();

        let counter = queries.clone();
        let token = stop.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            loop {
                let (len, peer) = tokio::select! {
                    _ = token.cancelled() => break,
                    res = socket.recv_from(&mut buf) => match res {
                        Ok(r) => r,
                        Err(_) => continue,
                    },
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let Some(delay) = delay else { continue };
                if len < 12 {
                    continue;
                }
                let reply = answer(&buf[..len], EXAMPLE_IP);
                let socket = socket.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = socket.send_to(&reply, peer).await;
                });
            }
        });

        Self {
            addr,
            queries,
            stop,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// Echoes the query's id and question, then appends one A record.
fn answer(query: &[u8], ip: Ipv4Addr) -> Vec<u8> {
    let mut end = 12;
    while end < query.len() && query[end] != 0 {
        end += query[end] as usize + 1;
    }
    let end = (end + 5).min(query.len());

    let mut reply = Vec::with_capacity(end + 16);
    reply.extend_from_slice(&query[..2]);
    reply.extend_from_slice(&[0x81, 0x80, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
    reply.extend_from_slice(&query[12..end]);
    reply.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x3c]);
    reply.extend_from_slice(&[0x00, 0x04]);
    reply.extend_from_slice(&ip.octets());
    reply
}

pub struct RunningServer {
    pub addr: SocketAddr,
    pub stats: Arc<DispatchStats>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl RunningServer {
    pub async fn stop(self) {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("listener did not drain")
            .expect("listener task panicked");
    }
}

pub struct ServerOptions {
    pub upstream_timeout: Duration,
    pub request_timeout: Duration,
    pub answer_ttl: u32,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            upstream_timeout: Duration::from_secs(1),
            request_timeout: Duration::from_secs(3),
            answer_ttl: 300,
        }
    }
}

pub fn start_server(upstream: SocketAddr, options: ServerOptions) -> RunningServer {
    start_server_with_cache(upstream, Arc::new(InMemoryCacheStore::new()), options)
}

pub fn start_server_with_cache(
    upstream: SocketAddr,
    cache: Arc<dyn CacheStore>,
    options: ServerOptions,
) -> RunningServer {
    let forwarder = UdpForwarder::new(
        Arc::new(UdpTransport::new(upstream)),
        options.upstream_timeout,
    );
    let stats = Arc::new(DispatchStats::new());
    let use_case = HandleDnsQueryUseCase::new(cache, Arc::new(forwarder), Duration::from_secs(60))
        .with_stats(stats.clone());
    let handler = Arc::new(DnsServerHandler::new(Arc::new(use_case), options.answer_ttl));

    let config = ListenerConfig {
        recv_buffer_size: 65_535,
        max_concurrent_requests: 256,
        request_timeout: options.request_timeout,
        shutdown_grace: Duration::from_secs(2),
    };
    let listener = UdpListener::bind("127.0.0.1:0".parse().unwrap(), handler, config).unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(listener.run(shutdown.clone()));

    RunningServer {
        addr,
        stats,
        shutdown,
        task,
    }
}

pub async fn send_raw(server: SocketAddr, payload: &[u8], wait: Duration) -> Option<Vec<u8>> {
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.send_to(payload, server).await.unwrap();

    let mut buf = vec![0u8; 65_535];
    match tokio::time::timeout(wait, client.recv_from(&mut buf)).await {
        Ok(Ok((len, _))) => Some(buf[..len].to_vec()),
        _ => None,
    }
}

pub async fn query_a(server: SocketAddr, id: u16, domain: &str) -> Option<Vec<u8>> {
    let query = MessageBuilder::build_query(id, domain, &RecordType::A).unwrap();
    send_raw(server, &query, Duration::from_secs(2)).await
}
