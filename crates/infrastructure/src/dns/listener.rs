//! UDP listener: one task per datagram, bounded by a semaphore, each under
//! its own deadline, drained on shutdown.

use super::server::DnsServerHandler;
use cachedns_domain::config::ServerConfig;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

const KERNEL_BUFFER_SIZE: usize = 512 * 1024;

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub recv_buffer_size: usize,
    pub max_concurrent_requests: usize,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl From<&ServerConfig> for ListenerConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            recv_buffer_size: server.recv_buffer_size,
            max_concurrent_requests: server.max_concurrent_requests,
            request_timeout: server.request_timeout(),
            shutdown_grace: server.shutdown_grace(),
        }
    }
}

pub struct UdpListener {
    socket: Arc<UdpSocket>,
    handler: Arc<DnsServerHandler>,
    config: ListenerConfig,
}

impl UdpListener {
    pub fn bind(
        addr: SocketAddr,
        handler: Arc<DnsServerHandler>,
        config: ListenerConfig,
    ) -> io::Result<Self> {
        let socket = create_udp_socket(addr)?;
        Ok(Self {
            socket: Arc::new(socket),
            handler,
            config,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Serves until `shutdown` is cancelled, then waits up to the grace
    /// period for in-flight requests before returning.
    pub async fn run(self, shutdown: CancellationToken) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_requests.max(1)));
        let tracker = TaskTracker::new();
        let mut recv_buf = vec![0u8; self.config.recv_buffer_size];

        if let Ok(addr) = self.local_addr() {
            info!(
                bind_address = %addr,
                max_concurrent = self.config.max_concurrent_requests,
                "DNS listener ready"
            );
        }

        loop {
            let permit = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let (len, client) = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                received = self.socket.recv_from(&mut recv_buf) => match received {
                    Ok(received) => received,
                    Err(e) => {
                        error!(error = %e, "UDP recv error");
                        continue;
                    }
                },
            };

            let datagram: Arc<[u8]> = Arc::from(&recv_buf[..len]);
            let socket = Arc::clone(&self.socket);
            let handler = Arc::clone(&self.handler);
            let deadline = self.config.request_timeout;

            tracker.spawn(async move {
                let _permit = permit;
                match tokio::time::timeout(deadline, handler.handle_datagram(&datagram, client))
                    .await
                {
                    Ok(Some(response)) => {
                        if let Err(e) = socket.send_to(&response, client).await {
                            error!(client = %client, error = %e, "Failed to send response");
                        }
                    }
                    Ok(None) => {}
                    Err(_) => {
                        warn!(
                            client = %client,
                            timeout_ms = deadline.as_millis() as u64,
                            "Request deadline exceeded, no reply sent"
                        );
                    }
                }
            });
        }

        tracker.close();
        let in_flight = tracker.len();
        if in_flight > 0 {
            info!(in_flight, "Draining in-flight requests");
        }
        if tokio::time::timeout(self.config.shutdown_grace, tracker.wait())
            .await
            .is_err()
        {
            warn!(
                abandoned = tracker.len(),
                "Shutdown grace period elapsed with requests still running"
            );
        }
        debug!("DNS listener stopped");
    }
}

fn create_udp_socket(socket_addr: SocketAddr) -> io::Result<UdpSocket> {
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.set_recv_buffer_size(KERNEL_BUFFER_SIZE)?;
    socket.set_send_buffer_size(KERNEL_BUFFER_SIZE)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}
