pub mod cache;
pub mod forwarding;
pub mod listener;
pub mod server;
pub mod transport;

pub use cache::{CachePurgeJob, InMemoryCacheStore, RedisCacheStore};
pub use forwarding::{MessageBuilder, QueryParser, ResponseParser, UdpForwarder};
pub use listener::{ListenerConfig, UdpListener};
pub use server::DnsServerHandler;
