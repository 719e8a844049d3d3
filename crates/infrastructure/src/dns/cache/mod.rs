pub mod memory;
pub mod purge_job;
pub mod redis_client;
pub mod redis_store;
pub mod resp;

pub use memory::InMemoryCacheStore;
pub use purge_job::CachePurgeJob;
pub use redis_client::{RedisClient, RedisConfig};
pub use redis_store::RedisCacheStore;
pub use resp::{RedisError, RespValue};
