//! cachedns Domain Layer
pub mod cache_key;
pub mod cached_entry;
pub mod config;
pub mod dns_query;
pub mod dns_record;
pub mod errors;

pub use cache_key::CacheKey;
pub use cached_entry::{CachedEntry, HeaderFlags};
pub use config::{CacheBackend, CliOverrides, Config, ConfigError};
pub use dns_query::DnsQuery;
pub use dns_record::RecordType;
pub use errors::DomainError;
