//! Configuration module for cachedns
//!
//! - `root`: Main configuration, loading order and CLI overrides
//! - `server`: Listener binding, buffers and request limits
//! - `upstream`: The forward resolver
//! - `cache`: Cache store backend and lifetimes
//! - `logging`: Logging settings
//! - `errors`: Configuration errors

pub mod cache;
pub mod errors;
pub mod logging;
pub mod root;
pub mod server;
pub mod upstream;

pub use cache::{CacheBackend, CacheConfig};
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{read_dotenv, CliOverrides, Config, DOTENV_FILE, REDIS_URI_ENV};
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;
