use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use super::cache::{CacheBackend, CacheConfig};
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::server::ServerConfig;
use super::upstream::UpstreamConfig;

/// Environment variable holding the cache store connection string.
pub const REDIS_URI_ENV: &str = "REDIS_URI";

/// Optional `KEY=value` file read from the working directory.
pub const DOTENV_FILE: &str = ".env";

const MIN_RECV_BUFFER: usize = 512;
const MAX_RECV_BUFFER: usize = 65_535;

/// Main configuration structure for cachedns
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Listener configuration (bind address, buffers, limits)
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream resolver
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Cache store
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. cachedns.toml in current directory
    /// 3. /etc/cachedns/config.toml
    /// 4. Default configuration
    ///
    /// `REDIS_URI` is applied next, from the process environment or else from
    /// a `.env` file in the working directory. CLI overrides come last.
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("cachedns.toml").exists() {
            Self::from_file("cachedns.toml")?
        } else if std::path::Path::new("/etc/cachedns/config.toml").exists() {
            Self::from_file("/etc/cachedns/config.toml")?
        } else {
            Self::default()
        };

        let dotenv = read_dotenv(Path::new(DOTENV_FILE));
        config.apply_env_layers(|name| std::env::var(name).ok(), &dotenv);
        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    /// Load configuration from a specific file
    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply values taken from the process environment
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(REDIS_URI_ENV).filter(|v| !v.trim().is_empty()) {
            self.cache.url = Some(url);
        }
    }

    /// Like `apply_env`, with `.env` values filling in for variables the
    /// process environment leaves unset or blank.
    pub fn apply_env_layers<F>(&mut self, process: F, dotenv: &HashMap<String, String>)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.apply_env(|name| {
            process(name)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| dotenv.get(name).cloned())
        });
    }

    /// Apply command-line overrides to configuration
    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(upstream) = overrides.upstream {
            self.upstream.address = upstream;
        }
        if let Some(backend) = overrides.cache_backend {
            self.cache.backend = backend;
        }
        if let Some(url) = overrides.cache_url {
            self.cache.url = Some(url);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn upstream_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.upstream
            .address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress("upstream", self.upstream.address.clone()))
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = self.server.socket_addr();
        addr.parse()
            .map_err(|_| ConfigError::InvalidAddress("bind", addr))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        self.listen_addr()?;
        self.upstream_addr()?;

        if !(MIN_RECV_BUFFER..=MAX_RECV_BUFFER).contains(&self.server.recv_buffer_size) {
            return Err(ConfigError::Validation(format!(
                "recv_buffer_size must be between {} and {}",
                MIN_RECV_BUFFER, MAX_RECV_BUFFER
            )));
        }

        if self.server.max_concurrent_requests == 0 {
            return Err(ConfigError::Validation(
                "max_concurrent_requests cannot be 0".to_string(),
            ));
        }

        if self.server.request_timeout_ms == 0 || self.upstream.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Request and upstream timeouts must be greater than 0".to_string(),
            ));
        }

        if self.cache.entry_ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "Cache entry TTL must be greater than 0".to_string(),
            ));
        }

        if self.cache.operation_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Cache operation timeout must be greater than 0".to_string(),
            ));
        }

        if self.cache.purge_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "Cache purge interval must be greater than 0".to_string(),
            ));
        }

        if self.cache.backend == CacheBackend::Redis
            && self.cache.url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "Redis cache backend selected but no connection string (set {} or cache.url)",
                REDIS_URI_ENV
            )));
        }

        Ok(())
    }
}

/// Reads a `.env` file. A missing or unreadable file yields no variables;
/// malformed lines are skipped.
pub fn read_dotenv(path: &Path) -> HashMap<String, String> {
    match dotenvy::from_path_iter(path) {
        Ok(iter) => iter.filter_map(Result::ok).collect(),
        Err(_) => HashMap::new(),
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub upstream: Option<String>,
    pub cache_backend: Option<CacheBackend>,
    pub cache_url: Option<String>,
    pub log_level: Option<String>,
}
