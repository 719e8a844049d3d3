use cachedns_domain::{CliOverrides, Config};
use tracing::info;

pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides)?;
    config.validate()?;
    Ok(config)
}

/// Logged once the subscriber is up; the connection string is left out since
/// it may carry a password.
pub fn log_config_summary(config: &Config) {
    info!(
        bind = %config.server.socket_addr(),
        upstream = %config.upstream.address,
        upstream_timeout_ms = config.upstream.timeout_ms,
        cache_backend = config.cache.backend.as_str(),
        entry_ttl_secs = config.cache.entry_ttl_secs,
        answer_ttl_secs = config.cache.answer_ttl_secs,
        max_concurrent = config.server.max_concurrent_requests,
        "Configuration loaded"
    );
}
