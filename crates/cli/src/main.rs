use cachedns_domain::{CacheBackend, CliOverrides};
use cachedns_infrastructure::dns::ListenerConfig;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "cachedns")]
#[command(version)]
#[command(about = "Caching DNS forwarder backed by Redis")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Upstream resolver as IP:port
    #[arg(short = 'u', long)]
    upstream: Option<String>,

    /// Cache backend (redis, memory)
    #[arg(long, value_parser = parse_backend)]
    cache_backend: Option<CacheBackend>,

    /// Cache store connection string, e.g. redis://:password@host:6379/0
    #[arg(long)]
    cache_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_backend(value: &str) -> Result<CacheBackend, String> {
    match value.to_ascii_lowercase().as_str() {
        "redis" => Ok(CacheBackend::Redis),
        "memory" => Ok(CacheBackend::Memory),
        other => Err(format!("unknown cache backend '{other}' (expected redis or memory)")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind.clone(),
        upstream: cli.upstream.clone(),
        cache_backend: cli.cache_backend,
        cache_url: cli.cache_url.clone(),
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting cachedns v{}", env!("CARGO_PKG_VERSION"));
    bootstrap::log_config_summary(&config);

    let shutdown = CancellationToken::new();
    let dns_services = di::DnsServices::new(&config, &shutdown).await?;
    server::spawn_signal_handler(shutdown.clone());

    server::start_dns_server(
        config.listen_addr()?,
        dns_services.handler.clone(),
        ListenerConfig::from(&config.server),
        shutdown,
    )
    .await?;

    if let Some(purge_job) = dns_services.purge_job {
        let _ = purge_job.await;
    }

    let stats = dns_services.stats.snapshot();
    info!(
        queries = stats.queries,
        cache_hits = stats.cache_hits,
        cache_misses = stats.cache_misses,
        hit_rate = format!("{:.1}%", stats.hit_rate()),
        coalesced = stats.coalesced,
        upstream_resolutions = stats.upstream_resolutions,
        upstream_failures = stats.upstream_failures,
        cache_read_errors = stats.cache_read_errors,
        cache_write_errors = stats.cache_write_errors,
        "Shutdown complete"
    );

    Ok(())
}
