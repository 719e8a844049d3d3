use cachedns_application::ports::{CacheStore, UpstreamResolver};
use cachedns_application::services::DispatchStats;
use cachedns_application::use_cases::HandleDnsQueryUseCase;
use cachedns_domain::{CacheBackend, Config};
use cachedns_infrastructure::dns::transport::UdpTransport;
use cachedns_infrastructure::dns::{
    CachePurgeJob, DnsServerHandler, InMemoryCacheStore, RedisCacheStore, UdpForwarder,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct DnsServices {
    pub stats: Arc<DispatchStats>,
    pub handler: Arc<DnsServerHandler>,
    /// Running only with the memory backend; stops when `shutdown` fires.
    pub purge_job: Option<JoinHandle<()>>,
}

impl DnsServices {
    pub async fn new(config: &Config, shutdown: &CancellationToken) -> anyhow::Result<Self> {
        let (cache, purge_job) = Self::build_cache(config, shutdown).await?;
        let upstream = Self::build_upstream(config)?;
        let stats = Arc::new(DispatchStats::new());

        let handler_use_case = Arc::new(
            HandleDnsQueryUseCase::new(cache.clone(), upstream.clone(), config.cache.entry_ttl())
                .with_stats(stats.clone()),
        );
        let handler = Arc::new(DnsServerHandler::new(
            handler_use_case,
            config.cache.answer_ttl_secs,
        ));

        info!(
            cache = cache.backend_name(),
            upstream = upstream.server(),
            "DNS services initialized"
        );

        Ok(Self {
            stats,
            handler,
            purge_job,
        })
    }

    async fn build_cache(
        config: &Config,
        shutdown: &CancellationToken,
    ) -> anyhow::Result<(Arc<dyn CacheStore>, Option<JoinHandle<()>>)> {
        match config.cache.backend {
            CacheBackend::Memory => {
                let store = Arc::new(InMemoryCacheStore::new());
                let purge_job = CachePurgeJob::new(Arc::clone(&store))
                    .with_interval(config.cache.purge_interval())
                    .with_cancellation(shutdown.clone())
                    .start();
                let cache: Arc<dyn CacheStore> = store;
                Ok((cache, Some(purge_job)))
            }
            CacheBackend::Redis => {
                let url = config.cache.url.as_deref().unwrap_or_default();
                let store = RedisCacheStore::connect(
                    url,
                    config.cache.pool_size,
                    config.cache.operation_timeout(),
                )?;

                // An unreachable store is not fatal: lookups degrade to misses.
                let address = store.client().config().address();
                match store.ping().await {
                    Ok(()) => info!(%address, "Cache store reachable"),
                    Err(e) => warn!(
                        %address,
                        error = %e,
                        "Cache store unreachable at startup, serving without cache hits"
                    ),
                }

                let cache: Arc<dyn CacheStore> = Arc::new(store);
                Ok((cache, None))
            }
        }
    }

    fn build_upstream(config: &Config) -> anyhow::Result<Arc<dyn UpstreamResolver>> {
        let addr = config.upstream_addr()?;
        let transport = Arc::new(UdpTransport::new(addr));
        Ok(Arc::new(UdpForwarder::new(transport, config.upstream.timeout())))
    }
}
