use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use copyforge::cache::{connect_redis, CacheService, CachedGenerator};
use copyforge::fetch::HttpPageFetcher;
use copyforge::llm::{Generator, OpenAiBackend};
use copyforge::monitoring::Metrics;
use copyforge::queue::{JobQueue, JobStore, WorkerContext};
use copyforge::utils::RetryPolicy;
use copyforge::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "copyforge=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    info!("Configuration loaded: {:?}", config.server);

    // One redis connection shared by the cache and the job-status mirror.
    let redis = connect_redis(&config.redis).await;
    let metrics = Arc::new(Metrics::default());
    let cache = Arc::new(CacheService::new(
        redis.clone(),
        config.cache.memory_max_entries,
    ));

    // Generation pipeline: OpenAI adapter -> retry wrapper -> cache wrapper.
    let backend = Arc::new(OpenAiBackend::new(&config.openai));
    let generator = Arc::new(Generator::new(
        backend,
        RetryPolicy::from(&config.generation),
        metrics.clone(),
        config.fetch.max_page_chars,
    ));
    let cached_generator = Arc::new(CachedGenerator::new(
        generator,
        cache.clone(),
        metrics.clone(),
        Duration::from_secs(config.cache.content_ttl_secs),
    ));

    let fetcher = Arc::new(HttpPageFetcher::new(&config.fetch)?);
    let store = Arc::new(JobStore::new(
        redis,
        Duration::from_secs(config.cache.job_ttl_secs),
    ));

    let worker_ctx = Arc::new(WorkerContext {
        store,
        generator: cached_generator,
        fetcher,
        metrics: metrics.clone(),
        row_timeout: Duration::from_secs(config.queue.row_timeout_secs),
    });
    let queue = JobQueue::start(worker_ctx, config.queue.worker_count);
    info!(workers = config.queue.worker_count, "worker pool started");

    let state = AppState {
        config: config.clone(),
        cache,
        queue,
        metrics,
    };
    let app = create_router(state);

    // Start server
    let addr = config.server.addr();
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
