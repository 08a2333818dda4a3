use catalog_gateway::backend::InMemoryBackend;
use catalog_gateway::http::{self, AppState};
use catalog_gateway::observability::AtomicMetrics;
use catalog_gateway::upstream::HttpCatalog;
use catalog_gateway::{CacheStore, CatalogService, Enricher, GatewayConfig, JwtAuthenticator};
use log::{info, warn};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .ok();

    let config = GatewayConfig::from_env_file(".env")?;
    if config.uses_default_secret() {
        warn!("JWT_SECRET is not set; using the development secret");
    }

    let store = Arc::new(
        CacheStore::new(InMemoryBackend::new(), config.cache_ttl)
            .with_metrics(Box::new(AtomicMetrics::new())),
    );
    let upstream = HttpCatalog::new(&config.upstream_base_url, config.upstream_timeout)?;
    let catalog = CatalogService::new(
        store,
        Arc::new(upstream),
        Enricher::new(config.pricing.clone()),
        config.upstream_timeout,
    );
    let auth = Arc::new(JwtAuthenticator::from_config(&config));

    let state = AppState::new(catalog, auth, config.upstream_base_url.as_str());
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(
        "🚀 catalog-gateway {} listening on {} (upstream {}, cache TTL {:?})",
        catalog_gateway::VERSION,
        listener.local_addr()?,
        config.upstream_base_url,
        config.cache_ttl
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("catalog-gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
