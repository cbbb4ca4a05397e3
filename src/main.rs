use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod enrichment;
mod gateway;
mod messaging;
mod metrics;
mod service;
mod sharding;
mod store;

#[cfg(test)]
mod testing;

use gateway::{PricingClient, StockClient};
use messaging::RedpandaClient;
use service::OrderService;
use store::{InMemoryOrderStore, OrderStore, PgOrderStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_service=debug")),
        )
        .init();

    tracing::info!("🚀 Starting order service");

    // === 1. Configuration ===
    let config = config::load_config(None)?;
    tracing::info!(
        port = config.app.port,
        topic = %config.kafka.topic,
        shards = config.sharding.num_shards,
        "Configuration loaded"
    );

    // === 2. Prometheus metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 3. Order store ===
    let store: Arc<dyn OrderStore> = match config.database.url() {
        Some(url) => {
            tracing::info!("Connecting to Postgres...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(url)
                .await?;
            sqlx::migrate!().run(&pool).await?;
            tracing::info!("✅ Database migrations applied");
            Arc::new(PgOrderStore::new(pool))
        }
        None => {
            tracing::warn!(
                shards = config.sharding.num_shards,
                "No database URL configured, orders are kept in memory"
            );
            Arc::new(InMemoryOrderStore::new(config.sharding.num_shards)?)
        }
    };

    // === 4. Stock and pricing gateways ===
    let stock = Arc::new(StockClient::new(&config.services.stock_url, config.services.timeout())?);
    let pricing = Arc::new(PricingClient::new(
        &config.services.pricing_url,
        config.services.timeout(),
    )?);

    // === 5. Redpanda producer ===
    let redpanda = Arc::new(RedpandaClient::new(
        &config.kafka.brokers,
        &config.kafka.topic,
        config.kafka.message_timeout(),
    )?);
    tracing::info!(topic = redpanda.topic(), "Redpanda producer ready");

    // === 6. Order service and HTTP API ===
    let service = Arc::new(OrderService::new(stock, pricing, store, redpanda, metrics.clone()));

    let state = api::AppState {
        service,
        metrics,
        request_timeout: config.app.request_timeout(),
    };

    api::start_http_server(&config.app.host, config.app.port, state).await?;

    tracing::info!("👋 Order service stopped");
    Ok(())
}
