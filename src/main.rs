//! Zoo Shop - storefront backend for a pet-supply shop

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zoo_shop::api::{self, AppState};
use zoo_shop::cache::PageCache;
use zoo_shop::config::Config;
use zoo_shop::notify::Notifier;
use zoo_shop::recommendations::Recommender;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;

    let db = PgPoolOptions::new().max_connections(config.max_connections).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let redis = match &config.redis_url {
        Some(url) => match redis::Client::open(url.as_str()) {
            Ok(client) => match redis::aio::ConnectionManager::new(client).await {
                Ok(conn) => Some(conn),
                Err(e) => { tracing::warn!(error = %e, "redis unavailable, cache and recommendations disabled"); None }
            },
            Err(e) => { tracing::warn!(error = %e, "invalid REDIS_URL"); None }
        },
        None => None,
    };
    let nats = match &config.nats_url {
        Some(url) => async_nats::connect(url.as_str()).await.map_err(|e| tracing::warn!(error = %e, "nats unavailable")).ok(),
        None => None,
    };
    if config.telegram.is_none() { tracing::info!("telegram notifications disabled"); }

    let state = AppState {
        db,
        cache: PageCache::new(redis.clone(), config.page_cache_ttl),
        recommender: Recommender::new(redis),
        notifier: Notifier::new(config.telegram.clone(), nats),
    };
    let app = api::router(state);

    tracing::info!("🐾 Zoo Shop listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?, app).await?;
    Ok(())
}
