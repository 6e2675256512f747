//! Pushgate API server binary entrypoint.

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pushgate_common::config::{AppConfig, UserStoreBackend};
use pushgate_common::db::{create_pool, run_migrations};
use pushgate_common::redis_pool::create_redis_pool;
use pushgate_engine::NotificationDispatcher;
use pushgate_engine::store::{PgUserStore, RedisUserStore, UserRecordStore};
use pushgate_notifier::FcmTransport;

use pushgate_api::routes::create_router;
use pushgate_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "pushgate_api=debug,pushgate_engine=debug,pushgate_notifier=debug,tower_http=debug",
            )
        }))
        .init();

    tracing::info!("Starting Pushgate API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    let store = build_store(&config).await?;
    let transport = Arc::new(FcmTransport::from_config(&config)?);
    let dispatcher = NotificationDispatcher::new(store, transport);

    // Build application state
    let addr = config.bind_addr;
    let state = AppState::new(dispatcher, config);

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Connect the configured user-record backend.
async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn UserRecordStore>> {
    tracing::info!(backend = %config.user_store, "Initializing user store");

    match config.user_store {
        UserStoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for postgres"))?;
            let pool = create_pool(database_url, config.db_max_connections).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(PgUserStore::new(pool)))
        }
        UserStoreBackend::Redis => {
            let redis = create_redis_pool(&config.redis_url).await?;
            Ok(Arc::new(RedisUserStore::new(redis)))
        }
    }
}
