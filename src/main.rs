use std::sync::Arc;

use course_recommender::{
    config::{Config, EngineConfig, StoreBackend},
    create_router,
    db::{self, CatalogStore, InMemoryCatalog, PgCatalogStore},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "course_recommender=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let engine = EngineConfig::from_env()?;

    tracing::info!(
        role_weight = engine.role_weight,
        affinity_weight = engine.affinity_weight,
        quality_weight = engine.quality_weight,
        alpha = engine.alpha,
        top_k_similar = engine.top_k_similar,
        prior_strength = engine.prior_strength,
        "Engine configuration loaded"
    );

    let store: Arc<dyn CatalogStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config.database_url, config.max_connections).await?;
            if config.run_migrations {
                db::postgres::run_migrations(&pool).await?;
            }
            Arc::new(PgCatalogStore::new(pool))
        }
        StoreBackend::Memory => Arc::new(InMemoryCatalog::from_path(&config.seed_path)?),
    };

    let app = create_router(AppState::new(store, engine));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, backend = ?config.store_backend, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
