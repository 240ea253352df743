use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::handlers::{batch_search, health, search, AppState};

/// All routes over a shared [`AppState`]. `*` is accepted as the index name
/// of the multi-query route.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/1/indexes/:indexName/queries", post(batch_search))
        .route("/1/indexes/:indexName/query", post(search))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive().max_age(std::time::Duration::from_secs(86400)))
}

/// Install the global fmt subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    serve_with(ServerConfig::from_env()?).await
}

/// Run the server until ctrl-c. Indexes load lazily on their first query.
pub async fn serve_with(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = config.build_client()?;
    for spec in &config.indexes {
        tracing::info!(
            index = %spec.name,
            location = %spec.location,
            fallbacks = spec.fallbacks.len(),
            "Registered index"
        );
    }
    tracing::info!(
        censor_threshold = config.worker.censor_threshold,
        unknown_index = ?config.client.unknown_index,
        "Search configuration loaded"
    );

    let app = router(Arc::new(AppState { client }));

    tracing::info!("Starting Shortstack server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
