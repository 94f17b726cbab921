// API server binary entry point
//
// Purpose: train the classifier, load the rule database, serve JSON endpoints
// Usage: cargo run --release --features api --bin api_server

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xcrop_advisor::{create_router, AdvisorConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xcrop_advisor=info,tower_http=debug,axum=debug,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    // Optional JSON config file, then environment overrides
    let config = match std::env::var("ADVISOR_CONFIG") {
        Ok(path) => AdvisorConfig::load(std::path::Path::new(&path))?.with_env_overrides()?,
        Err(_) => AdvisorConfig::from_env()?,
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    tracing::info!("Configuration:");
    tracing::info!("  DATA_DIR: {:?}", config.data_dir);
    tracing::info!("  Trees: {} (seed {})", config.forest.n_estimators, config.forest.seed);
    tracing::info!("  Language: {}", config.language);
    tracing::info!("  PORT: {}", port);

    // Training is CPU-bound; keep it off the async workers
    let state = tokio::task::spawn_blocking(move || AppState::new(&config)).await??;
    tracing::info!("Application state initialized successfully");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
