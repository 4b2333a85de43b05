//! sDAI API server binary entrypoint.

use std::future::IntoFuture;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use sdai_common::config::AppConfig;
use sdai_engine::positions::InMemoryPositionStore;
use sdai_engine::prices::StaticPriceFeed;
use sdai_engine::registry::AssetRegistry;

use sdai_api::poller::PricePoller;
use sdai_api::routes::create_router;
use sdai_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("sdai_api=debug,sdai_engine=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting sDAI API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Seed the position store
    let store = match &config.positions_file {
        Some(path) => InMemoryPositionStore::from_json_file(path)?,
        None => {
            tracing::info!("No positions file configured, starting with an empty store");
            InMemoryPositionStore::new()
        }
    };

    let registry = AssetRegistry::supported();
    let feed = StaticPriceFeed::new(registry.clone());

    // Build application state
    let addr = config.api_addr;
    let poll_interval_ms = config.price_poll_interval_ms;
    let state = AppState::new(config, registry, Box::new(store));

    let poller = PricePoller::new(Box::new(feed), state.prices.clone(), poll_interval_ms);

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    tracing::info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        result = poller.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Price poller exited with error");
                return Err(e);
            }
        }
        result = axum::serve(listener, app).into_future() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("sDAI API server stopped.");
    Ok(())
}
