//! Shared application state for the Axum API server.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use sdai_common::config::AppConfig;
use sdai_engine::monitor::{RateLimiter, SecurityMonitor};
use sdai_engine::positions::PositionSource;
use sdai_engine::prices::PriceBook;
use sdai_engine::registry::AssetRegistry;

/// Application state shared across all route handlers via Axum `State`.
///
/// The price book is written by the poller and read by every handler.
/// The security monitor belongs to this server instance and is reset only
/// through `POST /api/security/reset`.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<AssetRegistry>,
    pub prices: Arc<RwLock<PriceBook>>,
    pub positions: Arc<RwLock<Box<dyn PositionSource>>>,
    pub monitor: Arc<Mutex<SecurityMonitor>>,
    pub limiter: Arc<Mutex<RateLimiter>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        registry: AssetRegistry,
        positions: Box<dyn PositionSource>,
    ) -> Self {
        let now = Utc::now();
        let prices = PriceBook::from_registry(&registry, now);
        let monitor = SecurityMonitor::from_config(&config, now);

        Self {
            config,
            registry: Arc::new(registry),
            prices: Arc::new(RwLock::new(prices)),
            positions: Arc::new(RwLock::new(positions)),
            monitor: Arc::new(Mutex::new(monitor)),
            limiter: Arc::new(Mutex::new(RateLimiter::default())),
        }
    }
}
