pub mod assets;
pub mod cdp;
pub mod health;
pub mod positions;
pub mod prices;
pub mod security;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(assets::router())
        .merge(cdp::router())
        .merge(prices::router())
        .merge(positions::router())
        .merge(security::router())
        .with_state(state)
}
