//! Security monitor routes.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use sdai_engine::monitor::{SecurityEvent, SecurityStatus};

use crate::state::AppState;

/// Number of most recent events included in a report.
const RECENT_EVENTS: usize = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/security/status", get(get_status))
        .route("/api/security/reset", post(reset))
}

#[derive(Debug, Serialize)]
pub struct SecurityReport {
    #[serde(flatten)]
    pub status: SecurityStatus,
    /// Newest first
    pub recent_events: Vec<SecurityEvent>,
    /// Clients currently held by the rate limiter
    pub tracked_clients: usize,
}

async fn report(state: &AppState) -> SecurityReport {
    let (status, recent_events) = {
        let monitor = state.monitor.lock().await;
        let recent = monitor.events().rev().take(RECENT_EVENTS).cloned().collect();
        (monitor.status().clone(), recent)
    };
    let tracked_clients = state.limiter.lock().await.tracked_count();

    SecurityReport {
        status,
        recent_events,
        tracked_clients,
    }
}

/// GET /api/security/status — Current score, status, threats and recent events.
async fn get_status(State(state): State<AppState>) -> Json<SecurityReport> {
    Json(report(&state).await)
}

/// POST /api/security/reset — Clear events and threats.
async fn reset(State(state): State<AppState>) -> Json<SecurityReport> {
    state.monitor.lock().await.reset(Utc::now());
    tracing::info!("Security monitor reset");
    Json(report(&state).await)
}
