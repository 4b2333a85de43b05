//! Price routes.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use sdai_engine::format::{format_date, time_since};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/prices", get(list_prices))
}

#[derive(Debug, Serialize)]
pub struct PriceView {
    pub asset_id: String,
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
    /// Display form of `timestamp`, e.g. "Mar 5, 2026, 3:07 PM"
    pub updated_at: String,
    /// Age of the quote, e.g. "12s ago"
    pub updated: String,
}

/// GET /api/prices — Latest quote per asset.
async fn list_prices(State(state): State<AppState>) -> Json<Vec<PriceView>> {
    let now = Utc::now();
    let snapshot = state.prices.read().await.snapshot();
    Json(
        snapshot
            .into_iter()
            .map(|(asset_id, quote)| PriceView {
                asset_id,
                updated_at: format_date(quote.timestamp),
                updated: time_since(quote.timestamp, now),
                symbol: quote.symbol,
                price: quote.price,
                timestamp: quote.timestamp,
            })
            .collect(),
    )
}
