//! Stateless CDP calculation routes.
//!
//! Amounts are accepted as JSON numbers or strings; anything that does not
//! parse as a finite non-negative number counts as zero.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sdai_common::error::AppError;
use sdai_common::types::{AssetDescriptor, RiskAssessment};
use sdai_engine::calculator::{CdpMetrics, calculate};
use sdai_engine::format::{format_percent, format_ratio, format_usd};
use sdai_engine::numeric::coerce_amount;
use sdai_engine::registry::AssetRegistry;
use sdai_engine::risk::assess_metrics;
use sdai_engine::validation::{ValidationOutcome, validate_creation};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cdp/calculate", post(calculate_cdp))
        .route("/api/cdp/validate", post(validate_cdp))
}

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub asset_id: Option<String>,
    /// Alternative to `asset_id`: the collateral token mint
    #[serde(default)]
    pub collateral_mint: Option<String>,
    #[serde(default)]
    pub collateral_amount: serde_json::Value,
    #[serde(default)]
    pub debt_amount: serde_json::Value,
    /// Overrides the configured minimum collateral ratio
    #[serde(default)]
    pub min_collateral_ratio: Option<Decimal>,
}

/// Display strings for the headline metrics.
#[derive(Debug, Serialize)]
pub struct FormattedMetrics {
    pub collateral_value: String,
    pub collateral_ratio: String,
    pub liquidation_price: String,
    pub max_dai: String,
    pub stability_fee: String,
}

#[derive(Debug, Serialize)]
pub struct CalculateResponse {
    pub asset_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub min_collateral_ratio: Decimal,
    pub metrics: CdpMetrics,
    pub risk: RiskAssessment,
    pub formatted: FormattedMetrics,
}

/// POST /api/cdp/calculate — Metrics for a hypothetical position at the current price.
async fn calculate_cdp(
    State(state): State<AppState>,
    Json(req): Json<CalculateRequest>,
) -> Result<Json<CalculateResponse>, AppError> {
    let asset = resolve_asset(
        &state.registry,
        req.asset_id.as_deref(),
        req.collateral_mint.as_deref(),
    )?;
    let priced = state.prices.read().await.priced(asset);
    let min_collateral_ratio = req
        .min_collateral_ratio
        .unwrap_or(state.config.min_collateral_ratio);

    let metrics = calculate(
        &priced,
        &req.collateral_amount,
        &req.debt_amount,
        min_collateral_ratio,
    );
    let risk = assess_metrics(
        &metrics,
        coerce_amount(&req.debt_amount),
        priced.liquidation_ratio,
    );

    let formatted = FormattedMetrics {
        collateral_value: format_usd(&metrics.collateral_value, 2),
        collateral_ratio: format_ratio(&metrics.collateral_ratio, 2),
        liquidation_price: match metrics.liquidation_price {
            Some(p) => format_usd(&p, 2),
            None => "n/a".to_string(),
        },
        max_dai: format_usd(&metrics.max_dai, 2),
        stability_fee: format_percent(&priced.stability_fee, 2),
    };

    Ok(Json(CalculateResponse {
        asset_id: priced.id.clone(),
        price: priced.price_usd,
        min_collateral_ratio,
        metrics,
        risk,
        formatted,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub collateral_mint: Option<String>,
    #[serde(default)]
    pub collateral_amount: serde_json::Value,
    #[serde(default)]
    pub dai_amount: serde_json::Value,
}

/// POST /api/cdp/validate — Check creation parameters before submitting on-chain.
async fn validate_cdp(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ValidationOutcome>, AppError> {
    let asset = resolve_asset(
        &state.registry,
        req.asset_id.as_deref(),
        req.collateral_mint.as_deref(),
    )?;
    let priced = state.prices.read().await.priced(asset);
    Ok(Json(validate_creation(
        &priced,
        &req.collateral_amount,
        &req.dai_amount,
    )))
}

/// Look up the request's asset by mint when given, else by id.
fn resolve_asset<'a>(
    registry: &'a AssetRegistry,
    asset_id: Option<&str>,
    collateral_mint: Option<&str>,
) -> Result<&'a AssetDescriptor, AppError> {
    match (collateral_mint, asset_id) {
        (Some(mint), _) => registry.by_mint(mint).ok_or_else(|| {
            AppError::NotFound(format!("Unsupported collateral mint '{}'", mint))
        }),
        (None, Some(id)) => registry.require(id),
        (None, None) => Err(AppError::Validation(
            "Either asset_id or collateral_mint is required".to_string(),
        )),
    }
}
