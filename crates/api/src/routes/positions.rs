//! Position, portfolio and action routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use sdai_common::error::AppError;
use sdai_common::types::{CdpAction, RiskAssessment, ThreatLevel};
use sdai_engine::actions::apply_action;
use sdai_engine::monitor::SecurityEventType;
use sdai_engine::numeric::coerce_amount;
use sdai_engine::portfolio::{PortfolioStats, PositionHealth, aggregate, evaluate_position};

use crate::middleware::rate_limit::RateLimitedClient;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/owners/{owner}/positions", get(list_positions))
        .route("/api/owners/{owner}/portfolio", get(get_portfolio))
        .route("/api/positions/{id}", get(get_position))
        .route("/api/positions/{id}/actions", post(submit_action))
}

/// GET /api/owners/:owner/positions — Every position of an owner with metrics and risk.
///
/// Positions whose collateral type is not in the registry are skipped.
async fn list_positions(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<Vec<PositionHealth>>, AppError> {
    let positions = state.positions.read().await.positions_for_owner(&owner)?;
    let prices = state.prices.read().await;

    let health = positions
        .iter()
        .filter_map(|p| match state.registry.get(&p.collateral_type) {
            Some(asset) => Some(evaluate_position(
                p,
                asset,
                &prices,
                state.config.min_collateral_ratio,
            )),
            None => {
                tracing::warn!(
                    position_id = %p.id,
                    collateral_type = %p.collateral_type,
                    "Skipping position with unsupported collateral"
                );
                None
            }
        })
        .collect();

    Ok(Json(health))
}

/// GET /api/owners/:owner/portfolio — Aggregate stats across an owner's positions.
async fn get_portfolio(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<PortfolioStats>, AppError> {
    let positions = state.positions.read().await.positions_for_owner(&owner)?;
    let prices = state.prices.read().await;
    Ok(Json(aggregate(&positions, &state.registry, &prices)))
}

/// GET /api/positions/:id — One position with metrics and risk.
async fn get_position(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PositionHealth>, AppError> {
    let position = state
        .positions
        .read()
        .await
        .position(&id)?
        .ok_or_else(|| AppError::NotFound(format!("Position {} not found", id)))?;
    let asset = state.registry.require(&position.collateral_type)?;
    let prices = state.prices.read().await;

    Ok(Json(evaluate_position(
        &position,
        asset,
        &prices,
        state.config.min_collateral_ratio,
    )))
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: CdpAction,
    #[serde(default)]
    pub amount: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub position: PositionHealth,
    /// Result of the transaction screening that preceded the action
    pub transaction_check: RiskAssessment,
}

/// POST /api/positions/:id/actions — Simulate an action against a position.
///
/// 1. Screen the transaction (burst and size checks)
/// 2. Apply the action at the current price and store the result
/// 3. Re-evaluate the position and record a near-liquidation event if needed
///
/// The position store stays write-locked from the read until the store, so
/// concurrent actions on one position apply in sequence.
async fn submit_action(
    State(state): State<AppState>,
    client: RateLimitedClient,
    Path(id): Path<String>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let now = Utc::now();
    let amount = coerce_amount(&req.amount);

    let mut positions = state.positions.write().await;
    let position = positions
        .position(&id)?
        .ok_or_else(|| AppError::NotFound(format!("Position {} not found", id)))?;
    let asset = state.registry.require(&position.collateral_type)?;

    let transaction_check = {
        let mut monitor = state.monitor.lock().await;
        let check = monitor.check_transaction(amount, now);
        let data = json!({
            "position_id": id,
            "action": req.action,
            "amount": amount.to_string(),
        });

        if !check.safe {
            monitor.log_event(
                SecurityEventType::SuspiciousActivity,
                data,
                check.threat_level,
                check.message.clone(),
                Some(client.id.as_str()),
                now,
            );
            return Err(AppError::RateLimited(check.message));
        }
        if check.threat_level >= ThreatLevel::Medium {
            monitor.log_event(
                SecurityEventType::LargeTransaction,
                data.clone(),
                check.threat_level,
                check.message.clone(),
                Some(client.id.as_str()),
                now,
            );
        }
        monitor.log_event(
            SecurityEventType::TransactionInitiated,
            data,
            ThreatLevel::Low,
            format!("{} initiated", req.action),
            Some(client.id.as_str()),
            now,
        );
        check
    };

    let price = state.prices.read().await.current_price(asset);
    let updated = match apply_action(&position, req.action, &amount, price, now) {
        Ok(updated) => updated,
        Err(e) => {
            state.monitor.lock().await.log_event(
                SecurityEventType::TransactionFailed,
                json!({ "position_id": id, "action": req.action }),
                ThreatLevel::Medium,
                e.to_string(),
                Some(client.id.as_str()),
                now,
            );
            return Err(e);
        }
    };
    positions.store(updated.clone())?;
    drop(positions);

    let health = {
        let prices = state.prices.read().await;
        evaluate_position(&updated, asset, &prices, state.config.min_collateral_ratio)
    };

    {
        let mut monitor = state.monitor.lock().await;
        monitor.log_event(
            SecurityEventType::TransactionSucceeded,
            json!({ "position_id": id, "action": req.action }),
            ThreatLevel::Low,
            format!("{} applied", req.action),
            Some(client.id.as_str()),
            now,
        );
        if health.risk.threat_level >= ThreatLevel::High {
            monitor.log_event(
                SecurityEventType::CdpNearLiquidation,
                json!({
                    "position_id": id,
                    "collateral_value": health.metrics.collateral_value.to_string(),
                    "debt_value": health.metrics.debt_value.to_string(),
                }),
                health.risk.threat_level,
                health.risk.message.clone(),
                Some(updated.owner.as_str()),
                now,
            );
        }
    }

    tracing::info!(
        position_id = %id,
        action = %req.action,
        client = %client.id,
        "Action applied"
    );

    Ok(Json(ActionResponse {
        position: health,
        transaction_check,
    }))
}
