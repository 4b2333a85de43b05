//! Collateral asset routes.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use sdai_common::error::AppError;
use sdai_common::types::AssetDescriptor;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/assets", get(list_assets))
        .route("/api/assets/{id}", get(get_asset))
        .route("/api/assets/mint/{mint}", get(get_asset_by_mint))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAssetsQuery {
    /// Only assets currently accepting new CDPs
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct MintLookup {
    pub asset: AssetDescriptor,
    /// Known and accepting new CDPs
    pub is_supported: bool,
}

/// GET /api/assets — Supported collateral assets at their current price.
///
/// `?active=true` restricts the list to assets accepting new CDPs.
async fn list_assets(
    State(state): State<AppState>,
    Query(query): Query<ListAssetsQuery>,
) -> Json<Vec<AssetDescriptor>> {
    let prices = state.prices.read().await;
    let assets: Vec<&AssetDescriptor> = if query.active {
        state.registry.active()
    } else {
        state.registry.all().iter().collect()
    };
    Json(assets.into_iter().map(|a| prices.priced(a)).collect())
}

/// GET /api/assets/:id — One asset at its current price.
async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AssetDescriptor>, AppError> {
    let asset = state.registry.require(&id)?;
    Ok(Json(state.prices.read().await.priced(asset)))
}

/// GET /api/assets/mint/:mint — Asset for a token mint and whether it is supported.
async fn get_asset_by_mint(
    State(state): State<AppState>,
    Path(mint): Path<String>,
) -> Result<Json<MintLookup>, AppError> {
    let asset = state
        .registry
        .by_mint(&mint)
        .ok_or_else(|| AppError::NotFound(format!("Unsupported collateral mint '{}'", mint)))?;
    Ok(Json(MintLookup {
        asset: state.prices.read().await.priced(asset),
        is_supported: state.registry.is_supported(&mint),
    }))
}
