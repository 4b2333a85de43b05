//! Portfolio aggregation and liquidation-risk bucketing.
//!
//! Rolls every position of one owner into totals and an overall collateral
//! ratio, then classifies the ratio into a [`LiquidationRisk`] band:
//!
//! | ratio           | risk    |
//! |-----------------|---------|
//! | 0 (no debt)     | none    |
//! | > 2.0           | low     |
//! | (1.75, 2.0]     | medium  |
//! | (1.5, 1.75]     | high    |
//! | ≤ 1.5           | extreme |
//!
//! Aggregation is pure and recomputed on every call. Note that a debt-free
//! portfolio reports a ratio of `0`, whereas a debt-free single position
//! reports [`CollateralRatio::Unbounded`](crate::calculator::CollateralRatio).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use sdai_common::types::{AssetDescriptor, LiquidationRisk, Position, RiskAssessment};

use crate::calculator::{CdpMetrics, calculate};
use crate::prices::PriceBook;
use crate::registry::AssetRegistry;
use crate::risk::assess_metrics;

/// Blanket loan-to-value applied to the whole portfolio when estimating headroom.
pub const PORTFOLIO_BORROW_LTV: Decimal = dec!(0.6);

const LOW_RISK_ABOVE: Decimal = dec!(2.0);
const MEDIUM_RISK_ABOVE: Decimal = dec!(1.75);
const HIGH_RISK_ABOVE: Decimal = dec!(1.5);

/// Aggregate view over all positions of one owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioStats {
    #[serde(with = "rust_decimal::serde::str")]
    pub total_collateral_value_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_debt_value_usd: Decimal,
    /// Collateral over debt; `0` when there is no debt
    #[serde(with = "rust_decimal::serde::str")]
    pub overall_collateral_ratio: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub available_dai_to_borrow: Decimal,
    pub liquidation_risk: LiquidationRisk,
    pub position_count: usize,
}

impl PortfolioStats {
    pub fn empty() -> Self {
        Self {
            total_collateral_value_usd: Decimal::ZERO,
            total_debt_value_usd: Decimal::ZERO,
            overall_collateral_ratio: Decimal::ZERO,
            available_dai_to_borrow: Decimal::ZERO,
            liquidation_risk: LiquidationRisk::None,
            position_count: 0,
        }
    }
}

/// One position together with its metrics at the current price.
#[derive(Debug, Clone, Serialize)]
pub struct PositionHealth {
    pub position: Position,
    pub asset_symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub current_price: Decimal,
    pub metrics: CdpMetrics,
    pub risk: RiskAssessment,
}

/// Aggregate positions into portfolio totals and a risk bucket.
///
/// Each position is valued at its asset's live quote, falling back to the
/// registry's static price. A position whose asset has neither contributes
/// its debt but no collateral value.
pub fn aggregate(
    positions: &[Position],
    registry: &AssetRegistry,
    prices: &PriceBook,
) -> PortfolioStats {
    if positions.is_empty() {
        return PortfolioStats::empty();
    }

    let mut total_collateral = Decimal::ZERO;
    let mut total_debt = Decimal::ZERO;

    for position in positions {
        let value = match prices.resolve(&position.collateral_type, registry) {
            Some(price) => position.collateral_amount.checked_mul(price).unwrap_or_else(|| {
                tracing::warn!(
                    position_id = %position.id,
                    "Collateral value overflowed, counting it as zero"
                );
                Decimal::ZERO
            }),
            None => {
                tracing::warn!(
                    position_id = %position.id,
                    collateral_type = %position.collateral_type,
                    "No price for collateral type, counting it as zero"
                );
                Decimal::ZERO
            }
        };

        total_collateral = total_collateral.saturating_add(value);
        total_debt = total_debt.saturating_add(position.debt_amount);
    }

    let overall_collateral_ratio = if total_debt > Decimal::ZERO {
        total_collateral.checked_div(total_debt).unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    let available_dai_to_borrow = total_collateral
        .checked_mul(PORTFOLIO_BORROW_LTV)
        .map(|cap| (cap - total_debt).max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO);

    let stats = PortfolioStats {
        total_collateral_value_usd: total_collateral,
        total_debt_value_usd: total_debt,
        overall_collateral_ratio,
        available_dai_to_borrow,
        liquidation_risk: classify_risk(overall_collateral_ratio, total_debt),
        position_count: positions.len(),
    };

    tracing::debug!(
        positions = stats.position_count,
        ratio = %stats.overall_collateral_ratio,
        risk = %stats.liquidation_risk,
        "Portfolio aggregated"
    );

    stats
}

/// Bucket an overall collateral ratio. Bands are checked high to low; the
/// upper bound of each band is inclusive.
pub fn classify_risk(overall_collateral_ratio: Decimal, total_debt: Decimal) -> LiquidationRisk {
    if overall_collateral_ratio.is_zero() && total_debt.is_zero() {
        LiquidationRisk::None
    } else if overall_collateral_ratio > LOW_RISK_ABOVE {
        LiquidationRisk::Low
    } else if overall_collateral_ratio > MEDIUM_RISK_ABOVE {
        LiquidationRisk::Medium
    } else if overall_collateral_ratio > HIGH_RISK_ABOVE {
        LiquidationRisk::High
    } else {
        LiquidationRisk::Extreme
    }
}

/// Evaluate a single position at the current price of its asset.
pub fn evaluate_position(
    position: &Position,
    asset: &AssetDescriptor,
    prices: &PriceBook,
    min_collateral_ratio: Decimal,
) -> PositionHealth {
    let priced = prices.priced(asset);
    let metrics = calculate(
        &priced,
        &position.collateral_amount,
        &position.debt_amount,
        min_collateral_ratio,
    );
    let risk = assess_metrics(&metrics, position.debt_amount, asset.liquidation_ratio);

    PositionHealth {
        position: position.clone(),
        asset_symbol: asset.symbol.clone(),
        current_price: priced.price_usd,
        metrics,
        risk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sdai_common::types::{PriceQuote, ThreatLevel};

    fn position(collateral_type: &str, collateral: Decimal, debt: Decimal) -> Position {
        let now = Utc::now();
        Position {
            id: format!("cdp-{}", collateral_type),
            owner: "alice".to_string(),
            collateral_type: collateral_type.to_string(),
            collateral_amount: collateral,
            debt_amount: debt,
            created_at: now,
            last_updated_at: now,
            stability_fee_accrued: Decimal::ZERO,
        }
    }

    #[test]
    fn test_empty_portfolio() {
        let stats = aggregate(&[], &AssetRegistry::supported(), &PriceBook::new());
        assert_eq!(stats, PortfolioStats::empty());
        assert_eq!(stats.liquidation_risk, LiquidationRisk::None);
    }

    #[test]
    fn test_aggregates_at_static_prices() {
        // 10 SOL @ 142.50 + 5 mSOL @ 146.25 = 1425 + 731.25
        let positions = vec![
            position("sol", dec!(10), dec!(900)),
            position("msol", dec!(5), dec!(500)),
        ];
        let stats = aggregate(&positions, &AssetRegistry::supported(), &PriceBook::new());

        assert_eq!(stats.total_collateral_value_usd, dec!(2156.25));
        assert_eq!(stats.total_debt_value_usd, dec!(1400));
        // 2156.25 / 1400 = 1.5401...
        assert_eq!(stats.liquidation_risk, LiquidationRisk::High);
        // 2156.25 × 0.6 − 1400 = −106.25 → clamped
        assert_eq!(stats.available_dai_to_borrow, Decimal::ZERO);
        assert_eq!(stats.position_count, 2);
    }

    #[test]
    fn test_live_quote_overrides_static_price() {
        let mut prices = PriceBook::new();
        prices.update(
            "sol",
            PriceQuote {
                price: dec!(300),
                timestamp: Utc::now(),
                symbol: "SOL".to_string(),
            },
        );
        let positions = vec![position("sol", dec!(10), dec!(1000))];
        let stats = aggregate(&positions, &AssetRegistry::supported(), &prices);

        assert_eq!(stats.total_collateral_value_usd, dec!(3000));
        assert_eq!(stats.overall_collateral_ratio, dec!(3));
        assert_eq!(stats.available_dai_to_borrow, dec!(800));
        assert_eq!(stats.liquidation_risk, LiquidationRisk::Low);
    }

    #[test]
    fn test_no_debt_reports_zero_ratio() {
        let positions = vec![position("sol", dec!(10), Decimal::ZERO)];
        let stats = aggregate(&positions, &AssetRegistry::supported(), &PriceBook::new());
        assert_eq!(stats.overall_collateral_ratio, Decimal::ZERO);
        assert_eq!(stats.liquidation_risk, LiquidationRisk::None);
        assert_eq!(stats.available_dai_to_borrow, dec!(855));
    }

    #[test]
    fn test_unknown_asset_counts_debt_only() {
        let positions = vec![position("doge", dec!(1000), dec!(100))];
        let stats = aggregate(&positions, &AssetRegistry::supported(), &PriceBook::new());
        assert_eq!(stats.total_collateral_value_usd, Decimal::ZERO);
        assert_eq!(stats.total_debt_value_usd, dec!(100));
        assert_eq!(stats.liquidation_risk, LiquidationRisk::Extreme);
    }

    #[test]
    fn test_risk_band_boundaries() {
        let debt = Decimal::ONE;
        assert_eq!(classify_risk(dec!(2.01), debt), LiquidationRisk::Low);
        assert_eq!(classify_risk(dec!(2.0), debt), LiquidationRisk::Medium);
        assert_eq!(classify_risk(dec!(1.76), debt), LiquidationRisk::Medium);
        assert_eq!(classify_risk(dec!(1.75), debt), LiquidationRisk::High);
        assert_eq!(classify_risk(dec!(1.51), debt), LiquidationRisk::High);
        assert_eq!(classify_risk(dec!(1.5), debt), LiquidationRisk::Extreme);
        assert_eq!(classify_risk(dec!(0.2), debt), LiquidationRisk::Extreme);
        assert_eq!(classify_risk(Decimal::ZERO, Decimal::ZERO), LiquidationRisk::None);
    }

    #[test]
    fn test_evaluate_position() {
        let registry = AssetRegistry::supported();
        let sol = registry.get("sol").unwrap();
        let p = position("sol", dec!(10), dec!(900));
        let health = evaluate_position(&p, sol, &PriceBook::new(), dec!(1.55));

        assert_eq!(health.asset_symbol, "SOL");
        assert_eq!(health.current_price, dec!(142.50));
        // 1425 / 900 = 1.583 → valid against 1.55, high risk vs 1.45
        assert!(health.metrics.is_valid_cdp);
        assert_eq!(health.risk.threat_level, ThreatLevel::High);
    }

    #[test]
    fn test_overflowing_position_is_not_reported_healthy() {
        let registry = AssetRegistry::supported();
        let sol = registry.get("sol").unwrap();
        let p = position("sol", Decimal::MAX, dec!(1000));
        let health = evaluate_position(&p, sol, &PriceBook::new(), dec!(1.55));

        assert!(!health.metrics.is_valid_cdp);
        assert!(!health.risk.safe);
        assert_eq!(health.risk.threat_level, ThreatLevel::Critical);
    }
}
