//! Single-position solvency calculator.
//!
//! Computes the derived metrics of one CDP from an asset descriptor and
//! user-chosen collateral/debt amounts:
//!
//! - collateral value = collateral × price
//! - collateral ratio = collateral value / debt (unbounded with zero debt)
//! - liquidation price = debt × liquidation ratio / collateral
//! - max borrowable = collateral value × max LTV
//! - exposure = collateral value / (collateral value − debt)
//!
//! The calculator never fails. Arithmetic is checked; if any step overflows
//! the result is the all-zero invalid [`CdpMetrics::invalid`], so a caller can
//! never render a healthy position from a failed computation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};

use sdai_common::types::AssetDescriptor;

use crate::numeric::{ToDecimal, coerce_amount};

/// Exposure reported for a position without debt.
const UNLEVERAGED_EXPOSURE: &str = "1x";

/// Exposure reported when debt meets or exceeds collateral value.
const UNDEFINED_EXPOSURE: &str = "n/a";

/// Collateral/debt ratio of a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollateralRatio {
    /// No outstanding debt: unbounded headroom, nothing to liquidate.
    Unbounded,
    Finite(Decimal),
}

impl CollateralRatio {
    pub fn is_unbounded(&self) -> bool {
        matches!(self, CollateralRatio::Unbounded)
    }

    /// The numeric ratio, `None` when unbounded.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            CollateralRatio::Unbounded => None,
            CollateralRatio::Finite(r) => Some(*r),
        }
    }

    /// Whether the ratio is at or above `minimum`.
    pub fn meets(&self, minimum: Decimal) -> bool {
        match self {
            CollateralRatio::Unbounded => true,
            CollateralRatio::Finite(r) => *r >= minimum,
        }
    }
}

impl std::fmt::Display for CollateralRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollateralRatio::Unbounded => write!(f, "Infinity"),
            CollateralRatio::Finite(r) => write!(f, "{}", r),
        }
    }
}

impl Serialize for CollateralRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Derived metrics of one position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CdpMetrics {
    /// USD value of the collateral
    #[serde(with = "rust_decimal::serde::str")]
    pub collateral_value: Decimal,
    /// USD value of the debt (stablecoin is 1:1 USD)
    #[serde(with = "rust_decimal::serde::str")]
    pub debt_value: Decimal,
    pub collateral_ratio: CollateralRatio,
    /// Collateral price at which the position becomes liquidatable.
    /// `None` when there is no collateral.
    #[serde(with = "rust_decimal::serde::str_option")]
    pub liquidation_price: Option<Decimal>,
    /// Maximum stablecoin that may be borrowed against this collateral
    #[serde(with = "rust_decimal::serde::str")]
    pub max_dai: Decimal,
    /// Leverage multiple, e.g. "1.92x"
    pub exposure: String,
    /// Whether the ratio reaches the requested minimum
    pub is_valid_cdp: bool,
}

impl CdpMetrics {
    /// The fail-closed result: every amount zero, never valid.
    pub fn invalid() -> Self {
        Self {
            collateral_value: Decimal::ZERO,
            debt_value: Decimal::ZERO,
            collateral_ratio: CollateralRatio::Finite(Decimal::ZERO),
            liquidation_price: None,
            max_dai: Decimal::ZERO,
            exposure: UNDEFINED_EXPOSURE.to_string(),
            is_valid_cdp: false,
        }
    }
}

/// Calculate the metrics of a position.
///
/// `collateral_amount` and `debt_amount` are coerced to non-negative decimals;
/// anything that does not parse counts as zero.
pub fn calculate<C, D>(
    asset: &AssetDescriptor,
    collateral_amount: &C,
    debt_amount: &D,
    min_collateral_ratio: Decimal,
) -> CdpMetrics
where
    C: ToDecimal + ?Sized,
    D: ToDecimal + ?Sized,
{
    let collateral = coerce_amount(collateral_amount);
    let debt = coerce_amount(debt_amount);

    match try_calculate(asset, collateral, debt, min_collateral_ratio) {
        Some(metrics) => metrics,
        None => {
            tracing::warn!(
                asset = %asset.id,
                collateral = %collateral,
                debt = %debt,
                "CDP calculation failed, returning invalid result"
            );
            CdpMetrics::invalid()
        }
    }
}

fn try_calculate(
    asset: &AssetDescriptor,
    collateral: Decimal,
    debt: Decimal,
    min_collateral_ratio: Decimal,
) -> Option<CdpMetrics> {
    if asset.price_usd.is_sign_negative() {
        return None;
    }

    let collateral_value = collateral.checked_mul(asset.price_usd)?;
    let max_dai = collateral_value.checked_mul(asset.max_ltv)?;
    let liquidation_price = if collateral.is_zero() {
        None
    } else {
        Some(
            debt.checked_mul(asset.liquidation_ratio)?
                .checked_div(collateral)?,
        )
    };

    if debt.is_zero() {
        return Some(CdpMetrics {
            collateral_value,
            debt_value: Decimal::ZERO,
            collateral_ratio: CollateralRatio::Unbounded,
            liquidation_price,
            max_dai,
            exposure: UNLEVERAGED_EXPOSURE.to_string(),
            is_valid_cdp: true,
        });
    }

    let debt_value = debt;
    let collateral_ratio = CollateralRatio::Finite(collateral_value.checked_div(debt_value)?);
    let exposure = exposure(collateral_value, debt_value)?;

    Some(CdpMetrics {
        collateral_value,
        debt_value,
        collateral_ratio,
        liquidation_price,
        max_dai,
        exposure,
        is_valid_cdp: collateral_ratio.meets(min_collateral_ratio),
    })
}

/// Leverage multiple `value / (value − debt)`, two decimals, half-up.
fn exposure(collateral_value: Decimal, debt_value: Decimal) -> Option<String> {
    let equity = collateral_value.checked_sub(debt_value)?;
    if equity <= Decimal::ZERO {
        return Some(UNDEFINED_EXPOSURE.to_string());
    }
    let mut multiple = collateral_value
        .checked_div(equity)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    multiple.rescale(2);
    Some(format!("{}x", multiple))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::registry::AssetRegistry;

    fn sol() -> AssetDescriptor {
        AssetRegistry::supported().get("sol").unwrap().clone()
    }

    fn priced(price: Decimal) -> AssetDescriptor {
        AssetDescriptor {
            price_usd: price,
            ..sol()
        }
    }

    #[test]
    fn test_zero_debt_is_unbounded_and_valid() {
        let m = calculate(&sol(), "5", "0", dec!(1.55));
        assert_eq!(m.collateral_ratio, CollateralRatio::Unbounded);
        assert!(m.is_valid_cdp);
        assert_eq!(m.exposure, "1x");
        assert_eq!(m.collateral_value, dec!(712.5));
        assert_eq!(m.debt_value, Decimal::ZERO);
        assert_eq!(m.liquidation_price, Some(Decimal::ZERO));
    }

    #[test]
    fn test_healthy_position() {
        // 10 SOL @ 142.50 = 1425, debt 500 → ratio 2.85
        let m = calculate(&sol(), "10", "500", dec!(1.55));
        assert_eq!(m.collateral_value, dec!(1425));
        assert_eq!(m.collateral_ratio, CollateralRatio::Finite(dec!(2.85)));
        assert_eq!(m.max_dai, dec!(940.5));
        // 500 × 1.45 / 10
        assert_eq!(m.liquidation_price, Some(dec!(72.5)));
        // 1425 / 925 = 1.5405...
        assert_eq!(m.exposure, "1.54x");
        assert!(m.is_valid_cdp);
    }

    #[test]
    fn test_below_liquidation_ratio_is_invalid() {
        let m = calculate(&priced(dec!(100)), "10", "900", dec!(1.45));
        let ratio = m.collateral_ratio.value().unwrap();
        assert!(ratio > dec!(1.111) && ratio < dec!(1.112));
        assert!(!m.is_valid_cdp);
    }

    #[test]
    fn test_ratio_exactly_at_minimum_is_valid() {
        // 1000 / 500 = 2.0
        let m = calculate(&priced(dec!(100)), "10", "500", dec!(2.0));
        assert!(m.is_valid_cdp);
    }

    #[test]
    fn test_grossly_undercollateralized_is_invalid() {
        let m = calculate(&sol(), "3", "10000", dec!(1.55));
        assert_eq!(m.collateral_value, dec!(427.50));
        assert_eq!(m.collateral_ratio, CollateralRatio::Finite(dec!(0.04275)));
        assert!(!m.is_valid_cdp);
        assert_eq!(m.exposure, "n/a");
    }

    #[test]
    fn test_malformed_collateral_is_zero() {
        let m = calculate(&sol(), "abc", "100", dec!(1.55));
        assert_eq!(m.collateral_value, Decimal::ZERO);
        assert_eq!(m.liquidation_price, None);
        assert!(!m.is_valid_cdp);
    }

    #[test]
    fn test_overflow_fails_closed() {
        let m = calculate(&sol(), "79228162514264337593543950335", "1", dec!(1.55));
        assert_eq!(m, CdpMetrics::invalid());
        assert!(!m.is_valid_cdp);
    }

    #[test]
    fn test_negative_price_fails_closed() {
        let m = calculate(&priced(dec!(-1)), "10", "0", dec!(1.55));
        assert_eq!(m, CdpMetrics::invalid());
    }

    #[test]
    fn test_exposure_rounds_half_up() {
        // 1000 / (1000 - 200) = 1.25
        assert_eq!(exposure(dec!(1000), dec!(200)).unwrap(), "1.25x");
        // 1000 / (1000 - 500) = 2
        assert_eq!(exposure(dec!(1000), dec!(500)).unwrap(), "2.00x");
        assert_eq!(exposure(dec!(1000), dec!(1000)).unwrap(), "n/a");
    }

    #[test]
    fn test_serializes_unbounded_ratio() {
        let m = calculate(&sol(), "1", "0", dec!(1.55));
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["collateral_ratio"], "Infinity");
        assert_eq!(json["collateral_value"], "142.50");
        assert_eq!(json["is_valid_cdp"], true);
    }

    #[test]
    fn test_serializes_missing_liquidation_price_as_null() {
        let m = calculate(&sol(), "0", "10", dec!(1.55));
        let json = serde_json::to_value(&m).unwrap();
        assert!(json["liquidation_price"].is_null());
    }
}
