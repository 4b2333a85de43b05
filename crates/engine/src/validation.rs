//! Pre-flight validation of a new CDP before it is submitted on-chain.

use rust_decimal::Decimal;
use serde::Serialize;

use sdai_common::types::AssetDescriptor;

use crate::calculator::calculate;
use crate::format::fixed;
use crate::numeric::{ToDecimal, coerce_amount};

/// Result of validating CDP creation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub message: String,
}

impl ValidationOutcome {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
        }
    }
}

/// Check that `dai_amount` may be minted against `collateral_amount` of `asset`.
///
/// Checks run in order and the first failure is reported: asset active,
/// positive collateral, positive debt, debt within max LTV, ratio at or
/// above the asset's liquidation ratio.
pub fn validate_creation<C, D>(
    asset: &AssetDescriptor,
    collateral_amount: &C,
    dai_amount: &D,
) -> ValidationOutcome
where
    C: ToDecimal + ?Sized,
    D: ToDecimal + ?Sized,
{
    if !asset.is_active {
        return ValidationOutcome::rejected(format!(
            "{} is not accepting new CDPs",
            asset.symbol
        ));
    }

    let collateral = coerce_amount(collateral_amount);
    let dai = coerce_amount(dai_amount);

    if collateral.is_zero() {
        return ValidationOutcome::rejected("Collateral amount must be greater than 0");
    }
    if dai.is_zero() {
        return ValidationOutcome::rejected("DAI amount must be greater than 0");
    }

    let metrics = calculate(asset, &collateral, &dai, asset.liquidation_ratio);

    if dai > metrics.max_dai {
        return ValidationOutcome::rejected(format!(
            "Cannot borrow more than {} DAI with this collateral",
            fixed(metrics.max_dai, 2)
        ));
    }

    if !metrics.is_valid_cdp {
        let ratio = metrics
            .collateral_ratio
            .value()
            .unwrap_or_default()
            .saturating_mul(Decimal::ONE_HUNDRED);
        return ValidationOutcome::rejected(format!(
            "Collateral ratio ({}%) is below the minimum required ({}%)",
            fixed(ratio, 2),
            fixed(asset.liquidation_ratio.saturating_mul(Decimal::ONE_HUNDRED), 2)
        ));
    }

    ValidationOutcome {
        is_valid: true,
        message: "Valid CDP parameters".to_string(),
    }
}
