//! Per-position liquidation risk assessment.
//!
//! Grades how close a position sits to its liquidation ratio:
//! - at or below the liquidation ratio → critical
//! - less than 20% above it → high
//! - below the recommended 150% → medium
//! - otherwise → low

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use sdai_common::types::{RiskAssessment, ThreatLevel};

use crate::calculator::CdpMetrics;
use crate::format::fixed;

/// Collateral ratio below which a position is flagged even if far from liquidation.
pub const MIN_SAFE_COLLATERAL_RATIO: Decimal = dec!(1.5);

/// Headroom above the liquidation ratio, as a fraction of it, that triggers a warning.
pub const LIQUIDATION_WARNING_THRESHOLD: Decimal = dec!(0.2);

/// Assess the liquidation risk of a position from its USD values.
pub fn assess_liquidation(
    collateral_value: Decimal,
    debt_value: Decimal,
    liquidation_ratio: Decimal,
) -> RiskAssessment {
    if debt_value <= Decimal::ZERO {
        return RiskAssessment::new(true, ThreatLevel::Low, "CDP has no outstanding debt");
    }

    let Some((current_ratio, headroom)) =
        ratio_and_headroom(collateral_value, debt_value, liquidation_ratio)
    else {
        return unevaluated();
    };

    if current_ratio <= liquidation_ratio {
        RiskAssessment::new(
            false,
            ThreatLevel::Critical,
            format!(
                "CDP at imminent risk of liquidation! \
                 Current ratio: {}%, Liquidation threshold: {}%",
                percent(current_ratio),
                percent(liquidation_ratio)
            ),
        )
    } else if headroom < LIQUIDATION_WARNING_THRESHOLD {
        RiskAssessment::new(
            false,
            ThreatLevel::High,
            format!(
                "CDP at high risk of liquidation. Only {}% above threshold.",
                percent(headroom)
            ),
        )
    } else if current_ratio < MIN_SAFE_COLLATERAL_RATIO {
        RiskAssessment::new(
            true,
            ThreatLevel::Medium,
            format!(
                "CDP below recommended safety ratio of {}%. Consider adding collateral.",
                percent(MIN_SAFE_COLLATERAL_RATIO)
            ),
        )
    } else {
        RiskAssessment::new(true, ThreatLevel::Low, "CDP has a safe collateral ratio")
    }
}

/// Assess a position from its calculated metrics.
///
/// `debt_amount` is the position's own debt. Metrics that failed closed
/// carry zero debt; an indebted position behind them is critical.
pub fn assess_metrics(
    metrics: &CdpMetrics,
    debt_amount: Decimal,
    liquidation_ratio: Decimal,
) -> RiskAssessment {
    if debt_amount > Decimal::ZERO && metrics.debt_value.is_zero() {
        return unevaluated();
    }
    assess_liquidation(metrics.collateral_value, metrics.debt_value, liquidation_ratio)
}

fn unevaluated() -> RiskAssessment {
    RiskAssessment::new(
        false,
        ThreatLevel::Critical,
        "Unable to evaluate CDP collateral ratio",
    )
}

fn ratio_and_headroom(
    collateral_value: Decimal,
    debt_value: Decimal,
    liquidation_ratio: Decimal,
) -> Option<(Decimal, Decimal)> {
    let current_ratio = collateral_value.checked_div(debt_value)?;
    let headroom = current_ratio
        .checked_sub(liquidation_ratio)?
        .checked_div(liquidation_ratio)?;
    Some((current_ratio, headroom))
}

fn percent(ratio: Decimal) -> String {
    ratio
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|p| fixed(p, 2))
        .unwrap_or_else(|| "0.00".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_debt_is_safe() {
        let r = assess_liquidation(dec!(1000), Decimal::ZERO, dec!(1.45));
        assert!(r.safe);
        assert_eq!(r.threat_level, ThreatLevel::Low);
    }

    #[test]
    fn test_at_liquidation_ratio_is_critical() {
        let r = assess_liquidation(dec!(1450), dec!(1000), dec!(1.45));
        assert!(!r.safe);
        assert_eq!(r.threat_level, ThreatLevel::Critical);
        assert!(r.message.contains("145.00%"));
    }

    #[test]
    fn test_close_to_liquidation_is_high() {
        // ratio 1.6 vs 1.45 → 10.34% headroom
        let r = assess_liquidation(dec!(1600), dec!(1000), dec!(1.45));
        assert!(!r.safe);
        assert_eq!(r.threat_level, ThreatLevel::High);
        assert!(r.message.contains("10.34%"));
    }

    #[test]
    fn test_below_recommended_ratio_is_medium() {
        // ratio 1.45 vs liquidation 1.2 → 20.8% headroom but under 1.5
        let r = assess_liquidation(dec!(1450), dec!(1000), dec!(1.2));
        assert!(r.safe);
        assert_eq!(r.threat_level, ThreatLevel::Medium);
    }

    #[test]
    fn test_comfortable_ratio_is_low() {
        let r = assess_liquidation(dec!(3000), dec!(1000), dec!(1.45));
        assert!(r.safe);
        assert_eq!(r.threat_level, ThreatLevel::Low);
    }

    #[test]
    fn test_failed_metrics_with_debt_are_critical() {
        let r = assess_metrics(&CdpMetrics::invalid(), dec!(1000), dec!(1.45));
        assert!(!r.safe);
        assert_eq!(r.threat_level, ThreatLevel::Critical);
        assert_eq!(r.message, "Unable to evaluate CDP collateral ratio");

        // Nothing owed: the zero-debt answer still applies
        let r = assess_metrics(&CdpMetrics::invalid(), Decimal::ZERO, dec!(1.45));
        assert!(r.safe);
    }

    #[test]
    fn test_zero_liquidation_ratio_fails_closed() {
        let r = assess_liquidation(dec!(3000), dec!(1000), Decimal::ZERO);
        assert!(!r.safe);
        assert_eq!(r.threat_level, ThreatLevel::Critical);
    }
}
