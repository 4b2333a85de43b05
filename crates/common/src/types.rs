use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A collateral asset accepted by the protocol.
///
/// Descriptors are immutable and sourced from the static asset registry;
/// `price_usd` is the last-known static price used when no live quote exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub id: String,
    pub name: String,
    pub symbol: String,
    /// SPL token mint address
    pub mint_address: String,
    pub decimals: u8,
    /// Maximum loan-to-value fraction, in (0, 1]
    pub max_ltv: Decimal,
    /// Annualized borrowing fee rate, in [0, 1)
    pub stability_fee: Decimal,
    /// Minimum collateral/debt ratio before liquidation (1.45 = 145%)
    pub liquidation_ratio: Decimal,
    pub price_usd: Decimal,
    /// Whether new positions may be opened against this asset
    pub is_active: bool,
}

/// A collateralized debt position snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    /// Owner wallet public key (opaque)
    pub owner: String,
    /// Asset id of the locked collateral (e.g. "sol", "msol")
    pub collateral_type: String,
    pub collateral_amount: Decimal,
    pub debt_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    #[serde(default)]
    pub stability_fee_accrued: Decimal,
}

/// Mutations a user can apply to an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CdpAction {
    /// Borrow more and buy more collateral with the proceeds
    Boost,
    /// Sell collateral to pay down debt
    Repay,
    Supply,
    Withdraw,
    Borrow,
    Payback,
}

impl std::fmt::Display for CdpAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CdpAction::Boost => write!(f, "BOOST"),
            CdpAction::Repay => write!(f, "REPAY"),
            CdpAction::Supply => write!(f, "SUPPLY"),
            CdpAction::Withdraw => write!(f, "WITHDRAW"),
            CdpAction::Borrow => write!(f, "BORROW"),
            CdpAction::Payback => write!(f, "PAYBACK"),
        }
    }
}

/// A live price observation for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
}

/// Portfolio-level liquidation risk bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidationRisk {
    None,
    Low,
    Medium,
    High,
    Extreme,
}

impl std::fmt::Display for LiquidationRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiquidationRisk::None => write!(f, "none"),
            LiquidationRisk::Low => write!(f, "low"),
            LiquidationRisk::Medium => write!(f, "medium"),
            LiquidationRisk::High => write!(f, "high"),
            LiquidationRisk::Extreme => write!(f, "extreme"),
        }
    }
}

/// Severity of a security or liquidation finding, ordered low to critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreatLevel::Low => write!(f, "low"),
            ThreatLevel::Medium => write!(f, "medium"),
            ThreatLevel::High => write!(f, "high"),
            ThreatLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Outcome of a single safety check (liquidation, transaction, wallet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub safe: bool,
    pub threat_level: ThreatLevel,
    pub message: String,
}

impl RiskAssessment {
    pub fn new(safe: bool, threat_level: ThreatLevel, message: impl Into<String>) -> Self {
        Self {
            safe,
            threat_level,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_action_serde_uses_uppercase() {
        let json = serde_json::to_string(&CdpAction::Payback).unwrap();
        assert_eq!(json, "\"PAYBACK\"");
        let parsed: CdpAction = serde_json::from_str("\"BOOST\"").unwrap();
        assert_eq!(parsed, CdpAction::Boost);
    }

    #[test]
    fn test_threat_levels_are_ordered() {
        assert!(ThreatLevel::Critical > ThreatLevel::High);
        assert!(ThreatLevel::High > ThreatLevel::Medium);
        assert!(ThreatLevel::Medium > ThreatLevel::Low);
    }

    #[test]
    fn test_position_accepts_numeric_amounts() {
        let position: Position = serde_json::from_value(serde_json::json!({
            "id": "cdp-1",
            "owner": "8YUVQCdEFnQ4g5zLbkKXsJEG6pYa4BrXN8xTmZfAkKgn",
            "collateral_type": "sol",
            "collateral_amount": 10,
            "debt_amount": "900",
            "created_at": "2026-01-01T00:00:00Z",
            "last_updated_at": "2026-01-02T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(position.collateral_amount, dec!(10));
        assert_eq!(position.debt_amount, dec!(900));
        assert_eq!(position.stability_fee_accrued, Decimal::ZERO);
    }
}
