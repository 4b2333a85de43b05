use std::net::SocketAddr;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP API binds to (default: 0.0.0.0:3000)
    pub api_addr: SocketAddr,

    /// Minimum collateral ratio a new CDP must reach (default: 1.55 = 155%)
    pub min_collateral_ratio: Decimal,

    /// Price refresh interval in milliseconds (default: 30000)
    pub price_poll_interval_ms: u64,

    /// Optional JSON file used to seed the in-memory position store
    pub positions_file: Option<String>,

    /// Transactions per minute above which a session is flagged (default: 10)
    pub max_tx_per_minute: usize,

    /// Amount above which a transaction is flagged as large (default: 100)
    pub large_tx_threshold: Decimal,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            api_addr: std::env::var("SDAI_API_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SDAI_API_ADDR must be a valid socket address"))?,
            min_collateral_ratio: Decimal::from_str(
                &std::env::var("SDAI_MIN_COLLATERAL_RATIO").unwrap_or_else(|_| "1.55".to_string()),
            )
            .map_err(|_| anyhow::anyhow!("SDAI_MIN_COLLATERAL_RATIO must be a valid decimal"))?,
            price_poll_interval_ms: parse_poll_interval(
                &std::env::var("SDAI_PRICE_POLL_INTERVAL_MS")
                    .unwrap_or_else(|_| "30000".to_string()),
            )?,
            positions_file: std::env::var("SDAI_POSITIONS_FILE").ok(),
            max_tx_per_minute: std::env::var("SDAI_MAX_TX_PER_MINUTE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SDAI_MAX_TX_PER_MINUTE must be a valid usize"))?,
            large_tx_threshold: Decimal::from_str(
                &std::env::var("SDAI_LARGE_TX_THRESHOLD").unwrap_or_else(|_| "100".to_string()),
            )
            .map_err(|_| anyhow::anyhow!("SDAI_LARGE_TX_THRESHOLD must be a valid decimal"))?,
        })
    }
}

fn parse_poll_interval(raw: &str) -> anyhow::Result<u64> {
    let ms: u64 = raw
        .parse()
        .map_err(|_| anyhow::anyhow!("SDAI_PRICE_POLL_INTERVAL_MS must be a valid u64"))?;
    if ms == 0 {
        anyhow::bail!("SDAI_PRICE_POLL_INTERVAL_MS must be greater than 0");
    }
    Ok(ms)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            min_collateral_ratio: Decimal::new(155, 2),
            price_poll_interval_ms: 30_000,
            positions_file: None,
            max_tx_per_minute: 10,
            large_tx_threshold: Decimal::from(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api_addr.port(), 3000);
        assert_eq!(config.min_collateral_ratio.to_string(), "1.55");
        assert_eq!(config.price_poll_interval_ms, 30_000);
        assert!(config.positions_file.is_none());
        assert_eq!(config.max_tx_per_minute, 10);
    }

    #[test]
    fn test_poll_interval_must_be_positive() {
        assert_eq!(parse_poll_interval("250").unwrap(), 250);

        let err = parse_poll_interval("0").unwrap_err();
        assert_eq!(err.to_string(), "SDAI_PRICE_POLL_INTERVAL_MS must be greater than 0");

        assert!(parse_poll_interval("-5").is_err());
        assert!(parse_poll_interval("soon").is_err());
    }
}
