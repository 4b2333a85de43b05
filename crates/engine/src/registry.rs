//! Static registry of collateral assets accepted by the protocol.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use sdai_common::error::AppError;
use sdai_common::types::AssetDescriptor;

/// Minimum collateral ratio a new CDP must reach when the caller gives none (155%).
pub const DEFAULT_MIN_COLLATERAL_RATIO: Decimal = dec!(1.55);

/// Symbol of the stablecoin minted against collateral. Pegged 1:1 to USD.
pub const STABLECOIN_SYMBOL: &str = "sDAI";

/// Registry of collateral asset descriptors.
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    assets: Vec<AssetDescriptor>,
}

impl AssetRegistry {
    pub fn new(assets: Vec<AssetDescriptor>) -> Self {
        Self { assets }
    }

    /// The default set of supported collateral assets.
    pub fn supported() -> Self {
        Self::new(vec![
            asset(
                ("sol", "Solana", "SOL"),
                "So11111111111111111111111111111111111111112",
                9,
                [dec!(0.66), dec!(0.06), dec!(1.45), dec!(142.50)],
            ),
            asset(
                ("msol", "Marinade SOL", "mSOL"),
                "mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So",
                9,
                [dec!(0.70), dec!(0.055), dec!(1.40), dec!(146.25)],
            ),
            asset(
                ("bsol", "Blaze SOL", "bSOL"),
                "bSo13r4TkiE4KumL71LsHTPpL2euBYLFx6h9HP3piy1",
                9,
                [dec!(0.68), dec!(0.057), dec!(1.43), dec!(144.80)],
            ),
            asset(
                ("jsol", "Jito SOL", "jitoSOL"),
                "J1toso1uCk3RLmjorhTtrVwY9HJ7X8V9yYac6Y7kGCPn",
                9,
                [dec!(0.69), dec!(0.058), dec!(1.42), dec!(145.30)],
            ),
            asset(
                ("usdc", "USD Coin", "USDC"),
                "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                6,
                [dec!(0.80), dec!(0.04), dec!(1.20), dec!(1.00)],
            ),
            asset(
                ("usdt", "Tether USD", "USDT"),
                "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB",
                6,
                [dec!(0.75), dec!(0.045), dec!(1.25), dec!(1.00)],
            ),
            asset(
                ("bonk", "Bonk", "BONK"),
                "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
                5,
                [dec!(0.40), dec!(0.10), dec!(2.00), dec!(0.00002145)],
            ),
        ])
    }

    /// All registered assets, active or not.
    pub fn all(&self) -> &[AssetDescriptor] {
        &self.assets
    }

    /// Assets currently accepting new CDPs.
    pub fn active(&self) -> Vec<&AssetDescriptor> {
        self.assets.iter().filter(|a| a.is_active).collect()
    }

    pub fn get(&self, id: &str) -> Option<&AssetDescriptor> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Look up an asset id, failing with `NotFound` for unknown ids.
    pub fn require(&self, id: &str) -> Result<&AssetDescriptor, AppError> {
        self.get(id)
            .ok_or_else(|| AppError::NotFound(format!("Unsupported collateral type '{}'", id)))
    }

    /// Find an asset by token mint address (case-insensitive).
    pub fn by_mint(&self, mint_address: &str) -> Option<&AssetDescriptor> {
        self.assets
            .iter()
            .find(|a| a.mint_address.eq_ignore_ascii_case(mint_address))
    }

    /// Whether a mint is known and currently accepting new CDPs.
    pub fn is_supported(&self, mint_address: &str) -> bool {
        self.by_mint(mint_address).is_some_and(|a| a.is_active)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::supported()
    }
}

/// `params` is `[max_ltv, stability_fee, liquidation_ratio, price_usd]`.
fn asset(
    (id, name, symbol): (&str, &str, &str),
    mint_address: &str,
    decimals: u8,
    params: [Decimal; 4],
) -> AssetDescriptor {
    let [max_ltv, stability_fee, liquidation_ratio, price_usd] = params;
    AssetDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        symbol: symbol.to_string(),
        mint_address: mint_address.to_string(),
        decimals,
        max_ltv,
        stability_fee,
        liquidation_ratio,
        price_usd,
        is_active: true,
    }
}
