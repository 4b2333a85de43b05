//! Price book: latest known quote per asset, with static fallback.
//!
//! Quotes are pushed in by a [`PriceFeed`] on an external schedule. The book
//! never fails a lookup: an asset without a usable quote is priced at the
//! static price from its descriptor.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use sdai_common::types::{AssetDescriptor, PriceQuote};

use crate::registry::AssetRegistry;

/// Source of fresh price quotes, keyed by asset id.
pub trait PriceFeed: Send + Sync {
    /// Fetch the latest quotes. Assets missing from the result keep their
    /// previous quote.
    fn fetch(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<(String, PriceQuote)>>;

    /// Human-readable name for this feed (e.g., "static registry").
    fn name(&self) -> &'static str;
}

/// Feed that republishes the registry's static prices with fresh timestamps.
pub struct StaticPriceFeed {
    registry: AssetRegistry,
}

impl StaticPriceFeed {
    pub fn new(registry: AssetRegistry) -> Self {
        Self { registry }
    }
}

impl PriceFeed for StaticPriceFeed {
    fn fetch(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<(String, PriceQuote)>> {
        Ok(self
            .registry
            .all()
            .iter()
            .map(|a| {
                (
                    a.id.clone(),
                    PriceQuote {
                        price: a.price_usd,
                        timestamp: now,
                        symbol: a.symbol.clone(),
                    },
                )
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "static registry"
    }
}

/// Latest quote per asset id.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    quotes: HashMap<String, PriceQuote>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the book with every registry asset at its static price.
    pub fn from_registry(registry: &AssetRegistry, now: DateTime<Utc>) -> Self {
        let mut book = Self::new();
        for asset in registry.all() {
            book.update(
                &asset.id,
                PriceQuote {
                    price: asset.price_usd,
                    timestamp: now,
                    symbol: asset.symbol.clone(),
                },
            );
        }
        book
    }

    pub fn update(&mut self, asset_id: &str, quote: PriceQuote) {
        self.quotes.insert(asset_id.to_string(), quote);
    }

    /// Apply a batch of quotes from a feed. Returns how many were applied.
    pub fn apply(&mut self, quotes: Vec<(String, PriceQuote)>) -> usize {
        let count = quotes.len();
        for (asset_id, quote) in quotes {
            self.quotes.insert(asset_id, quote);
        }
        count
    }

    pub fn quote(&self, asset_id: &str) -> Option<&PriceQuote> {
        self.quotes.get(asset_id)
    }

    /// Current price of an asset: the live quote if positive, else its static price.
    pub fn current_price(&self, asset: &AssetDescriptor) -> Decimal {
        self.live_price(&asset.id).unwrap_or(asset.price_usd)
    }

    /// Resolve a price by asset id, falling back to the registry.
    ///
    /// Returns `None` only when the asset has neither a quote nor a registry entry.
    pub fn resolve(&self, asset_id: &str, registry: &AssetRegistry) -> Option<Decimal> {
        self.live_price(asset_id)
            .or_else(|| registry.get(asset_id).map(|a| a.price_usd))
    }

    /// A copy of `asset` carrying its current price.
    pub fn priced(&self, asset: &AssetDescriptor) -> AssetDescriptor {
        AssetDescriptor {
            price_usd: self.current_price(asset),
            ..asset.clone()
        }
    }

    /// All quotes ordered by asset id.
    pub fn snapshot(&self) -> Vec<(String, PriceQuote)> {
        let mut quotes: Vec<_> = self
            .quotes
            .iter()
            .map(|(id, q)| (id.clone(), q.clone()))
            .collect();
        quotes.sort_by(|a, b| a.0.cmp(&b.0));
        quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    fn live_price(&self, asset_id: &str) -> Option<Decimal> {
        self.quotes
            .get(asset_id)
            .map(|q| q.price)
            .filter(|p| *p > Decimal::ZERO)
    }
}
