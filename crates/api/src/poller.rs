use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use sdai_engine::prices::{PriceBook, PriceFeed};

/// Periodically refreshes the shared price book from a feed.
pub struct PricePoller {
    feed: Box<dyn PriceFeed>,
    prices: Arc<RwLock<PriceBook>>,
    poll_interval: Duration,
}

impl PricePoller {
    pub fn new(
        feed: Box<dyn PriceFeed>,
        prices: Arc<RwLock<PriceBook>>,
        poll_interval_ms: u64,
    ) -> Self {
        Self {
            feed,
            prices,
            poll_interval: Duration::from_millis(poll_interval_ms),
        }
    }

    /// Fetch once and apply the quotes. Returns how many quotes were applied.
    ///
    /// A failed fetch leaves the book untouched; lookups keep using the
    /// previous quotes or the static prices.
    pub async fn refresh(&self) -> anyhow::Result<usize> {
        let quotes = self.feed.fetch(Utc::now())?;
        let applied = self.prices.write().await.apply(quotes);
        tracing::debug!(feed = self.feed.name(), quotes = applied, "Prices refreshed");
        Ok(applied)
    }

    /// Start the polling loop. Runs indefinitely until the task is cancelled.
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(
            feed = self.feed.name(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Price poller started"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh().await {
                tracing::warn!(
                    feed = self.feed.name(),
                    error = %e,
                    "Price refresh failed, keeping last known prices"
                );
            }
        }
    }
}
