//! Wallet summary cache using Moka

use crate::{config::Config, models::WalletBridgeSummary};
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

/// Caches per-wallet summaries keyed by wallet address
#[derive(Clone)]
pub struct SummaryCache {
    cache: Cache<String, WalletBridgeSummary>,
}

impl SummaryCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_max_capacity, config.cache_ttl)
    }

    pub async fn get(&self, wallet: &str) -> Option<WalletBridgeSummary> {
        let result = self.cache.get(wallet).await;
        if result.is_some() {
            debug!("Cache hit for wallet: {}", wallet);
        } else {
            debug!("Cache miss for wallet: {}", wallet);
        }
        result
    }

    pub async fn insert(&self, summary: WalletBridgeSummary) {
        self.cache.insert(summary.wallet.clone(), summary).await;
    }

    /// Drop every cached summary after new rows were written
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
        debug!("Invalidated wallet summary cache");
    }
}
