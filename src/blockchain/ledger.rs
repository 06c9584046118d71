use crate::models::WalletAggregate;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Per-wallet running totals for the current run.
///
/// Advisory only: the stored rows are the source of truth, this map exists
/// for logging and sanity checks and is dropped with the run.
#[derive(Default)]
pub struct AggregationLedger {
    wallets: Mutex<HashMap<String, WalletAggregate>>,
}

impl AggregationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn observe(&self, wallet: &str, timestamp: DateTime<Utc>, amount: u64) {
        let mut wallets = self.wallets.lock().await;
        wallets
            .entry(wallet.to_string())
            .and_modify(|entry| {
                entry.earliest_date = entry.earliest_date.min(timestamp);
                entry.txn_count += 1;
                entry.bridged_amount_lamports =
                    entry.bridged_amount_lamports.saturating_add(amount);
            })
            .or_insert(WalletAggregate {
                earliest_date: timestamp,
                txn_count: 1,
                bridged_amount_lamports: amount,
            });
    }

    pub async fn get(&self, wallet: &str) -> Option<WalletAggregate> {
        self.wallets.lock().await.get(wallet).cloned()
    }

    pub async fn len(&self) -> usize {
        self.wallets.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.wallets.lock().await.is_empty()
    }

    pub async fn snapshot(&self) -> HashMap<String, WalletAggregate> {
        self.wallets.lock().await.clone()
    }
}
