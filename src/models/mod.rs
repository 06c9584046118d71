// Persisted bridge rows, per-wallet aggregates and run reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bridge transfer, keyed by signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeTransaction {
    pub signature: String,
    pub bridge_wallet: String,
    pub created_at: DateTime<Utc>,
    pub bridged_amount_lamports: u64,
}

/// Running stats for one wallet within a single indexing run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletAggregate {
    pub earliest_date: DateTime<Utc>,
    pub txn_count: u64,
    pub bridged_amount_lamports: u64,
}

/// Per-wallet totals recomputed from stored rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBridgeSummary {
    pub wallet: String,
    pub txn_count: i64,
    pub bridged_amount_lamports: u64,
    pub earliest_date: DateTime<Utc>,
    pub latest_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Backfill,
    Incremental,
}

/// Outcome of one indexing run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub kind: RunKind,
    pub until: Option<String>,
    pub pages: usize,
    pub signatures_seen: usize,
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub wallets: usize,
    /// Oldest signature reached by the walk
    pub final_cursor: Option<String>,
    /// First (newest) signature seen by the walk
    pub newest_signature: Option<String>,
}

impl RunReport {
    pub fn new(kind: RunKind, until: Option<String>) -> Self {
        Self {
            kind,
            until,
            pages: 0,
            signatures_seen: 0,
            persisted: 0,
            skipped: 0,
            failed: 0,
            duplicates: 0,
            wallets: 0,
            final_cursor: None,
            newest_signature: None,
        }
    }
}
