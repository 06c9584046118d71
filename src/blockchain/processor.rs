use crate::blockchain::client::BridgeRpc;
use crate::blockchain::error::IndexerError;
use crate::blockchain::ledger::AggregationLedger;
use crate::blockchain::models::{InstructionKind, ParsedTransaction, SignatureInfo};
use crate::blockchain::worker_pool::TaskOutcome;
use crate::db::TransactionStore;
use crate::models::BridgeTransaction;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A transfer into the bridge, attributed to its counterparty wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeTransfer {
    pub wallet: String,
    pub timestamp: DateTime<Utc>,
    pub lamports: u64,
}

/// Why a transaction was not attributed to any wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TooFewAccounts,
    NoBridgeAmount,
    MissingBlockTime,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewAccounts => write!(f, "too few accounts"),
            Self::NoBridgeAmount => write!(f, "no bridge amount found"),
            Self::MissingBlockTime => write!(f, "no block time"),
        }
    }
}

/// Account creation inserts the new account at index 1, pushing the
/// counterparty to index 2.
fn counterparty_index(tx: &ParsedTransaction) -> usize {
    match tx.instructions.first() {
        Some(InstructionKind::CreateAccount) => 2,
        _ => 1,
    }
}

fn sum_lamports<'a>(instructions: impl Iterator<Item = &'a InstructionKind>) -> u64 {
    instructions
        .filter_map(InstructionKind::transfer_lamports)
        .fold(0u64, u64::saturating_add)
}

/// Sum of system transfers. A present nested list, even an empty one, is the
/// only source summed; top-level instructions count only when it is absent.
pub fn sum_transfers(tx: &ParsedTransaction) -> u64 {
    match &tx.inner_instructions {
        Some(sets) => sum_lamports(sets.iter().flatten()),
        None => sum_lamports(tx.instructions.iter()),
    }
}

pub fn parse_bridge_transfer(
    sig: &SignatureInfo,
    tx: &ParsedTransaction,
) -> Result<BridgeTransfer, SkipReason> {
    if tx.account_keys.len() <= 2 {
        return Err(SkipReason::TooFewAccounts);
    }

    let wallet = tx.account_keys[counterparty_index(tx)].clone();

    let lamports = sum_transfers(tx);
    if lamports == 0 {
        return Err(SkipReason::NoBridgeAmount);
    }

    let timestamp = sig
        .block_time
        .or(tx.block_time)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or(SkipReason::MissingBlockTime)?;

    Ok(BridgeTransfer {
        wallet,
        timestamp,
        lamports,
    })
}

/// Fetch, parse, record and persist one signature
pub async fn process_signature(
    rpc: Arc<dyn BridgeRpc>,
    store: Arc<dyn TransactionStore>,
    ledger: Arc<AggregationLedger>,
    sig: SignatureInfo,
) -> Result<TaskOutcome, IndexerError> {
    let tx = match rpc.get_parsed_transaction(&sig.signature).await? {
        Some(tx) => tx,
        None => {
            warn!("Skipping transaction {} - unreadable transaction", sig.signature);
            return Ok(TaskOutcome::Skipped);
        }
    };

    let transfer = match parse_bridge_transfer(&sig, &tx) {
        Ok(transfer) => transfer,
        Err(reason) => {
            info!("Skipping transaction {} - {}", sig.signature, reason);
            return Ok(TaskOutcome::Skipped);
        }
    };

    ledger
        .observe(&transfer.wallet, transfer.timestamp, transfer.lamports)
        .await;

    let row = BridgeTransaction {
        signature: sig.signature,
        bridge_wallet: transfer.wallet,
        created_at: transfer.timestamp,
        bridged_amount_lamports: transfer.lamports,
    };
    store.upsert_transaction(&row).await?;

    info!("Processed: {} Bridge Wallet: {}", row.signature, row.bridge_wallet);
    debug!("Bridged {} lamports at {}", row.bridged_amount_lamports, row.created_at);

    Ok(TaskOutcome::Persisted)
}
