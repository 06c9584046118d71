pub mod connection;
pub mod migration;
pub mod transaction;

use crate::models::BridgeTransaction;
use async_trait::async_trait;
use thiserror::Error;

pub use transaction::SqliteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    #[error("Query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

impl StoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey(_))
    }

    /// The store cannot be reached at all, so no later write will succeed either
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let duplicate = match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Some(db_err.message().to_string())
            }
            _ => None,
        };
        if let Some(message) = duplicate {
            return StoreError::DuplicateKey(message);
        }

        let unavailable = matches!(
            err,
            sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::Configuration(_)
        );
        if unavailable {
            StoreError::Unavailable(err)
        } else {
            StoreError::Query(err)
        }
    }
}

/// Keyed upsert store for bridge transactions
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Verify the store is reachable before a run starts
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Insert or overwrite the row for `transaction.signature`
    async fn upsert_transaction(&self, transaction: &BridgeTransaction) -> Result<(), StoreError>;

    /// Signature of the newest stored row by `created_at`
    async fn latest_signature(&self) -> Result<Option<String>, StoreError>;
}
