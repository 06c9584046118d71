use crate::db::{StoreError, TransactionStore};
use crate::models::{BridgeTransaction, WalletBridgeSummary};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

fn to_datetime(secs: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| StoreError::InvalidRow(format!("timestamp out of range: {}", secs)))
}

fn to_lamports(value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::InvalidRow(format!("negative amount: {}", value)))
}

/// `bridge_transactions` table backed by a SQLite pool
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[cfg(test)]
    pub async fn get_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<BridgeTransaction>, StoreError> {
        let row = sqlx::query(
            "SELECT signature, bridge_wallet, created_at, bridged_amount_lamports
             FROM bridge_transactions WHERE signature = ?"
        )
        .bind(signature)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(BridgeTransaction {
                signature: row.get("signature"),
                bridge_wallet: row.get("bridge_wallet"),
                created_at: to_datetime(row.get("created_at"))?,
                bridged_amount_lamports: to_lamports(row.get("bridged_amount_lamports"))?,
            })
        })
        .transpose()
    }

    #[cfg(test)]
    pub async fn count_transactions(&self) -> Result<i64, StoreError> {
        let count = sqlx::query("SELECT COUNT(*) FROM bridge_transactions")
            .fetch_one(&self.pool)
            .await?
            .get::<i64, _>(0);

        Ok(count)
    }

    /// Totals for one wallet recomputed from every stored row
    pub async fn wallet_summary(
        &self,
        wallet: &str,
    ) -> Result<Option<WalletBridgeSummary>, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS txn_count,
                    COALESCE(SUM(bridged_amount_lamports), 0) AS total,
                    MIN(created_at) AS earliest,
                    MAX(created_at) AS latest
             FROM bridge_transactions WHERE bridge_wallet = ?"
        )
        .bind(wallet)
        .fetch_one(&self.pool)
        .await?;

        let txn_count: i64 = row.get("txn_count");
        if txn_count == 0 {
            return Ok(None);
        }

        let earliest: Option<i64> = row.get("earliest");
        let latest: Option<i64> = row.get("latest");

        Ok(Some(WalletBridgeSummary {
            wallet: wallet.to_string(),
            txn_count,
            bridged_amount_lamports: to_lamports(row.get("total"))?,
            earliest_date: to_datetime(earliest.unwrap_or_default())?,
            latest_date: to_datetime(latest.unwrap_or_default())?,
        }))
    }
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn upsert_transaction(&self, transaction: &BridgeTransaction) -> Result<(), StoreError> {
        let amount = i64::try_from(transaction.bridged_amount_lamports).map_err(|_| {
            StoreError::InvalidRow(format!(
                "amount too large: {}",
                transaction.bridged_amount_lamports
            ))
        })?;
        let created_at = transaction.created_at.timestamp();

        sqlx::query(
            r#"
            INSERT INTO bridge_transactions
            (signature, bridge_wallet, created_at, bridged_amount_lamports)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(signature) DO UPDATE SET
                bridge_wallet = excluded.bridge_wallet,
                created_at = excluded.created_at,
                bridged_amount_lamports = excluded.bridged_amount_lamports
            "#
        )
        .bind(&transaction.signature)
        .bind(&transaction.bridge_wallet)
        .bind(created_at)
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest_signature(&self) -> Result<Option<String>, StoreError> {
        let row = sqlx::query(
            "SELECT signature FROM bridge_transactions ORDER BY created_at DESC LIMIT 1"
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.get("signature")))
    }
}
