use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS bridge_transactions (
            signature TEXT PRIMARY KEY,
            bridge_wallet TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            bridged_amount_lamports INTEGER NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    // Incremental runs look up the newest row
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_bridge_transactions_created_at
         ON bridge_transactions(created_at)"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_bridge_transactions_wallet
         ON bridge_transactions(bridge_wallet, created_at)"
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
