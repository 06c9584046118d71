//! Shared startup for the one-shot binaries and the server

use crate::blockchain::{BridgeIndexer, SolanaClient};
use crate::config::Config;
use crate::db::{connection::establish_connection, SqliteStore};
use crate::models::RunKind;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log to stdout, filtered by `RUST_LOG` (default `info`)
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run one backfill or incremental update against the configured endpoint.
/// Ctrl-C cancels the run.
pub async fn run_job(kind: RunKind) -> ExitCode {
    init_tracing();

    let config = Config::from_env();
    let pool = match establish_connection(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to {}: {}", config.database_url, e);
            return ExitCode::FAILURE;
        }
    };

    let indexer = BridgeIndexer::new(
        Arc::new(SolanaClient::new(&config)),
        Arc::new(SqliteStore::new(pool)),
        config.indexer_settings(),
    );

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            ctrl_c.cancel();
        }
    });

    let result = match kind {
        RunKind::Backfill => indexer.backfill_bridge_data(shutdown).await,
        RunKind::Incremental => indexer.update_bridge_data(shutdown).await,
    };

    match result {
        Ok(report) => {
            info!("{:?} run succeeded: {:?}", kind, report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:?} run failed: {}", kind, e);
            ExitCode::FAILURE
        }
    }
}
