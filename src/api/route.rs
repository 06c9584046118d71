use crate::{
    api::{
        error::ApiError,
        response::{ApiResponse, CronResponse},
    },
    models::WalletBridgeSummary,
    state::AppState,
    validation::validate_solana_address,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/cron", get(run_update))
        .route("/wallets/{wallet}/bridge", get(wallet_summary))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

// GET /cron handler
async fn run_update(State(state): State<Arc<AppState>>) -> Result<CronResponse, ApiError> {
    let _guard = state.run_lock.try_lock().map_err(|_| ApiError::Conflict)?;
    info!("Cron triggered incremental update");

    let shutdown = CancellationToken::new();
    let run = state.indexer.update_bridge_data(shutdown.clone());
    let report = match tokio::time::timeout(state.config.run_timeout, run).await {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => {
            error!("Incremental update failed: {}", e);
            return Err(e.into());
        }
        Err(_) => {
            shutdown.cancel();
            error!("Incremental update timed out after {:?}", state.config.run_timeout);
            return Err(ApiError::Timeout(state.config.run_timeout));
        }
    };

    if report.persisted > 0 {
        state.cache.invalidate_all();
    }

    Ok(CronResponse {
        success: true,
        report,
    })
}

// GET /wallets/{wallet}/bridge handler
async fn wallet_summary(
    State(state): State<Arc<AppState>>,
    Path(wallet): Path<String>,
) -> Result<ApiResponse<WalletBridgeSummary>, ApiError> {
    validate_solana_address(&wallet)?;

    if let Some(summary) = state.cache.get(&wallet).await {
        return Ok(ApiResponse { data: summary });
    }

    let summary = state
        .store
        .wallet_summary(&wallet)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No bridge transactions for {}", wallet)))?;

    state.cache.insert(summary.clone()).await;
    Ok(ApiResponse { data: summary })
}
