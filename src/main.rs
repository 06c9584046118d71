use bridge_indexer::{
    api, blockchain::BridgeIndexer, config::Config, db, job, state::AppState, SolanaClient,
    SqliteStore,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    job::init_tracing();

    tracing::info!("Starting bridge-indexer");

    let config = Config::from_env();
    tracing::info!("Configuration loaded: {:?}", config);

    let pool = db::connection::establish_connection(&config.database_url).await?;
    let store = Arc::new(SqliteStore::new(pool));
    tracing::info!("Database connection established");

    let client = Arc::new(SolanaClient::new(&config));
    let indexer = Arc::new(BridgeIndexer::new(
        client,
        store.clone(),
        config.indexer_settings(),
    ));

    let app_state = Arc::new(AppState::new(config.clone(), store, indexer));
    tracing::info!(
        "Cache initialized with TTL: {:?} and capacity: {}",
        config.cache_ttl,
        config.cache_max_capacity
    );

    let app = api::create_router(app_state);
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
