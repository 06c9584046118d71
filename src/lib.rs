pub mod api;
pub mod blockchain;
pub mod cache;
pub mod config;
pub mod db;
pub mod job;
pub mod models;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod tests;

pub use api::{create_router, ApiError};
pub use blockchain::{BridgeIndexer, BridgeRpc, IndexerError, SolanaClient};
pub use config::Config;
pub use db::{connection, migration, SqliteStore, TransactionStore};
pub use models::{BridgeTransaction, RunReport, WalletBridgeSummary};
pub use validation::validate_solana_address;
