pub mod client;
pub mod error;
pub mod ledger;
pub mod models;
pub mod paginator;
pub mod processor;
pub mod sync;
pub mod worker_pool;

// Re-exports for convenience
pub use client::{BridgeRpc, SolanaClient};
pub use error::IndexerError;
pub use sync::BridgeIndexer;
