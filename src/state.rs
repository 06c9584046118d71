use crate::blockchain::BridgeIndexer;
use crate::cache::SummaryCache;
use crate::config::Config;
use crate::db::SqliteStore;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct AppState {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub indexer: Arc<BridgeIndexer>,
    pub cache: SummaryCache,
    /// Held for the duration of a triggered run
    pub run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<SqliteStore>, indexer: Arc<BridgeIndexer>) -> Self {
        let cache = SummaryCache::from_config(&config);
        Self {
            config,
            store,
            indexer,
            cache,
            run_lock: Mutex::new(()),
        }
    }
}
