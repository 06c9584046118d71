// Configuration for:
// - RPC endpoint URL and commitment
// - Database connection string
// - Server listening address/port
// - Bridge address, cutoff date and job pacing
// - Cache settings (size, TTL)

use chrono::{DateTime, Utc};
use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Bridge deposit address on Eclipse mainnet
pub const DEFAULT_BRIDGE_ADDRESS: &str = "br1xwubggTiEZ6b7iNZUwfA3psygFfaXGfZ1heaN9AW";

/// Historical boundary of the backfill
pub const DEFAULT_CUTOFF: &str = "2024-11-19T23:59:00Z";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub solana_rpc_url: String,
    pub solana_commitment_level: String,
    pub rpc_timeout_secs: u64,
    pub rpc_rate_limit: Option<u32>,
    pub bridge_address: String,
    pub cutoff: DateTime<Utc>,
    pub start_signature: Option<String>,
    pub page_limit: usize,
    pub worker_concurrency: usize,
    pub task_delay: Duration,
    pub page_retry_attempts: usize,
    pub page_retry_min_delay: Duration,
    pub page_retry_max_delay: Duration,
    pub run_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_max_capacity: u64,
}

/// Parameters of a single indexing run, detached from the environment
#[derive(Debug, Clone)]
pub struct IndexerSettings {
    pub bridge_address: String,
    pub cutoff: DateTime<Utc>,
    pub start_signature: Option<String>,
    pub page_limit: usize,
    pub concurrency: usize,
    pub task_delay: Duration,
    pub retry: RetrySettings,
}

/// Backoff policy for page fetches
#[derive(Debug, Clone, Copy)]
pub struct RetrySettings {
    /// Retries after the first attempt
    pub max_retries: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 4,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            bridge_address: DEFAULT_BRIDGE_ADDRESS.to_string(),
            cutoff: default_cutoff(),
            start_signature: None,
            page_limit: 1000,
            concurrency: 3,
            task_delay: Duration::from_millis(350),
            retry: RetrySettings::default(),
        }
    }
}

pub fn default_cutoff() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(DEFAULT_CUTOFF)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:bridge.db".to_string());
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env_or("SERVER_PORT", 8080);
        let solana_rpc_url = env::var("SOLANA_RPC_URL")
            .unwrap_or_else(|_| "https://eclipse.lgns.net".to_string());
        let solana_commitment_level = env::var("SOLANA_COMMITMENT_LEVEL")
            .unwrap_or_else(|_| "confirmed".to_string());
        let rpc_timeout_secs = env_or("RPC_TIMEOUT_SECS", 30);
        let rpc_rate_limit = env::var("RPC_RATE_LIMIT")
            .map(|v| v.parse().ok())
            .unwrap_or(None);

        let bridge_address = env::var("BRIDGE_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_BRIDGE_ADDRESS.to_string());
        let cutoff = env::var("BRIDGE_CUTOFF")
            .ok()
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(default_cutoff);
        let start_signature = env::var("BRIDGE_START_SIGNATURE")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let page_limit = env_or("PAGE_LIMIT", 1000usize).max(1);
        let worker_concurrency = env_or("WORKER_CONCURRENCY", 3usize).max(1);
        let task_delay = Duration::from_millis(env_or("TASK_DELAY_MS", 350));
        let page_retry_attempts = env_or("PAGE_RETRY_ATTEMPTS", 5usize).max(1);
        let page_retry_min_delay = Duration::from_millis(env_or("PAGE_RETRY_MIN_DELAY_MS", 500));
        let page_retry_max_delay =
            Duration::from_millis(env_or("PAGE_RETRY_MAX_DELAY_MS", 10_000));
        let run_timeout = Duration::from_secs(env_or("RUN_TIMEOUT_SECS", 60));

        let cache_ttl = Duration::from_secs(env_or("CACHE_TTL", 60));
        let cache_max_capacity = env_or("CACHE_MAX_CAPACITY", 1000);

        Self {
            database_url,
            server_host,
            server_port,
            solana_rpc_url,
            solana_commitment_level,
            rpc_timeout_secs,
            rpc_rate_limit,
            bridge_address,
            cutoff,
            start_signature,
            page_limit,
            worker_concurrency,
            task_delay,
            page_retry_attempts,
            page_retry_min_delay,
            page_retry_max_delay,
            run_timeout,
            cache_ttl,
            cache_max_capacity,
        }
    }

    pub fn indexer_settings(&self) -> IndexerSettings {
        IndexerSettings {
            bridge_address: self.bridge_address.clone(),
            cutoff: self.cutoff,
            start_signature: self.start_signature.clone(),
            page_limit: self.page_limit,
            concurrency: self.worker_concurrency,
            task_delay: self.task_delay,
            retry: RetrySettings {
                max_retries: self.page_retry_attempts.saturating_sub(1),
                min_delay: self.page_retry_min_delay,
                max_delay: self.page_retry_max_delay.max(self.page_retry_min_delay),
            },
        }
    }
}
