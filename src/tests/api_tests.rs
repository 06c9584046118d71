use crate::api::create_router;
use crate::blockchain::models::InstructionKind::SystemTransfer;
use crate::blockchain::BridgeIndexer;
use crate::config::{Config, IndexerSettings, RetrySettings};
use crate::db::{connection::establish_in_memory, SqliteStore, TransactionStore};
use crate::models::BridgeTransaction;
use crate::state::AppState;
use crate::tests::mocks::{signature_at, transaction, MockRpc};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::DateTime;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn wallet(seed: u8) -> String {
    bs58::encode([seed; 32]).into_string()
}

fn settings() -> IndexerSettings {
    IndexerSettings {
        bridge_address: "bridge".to_string(),
        cutoff: DateTime::from_timestamp(1_000, 0).unwrap(),
        start_signature: None,
        page_limit: 10,
        concurrency: 3,
        task_delay: Duration::from_millis(1),
        retry: RetrySettings {
            max_retries: 0,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        },
    }
}

fn rpc_with_two_transfers() -> MockRpc {
    let rpc = MockRpc::with_history(vec![
        signature_at("sig-1", 1_800),
        signature_at("sig-2", 1_700),
    ]);
    let alice = wallet(1);
    for (sig, lamports) in [("sig-1", 40), ("sig-2", 2)] {
        rpc.insert_transaction(
            sig,
            transaction(
                &["payer", alice.as_str(), "bridge"],
                vec![SystemTransfer { lamports }],
                None,
            ),
        );
    }
    rpc
}

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    store: Arc<SqliteStore>,
}

async fn setup(rpc: MockRpc, settings: IndexerSettings, run_timeout: Duration) -> TestApp {
    let pool = establish_in_memory().await.unwrap();
    let store = Arc::new(SqliteStore::new(pool));
    let indexer = Arc::new(BridgeIndexer::new(Arc::new(rpc), store.clone(), settings));

    let mut config = Config::from_env();
    config.run_timeout = run_timeout;
    config.cache_ttl = Duration::from_secs(60);

    let state = Arc::new(AppState::new(config, store.clone(), indexer));
    TestApp {
        router: create_router(state.clone()),
        state,
        store,
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn cron_runs_incremental_update() {
    let app = setup(rpc_with_two_transfers(), settings(), Duration::from_secs(5)).await;

    let (status, body) = get(&app.router, "/cron").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["report"]["kind"], "incremental");
    assert_eq!(body["report"]["persisted"], 2);
    assert_eq!(app.store.count_transactions().await.unwrap(), 2);
    assert_eq!(app.store.latest_signature().await.unwrap().as_deref(), Some("sig-1"));
}

#[tokio::test]
async fn cron_rejects_overlapping_runs() {
    let app = setup(rpc_with_two_transfers(), settings(), Duration::from_secs(5)).await;
    let _running = app.state.run_lock.lock().await;

    let (status, body) = get(&app.router, "/cron").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn cron_reports_failed_run() {
    let rpc = rpc_with_two_transfers();
    rpc.fail_signature_calls(100);
    let app = setup(rpc, settings(), Duration::from_secs(5)).await;

    let (status, body) = get(&app.router, "/cron").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert_eq!(app.store.count_transactions().await.unwrap(), 0);
}

#[tokio::test]
async fn cron_gives_up_after_run_timeout() {
    let mut slow = settings();
    slow.task_delay = Duration::from_secs(5);
    let app = setup(rpc_with_two_transfers(), slow, Duration::from_millis(50)).await;

    let (status, body) = get(&app.router, "/cron").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("timed out"));
    // The lock is released once the handler returns
    assert!(app.state.run_lock.try_lock().is_ok());
}

#[tokio::test]
async fn wallet_summary_is_served_and_cached() {
    let app = setup(MockRpc::default(), settings(), Duration::from_secs(5)).await;
    let alice = wallet(1);
    let row = |signature: &str, secs: i64, lamports: u64| BridgeTransaction {
        signature: signature.to_string(),
        bridge_wallet: alice.clone(),
        created_at: DateTime::from_timestamp(secs, 0).unwrap(),
        bridged_amount_lamports: lamports,
    };
    app.store.upsert_transaction(&row("a", 1_500, 10)).await.unwrap();
    app.store.upsert_transaction(&row("b", 1_200, 5)).await.unwrap();

    let uri = format!("/wallets/{}/bridge", alice);
    let (status, body) = get(&app.router, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["wallet"], alice.as_str());
    assert_eq!(body["data"]["txn_count"], 2);
    assert_eq!(body["data"]["bridged_amount_lamports"], 15);

    // Served from cache until the entry expires or a run invalidates it
    app.store.upsert_transaction(&row("c", 1_600, 100)).await.unwrap();
    let (_, cached) = get(&app.router, &uri).await;
    assert_eq!(cached["data"]["txn_count"], 2);

    app.state.cache.invalidate_all();
    let (_, fresh) = get(&app.router, &uri).await;
    assert_eq!(fresh["data"]["txn_count"], 3);
}

#[tokio::test]
async fn wallet_summary_rejects_unknown_and_malformed_wallets() {
    let app = setup(MockRpc::default(), settings(), Duration::from_secs(5)).await;

    let (status, _) = get(&app.router, &format!("/wallets/{}/bridge", wallet(9))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&app.router, "/wallets/not-a-key/bridge").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid blockchain address format");
}
