use crate::blockchain::client::BridgeRpc;
use crate::blockchain::error::IndexerError;
use crate::blockchain::ledger::AggregationLedger;
use crate::blockchain::paginator::SignaturePaginator;
use crate::blockchain::processor::process_signature;
use crate::blockchain::worker_pool::WorkQueue;
use crate::config::IndexerSettings;
use crate::db::TransactionStore;
use crate::models::{RunKind, RunReport};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Indexes transfers into the bridge address.
///
/// Both entry points share one pipeline: paginator -> work queue ->
/// fetch/parse/persist per signature. Rows are upserted by signature, so a
/// crashed or timed out run is picked up by the next incremental run.
pub struct BridgeIndexer {
    rpc: Arc<dyn BridgeRpc>,
    store: Arc<dyn TransactionStore>,
    settings: IndexerSettings,
}

impl BridgeIndexer {
    pub fn new(
        rpc: Arc<dyn BridgeRpc>,
        store: Arc<dyn TransactionStore>,
        settings: IndexerSettings,
    ) -> Self {
        Self {
            rpc,
            store,
            settings,
        }
    }

    /// Walk from the newest signature back to the cutoff
    pub async fn backfill_bridge_data(
        &self,
        shutdown: CancellationToken,
    ) -> Result<RunReport, IndexerError> {
        info!("Starting initial backfill to {}...", self.settings.cutoff);
        self.store.health_check().await?;

        self.run(RunKind::Backfill, None, shutdown).await
    }

    /// Walk from the newest signature back to the newest one already stored
    pub async fn update_bridge_data(
        &self,
        shutdown: CancellationToken,
    ) -> Result<RunReport, IndexerError> {
        info!("Starting incremental update...");

        let until = match self.store.latest_signature().await? {
            Some(signature) => Some(signature),
            None => self.settings.start_signature.clone(),
        };
        info!("Starting from signature: {:?}", until);

        self.run(RunKind::Incremental, until, shutdown).await
    }

    async fn run(
        &self,
        kind: RunKind,
        until: Option<String>,
        shutdown: CancellationToken,
    ) -> Result<RunReport, IndexerError> {
        let settings = &self.settings;
        let ledger = Arc::new(AggregationLedger::new());
        let mut queue = WorkQueue::new(
            settings.concurrency,
            settings.task_delay,
            shutdown.child_token(),
        );
        let mut paginator = SignaturePaginator::new(
            self.rpc.as_ref(),
            settings.bridge_address.as_str(),
            settings.page_limit,
            settings.cutoff,
        )
        .until(until.clone())
        .with_retry(settings.retry);

        let mut report = RunReport::new(kind, until.clone());
        let mut page_error = None;

        'walk: loop {
            let page = match paginator.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(e) => {
                    error!("Giving up on signature pages after retries: {}", e);
                    page_error = Some(e);
                    break;
                }
            };

            report.pages += 1;
            if report.newest_signature.is_none() {
                report.newest_signature = page.first().map(|sig| sig.signature.clone());
            }

            for sig in page {
                // The boundary row is already stored
                if until.as_deref() == Some(sig.signature.as_str()) {
                    continue;
                }
                report.signatures_seen += 1;

                let task = process_signature(
                    self.rpc.clone(),
                    self.store.clone(),
                    ledger.clone(),
                    sig,
                );
                if queue.enqueue(task).await.is_err() {
                    break 'walk;
                }
            }

            debug!("Page {} queued, cursor at {:?}", report.pages, paginator.cursor());
        }

        report.final_cursor = paginator.cursor().map(str::to_string);

        let stats = queue.drain().await?;
        if let Some(e) = page_error {
            return Err(e.into());
        }

        report.persisted = stats.persisted;
        report.skipped = stats.skipped;
        report.failed = stats.failed;
        report.duplicates = stats.duplicates;
        report.wallets = ledger.len().await;
        for (wallet, aggregate) in ledger.snapshot().await {
            debug!(
                "Wallet {}: {} txns, {} lamports since {}",
                wallet,
                aggregate.txn_count,
                aggregate.bridged_amount_lamports,
                aggregate.earliest_date
            );
        }

        info!(
            "{:?} run completed: {} pages, {} signatures, {} persisted, {} wallets, \
             final cursor {:?}",
            kind,
            report.pages,
            report.signatures_seen,
            report.persisted,
            report.wallets,
            report.final_cursor
        );

        Ok(report)
    }
}
