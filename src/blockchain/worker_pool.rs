use crate::blockchain::error::IndexerError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// What a finished task did with its transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Persisted,
    Skipped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub cancelled: usize,
}

/// Runs tasks with at most `concurrency` in flight, holding each slot for
/// `task_delay` after its task completes.
///
/// Slots are handed out in submission order. `enqueue` waits for a free slot,
/// so a producer can never run more than `concurrency` tasks ahead.
pub struct WorkQueue {
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<Result<TaskOutcome, IndexerError>>,
    task_delay: Duration,
    shutdown: CancellationToken,
    stats: QueueStats,
    fatal: Option<IndexerError>,
}

impl WorkQueue {
    pub fn new(concurrency: usize, task_delay: Duration, shutdown: CancellationToken) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            tasks: JoinSet::new(),
            task_delay,
            shutdown,
            stats: QueueStats::default(),
            fatal: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Schedule a task once a slot is free. Fails only if the queue was cancelled.
    pub async fn enqueue<F>(&mut self, task: F) -> Result<(), IndexerError>
    where
        F: Future<Output = Result<TaskOutcome, IndexerError>> + Send + 'static,
    {
        while let Some(result) = self.tasks.try_join_next() {
            self.record(result);
        }

        let permit = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Err(IndexerError::Cancelled),
            permit = self.semaphore.clone().acquire_owned() => {
                permit.map_err(|_| IndexerError::Cancelled)?
            }
        };

        let shutdown = self.shutdown.clone();
        let task_delay = self.task_delay;

        self.tasks.spawn(async move {
            let result = tokio::select! {
                _ = shutdown.cancelled() => Err(IndexerError::Cancelled),
                result = task => result,
            };

            match &result {
                Err(e) if e.is_fatal() => shutdown.cancel(),
                Err(IndexerError::Cancelled) => {}
                // Pacing for upstream rate limits
                _ => sleep(task_delay).await,
            }

            drop(permit);
            result
        });

        Ok(())
    }

    /// Wait for every queued task. Sibling failures never stop each other; a
    /// fatal failure or cancellation is returned after the queue is empty.
    pub async fn drain(mut self) -> Result<QueueStats, IndexerError> {
        while let Some(result) = self.tasks.join_next().await {
            self.record(result);
        }

        info!(
            "Work queue drained: {} persisted, {} skipped, {} failed, {} duplicates",
            self.stats.persisted, self.stats.skipped, self.stats.failed, self.stats.duplicates
        );

        if let Some(fatal) = self.fatal.take() {
            return Err(fatal);
        }
        if self.shutdown.is_cancelled() {
            return Err(IndexerError::Cancelled);
        }
        Ok(self.stats)
    }

    fn record(&mut self, result: Result<Result<TaskOutcome, IndexerError>, JoinError>) {
        match result {
            Ok(Ok(TaskOutcome::Persisted)) => self.stats.persisted += 1,
            Ok(Ok(TaskOutcome::Skipped)) => self.stats.skipped += 1,
            Ok(Err(IndexerError::Cancelled)) => self.stats.cancelled += 1,
            Ok(Err(e)) if e.is_duplicate_key() => {
                debug!("Ignoring duplicate key: {}", e);
                self.stats.duplicates += 1;
            }
            Ok(Err(e)) => {
                error!("Error processing transaction: {:?}", e);
                self.stats.failed += 1;
                if e.is_fatal() && self.fatal.is_none() {
                    self.fatal = Some(e);
                }
            }
            Err(e) => {
                error!("Worker task failed to complete: {}", e);
                self.stats.failed += 1;
            }
        }
    }
}
