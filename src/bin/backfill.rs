use bridge_indexer::{job::run_job, models::RunKind};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    run_job(RunKind::Backfill).await
}
