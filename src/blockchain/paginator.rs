use crate::blockchain::client::{BridgeRpc, ClientError};
use crate::blockchain::models::SignatureInfo;
use crate::config::RetrySettings;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Walks an address's signature history backward, one page per `next_page`.
///
/// The walk ends when a page comes back empty, when a page is shorter than
/// `limit`, or when a page reaches past `cutoff`. In the last case only the
/// entries at or after the cutoff are returned.
pub struct SignaturePaginator<'a> {
    rpc: &'a dyn BridgeRpc,
    address: String,
    limit: usize,
    cursor: Option<String>,
    until: Option<String>,
    cutoff: DateTime<Utc>,
    retry: RetrySettings,
    exhausted: bool,
}

impl<'a> SignaturePaginator<'a> {
    pub fn new(
        rpc: &'a dyn BridgeRpc,
        address: impl Into<String>,
        limit: usize,
        cutoff: DateTime<Utc>,
    ) -> Self {
        Self {
            rpc,
            address: address.into(),
            limit: limit.max(1),
            cursor: None,
            until: None,
            cutoff,
            retry: RetrySettings::default(),
            exhausted: false,
        }
    }

    /// Start below this signature instead of at the newest one
    pub fn before(mut self, before: Option<String>) -> Self {
        self.cursor = before;
        self
    }

    /// Stop above this signature
    pub fn until(mut self, until: Option<String>) -> Self {
        self.until = until;
        self
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Oldest signature handed out so far
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub async fn next_page(&mut self) -> Result<Option<Vec<SignatureInfo>>, ClientError> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self.fetch_page().await?;
        if page.is_empty() {
            debug!("No more signatures for {}", self.address);
            self.exhausted = true;
            return Ok(None);
        }

        let cutoff_secs = self.cutoff.timestamp();
        let predates_cutoff =
            |sig: &SignatureInfo| sig.block_time.is_some_and(|t| t < cutoff_secs);

        if page.last().is_some_and(predates_cutoff) {
            info!("Reached cutoff {}, stopping", self.cutoff);
            self.exhausted = true;

            let valid: Vec<_> = page.into_iter().filter(|sig| !predates_cutoff(sig)).collect();
            if let Some(last) = valid.last() {
                self.cursor = Some(last.signature.clone());
            }
            return Ok(if valid.is_empty() { None } else { Some(valid) });
        }

        if page.len() < self.limit {
            info!("Exhausted signatures for {}", self.address);
            self.exhausted = true;
        }

        self.cursor = page.last().map(|sig| sig.signature.clone());
        Ok(Some(page))
    }

    async fn fetch_page(&self) -> Result<Vec<SignatureInfo>, ClientError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.retry.min_delay)
            .with_max_delay(self.retry.max_delay)
            .with_max_times(self.retry.max_retries);

        (|| async {
            self.rpc
                .get_signatures_for_address(
                    &self.address,
                    self.cursor.as_deref(),
                    self.until.as_deref(),
                    self.limit,
                )
                .await
        })
        .retry(backoff)
        // Malformed bounds will not fix themselves
        .when(|e| matches!(e, ClientError::RpcError(_)))
        .notify(|e, delay| warn!("Signature page fetch failed, retrying in {:?}: {}", delay, e))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::{signature_at, MockRpc};
    use std::time::Duration;

    fn cutoff() -> DateTime<Utc> {
        DateTime::from_timestamp(1_000, 0).unwrap()
    }

    fn fast_retry() -> RetrySettings {
        RetrySettings {
            max_retries: 2,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn walks_pages_backward_until_short_page() {
        // 5 signatures, newest first
        let history: Vec<_> = (0..5).map(|i| signature_at(&format!("s{}", i), 2_000 - i)).collect();
        let rpc = MockRpc::with_history(history);
        let mut paginator = SignaturePaginator::new(&rpc, "bridge", 2, cutoff());

        let mut seen = Vec::new();
        while let Some(page) = paginator.next_page().await.unwrap() {
            seen.push(page.iter().map(|s| s.signature.clone()).collect::<Vec<_>>());
        }

        assert_eq!(seen, vec![vec!["s0", "s1"], vec!["s2", "s3"], vec!["s4"]]);
        assert!(paginator.is_exhausted());
        assert_eq!(paginator.cursor(), Some("s4"));
        assert_eq!(rpc.signature_calls(), 3);
    }

    #[tokio::test]
    async fn empty_page_ends_walk() {
        let history: Vec<_> = (0..4).map(|i| signature_at(&format!("s{}", i), 2_000 - i)).collect();
        let rpc = MockRpc::with_history(history);
        let mut paginator = SignaturePaginator::new(&rpc, "bridge", 2, cutoff());

        assert_eq!(paginator.next_page().await.unwrap().unwrap().len(), 2);
        assert_eq!(paginator.next_page().await.unwrap().unwrap().len(), 2);
        assert!(!paginator.is_exhausted());
        assert!(paginator.next_page().await.unwrap().is_none());
        assert!(paginator.is_exhausted());
    }

    #[tokio::test]
    async fn cutoff_truncates_page_and_terminates() {
        let history = vec![
            signature_at("new", 1_500),
            signature_at("edge", 1_000),
            signature_at("old", 999),
            signature_at("older", 500),
        ];
        let rpc = MockRpc::with_history(history);
        let mut paginator = SignaturePaginator::new(&rpc, "bridge", 10, cutoff());

        let page = paginator.next_page().await.unwrap().unwrap();
        let names: Vec<_> = page.iter().map(|s| s.signature.as_str()).collect();
        assert_eq!(names, vec!["new", "edge"]);
        assert!(paginator.is_exhausted());
        assert!(paginator.next_page().await.unwrap().is_none());
        assert_eq!(rpc.signature_calls(), 1);
    }

    #[tokio::test]
    async fn page_entirely_before_cutoff_yields_nothing() {
        let history = vec![signature_at("old", 900), signature_at("older", 800)];
        let rpc = MockRpc::with_history(history);
        let mut paginator = SignaturePaginator::new(&rpc, "bridge", 10, cutoff());

        assert!(paginator.next_page().await.unwrap().is_none());
        assert!(paginator.is_exhausted());
    }

    #[tokio::test]
    async fn until_bound_is_exclusive() {
        let history: Vec<_> = (0..5).map(|i| signature_at(&format!("s{}", i), 2_000 - i)).collect();
        let rpc = MockRpc::with_history(history);
        let mut paginator =
            SignaturePaginator::new(&rpc, "bridge", 10, cutoff()).until(Some("s3".to_string()));

        let page = paginator.next_page().await.unwrap().unwrap();
        let names: Vec<_> = page.iter().map(|s| s.signature.as_str()).collect();
        assert_eq!(names, vec!["s0", "s1", "s2"]);
    }

    #[tokio::test]
    async fn resumes_strictly_below_starting_cursor() {
        let history: Vec<_> =
            (0..6).map(|i| signature_at(&format!("s{}", i), 2_000 - i)).collect();
        let rpc = MockRpc::with_history(history);
        let mut paginator = SignaturePaginator::new(&rpc, "bridge", 2, cutoff())
            .before(Some("s2".to_string()));
        assert_eq!(paginator.cursor(), Some("s2"));

        let mut seen = Vec::new();
        while let Some(page) = paginator.next_page().await.unwrap() {
            seen.extend(page.into_iter().map(|s| s.signature));
        }

        assert_eq!(seen, vec!["s3", "s4", "s5"]);
        assert_eq!(paginator.cursor(), Some("s5"));
    }

    #[tokio::test]
    async fn transient_page_failure_is_retried() {
        let history: Vec<_> = (0..3).map(|i| signature_at(&format!("s{}", i), 2_000 - i)).collect();
        let rpc = MockRpc::with_history(history);
        rpc.fail_signature_calls(1);
        let mut paginator =
            SignaturePaginator::new(&rpc, "bridge", 10, cutoff()).with_retry(fast_retry());

        let page = paginator.next_page().await.unwrap().unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(rpc.signature_calls(), 2);
    }

    #[tokio::test]
    async fn persistent_page_failure_surfaces() {
        let rpc = MockRpc::with_history(vec![signature_at("s0", 2_000)]);
        rpc.fail_signature_calls(10);
        let mut paginator =
            SignaturePaginator::new(&rpc, "bridge", 10, cutoff()).with_retry(fast_retry());

        assert!(paginator.next_page().await.is_err());
        // First attempt plus two retries
        assert_eq!(rpc.signature_calls(), 3);
    }
}
