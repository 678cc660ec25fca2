//! Batch selection and the continuous processing loop.
//!
//! One orchestrator owns the retry controller and failure tracker for the
//! lifetime of the process. Candidates are processed sequentially; shutdown
//! is checked between candidates and raced against every loop sleep, so a
//! candidate in flight always finishes its write.

use crate::config::{MAX_DAY_WINDOW, PipelineConfig};
use crate::error::{ConfigError, ErrorKind, StoreError};
use crate::extractors::Extract;
use crate::models::{ArticleCandidate, CandidateQuery, ExtractionStats};
use crate::resolver::Resolve;
use crate::retry::{Outcome, RetryController};
use crate::store::Store;
use crate::tracker::FailureTracker;
use crate::utils::truncate_for_log;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub selected: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Selected but no longer eligible when their turn came.
    pub skipped: usize,
}

pub struct Orchestrator<S, R, P, F> {
    store: Arc<S>,
    controller: RetryController<R, P, F>,
    tracker: FailureTracker<S>,
    config: PipelineConfig,
    shutdown: watch::Receiver<bool>,
}

impl<S, R, P, F> Orchestrator<S, R, P, F>
where
    S: Store,
    R: Resolve,
    P: Extract,
    F: Extract,
{
    pub fn new(
        store: Arc<S>,
        controller: RetryController<R, P, F>,
        config: PipelineConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let tracker = FailureTracker::new(store.clone(), config.retry_ceiling);
        Self {
            store,
            controller,
            tracker,
            config,
            shutdown,
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Query for a batch of `limit` candidates, optionally restricted to
    /// the last `days` days and one source.
    ///
    /// `days` must lie in `1..=MAX_DAY_WINDOW`.
    pub fn query(
        &self,
        limit: usize,
        days: Option<i64>,
        source: Option<&str>,
    ) -> Result<CandidateQuery, ConfigError> {
        let mut query = CandidateQuery::new(limit, self.config.retry_ceiling);
        if let Some(days) = days {
            let since = Some(days)
                .filter(|d| (1..=MAX_DAY_WINDOW).contains(d))
                .and_then(ChronoDuration::try_days)
                .and_then(|window| Utc::now().checked_sub_signed(window))
                .ok_or_else(|| {
                    ConfigError::Invalid(format!("days must be between 1 and {MAX_DAY_WINDOW}"))
                })?;
            query = query.discovered_since(since);
        }
        if let Some(source) = source {
            query = query.with_source(source);
        }
        Ok(query)
    }

    /// Candidates a batch would process, without touching the network.
    #[instrument(level = "info", skip_all)]
    pub async fn plan_batch(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<ArticleCandidate>, StoreError> {
        let pending = self.store.pending_candidates(query).await?;
        info!(count = pending.len(), limit = query.limit, "Planned batch (dry run)");
        Ok(pending)
    }

    /// Process one batch of pending candidates.
    #[instrument(level = "info", skip_all, fields(limit = query.limit))]
    pub async fn run_batch(&self, query: &CandidateQuery) -> Result<BatchReport, StoreError> {
        let t0 = Instant::now();
        let pending = self.store.pending_candidates(query).await?;
        let mut report = BatchReport {
            selected: pending.len(),
            ..BatchReport::default()
        };
        if pending.is_empty() {
            info!("No candidates to process");
            return Ok(report);
        }
        info!(count = pending.len(), "Processing batch");

        for candidate in pending {
            if self.shutdown_requested() {
                warn!(
                    remaining = report.selected - report.processed - report.skipped,
                    "Shutdown requested, stopping batch"
                );
                break;
            }
            if !self.tracker.is_eligible_for_retry(candidate.id).await? {
                debug!(id = candidate.id, "Candidate no longer eligible, skipping");
                report.skipped += 1;
                continue;
            }
            if self.process_candidate(&candidate).await? {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
            report.processed += 1;
        }

        info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            elapsed_ms_total = t0.elapsed().as_millis() as u64,
            "Batch complete"
        );
        Ok(report)
    }

    /// Run the controller for one candidate and persist the outcome.
    #[instrument(level = "info", skip_all, fields(id = candidate.id, source = %candidate.source))]
    async fn process_candidate(&self, candidate: &ArticleCandidate) -> Result<bool, StoreError> {
        info!(url = %truncate_for_log(&candidate.url, 80), "Extracting candidate");
        let run = self.controller.run(&candidate.url).await;

        let (kind, message) = match run.outcome {
            Outcome::Success(result)
                if result.has_sufficient_content(self.config.min_content_chars) =>
            {
                if !self.store.save_result(candidate.id, result).await? {
                    warn!("Result already stored, keeping the existing one");
                }
                return Ok(true);
            }
            Outcome::Success(result) => (
                ErrorKind::InsufficientContent,
                format!(
                    "insufficient content extracted ({} chars, need more than {})",
                    result.text_len(),
                    self.config.min_content_chars
                ),
            ),
            Outcome::PermanentFailure(e) | Outcome::Failed(e) => (e.kind(), e.to_string()),
        };

        self.tracker
            .record_failure(candidate.id, &candidate.url, kind, &message)
            .await?;
        Ok(false)
    }

    /// Log aggregate statistics and the most common failure kinds.
    #[instrument(level = "info", skip_all)]
    pub async fn report_statistics(&self) -> Result<ExtractionStats, StoreError> {
        let stats = self.store.statistics().await?;
        info!(
            total = stats.total_candidates,
            processed = stats.processed,
            unprocessed = stats.unprocessed,
            success_rate_percent = stats.success_rate_percent,
            permanently_failed_urls = self.controller.state().permanently_failed_count(),
            "Extraction statistics"
        );
        for breakdown in stats.failures.iter().take(5) {
            info!(
                kind = %breakdown.error_kind,
                count = breakdown.count,
                retryable = breakdown.retryable_count,
                "Failure breakdown"
            );
        }
        Ok(stats)
    }

    /// Sleep for `duration` unless shutdown arrives first.
    ///
    /// Returns `true` when shutdown interrupted the sleep.
    async fn sleep_or_shutdown(&self, duration: Duration) -> bool {
        let mut rx = self.shutdown.clone();
        tokio::select! {
            _ = sleep(duration) => false,
            Ok(_) = rx.wait_for(|stop| *stop) => true,
        }
    }

    /// Process batches until shutdown. Never returns an error; batch-level
    /// failures are logged and followed by a cooldown.
    #[instrument(level = "info", skip(self))]
    pub async fn run_continuously(&self, batch_size: usize) -> u64 {
        let stats_every = self.config.stats_every_cycles.max(1);
        let mut cycle = 0u64;
        info!(
            interval_secs = self.config.base_interval_secs,
            "Starting continuous extraction"
        );

        while !self.shutdown_requested() {
            cycle += 1;
            let query = CandidateQuery::new(batch_size, self.config.retry_ceiling);

            let pause = match self.run_batch(&query).await {
                Ok(report) => {
                    if cycle % stats_every == 0 || report.succeeded == 0 {
                        if let Err(e) = self.report_statistics().await {
                            error!(error = %e, "Failed to compute statistics");
                        }
                    }
                    if report.succeeded == 0 {
                        self.config.idle_interval()
                    } else {
                        self.config.base_interval()
                    }
                }
                Err(e) => {
                    error!(cycle, error = %e, "Batch failed");
                    self.config.error_cooldown()
                }
            };

            info!(cycle, sleep_secs = pause.as_secs(), "Sleeping until next batch");
            if self.sleep_or_shutdown(pause).await {
                break;
            }
        }

        info!(cycles = cycle, "Continuous extraction stopped");
        cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::models::{ExtractionResult, FailureRecord, FailureUpdate, Strategy, StoredResult};
    use crate::retry::testing::*;
    use crate::state::PipelineState;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type TestOrchestrator<'a, S> =
        Orchestrator<S, &'a StubResolver, &'a ScriptedExtractor, &'a ScriptedExtractor>;

    fn orchestrator<'a>(
        store: Arc<MemoryStore>,
        resolver: &'a StubResolver,
        primary: &'a ScriptedExtractor,
        fallback: &'a ScriptedExtractor,
        shutdown: watch::Receiver<bool>,
    ) -> TestOrchestrator<'a, MemoryStore> {
        let config = PipelineConfig::default();
        orchestrator_with(config, store, resolver, primary, fallback, shutdown)
    }

    fn orchestrator_with<'a, S: Store>(
        config: PipelineConfig,
        store: Arc<S>,
        resolver: &'a StubResolver,
        primary: &'a ScriptedExtractor,
        fallback: &'a ScriptedExtractor,
        shutdown: watch::Receiver<bool>,
    ) -> TestOrchestrator<'a, S> {
        let controller = RetryController::new(
            resolver,
            primary,
            fallback,
            Arc::new(PipelineState::new(config.min_interval())),
            config.max_retries,
            Duration::from_secs(1),
        );
        Orchestrator::new(store, controller, config, shutdown)
    }

    async fn seed<S: Store>(store: &S, urls: &[(u64, &str)]) {
        let now = Utc::now();
        for (i, (id, url)) in urls.iter().enumerate() {
            store
                .insert_candidate(ArticleCandidate {
                    id: *id,
                    url: url.to_string(),
                    source: "wire".to_string(),
                    discovered_at: now - ChronoDuration::minutes(i as i64),
                })
                .await
                .unwrap();
        }
    }

    async fn store_with(urls: &[(u64, &str)]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        seed(store.as_ref(), urls).await;
        store
    }

    /// Memory store that counts selections and statistics reads. It can fail
    /// every selection, or replay a fixed selection taken earlier.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        fail_selection: bool,
        stale_selection: Option<Vec<ArticleCandidate>>,
        selections: AtomicUsize,
        statistics_reads: AtomicUsize,
    }

    impl Store for CountingStore {
        async fn insert_candidate(&self, candidate: ArticleCandidate) -> Result<bool, StoreError> {
            self.inner.insert_candidate(candidate).await
        }

        async fn next_candidate_id(&self) -> Result<u64, StoreError> {
            self.inner.next_candidate_id().await
        }

        async fn pending_candidates(
            &self,
            query: &CandidateQuery,
        ) -> Result<Vec<ArticleCandidate>, StoreError> {
            self.selections.fetch_add(1, Ordering::SeqCst);
            if self.fail_selection {
                return Err(StoreError::Io {
                    path: "store.json".to_string(),
                    source: std::io::Error::other("disk unavailable"),
                });
            }
            if let Some(stale) = &self.stale_selection {
                return Ok(stale.clone());
            }
            self.inner.pending_candidates(query).await
        }

        async fn save_result(
            &self,
            candidate_id: u64,
            result: ExtractionResult,
        ) -> Result<bool, StoreError> {
            self.inner.save_result(candidate_id, result).await
        }

        async fn result(&self, candidate_id: u64) -> Result<Option<StoredResult>, StoreError> {
            self.inner.result(candidate_id).await
        }

        async fn results(&self) -> Result<Vec<StoredResult>, StoreError> {
            self.inner.results().await
        }

        async fn failure(&self, candidate_id: u64) -> Result<Option<FailureRecord>, StoreError> {
            self.inner.failure(candidate_id).await
        }

        async fn upsert_failure(&self, update: FailureUpdate) -> Result<FailureRecord, StoreError> {
            self.inner.upsert_failure(update).await
        }

        async fn statistics(&self) -> Result<ExtractionStats, StoreError> {
            self.statistics_reads.fetch_add(1, Ordering::SeqCst);
            self.inner.statistics().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_then_success() {
        let url = "https://news.example/one";
        let store = store_with(&[(1, url)]).await;
        let resolver = StubResolver::passthrough();
        let primary = ScriptedExtractor::new(
            "structured",
            vec![
                Err(network_error(url)),
                Err(network_error(url)),
                Ok(article(480, Strategy::Structured)),
            ],
        );
        let fallback = ScriptedExtractor::new("fallback", vec![]);
        let (_tx, rx) = watch::channel(false);
        let orch = orchestrator(store.clone(), &resolver, &primary, &fallback, rx);

        let report = orch.run_batch(&orch.query(5, None, None).unwrap()).await.unwrap();
        assert_eq!(report.succeeded, 1);
        assert_eq!(primary.calls(), 3);
        assert!(store.failure(1).await.unwrap().is_none());
        assert_eq!(store.result(1).await.unwrap().unwrap().result.text_len(), 480);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_records_permanent_failure() {
        let url = "https://news.example/two";
        let store = store_with(&[(2, url)]).await;
        let resolver = StubResolver::passthrough();
        let primary = ScriptedExtractor::new("structured", vec![Err(http_status(url, 404))]);
        let fallback = ScriptedExtractor::new("fallback", vec![]);
        let (_tx, rx) = watch::channel(false);
        let orch = orchestrator(store.clone(), &resolver, &primary, &fallback, rx);

        let report = orch.run_batch(&orch.query(5, None, None).unwrap()).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(fallback.calls(), 0);
        let failure = store.failure(2).await.unwrap().unwrap();
        assert_eq!(failure.error_kind, ErrorKind::NotFound);
        assert!(!failure.should_retry);
        assert_eq!(failure.attempt_count, 1);

        // Never selected again.
        let next = orch.run_batch(&orch.query(5, None, None).unwrap()).await.unwrap();
        assert_eq!(next.selected, 0);
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_redirect_records_failure() {
        let url = "https://news.google.com/rss/articles/CBMiabc";
        let store = store_with(&[(3, url)]).await;
        let resolver = StubResolver::unresolved();
        let primary = ScriptedExtractor::new("structured", vec![]);
        let fallback = ScriptedExtractor::new("fallback", vec![]);
        let (_tx, rx) = watch::channel(false);
        let orch = orchestrator(store.clone(), &resolver, &primary, &fallback, rx);

        orch.run_batch(&orch.query(5, None, None).unwrap()).await.unwrap();
        assert_eq!(primary.calls(), 0);
        let failure = store.failure(3).await.unwrap().unwrap();
        assert_eq!(failure.error_kind, ErrorKind::RedirectUnresolved);
        assert!(!failure.should_retry);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_result_is_never_persisted() {
        let url = "https://news.example/short";
        let store = store_with(&[(4, url)]).await;
        let resolver = StubResolver::passthrough();
        // A strategy that skips its own threshold check.
        let primary =
            ScriptedExtractor::new("structured", vec![Ok(article(100, Strategy::Structured))]);
        let fallback = ScriptedExtractor::new("fallback", vec![]);
        let (_tx, rx) = watch::channel(false);
        let orch = orchestrator(store.clone(), &resolver, &primary, &fallback, rx);

        let report = orch.run_batch(&orch.query(5, None, None).unwrap()).await.unwrap();
        assert_eq!(report.succeeded, 0);
        assert!(store.result(4).await.unwrap().is_none());
        let failure = store.failure(4).await.unwrap().unwrap();
        assert_eq!(failure.error_kind, ErrorKind::InsufficientContent);
        assert!(failure.should_retry);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_candidates_are_skipped() {
        let url = "https://news.example/flaky";
        let store = store_with(&[(5, url)]).await;
        let resolver = StubResolver::passthrough();
        let primary = ScriptedExtractor::new("structured", vec![Err(network_error(url))]);
        let fallback = ScriptedExtractor::new(
            "fallback",
            vec![Err(ExtractError::Network {
                url: url.to_string(),
                message: "reset".to_string(),
            })],
        );
        let (_tx, rx) = watch::channel(false);
        let orch = orchestrator(store.clone(), &resolver, &primary, &fallback, rx);

        for _ in 0..5 {
            let report = orch.run_batch(&orch.query(5, None, None).unwrap()).await.unwrap();
            assert_eq!(report.selected, 1);
        }
        let failure = store.failure(5).await.unwrap().unwrap();
        assert_eq!(failure.attempt_count, 5);
        assert!(failure.should_retry);
        assert_eq!(orch.run_batch(&orch.query(5, None, None).unwrap()).await.unwrap().selected, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_touches_nothing() {
        let store =
            store_with(&[(1, "https://news.example/a"), (2, "https://news.example/b")]).await;
        let resolver = StubResolver::passthrough();
        let primary = ScriptedExtractor::new("structured", vec![]);
        let fallback = ScriptedExtractor::new("fallback", vec![]);
        let (_tx, rx) = watch::channel(false);
        let orch = orchestrator(store.clone(), &resolver, &primary, &fallback, rx);

        let query = orch.query(1, Some(7), Some("wire")).unwrap();
        let plan = orch.plan_batch(&query).await.unwrap();
        assert_eq!(plan.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(primary.calls(), 0);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_between_candidates() {
        let store =
            store_with(&[(1, "https://news.example/a"), (2, "https://news.example/b")]).await;
        let resolver = StubResolver::passthrough();
        let primary =
            ScriptedExtractor::new("structured", vec![Ok(article(300, Strategy::Structured))]);
        let fallback = ScriptedExtractor::new("fallback", vec![]);
        let (tx, rx) = watch::channel(false);
        let orch = orchestrator(store.clone(), &resolver, &primary, &fallback, rx);

        tx.send(true).unwrap();
        let report = orch.run_batch(&orch.query(5, None, None).unwrap()).await.unwrap();
        assert_eq!(report.selected, 2);
        assert_eq!(report.processed, 0);
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_continuously_until_shutdown() {
        let store = store_with(&[(1, "https://news.example/a")]).await;
        let resolver = StubResolver::passthrough();
        let primary =
            ScriptedExtractor::new("structured", vec![Ok(article(300, Strategy::Structured))]);
        let fallback = ScriptedExtractor::new("fallback", vec![]);
        let (tx, rx) = watch::channel(false);
        let orch = orchestrator(store.clone(), &resolver, &primary, &fallback, rx);

        let stopper = async {
            // First cycle succeeds and sleeps 300s; the second is idle and
            // sleeps 60s. Stop during the second sleep.
            sleep(Duration::from_secs(330)).await;
            tx.send(true).unwrap();
        };
        let (cycles, ()) = tokio::join!(orch.run_continuously(5), stopper);
        assert_eq!(cycles, 2);
        assert!(store.result(1).await.unwrap().is_some());
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_batch_waits_error_cooldown() {
        let store = Arc::new(CountingStore {
            fail_selection: true,
            ..CountingStore::default()
        });
        let resolver = StubResolver::passthrough();
        let primary = ScriptedExtractor::new("structured", vec![]);
        let fallback = ScriptedExtractor::new("fallback", vec![]);
        let (tx, rx) = watch::channel(false);
        let config = PipelineConfig {
            error_cooldown_secs: 45,
            ..PipelineConfig::default()
        };
        let orch = orchestrator_with(config, store.clone(), &resolver, &primary, &fallback, rx);

        let stopper = async {
            // Batches at 0s, 45s, 90s and 135s; stop while the fourth cools down.
            sleep(Duration::from_secs(150)).await;
            tx.send(true).unwrap();
        };
        let (cycles, ()) = tokio::join!(orch.run_continuously(5), stopper);
        assert_eq!(cycles, 4);
        assert_eq!(store.selections.load(Ordering::SeqCst), 4);
        assert_eq!(store.statistics_reads.load(Ordering::SeqCst), 0);
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_statistics_cadence() {
        let store = Arc::new(CountingStore::default());
        seed(
            store.as_ref(),
            &[
                (1, "https://a.example/story"),
                (2, "https://b.example/story"),
                (3, "https://c.example/story"),
                (4, "https://d.example/story"),
            ],
        )
        .await;
        let resolver = StubResolver::passthrough();
        let primary = ScriptedExtractor::new(
            "structured",
            (0..4).map(|_| Ok(article(300, Strategy::Structured))).collect(),
        );
        let fallback = ScriptedExtractor::new("fallback", vec![]);
        let (tx, rx) = watch::channel(false);
        let config = PipelineConfig {
            stats_every_cycles: 3,
            ..PipelineConfig::default()
        };
        let orch = orchestrator_with(config, store.clone(), &resolver, &primary, &fallback, rx);

        let stopper = async {
            // Cycles 1-4 each store one result and sleep 300s. Cycles 5 and 6
            // find nothing and sleep 60s, so they start at 1200s and 1260s.
            sleep(Duration::from_secs(1290)).await;
            tx.send(true).unwrap();
        };
        let (cycles, ()) = tokio::join!(orch.run_continuously(1), stopper);
        assert_eq!(cycles, 6);
        assert_eq!(primary.calls(), 4);
        assert_eq!(store.results().await.unwrap().len(), 4);
        // Cycle 3 by cadence, cycles 5 and 6 because they had no success.
        assert_eq!(store.statistics_reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_selection_skips_ineligible_candidates() {
        let inner = MemoryStore::new();
        seed(&inner, &[(1, "https://a.example/gone"), (2, "https://b.example/live")]).await;
        let stale = inner
            .pending_candidates(&CandidateQuery::new(5, 5))
            .await
            .unwrap();
        // Candidate 1 turned into a dead link after the selection was read.
        inner
            .upsert_failure(FailureUpdate {
                candidate_id: 1,
                url: "https://a.example/gone".to_string(),
                error_kind: ErrorKind::NotFound,
                error_message: "HTTP 404".to_string(),
                should_retry: false,
                at: Utc::now(),
            })
            .await
            .unwrap();
        let store = Arc::new(CountingStore {
            inner,
            stale_selection: Some(stale),
            ..CountingStore::default()
        });
        let resolver = StubResolver::passthrough();
        let primary =
            ScriptedExtractor::new("structured", vec![Ok(article(300, Strategy::Structured))]);
        let fallback = ScriptedExtractor::new("fallback", vec![]);
        let (_tx, rx) = watch::channel(false);
        let orch = orchestrator_with(
            PipelineConfig::default(),
            store.clone(),
            &resolver,
            &primary,
            &fallback,
            rx,
        );

        let report = orch.run_batch(&orch.query(5, None, None).unwrap()).await.unwrap();
        assert_eq!(report.selected, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(primary.calls(), 1);
        assert_eq!(*primary.urls.lock().unwrap(), vec!["https://b.example/live".to_string()]);
        assert_eq!(store.failure(1).await.unwrap().unwrap().attempt_count, 1);
    }

    #[tokio::test]
    async fn test_query_rejects_out_of_range_days() {
        let store = store_with(&[]).await;
        let resolver = StubResolver::passthrough();
        let primary = ScriptedExtractor::new("structured", vec![]);
        let fallback = ScriptedExtractor::new("fallback", vec![]);
        let (_tx, rx) = watch::channel(false);
        let orch = orchestrator(store, &resolver, &primary, &fallback, rx);

        for days in [0, -1, MAX_DAY_WINDOW + 1, i64::MAX, i64::MIN] {
            let err = orch.query(5, Some(days), None).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{days}");
        }
        let query = orch.query(5, Some(MAX_DAY_WINDOW), None).unwrap();
        assert!(query.discovered_since.is_some());
    }
}
