//! Retry controller driving one candidate URL through the strategy chain.
//!
//! The controller is an explicit state machine:
//!
//! ```text
//! Initial ──(permanently failed)──────────────────────────► PermanentFailure
//!    │
//!    ▼
//! Resolving ──(redirect unresolved)───────────────────────► PermanentFailure
//!    │
//!    ▼
//! RateLimiting
//!    │
//!    ▼
//! Attempting(n) ──(ok)───────────────────────────────────► Success
//!    │  ├──(404/410)─────────────────────────────────────► PermanentFailure
//!    │  └──(other, n < last)── sleep 2^n s ──► Attempting(n+1)
//!    ▼ (other, n == last)
//! ExhaustedFallback ──(ok)───────────────────────────────► Success
//!                   └──(err)─────────────────────────────► Failed
//! ```
//!
//! # Retry Strategy
//!
//! - The structured extractor runs up to `max_retries` times (3 by default)
//! - Backoff doubles from one second and never follows the final attempt
//! - The fallback runs exactly once and is never retried

use crate::error::{ErrorKind, ExtractError};
use crate::extractors::Extract;
use crate::models::ExtractionResult;
use crate::resolver::Resolve;
use crate::state::PipelineState;
use crate::utils::truncate_for_log;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// States of a single extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    Initial,
    Resolving,
    RateLimiting { url: String },
    Attempting { url: String, attempt: u32 },
    ExhaustedFallback { url: String },
}

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    Success(ExtractionResult),
    /// Retrying cannot plausibly help (404/410, unresolved redirect, known dead URL).
    PermanentFailure(ExtractError),
    /// Every strategy was tried and failed.
    Failed(ExtractError),
}

/// Terminal outcome plus bookkeeping about how it was reached.
#[derive(Debug)]
pub struct AttemptReport {
    pub outcome: Outcome,
    /// Structured extractor invocations made.
    pub attempts: u32,
    pub fallback_invoked: bool,
    /// Total time spent in backoff sleeps.
    pub backoff: Duration,
}

impl AttemptReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// The classified failure, if the run failed.
    pub fn error(&self) -> Option<&ExtractError> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::PermanentFailure(e) | Outcome::Failed(e) => Some(e),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(ExtractError::kind)
    }
}

/// Drives the resolver, rate limiter and strategy chain for one URL.
pub struct RetryController<R, P, F> {
    resolver: R,
    primary: P,
    fallback: F,
    state: Arc<PipelineState>,
    max_retries: u32,
    base_delay: Duration,
}

impl<R, P, F> RetryController<R, P, F>
where
    R: Resolve,
    P: Extract,
    F: Extract,
{
    /// # Arguments
    ///
    /// * `max_retries` - structured extractor attempts (3 recommended)
    /// * `base_delay` - first backoff delay (1 second recommended)
    pub fn new(
        resolver: R,
        primary: P,
        fallback: F,
        state: Arc<PipelineState>,
        max_retries: u32,
        base_delay: Duration,
    ) -> Self {
        Self {
            resolver,
            primary,
            fallback,
            state,
            max_retries: max_retries.max(1),
            base_delay,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Backoff before attempt `attempt + 1`: `base_delay * 2^attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1 << attempt.min(16))
    }

    /// Run one candidate URL to a terminal outcome.
    #[instrument(level = "info", skip(self, url), fields(url = %truncate_for_log(url, 80)))]
    pub async fn run(&self, url: &str) -> AttemptReport {
        let t0 = Instant::now();
        let mut attempts = 0u32;
        let mut backoff = Duration::ZERO;
        let mut fallback_invoked = false;
        let mut state = AttemptState::Initial;

        let outcome = loop {
            state = match state {
                AttemptState::Initial => {
                    if self.state.is_permanently_failed(url) {
                        info!("Skipping permanently failed URL");
                        break Outcome::PermanentFailure(ExtractError::PermanentlyFailed {
                            url: url.to_string(),
                        });
                    }
                    AttemptState::Resolving
                }

                AttemptState::Resolving => match self.resolver.resolve(url).await {
                    Ok(resolved) => AttemptState::RateLimiting { url: resolved },
                    Err(e) => {
                        warn!(error = %e, "Could not resolve indirection link");
                        break Outcome::PermanentFailure(e);
                    }
                },

                AttemptState::RateLimiting { url: target } => {
                    self.state.limiter.acquire(&target).await;
                    AttemptState::Attempting {
                        url: target,
                        attempt: 0,
                    }
                }

                AttemptState::Attempting {
                    url: target,
                    attempt,
                } => {
                    if attempt > 0 {
                        info!(
                            attempt = attempt + 1,
                            max = self.max_retries,
                            "Retrying structured extraction"
                        );
                    }
                    attempts += 1;
                    match self.primary.extract(&target).await {
                        Ok(result) => {
                            info!(
                                chars = result.text_len(),
                                strategy = self.primary.name(),
                                attempts,
                                "Extraction succeeded"
                            );
                            break Outcome::Success(result);
                        }
                        Err(e) if e.is_not_found() => {
                            warn!(error = %e, "Permanent failure (404/410)");
                            self.state.mark_permanently_failed(url);
                            break Outcome::PermanentFailure(e);
                        }
                        Err(e) => {
                            error!(
                                attempt = attempt + 1,
                                max = self.max_retries,
                                kind = %e.kind(),
                                error = %truncate_for_log(&e.to_string(), 100),
                                "Structured extraction attempt failed"
                            );
                            if attempt + 1 < self.max_retries {
                                let delay = self.backoff_delay(attempt);
                                backoff += delay;
                                sleep(delay).await;
                                AttemptState::Attempting {
                                    url: target,
                                    attempt: attempt + 1,
                                }
                            } else {
                                AttemptState::ExhaustedFallback { url: target }
                            }
                        }
                    }
                }

                AttemptState::ExhaustedFallback { url: target } => {
                    info!(strategy = self.fallback.name(), "Trying fallback extraction");
                    fallback_invoked = true;
                    match self.fallback.extract(&target).await {
                        Ok(result) => {
                            info!(
                                chars = result.text_len(),
                                strategy = self.fallback.name(),
                                "Extraction succeeded"
                            );
                            break Outcome::Success(result);
                        }
                        Err(e) => {
                            error!(
                                kind = %e.kind(),
                                error = %truncate_for_log(&e.to_string(), 100),
                                "Fallback extraction also failed"
                            );
                            if e.is_not_found() {
                                self.state.mark_permanently_failed(url);
                            }
                            break Outcome::Failed(e);
                        }
                    }
                }
            };
        };

        let report = AttemptReport {
            outcome,
            attempts,
            fallback_invoked,
            backoff,
        };
        info!(
            attempts,
            fallback_invoked,
            elapsed_ms_total = t0.elapsed().as_millis() as u64,
            success = report.is_success(),
            error_kind = ?report.error_kind(),
            "Extraction run finished"
        );
        report
    }
}
