//! Persistent failure bookkeeping.
//!
//! Each non-success outcome produces or updates exactly one [`FailureRecord`]
//! per candidate. Retryability is derived from the error kind, and the store
//! applies the update atomically so concurrent recorders never lose a count.

use crate::error::{ErrorKind, StoreError};
use crate::models::{CandidateId, FailureRecord, FailureUpdate, MAX_ERROR_MESSAGE_CHARS};
use crate::store::Store;
use crate::utils::truncate_chars;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct FailureTracker<S> {
    store: Arc<S>,
    retry_ceiling: u32,
}

impl<S: Store> FailureTracker<S> {
    pub fn new(store: Arc<S>, retry_ceiling: u32) -> Self {
        Self {
            store,
            retry_ceiling,
        }
    }

    /// Record one failed attempt for a candidate.
    #[instrument(level = "info", skip(self, url, message))]
    pub async fn record_failure(
        &self,
        candidate_id: CandidateId,
        url: &str,
        kind: ErrorKind,
        message: &str,
    ) -> Result<FailureRecord, StoreError> {
        let update = FailureUpdate {
            candidate_id,
            url: url.to_string(),
            error_kind: kind,
            error_message: truncate_chars(message, MAX_ERROR_MESSAGE_CHARS),
            should_retry: kind.is_retryable(),
            at: Utc::now(),
        };
        let record = self.store.upsert_failure(update).await?;

        if record.is_eligible(self.retry_ceiling) {
            info!(
                attempt_count = record.attempt_count,
                kind = %record.error_kind,
                "Recorded failure"
            );
        } else {
            warn!(
                attempt_count = record.attempt_count,
                kind = %record.error_kind,
                should_retry = record.should_retry,
                "Candidate will not be retried"
            );
        }
        Ok(record)
    }

    /// Whether the candidate may be processed again. Candidates with no
    /// failure history are always eligible.
    pub async fn is_eligible_for_retry(
        &self,
        candidate_id: CandidateId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .store
            .failure(candidate_id)
            .await?
            .is_none_or(|f| f.is_eligible(self.retry_ceiling)))
    }
}
