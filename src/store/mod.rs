//! Persistence boundary for candidates, results and failure records.
//!
//! The pipeline only talks to the [`Store`] trait. Two implementations ship:
//!
//! - [`MemoryStore`]: process-local, used by tests and dry runs
//! - [`JsonStore`]: the same state snapshotted to a JSON file after every
//!   mutation, so the queue survives restarts
//!
//! Both keep their bookkeeping in [`memory::StoreState`], which owns the selection
//! and aggregation rules.

pub mod json;
pub mod memory;

use crate::error::StoreError;
use crate::models::{
    ArticleCandidate, CandidateId, CandidateQuery, ExtractionResult, ExtractionStats,
    FailureRecord, FailureUpdate, StoredResult,
};

pub use json::JsonStore;
pub use memory::MemoryStore;

/// Storage operations the pipeline depends on.
pub trait Store {
    /// Add a candidate. Returns `false` when its id or URL is already known.
    async fn insert_candidate(&self, candidate: ArticleCandidate) -> Result<bool, StoreError>;

    /// Id to assign to the next new candidate.
    async fn next_candidate_id(&self) -> Result<CandidateId, StoreError>;

    /// Candidates with no result whose failure state still allows a retry,
    /// newest first.
    async fn pending_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<ArticleCandidate>, StoreError>;

    /// Persist a result and clear the candidate's failure record.
    ///
    /// Returns `false` without overwriting when a result already exists.
    async fn save_result(
        &self,
        candidate_id: CandidateId,
        result: ExtractionResult,
    ) -> Result<bool, StoreError>;

    async fn result(&self, candidate_id: CandidateId) -> Result<Option<StoredResult>, StoreError>;

    /// All stored results, ordered by candidate id.
    async fn results(&self) -> Result<Vec<StoredResult>, StoreError>;

    async fn failure(&self, candidate_id: CandidateId)
    -> Result<Option<FailureRecord>, StoreError>;

    /// Create or update the failure record in one step.
    async fn upsert_failure(&self, update: FailureUpdate) -> Result<FailureRecord, StoreError>;

    async fn statistics(&self) -> Result<ExtractionStats, StoreError>;
}
