//! File-backed store: the in-memory state snapshotted to one JSON document.
//!
//! Every mutation is applied to a copy of the state and written out while the
//! write lock is held. The copy replaces the live state only once the snapshot
//! is on disk, so memory and file never disagree after a failed write. Writes
//! go to a sibling temp file first and are renamed over the target.

use super::Store;
use super::memory::StoreState;
use crate::error::StoreError;
use crate::models::{
    ArticleCandidate, CandidateId, CandidateQuery, ExtractionResult, ExtractionStats,
    FailureRecord, FailureUpdate, StoredResult,
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl JsonStore {
    /// Open the store at `path`, starting empty when the file does not exist.
    #[instrument(level = "info", skip_all)]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let state = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<StoreState>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(io_error(&path, e)),
        };
        info!(
            path = %path.display(),
            candidates = state.candidates.len(),
            results = state.results.len(),
            failures = state.failures.len(),
            "Opened store"
        );
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    async fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
        let json = serde_json::to_vec(state)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, &json).await.map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;
        debug!(bytes = json.len(), "Persisted store snapshot");
        Ok(())
    }
}

impl Store for JsonStore {
    async fn insert_candidate(&self, candidate: ArticleCandidate) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        if !next.insert_candidate(candidate) {
            return Ok(false);
        }
        self.persist(&next).await?;
        *state = next;
        Ok(true)
    }

    async fn next_candidate_id(&self) -> Result<CandidateId, StoreError> {
        Ok(self.state.read().await.next_candidate_id())
    }

    async fn pending_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<ArticleCandidate>, StoreError> {
        Ok(self.state.read().await.pending_candidates(query))
    }

    async fn save_result(
        &self,
        candidate_id: CandidateId,
        result: ExtractionResult,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        if !next.save_result(candidate_id, result)? {
            return Ok(false);
        }
        self.persist(&next).await?;
        *state = next;
        Ok(true)
    }

    async fn result(&self, candidate_id: CandidateId) -> Result<Option<StoredResult>, StoreError> {
        Ok(self.state.read().await.results.get(&candidate_id).cloned())
    }

    async fn results(&self) -> Result<Vec<StoredResult>, StoreError> {
        Ok(self.state.read().await.results.values().cloned().collect())
    }

    async fn failure(
        &self,
        candidate_id: CandidateId,
    ) -> Result<Option<FailureRecord>, StoreError> {
        Ok(self.state.read().await.failures.get(&candidate_id).cloned())
    }

    async fn upsert_failure(&self, update: FailureUpdate) -> Result<FailureRecord, StoreError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let record = next.upsert_failure(update)?;
        self.persist(&next).await?;
        *state = next;
        Ok(record)
    }

    async fn statistics(&self) -> Result<ExtractionStats, StoreError> {
        Ok(self.state.read().await.statistics())
    }
}
