//! In-memory storage implementation for testing and development.

use super::Store;
use crate::error::StoreError;
use crate::models::{
    ArticleCandidate, CandidateId, CandidateQuery, ExtractionResult, ExtractionStats,
    FailureBreakdown, FailureRecord, FailureUpdate, StoredResult,
};
use chrono::Utc;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Everything a store holds, serializable as one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub candidates: BTreeMap<CandidateId, ArticleCandidate>,
    #[serde(default)]
    pub results: BTreeMap<CandidateId, StoredResult>,
    #[serde(default)]
    pub failures: BTreeMap<CandidateId, FailureRecord>,
}

impl StoreState {
    pub fn insert_candidate(&mut self, candidate: ArticleCandidate) -> bool {
        if self.candidates.contains_key(&candidate.id)
            || self.candidates.values().any(|c| c.url == candidate.url)
        {
            return false;
        }
        self.candidates.insert(candidate.id, candidate);
        true
    }

    pub fn next_candidate_id(&self) -> CandidateId {
        self.candidates.keys().next_back().map_or(1, |id| id + 1)
    }

    fn is_pending(&self, candidate: &ArticleCandidate, retry_ceiling: u32) -> bool {
        if self.results.contains_key(&candidate.id) {
            return false;
        }
        self.failures
            .get(&candidate.id)
            .is_none_or(|f| f.is_eligible(retry_ceiling))
    }

    pub fn pending_candidates(&self, query: &CandidateQuery) -> Vec<ArticleCandidate> {
        self.candidates
            .values()
            .filter(|c| self.is_pending(c, query.retry_ceiling) && query.matches(c))
            .sorted_by_key(|c| (Reverse(c.discovered_at), c.id))
            .take(query.limit)
            .cloned()
            .collect()
    }

    pub fn save_result(
        &mut self,
        candidate_id: CandidateId,
        result: ExtractionResult,
    ) -> Result<bool, StoreError> {
        if !self.candidates.contains_key(&candidate_id) {
            return Err(StoreError::UnknownCandidate(candidate_id));
        }
        if self.results.contains_key(&candidate_id) {
            return Ok(false);
        }
        self.results.insert(
            candidate_id,
            StoredResult {
                candidate_id,
                extracted_at: Utc::now(),
                result,
            },
        );
        self.failures.remove(&candidate_id);
        Ok(true)
    }

    pub fn upsert_failure(&mut self, update: FailureUpdate) -> Result<FailureRecord, StoreError> {
        if !self.candidates.contains_key(&update.candidate_id) {
            return Err(StoreError::UnknownCandidate(update.candidate_id));
        }
        let record = match self.failures.get_mut(&update.candidate_id) {
            Some(existing) => {
                existing.apply(update);
                existing.clone()
            }
            None => {
                let record = FailureRecord::first(update);
                self.failures.insert(record.candidate_id, record.clone());
                record
            }
        };
        Ok(record)
    }

    pub fn statistics(&self) -> ExtractionStats {
        let total = self.candidates.len();
        let processed = self
            .results
            .keys()
            .filter(|id| self.candidates.contains_key(id))
            .count();

        let failures = self
            .failures
            .values()
            .into_group_map_by(|f| f.error_kind)
            .into_iter()
            .map(|(error_kind, records)| FailureBreakdown {
                error_kind,
                count: records.len(),
                retryable_count: records.iter().filter(|f| f.should_retry).count(),
            })
            .sorted_by_key(|b| (Reverse(b.count), b.error_kind))
            .collect();

        ExtractionStats {
            total_candidates: total,
            processed,
            unprocessed: total - processed,
            success_rate_percent: ExtractionStats::success_rate(processed, total),
            failures,
        }
    }
}

/// In-memory store.
///
/// Not suitable for production as data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn insert_candidate(&self, candidate: ArticleCandidate) -> Result<bool, StoreError> {
        Ok(self.state.write().await.insert_candidate(candidate))
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
        self.state.write().await.save_result(candidate_id, result)
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
        self.state.write().await.upsert_failure(update)
    }

    async fn statistics(&self) -> Result<ExtractionStats, StoreError> {
        Ok(self.state.read().await.statistics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{RawExtraction, Strategy};
    use chrono::{DateTime, Duration};

    fn candidate(id: CandidateId, discovered_at: DateTime<Utc>) -> ArticleCandidate {
        ArticleCandidate {
            id,
            url: format!("https://news.example/{id}"),
            source: if id % 2 == 0 { "even" } else { "odd" }.to_string(),
            discovered_at,
        }
    }

    fn result(chars: usize) -> ExtractionResult {
        ExtractionResult::normalize(
            RawExtraction {
                full_text: "t".repeat(chars),
                ..RawExtraction::default()
            },
            "https://news.example/",
            Strategy::Structured,
        )
    }

    fn failure(id: CandidateId, kind: ErrorKind) -> FailureUpdate {
        FailureUpdate {
            candidate_id: id,
            url: format!("https://news.example/{id}"),
            error_kind: kind,
            error_message: "failed".to_string(),
            should_retry: kind.is_retryable(),
            at: Utc::now(),
        }
    }

    async fn seeded(n: u64) -> MemoryStore {
        let store = MemoryStore::new();
        let now = Utc::now();
        for id in 1..=n {
            store
                .insert_candidate(candidate(id, now - Duration::hours(id as i64)))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates() {
        let store = MemoryStore::new();
        let now = Utc::now();
        assert!(store.insert_candidate(candidate(1, now)).await.unwrap());
        assert!(!store.insert_candidate(candidate(1, now)).await.unwrap());
        let mut same_url = candidate(2, now);
        same_url.url = "https://news.example/1".to_string();
        assert!(!store.insert_candidate(same_url).await.unwrap());
        assert_eq!(store.next_candidate_id().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_pending_newest_first_with_limit() {
        let store = seeded(4).await;
        let pending = store
            .pending_candidates(&CandidateQuery::new(3, 5))
            .await
            .unwrap();
        assert_eq!(pending.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_ineligible_candidates_never_selected() {
        let store = seeded(4).await;
        store.save_result(1, result(200)).await.unwrap();
        store
            .upsert_failure(failure(2, ErrorKind::NotFound))
            .await
            .unwrap();
        for _ in 0..5 {
            store
                .upsert_failure(failure(3, ErrorKind::NetworkError))
                .await
                .unwrap();
        }
        store
            .upsert_failure(failure(4, ErrorKind::NetworkError))
            .await
            .unwrap();

        let pending = store
            .pending_candidates(&CandidateQuery::new(10, 5))
            .await
            .unwrap();
        assert_eq!(pending.iter().map(|c| c.id).collect::<Vec<_>>(), vec![4]);
    }

    #[tokio::test]
    async fn test_pending_filters_source_and_age() {
        let store = seeded(4).await;
        let even = store
            .pending_candidates(&CandidateQuery::new(10, 5).with_source("even"))
            .await
            .unwrap();
        assert_eq!(even.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 4]);

        let recent = store
            .pending_candidates(
                &CandidateQuery::new(10, 5).discovered_since(Utc::now() - Duration::minutes(150)),
            )
            .await
            .unwrap();
        assert_eq!(recent.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_save_result_clears_failure_and_rejects_duplicate() {
        let store = seeded(1).await;
        store
            .upsert_failure(failure(1, ErrorKind::NetworkError))
            .await
            .unwrap();
        assert!(store.save_result(1, result(300)).await.unwrap());
        assert!(store.failure(1).await.unwrap().is_none());
        assert!(!store.save_result(1, result(999)).await.unwrap());
        assert_eq!(store.result(1).await.unwrap().unwrap().result.text_len(), 300);
    }

    #[tokio::test]
    async fn test_unknown_candidate() {
        let store = MemoryStore::new();
        let err = store.save_result(42, result(200)).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownCandidate(42)));
        let err = store
            .upsert_failure(failure(42, ErrorKind::Unknown))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownCandidate(42)));
    }

    #[tokio::test]
    async fn test_upsert_keeps_first_url() {
        let store = seeded(1).await;
        store
            .upsert_failure(failure(1, ErrorKind::NetworkError))
            .await
            .unwrap();
        let mut second = failure(1, ErrorKind::InsufficientContent);
        second.url = "https://elsewhere.example/1".to_string();
        let record = store.upsert_failure(second).await.unwrap();
        assert_eq!(record.attempt_count, 2);
        assert_eq!(record.url, "https://news.example/1");
        assert_eq!(record.error_kind, ErrorKind::InsufficientContent);
    }

    #[tokio::test]
    async fn test_statistics() {
        let store = seeded(6).await;
        store.save_result(1, result(200)).await.unwrap();
        store
            .upsert_failure(failure(2, ErrorKind::NotFound))
            .await
            .unwrap();
        store
            .upsert_failure(failure(3, ErrorKind::NetworkError))
            .await
            .unwrap();
        store
            .upsert_failure(failure(4, ErrorKind::NetworkError))
            .await
            .unwrap();

        let stats = store.statistics().await.unwrap();
        assert_eq!(stats.total_candidates, 6);
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.unprocessed, 5);
        assert_eq!(stats.success_rate_percent, 16.67);
        assert_eq!(
            stats.failures,
            vec![
                FailureBreakdown {
                    error_kind: ErrorKind::NetworkError,
                    count: 2,
                    retryable_count: 2,
                },
                FailureBreakdown {
                    error_kind: ErrorKind::NotFound,
                    count: 1,
                    retryable_count: 0,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_statistics() {
        let stats = MemoryStore::new().statistics().await.unwrap();
        assert_eq!(stats.total_candidates, 0);
        assert_eq!(stats.success_rate_percent, 0.0);
        assert!(stats.failures.is_empty());
    }
}
