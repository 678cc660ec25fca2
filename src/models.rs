//! Data models for extraction candidates, results and failure bookkeeping.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`ArticleCandidate`]: a discovered URL waiting for extraction
//! - [`ExtractionResult`]: normalized article text and metadata
//! - [`FailureRecord`]: persisted failure history for one candidate
//! - [`ExtractionStats`]: aggregate numbers for operational monitoring

use crate::error::ErrorKind;
use crate::utils::{absolutize_url, truncate_chars};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned to a candidate by the upstream producer.
pub type CandidateId = u64;

/// Maximum number of secondary image URLs kept per result.
pub const MAX_IMAGES: usize = 5;
/// Maximum number of keywords kept per result.
pub const MAX_KEYWORDS: usize = 10;
/// Maximum stored size of the cleaned text, in characters.
pub const MAX_CLEANED_CHARS: usize = 5000;
/// Maximum stored size of the summary, in characters.
pub const MAX_SUMMARY_CHARS: usize = 500;
/// Maximum stored size of a failure message, in characters.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// A discovered article URL awaiting content extraction.
///
/// Candidates are produced by feed discovery and are read-only to the
/// pipeline. A candidate leaves the pending set once it has a result, or
/// once its failure record makes it ineligible for retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleCandidate {
    pub id: CandidateId,
    pub url: String,
    /// Label of the feed that discovered the URL (e.g. `"reuters"`).
    pub source: String,
    pub discovered_at: DateTime<Utc>,
}

/// Which strategy in the chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Structured,
    Fallback,
}

/// Strategy output before normalization.
///
/// Extractors fill this in whatever shape their parsing produced; image URLs
/// may still be relative and lists may be arbitrarily long.
#[derive(Debug, Clone, Default)]
pub struct RawExtraction {
    pub title: Option<String>,
    pub full_text: String,
    pub authors: Vec<String>,
    pub top_image: Option<String>,
    pub images: Vec<String>,
    pub keywords: Vec<String>,
    pub summary: String,
}

/// Normalized article content, identical in shape for every strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: Option<String>,
    pub full_text: String,
    /// Full text with blank lines removed, capped at [`MAX_CLEANED_CHARS`].
    pub cleaned_text: String,
    pub authors: Vec<String>,
    pub top_image: Option<String>,
    /// Absolute secondary image URLs, at most [`MAX_IMAGES`].
    pub images: Vec<String>,
    /// At most [`MAX_KEYWORDS`] keywords.
    pub keywords: Vec<String>,
    /// Short summary, capped at [`MAX_SUMMARY_CHARS`].
    pub summary: String,
    pub strategy: Strategy,
}

impl ExtractionResult {
    /// Normalize raw strategy output against the page URL it came from.
    ///
    /// Image URLs are made absolute (non-http schemes are dropped), lists are
    /// deduplicated and capped, and the text fields are bounded. The summary
    /// falls back to the head of the text when the strategy produced none.
    pub fn normalize(raw: RawExtraction, page_url: &str, strategy: Strategy) -> Self {
        let full_text = raw.full_text.trim().to_string();
        let cleaned = full_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .join("\n");

        let top_image = raw
            .top_image
            .as_deref()
            .and_then(|src| absolutize_url(page_url, src));
        let images = raw
            .images
            .iter()
            .filter_map(|src| absolutize_url(page_url, src))
            .unique()
            .take(MAX_IMAGES)
            .collect::<Vec<_>>();

        let authors = raw
            .authors
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unique_by(|a| a.to_lowercase())
            .collect();
        let keywords = raw
            .keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .unique()
            .take(MAX_KEYWORDS)
            .collect();

        let summary = if raw.summary.trim().is_empty() {
            truncate_chars(&full_text, MAX_SUMMARY_CHARS)
        } else {
            truncate_chars(raw.summary.trim(), MAX_SUMMARY_CHARS)
        };

        Self {
            title: raw
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            cleaned_text: truncate_chars(&cleaned, MAX_CLEANED_CHARS),
            full_text,
            authors,
            top_image: top_image.or_else(|| images.first().cloned()),
            images,
            keywords,
            summary,
            strategy,
        }
    }

    /// Length of the full text in characters.
    pub fn text_len(&self) -> usize {
        self.full_text.chars().count()
    }

    /// A result is only valid when its text is longer than `min_chars`.
    pub fn has_sufficient_content(&self, min_chars: usize) -> bool {
        self.text_len() > min_chars
    }
}

/// A persisted result, addressable by candidate id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub candidate_id: CandidateId,
    pub extracted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: ExtractionResult,
}

/// Persisted failure history for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub candidate_id: CandidateId,
    pub url: String,
    pub error_kind: ErrorKind,
    pub error_message: String,
    pub attempt_count: u32,
    pub last_attempt: DateTime<Utc>,
    pub should_retry: bool,
}

/// One observed failure, applied to a [`FailureRecord`] by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureUpdate {
    pub candidate_id: CandidateId,
    pub url: String,
    pub error_kind: ErrorKind,
    pub error_message: String,
    pub should_retry: bool,
    pub at: DateTime<Utc>,
}

impl FailureRecord {
    /// First failure for a candidate.
    pub fn first(update: FailureUpdate) -> Self {
        Self {
            candidate_id: update.candidate_id,
            url: update.url,
            error_kind: update.error_kind,
            error_message: update.error_message,
            attempt_count: 1,
            last_attempt: update.at,
            should_retry: update.should_retry,
        }
    }

    /// Fold a repeated failure into this record.
    ///
    /// The attempt count only ever grows; kind, message, timestamp and the
    /// retry flag are overwritten with the latest observation. The URL keeps
    /// its first recorded value.
    pub fn apply(&mut self, update: FailureUpdate) {
        self.attempt_count = self.attempt_count.saturating_add(1);
        self.error_kind = update.error_kind;
        self.error_message = update.error_message;
        self.last_attempt = update.at;
        self.should_retry = update.should_retry;
    }

    /// Whether the candidate may be selected for another batch.
    pub fn is_eligible(&self, retry_ceiling: u32) -> bool {
        self.should_retry && self.attempt_count < retry_ceiling
    }
}

/// Selection criteria for a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    pub limit: usize,
    pub retry_ceiling: u32,
    /// Only candidates discovered at or after this instant.
    pub discovered_since: Option<DateTime<Utc>>,
    /// Only candidates from this source label.
    pub source: Option<String>,
}

impl CandidateQuery {
    pub fn new(limit: usize, retry_ceiling: u32) -> Self {
        Self {
            limit,
            retry_ceiling,
            discovered_since: None,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn discovered_since(mut self, since: DateTime<Utc>) -> Self {
        self.discovered_since = Some(since);
        self
    }

    /// Filter applied on top of the "no result, still eligible" join.
    pub fn matches(&self, candidate: &ArticleCandidate) -> bool {
        if let Some(since) = self.discovered_since {
            if candidate.discovered_at < since {
                return false;
            }
        }
        match &self.source {
            Some(source) => candidate.source == *source,
            None => true,
        }
    }
}

/// Failure counts for one error kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureBreakdown {
    pub error_kind: ErrorKind,
    pub count: usize,
    pub retryable_count: usize,
}

/// Aggregate extraction statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_candidates: usize,
    pub processed: usize,
    pub unprocessed: usize,
    pub success_rate_percent: f64,
    /// Sorted by count, largest first.
    pub failures: Vec<FailureBreakdown>,
}

impl ExtractionStats {
    /// Success rate rounded to two decimals; zero for an empty store.
    pub fn success_rate(processed: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        (processed as f64 / total as f64 * 10_000.0).round() / 100.0
    }
}
