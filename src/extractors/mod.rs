//! Extraction strategies for turning a page URL into article text.
//!
//! Each strategy follows the same two-phase pattern:
//!
//! 1. **Fetching**: download the page through the shared [`HttpFetcher`]
//! 2. **Parsing**: a pure function of `(html, page_url)` that produces a
//!    [`RawExtraction`], normalized into an [`ExtractionResult`]
//!
//! # Strategies
//!
//! | Strategy | Module | Method | Retried |
//! |----------|--------|--------|---------|
//! | Structured | [`structured`] | Readability-style scoring plus metadata | Yes |
//! | Fallback | [`fallback`] | Paragraphs of the likeliest content container | No |
//!
//! [`HttpFetcher`]: crate::fetch::HttpFetcher

pub mod fallback;
pub mod nlp;
pub mod structured;

use crate::error::ExtractError;
use crate::models::ExtractionResult;

pub use fallback::FallbackExtractor;
pub use structured::StructuredExtractor;

/// A single extraction strategy.
pub trait Extract {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn extract(&self, url: &str) -> Result<ExtractionResult, ExtractError>;
}

/// Reject results whose full text does not exceed `min_chars`.
pub fn ensure_sufficient(
    result: ExtractionResult,
    min_chars: usize,
) -> Result<ExtractionResult, ExtractError> {
    if result.has_sufficient_content(min_chars) {
        Ok(result)
    } else {
        Err(ExtractError::InsufficientContent {
            chars: result.text_len(),
            min: min_chars,
        })
    }
}
