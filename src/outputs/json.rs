//! JSON export of stored results for downstream consumers.
//!
//! # Output Structure
//!
//! ```text
//! {
//!   "exported_at": "2025-05-06T12:00:00Z",
//!   "count": 2,
//!   "articles": [ { "candidate_id": 1, "title": ..., "full_text": ... }, ... ]
//! }
//! ```
//!
//! Articles are ordered by candidate id.

use crate::models::StoredResult;
use crate::utils::ensure_writable_dir;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

#[derive(Debug, Serialize)]
pub struct ResultsExport<'a> {
    pub exported_at: DateTime<Utc>,
    pub count: usize,
    pub articles: &'a [StoredResult],
}

/// Write every stored result to `output_path` as one JSON document.
///
/// The parent directory is created and checked for writability first.
#[instrument(level = "info", skip_all, fields(output_path = %output_path.display()))]
pub async fn write_results(
    results: &[StoredResult],
    output_path: &Path,
) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(dir = %dir.display(), error = %e, "Output directory is not writable");
            return Err(e);
        }
    }

    let export = ResultsExport {
        exported_at: Utc::now(),
        count: results.len(),
        articles: results,
    };
    let json = serde_json::to_string_pretty(&export)?;

    info!(count = export.count, "Writing JSON export");
    fs::write(output_path, json).await?;
    info!(path = %output_path.display(), "Wrote JSON export");
    Ok(())
}
