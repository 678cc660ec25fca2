//! Utility functions for string manipulation, URL handling and file system checks.
//!
//! This module provides helper functions used throughout the pipeline:
//! - Character-safe truncation for logging and stored fields
//! - Whitespace normalization for scraped text
//! - Host normalization and absolute URL resolution
//! - Output directory validation

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a byte
/// count indicator appended. Cuts always land on a character boundary.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Keep at most `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => s[..cut].to_string(),
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Normalized host used as the rate-limiter key.
///
/// Lowercases the host and strips a leading `www.`. Strings that do not
/// parse as URLs are used as-is so they still get a (shared) bucket.
pub fn normalized_host(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| url.to_lowercase());
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

/// True when `url`'s host equals `pattern` or is a subdomain of it.
pub fn host_matches(url: &str, pattern: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_lowercase();
    let pattern = pattern.to_lowercase();
    host == pattern || host.ends_with(&format!(".{pattern}"))
}

/// Resolve `src` against `page_url` and keep it only if it is http(s).
pub fn absolutize_url(page_url: &str, src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    let resolved = match Url::parse(src) {
        Ok(u) => u,
        Err(_) => Url::parse(page_url).ok()?.join(src).ok()?,
    };
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Parse a URL list: one URL per line, blank lines and `#` comments ignored.
///
/// Returns the unique http(s) URLs in file order plus the number of lines
/// that were rejected as invalid.
pub fn parse_url_list(text: &str) -> (Vec<String>, usize) {
    let mut rejected = 0;
    let urls = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match Url::parse(line) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => Some(line.to_string()),
            _ => {
                rejected += 1;
                None
            }
        })
        .unique()
        .collect();
    (urls, rejected)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a scratch file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Sync write check through std fs
    let check_path = path.join("..__write_check__");
    stdfs::File::create(&check_path)?;
    let _ = stdfs::remove_file(&check_path);
    info!("Output directory is writable");
    Ok(())
}
