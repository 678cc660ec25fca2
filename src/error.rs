//! Typed errors and failure classification.
//!
//! Every stage of the pipeline returns an [`ExtractError`] instead of letting
//! an error escape its boundary. [`ExtractError::kind`] folds those errors
//! into the small [`ErrorKind`] vocabulary that the retry controller and the
//! failure tracker reason about.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classified failure reason persisted with every failure record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport failure or timeout.
    NetworkError,
    /// Page parsed but produced too little text.
    InsufficientContent,
    /// HTTP 404 or 410; the content does not exist.
    NotFound,
    /// An indirection link never reached a real destination.
    RedirectUnresolved,
    /// The URL already failed permanently earlier in this process.
    PermanentlyFailed,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Whether another run could plausibly produce a different outcome.
    pub fn is_retryable(self) -> bool {
        !matches!(
            self,
            ErrorKind::NotFound | ErrorKind::PermanentlyFailed | ErrorKind::RedirectUnresolved
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NetworkError => "network_error",
            ErrorKind::InsufficientContent => "insufficient_content",
            ErrorKind::NotFound => "not_found",
            ErrorKind::RedirectUnresolved => "redirect_unresolved",
            ErrorKind::PermanentlyFailed => "permanently_failed",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while resolving, fetching or parsing a candidate URL.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// Connection, TLS, body read or timeout failure.
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Extracted text did not clear the minimum content threshold.
    #[error("insufficient content extracted ({chars} chars, need more than {min})")]
    InsufficientContent { chars: usize, min: usize },

    /// The indirection link could not be followed to a real article.
    #[error("redirect unresolved for {url}: {reason}")]
    RedirectUnresolved { url: String, reason: String },

    /// Skipped because the URL already failed permanently in this process.
    #[error("previously failed permanently: {url}")]
    PermanentlyFailed { url: String },

    /// The URL could not be parsed.
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{0}")]
    Other(String),
}

impl ExtractError {
    /// Wrap a `reqwest` failure, keeping HTTP status information when the
    /// error came from `error_for_status`.
    pub fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return ExtractError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            };
        }
        ExtractError::Network {
            url: url.to_string(),
            message: e.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::Network { .. } => ErrorKind::NetworkError,
            ExtractError::HttpStatus { status, .. } if matches!(*status, 404 | 410) => {
                ErrorKind::NotFound
            }
            ExtractError::HttpStatus { .. } => ErrorKind::NetworkError,
            ExtractError::InsufficientContent { .. } => ErrorKind::InsufficientContent,
            ExtractError::RedirectUnresolved { .. } => ErrorKind::RedirectUnresolved,
            ExtractError::PermanentlyFailed { .. } => ErrorKind::PermanentlyFailed,
            ExtractError::InvalidUrl { .. } | ExtractError::Other(_) => ErrorKind::Unknown,
        }
    }

    /// True for 404/410 responses, which end the attempt loop immediately.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Errors raised by a [`Store`](crate::store::Store) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("candidate {0} not found")]
    UnknownCandidate(u64),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
