//! Resolution of link-indirection URLs (aggregator redirect links).
//!
//! Aggregators such as Google News hand out URLs that only redirect to the
//! real article. Those must be followed before anything else happens. URLs on
//! other hosts pass through untouched.

use crate::error::ExtractError;
use crate::fetch::HttpFetcher;
use crate::utils::{host_matches, truncate_for_log};
use tracing::{info, instrument, warn};

/// Turns a candidate URL into the URL that should actually be fetched.
pub trait Resolve {
    async fn resolve(&self, url: &str) -> Result<String, ExtractError>;
}

/// Resolver that follows redirects with a HEAD request.
#[derive(Debug, Clone)]
pub struct RedirectResolver {
    fetcher: HttpFetcher,
    indirection_hosts: Vec<String>,
}

impl RedirectResolver {
    pub fn new(fetcher: HttpFetcher, indirection_hosts: Vec<String>) -> Self {
        Self {
            fetcher,
            indirection_hosts,
        }
    }

    /// Whether `url` belongs to one of the configured indirection services.
    pub fn is_indirection(&self, url: &str) -> bool {
        self.indirection_hosts
            .iter()
            .any(|pattern| host_matches(url, pattern))
    }

    /// Accept a terminal URL only if it left the indirection service.
    fn check_terminal(&self, original: &str, terminal: String) -> Result<String, ExtractError> {
        if self.is_indirection(&terminal) {
            return Err(ExtractError::RedirectUnresolved {
                url: original.to_string(),
                reason: format!(
                    "redirect still points to indirection service: {}",
                    truncate_for_log(&terminal, 80)
                ),
            });
        }
        Ok(terminal)
    }
}

impl Resolve for RedirectResolver {
    #[instrument(level = "info", skip(self))]
    async fn resolve(&self, url: &str) -> Result<String, ExtractError> {
        if !self.is_indirection(url) {
            return Ok(url.to_string());
        }

        let terminal = self.fetcher.head_final_url(url).await.map_err(|e| {
            warn!(error = %e, "Failed to follow indirection link");
            ExtractError::RedirectUnresolved {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let resolved = self.check_terminal(url, terminal)?;
        info!(resolved = %truncate_for_log(&resolved, 80), "Resolved indirection link");
        Ok(resolved)
    }
}
