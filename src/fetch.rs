//! Shared HTTP client for resolving and fetching article pages.
//!
//! All network calls in the pipeline go through [`HttpFetcher`], which
//! bounds every request with a timeout, rotates browser user agents, and
//! turns non-success responses into [`ExtractError::HttpStatus`] so that
//! 404/410 can be recognized without inspecting error text.

use crate::config::PipelineConfig;
use crate::error::ExtractError;
use rand::{Rng, rng};
use reqwest::{Client, redirect};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/120.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
];

/// Pick a browser user agent at random.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS[rng().random_range(0..USER_AGENTS.len())]
}

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct Page {
    /// URL after redirects; relative links resolve against this.
    pub final_url: String,
    pub body: String,
}

/// Cheaply cloneable HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    fetch_timeout: Duration,
    resolve_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(
        max_redirects: usize,
        fetch_timeout: Duration,
        resolve_timeout: Duration,
    ) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(max_redirects))
            .timeout(fetch_timeout.max(resolve_timeout))
            .build()
            .map_err(|e| ExtractError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            fetch_timeout,
            resolve_timeout,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, ExtractError> {
        Self::new(
            config.max_redirects,
            config.fetch_timeout(),
            config.resolve_timeout(),
        )
    }

    /// GET a page and return its body, failing on non-2xx responses.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_html(&self, url: &str) -> Result<Page, ExtractError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, random_user_agent())
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| ExtractError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Non-success response");
            return Err(ExtractError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| ExtractError::from_reqwest(url, e))?;
        debug!(
            %url,
            %final_url,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(Page { final_url, body })
    }

    /// HEAD a URL, following redirects, and return where it ended up.
    #[instrument(level = "debug", skip(self))]
    pub async fn head_final_url(&self, url: &str) -> Result<String, ExtractError> {
        let response = self
            .client
            .head(url)
            .header(reqwest::header::USER_AGENT, random_user_agent())
            .timeout(self.resolve_timeout)
            .send()
            .await
            .map_err(|e| ExtractError::from_reqwest(url, e))?;
        Ok(response.url().to_string())
    }
}
