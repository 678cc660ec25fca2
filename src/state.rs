//! Process-lifetime pipeline state.
//!
//! Holds the caches that live for as long as the process does: per-host
//! rate-limiter slots and the set of URLs that already failed permanently.
//! Nothing here is persisted; a restart starts from a clean slate and relies
//! on stored failure records instead.

use crate::limiter::DomainRateLimiter;
use dashmap::DashSet;
use std::time::Duration;

#[derive(Debug)]
pub struct PipelineState {
    pub limiter: DomainRateLimiter,
    permanently_failed: DashSet<String>,
}

impl PipelineState {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            limiter: DomainRateLimiter::new(min_interval),
            permanently_failed: DashSet::new(),
        }
    }

    pub fn is_permanently_failed(&self, url: &str) -> bool {
        self.permanently_failed.contains(url)
    }

    /// Returns `true` if the URL was not already marked.
    pub fn mark_permanently_failed(&self, url: &str) -> bool {
        self.permanently_failed.insert(url.to_string())
    }

    pub fn permanently_failed_count(&self) -> usize {
        self.permanently_failed.len()
    }
}
