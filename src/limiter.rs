//! Per-domain request spacing.
//!
//! [`DomainRateLimiter::acquire`] reserves the next free slot for a host and
//! sleeps until it arrives. Reservation happens under a short lock and the
//! sleep happens outside it, so concurrent callers for one host queue up one
//! interval apart while callers for other hosts are never delayed.

use crate::utils::normalized_host;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

#[derive(Debug)]
pub struct DomainRateLimiter {
    min_interval: Duration,
    next_slot: DashMap<String, Instant>,
}

impl DomainRateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: DashMap::new(),
        }
    }

    /// Wait until `min_interval` has passed since the previous acquire for
    /// the same host, then record this request.
    ///
    /// Returns how long the caller waited.
    pub async fn acquire(&self, url: &str) -> Duration {
        let host = normalized_host(url);
        let now = Instant::now();
        // The entry guard holds the shard lock; it is released before sleeping.
        let slot = *self
            .next_slot
            .entry(host.clone())
            .and_modify(|last| *last = (*last + self.min_interval).max(now))
            .or_insert(now);

        let wait = slot.saturating_duration_since(now);
        if !wait.is_zero() {
            debug!(%host, wait_ms = wait.as_millis() as u64, "Rate limiting");
            sleep_until(slot).await;
        }
        wait
    }
}
