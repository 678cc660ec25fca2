//! Pipeline configuration.
//!
//! Every field has a default, so an empty or missing YAML file yields a
//! working configuration. CLI flags are applied on top in `main`.
//!
//! ```yaml
//! min_interval_secs: 2
//! max_retries: 3
//! indirection_hosts:
//!   - news.google.com
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Widest day window a batch may select from.
pub const MAX_DAY_WINDOW: i64 = 36_500;

/// Largest per-host spacing accepted.
pub const MAX_MIN_INTERVAL_SECS: f64 = 3_600.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum spacing between two requests to the same host.
    pub min_interval_secs: f64,
    /// Structured extractor attempts before falling back.
    pub max_retries: u32,
    /// Attempt count at which a candidate is no longer selected.
    pub retry_ceiling: u32,
    /// Full text must be strictly longer than this many characters.
    pub min_content_chars: usize,
    pub fetch_timeout_secs: u64,
    pub resolve_timeout_secs: u64,
    pub max_redirects: usize,
    /// Hosts of link-indirection services whose URLs must be resolved first.
    pub indirection_hosts: Vec<String>,
    pub batch_size: usize,
    /// Sleep after a batch with at least one success.
    pub base_interval_secs: u64,
    /// Sleep after a batch without successes.
    pub idle_interval_secs: u64,
    /// Sleep after a batch that errored out.
    pub error_cooldown_secs: u64,
    /// Log statistics every this many cycles.
    pub stats_every_cycles: u64,
    /// Default day window for one-off batches.
    pub default_days: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 2.0,
            max_retries: 3,
            retry_ceiling: 5,
            min_content_chars: 100,
            fetch_timeout_secs: 15,
            resolve_timeout_secs: 10,
            max_redirects: 10,
            indirection_hosts: vec!["news.google.com".to_string()],
            batch_size: 5,
            base_interval_secs: 300,
            idle_interval_secs: 60,
            error_cooldown_secs: 60,
            stats_every_cycles: 10,
            default_days: 7,
        }
    }
}

impl PipelineConfig {
    /// Load from a YAML file, or defaults when `path` is `None`.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
                info!(config_path = %path.display(), "Loaded configuration");
                config
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be at least 1".into()));
        }
        if self.retry_ceiling == 0 {
            return Err(ConfigError::Invalid("retry_ceiling must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if !(0.0..=MAX_MIN_INTERVAL_SECS).contains(&self.min_interval_secs) {
            return Err(ConfigError::Invalid(format!(
                "min_interval_secs must be between 0 and {MAX_MIN_INTERVAL_SECS}"
            )));
        }
        if !(1..=MAX_DAY_WINDOW).contains(&self.default_days) {
            return Err(ConfigError::Invalid(format!(
                "default_days must be between 1 and {MAX_DAY_WINDOW}"
            )));
        }
        if self.fetch_timeout_secs == 0 || self.resolve_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least 1 second".into()));
        }
        Ok(())
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_secs_f64(self.min_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn base_interval(&self) -> Duration {
        Duration::from_secs(self.base_interval_secs)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.idle_interval_secs)
    }

    pub fn error_cooldown(&self) -> Duration {
        Duration::from_secs(self.error_cooldown_secs)
    }
}
