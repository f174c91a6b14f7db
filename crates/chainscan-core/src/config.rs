//! Scan configuration and the fluent builder.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Configuration for one scan run over a bounded height range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Chain slug (e.g. `"consensus"`). Used as the checkpoint key and as the
    /// prefix on progress output.
    pub chain_id: String,
    /// Requested first height (inclusive). The resolved start may be higher if
    /// a checkpoint already covers part of the range.
    pub start_height: u64,
    /// Last height to process (inclusive).
    pub end_height: u64,
    /// Number of concurrent workers.
    pub workers: usize,
    /// Initial retry delay after a failed height.
    pub base_backoff: Duration,
    /// Ceiling for the doubled retry delay.
    pub max_backoff: Duration,
    /// Emit a progress line every N heights.
    pub progress_every: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chain_id: "consensus".into(),
            start_height: 0,
            end_height: 0,
            workers: 4,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            progress_every: 100,
        }
    }
}

impl ScanConfig {
    /// Validate preconditions before any worker is spawned.
    ///
    /// An empty range (`start > end`) is allowed — the run completes with zero
    /// work. A zero-sized pool or an empty chain id is a config error.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.chain_id.is_empty() {
            return Err(ScanError::Config("chain_id must not be empty".into()));
        }
        if self.workers == 0 {
            return Err(ScanError::Config("workers must be at least 1".into()));
        }
        if self.base_backoff.is_zero() {
            return Err(ScanError::Config("base_backoff must be non-zero".into()));
        }
        if self.max_backoff < self.base_backoff {
            return Err(ScanError::Config(
                "max_backoff must be >= base_backoff".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for `ScanConfig`.
#[derive(Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    /// Set the chain slug (checkpoint key + progress prefix).
    pub fn chain(mut self, chain_id: impl Into<String>) -> Self {
        self.config.chain_id = chain_id.into();
        self
    }

    /// Set the requested first height (inclusive).
    pub fn from_height(mut self, height: u64) -> Self {
        self.config.start_height = height;
        self
    }

    /// Set the last height (inclusive).
    pub fn to_height(mut self, height: u64) -> Self {
        self.config.end_height = height;
        self
    }

    /// Set the worker pool size.
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set the initial retry delay.
    pub fn base_backoff(mut self, delay: Duration) -> Self {
        self.config.base_backoff = delay;
        self
    }

    /// Set the retry delay ceiling.
    pub fn max_backoff(mut self, delay: Duration) -> Self {
        self.config.max_backoff = delay;
        self
    }

    /// Set the progress notification interval (every N heights).
    pub fn progress_every(mut self, n: u64) -> Self {
        self.config.progress_every = n;
        self
    }

    /// Build the `ScanConfig`.
    pub fn build(self) -> ScanConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let cfg = ScanConfigBuilder::new().build();
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.base_backoff, Duration::from_millis(500));
        assert_eq!(cfg.progress_every, 100);
    }

    #[test]
    fn builder_custom() {
        let cfg = ScanConfigBuilder::new()
            .chain("domain")
            .from_height(1_000)
            .to_height(2_000)
            .workers(8)
            .base_backoff(Duration::from_millis(250))
            .max_backoff(Duration::from_secs(10))
            .build();

        assert_eq!(cfg.chain_id, "domain");
        assert_eq!(cfg.start_height, 1_000);
        assert_eq!(cfg.end_height, 2_000);
        assert_eq!(cfg.workers, 8);
        cfg.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let cfg = ScanConfigBuilder::new().workers(0).build();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_backoff() {
        let cfg = ScanConfigBuilder::new()
            .base_backoff(Duration::from_secs(60))
            .max_backoff(Duration::from_secs(1))
            .build();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_allows_empty_range() {
        let cfg = ScanConfigBuilder::new().from_height(10).to_height(5).build();
        cfg.validate().unwrap();
    }
}
