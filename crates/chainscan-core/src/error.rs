//! Error types for the chainscan pipeline.

use thiserror::Error;

/// Errors that can occur during a scan run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("block source error: {0}")]
    Source(String),

    #[error("sink error at height {height}: {reason}")]
    Sink { height: u64, reason: String },

    #[error("checkpoint store error: {0}")]
    Checkpoint(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl ScanError {
    /// Returns `true` if the error is recoverable by retrying the same height.
    ///
    /// Checkpoint and config errors are fatal for the run; everything a worker
    /// hits while fetching or processing a block is retried in place.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Source(_) | Self::Sink { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ScanError::Source("timeout".into()).is_transient());
        assert!(ScanError::Sink { height: 5, reason: "busy".into() }.is_transient());
        assert!(!ScanError::Checkpoint("disk full".into()).is_transient());
        assert!(!ScanError::Config("missing --to".into()).is_transient());
    }
}
