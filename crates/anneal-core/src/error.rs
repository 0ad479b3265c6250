//! Error taxonomy for convergence runs.
//!
//! Only conditions that end a call with `Err` live here. Per-signal scorer
//! failures are absorbed into aggregation (see `score::ScorerUnavailable`),
//! and mid-run fatal conditions surface through the run report rather than
//! an error, so partial history is never discarded.

/// Errors produced by the convergence engine.
#[derive(Debug, thiserror::Error)]
pub enum AnnealError {
    /// Rejected before the run starts; never surfaced mid-run.
    #[error("invalid run configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for convergence engine operations.
pub type Result<T> = std::result::Result<T, AnnealError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_invalid_display() {
        let err = AnnealError::ConfigurationInvalid("max_iterations must be positive".to_string());
        assert!(err.to_string().contains("invalid run configuration"));
        assert!(err.to_string().contains("max_iterations"));
    }

    #[test]
    fn test_serde_error_converts() {
        let bad = serde_json::from_str::<serde_json::Value>("{");
        let err: AnnealError = bad.unwrap_err().into();
        assert!(matches!(err, AnnealError::Serialization(_)));
    }
}
