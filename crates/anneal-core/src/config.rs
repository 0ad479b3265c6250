//! Run configuration, validated once before a run starts.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::delta::AspectFilter;
use crate::error::AnnealError;
use crate::score::Severity;

/// Configuration for one convergence run.
///
/// Validated by [`RunConfig::validate`] before the loop starts; never
/// mutated mid-run. Invalid configuration is rejected up front and never
/// surfaces as a mid-run failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Weight per signal name. Non-negative; need not sum to 1 (the
    /// aggregator normalises).
    pub weights: BTreeMap<String, f32>,

    /// Aggregate score at or above which the run converges.
    pub converged_threshold: f32,

    /// Hard cap on scoring iterations.
    pub max_iterations: u32,

    /// Every Nth iteration pauses for human review, unless the candidate
    /// already converged or the budget ran out.
    pub checkpoint_interval: u32,

    /// Findings below this severity are dropped as acceptable deviation.
    pub severity_floor: Severity,

    /// Which aspects instructions may target.
    pub aspect_filter: AspectFilter,

    /// Per-scorer-call deadline. A timeout makes that signal unavailable
    /// for the iteration.
    pub scorer_timeout: Duration,

    /// Per-transform-call deadline. A timeout aborts the run.
    pub transform_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            converged_threshold: 0.9,
            max_iterations: 10,
            checkpoint_interval: 3,
            severity_floor: Severity::Medium,
            aspect_filter: AspectFilter::All,
            scorer_timeout: Duration::from_secs(60),
            transform_timeout: Duration::from_secs(300),
        }
    }
}

impl RunConfig {
    /// Set the weight for one signal.
    pub fn with_weight(mut self, signal: impl Into<String>, weight: f32) -> Self {
        self.weights.insert(signal.into(), weight);
        self
    }

    /// Reject invalid configuration before a run starts.
    pub fn validate(&self) -> Result<(), AnnealError> {
        if self.weights.is_empty() {
            return Err(AnnealError::ConfigurationInvalid(
                "at least one signal weight is required".to_string(),
            ));
        }
        for (signal, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(AnnealError::ConfigurationInvalid(format!(
                    "signal '{signal}' has invalid weight {weight}"
                )));
            }
        }
        if self.weights.values().all(|w| *w == 0.0) {
            return Err(AnnealError::ConfigurationInvalid(
                "signal weights must not all be zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.converged_threshold) {
            return Err(AnnealError::ConfigurationInvalid(format!(
                "converged_threshold {} outside [0, 1]",
                self.converged_threshold
            )));
        }
        if self.max_iterations == 0 {
            return Err(AnnealError::ConfigurationInvalid(
                "max_iterations must be positive".to_string(),
            ));
        }
        if self.checkpoint_interval == 0 {
            return Err(AnnealError::ConfigurationInvalid(
                "checkpoint_interval must be positive".to_string(),
            ));
        }
        if self.scorer_timeout.is_zero() || self.transform_timeout.is_zero() {
            return Err(AnnealError::ConfigurationInvalid(
                "timeouts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
