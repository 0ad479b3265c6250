//! Scoring signals, findings, and severity.

use serde::{Deserialize, Serialize};

/// Severity of a finding or instruction.
///
/// Ordered: `Low < Medium < High < Critical`. Instruction generation sorts
/// by severity descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Acceptable deviation, worth noting.
    Low,
    /// Should be corrected when convenient.
    Medium,
    /// Materially wrong versus the reference.
    High,
    /// Blocks convergence on its own.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// One structured gap a scorer observed between candidate and reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    /// Aspect of the candidate this concerns (e.g. "geometry.scale").
    pub aspect: String,

    /// What the reference implies.
    pub expected: String,

    /// What the candidate actually shows.
    pub actual: String,

    /// How badly this hurts the candidate.
    pub severity: Severity,
}

/// Result of one scorer for one candidate. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreResult {
    /// Signal name used for weighting and reporting (e.g. "factuality").
    pub signal: String,

    /// Bounded score in 0.0–1.0.
    pub value: f32,

    /// Structured findings backing the score.
    pub findings: Vec<Finding>,
}

impl ScoreResult {
    /// Create a result, clamping the value into [0, 1]. NaN collapses to 0.
    pub fn new(signal: impl Into<String>, value: f32) -> Self {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        Self {
            signal: signal.into(),
            value,
            findings: Vec::new(),
        }
    }

    /// Attach a finding.
    pub fn with_finding(mut self, finding: Finding) -> Self {
        self.findings.push(finding);
        self
    }
}

/// Reported by a scorer that cannot produce a score (upstream down, timeout).
///
/// A dedicated condition rather than a sentinel 0.0, so the aggregator can
/// tell "scored zero" apart from "not scored".
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("scorer unavailable: {reason}")]
pub struct ScorerUnavailable {
    pub reason: String,
}

impl ScorerUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Outcome of asking one scorer for a signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalOutcome {
    /// The scorer produced a bounded score.
    Scored(ScoreResult),

    /// The scorer failed or timed out; excluded from aggregation.
    Unavailable { signal: String, reason: String },
}

impl SignalOutcome {
    /// Signal name, regardless of outcome.
    pub fn signal(&self) -> &str {
        match self {
            Self::Scored(r) => &r.signal,
            Self::Unavailable { signal, .. } => signal,
        }
    }

    /// The score result, when one exists.
    pub fn as_scored(&self) -> Option<&ScoreResult> {
        match self {
            Self::Scored(r) => Some(r),
            Self::Unavailable { .. } => None,
        }
    }
}
