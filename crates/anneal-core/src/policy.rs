//! Convergence decisions and human checkpoint resolution.

use serde::{Deserialize, Serialize};

use crate::config::RunConfig;

/// Per-iteration decision produced by the convergence policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Keep iterating: generate instructions and transform.
    Continue,

    /// Aggregate score met the configured threshold.
    Converged,

    /// Iteration budget exhausted before convergence.
    BudgetExhausted,

    /// Scheduled pause for human review; the run suspends, it does not end.
    AwaitHumanCheckpoint,
}

impl Decision {
    /// Whether this decision ends the run.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Converged | Self::BudgetExhausted)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::Converged => write!(f, "converged"),
            Self::BudgetExhausted => write!(f, "budget_exhausted"),
            Self::AwaitHumanCheckpoint => write!(f, "await_human_checkpoint"),
        }
    }
}

/// Decide what happens after one scoring pass.
///
/// Deterministic: the same `(total_score, iteration, config)` always yields
/// the same decision. Precedence is fixed:
///
/// 1. threshold met → `Converged`, even on a checkpoint iteration — a
///    candidate that already meets the bar skips needless review;
/// 2. budget → `BudgetExhausted`, checked before checkpoint cadence so the
///    loop terminates within `max_iterations` regardless of the interval;
/// 3. checkpoint cadence → `AwaitHumanCheckpoint`;
/// 4. otherwise `Continue`.
pub fn decide(total_score: f32, iteration: u32, config: &RunConfig) -> Decision {
    if total_score >= config.converged_threshold {
        return Decision::Converged;
    }
    if iteration >= config.max_iterations {
        return Decision::BudgetExhausted;
    }
    if iteration % config.checkpoint_interval == 0 {
        return Decision::AwaitHumanCheckpoint;
    }
    Decision::Continue
}

/// What a reviewer decided at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumanDecision {
    /// Accept the candidate as-is; the run converges.
    Approve,
    /// Not good enough, keep iterating.
    RejectContinue,
    /// Not good enough and not worth more budget; stop now.
    RejectAbort,
}

impl std::fmt::Display for HumanDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::RejectContinue => write!(f, "reject_continue"),
            Self::RejectAbort => write!(f, "reject_abort"),
        }
    }
}

/// A reviewer's verdict, optionally carrying corrective feedback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckpointVerdict {
    pub decision: HumanDecision,

    /// Free-form reviewer note. On `RejectContinue` it is injected into the
    /// next transform's instruction set as a critical directive.
    pub note: Option<String>,
}

impl CheckpointVerdict {
    pub fn approve() -> Self {
        Self {
            decision: HumanDecision::Approve,
            note: None,
        }
    }

    pub fn reject_continue(note: Option<String>) -> Self {
        Self {
            decision: HumanDecision::RejectContinue,
            note,
        }
    }

    pub fn reject_abort(note: Option<String>) -> Self {
        Self {
            decision: HumanDecision::RejectAbort,
            note,
        }
    }
}

/// Map a reviewer verdict onto the decision that resumes the run.
pub fn resolve_verdict(verdict: &CheckpointVerdict) -> Decision {
    match verdict.decision {
        HumanDecision::Approve => Decision::Converged,
        HumanDecision::RejectContinue => Decision::Continue,
        HumanDecision::RejectAbort => Decision::BudgetExhausted,
    }
}
