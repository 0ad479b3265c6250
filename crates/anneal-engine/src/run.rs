//! Run state, history, and terminal reports.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use anneal_core::{
    AggregateScore, Candidate, CheckpointVerdict, Decision, Instruction, IterationRowArtifact,
    RunReportArtifact, RunSummaryArtifact,
};

/// Requests cancellation of an in-flight run.
///
/// Checked between iterations only — scorer and transform calls are external
/// and treated as non-interruptible. Cloning shares the flag, so a host can
/// keep one clone and hand the other to the loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Stage at which a run aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Scoring,
    Checkpoint,
    Transform,
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scoring => write!(f, "scoring"),
            Self::Checkpoint => write!(f, "checkpoint"),
            Self::Transform => write!(f, "transform"),
        }
    }
}

/// Terminal outcome of a convergence run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Aggregate score met the threshold, or a reviewer approved.
    Converged,

    /// Iteration budget exhausted, or a reviewer rejected and aborted.
    BudgetExhausted,

    /// Cancelled via [`CancelToken`] between iterations.
    Cancelled,

    /// A stage failed fatally. History up to `iteration` is preserved.
    Aborted {
        stage: RunStage,
        iteration: u32,
        reason: String,
    },
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::BudgetExhausted => write!(f, "budget_exhausted"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Aborted { stage, .. } => write!(f, "aborted({stage})"),
        }
    }
}

/// One completed scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,

    /// The candidate that was scored this pass.
    pub candidate: Candidate,

    pub score: AggregateScore,

    /// Decision the convergence policy produced for this pass.
    pub decision: Decision,

    /// Reviewer verdict, when this pass hit a checkpoint.
    pub human_verdict: Option<CheckpointVerdict>,

    /// Instructions handed to the transformer after this pass.
    /// Empty on terminal passes.
    pub instructions: Vec<Instruction>,
}

/// Mutable state of one run. Owned and mutated exclusively by the loop
/// controller; concurrent runs share nothing.
#[derive(Debug)]
pub struct RunState {
    pub run_id: Uuid,

    /// Completed scoring passes. 0 until the first pass starts.
    pub iteration: u32,

    /// Candidate the next pass will score.
    pub current: Candidate,

    /// Every completed pass, appended before the decision is acted on so
    /// history is complete even when the run aborts.
    pub history: Vec<IterationRecord>,

    pub started_at: DateTime<Utc>,
}

impl RunState {
    pub fn new(seed: Candidate) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            iteration: 0,
            current: seed,
            history: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Best-scoring pass so far. Ties go to the earliest iteration, so the
    /// result is deterministic across replays.
    pub fn best(&self) -> Option<&IterationRecord> {
        self.history.iter().fold(None, |best, record| match best {
            Some(b) if record.score.total > b.score.total => Some(record),
            None => Some(record),
            _ => best,
        })
    }
}

/// The best-scoring candidate in a run's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestCandidate {
    pub candidate: Candidate,
    pub score: AggregateScore,
    pub iteration: u32,
}

/// Final report returned for every run, fatal outcomes included — an abort
/// still reports which stage failed, at which iteration, and the best
/// candidate found up to that point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,

    pub outcome: RunOutcome,

    /// Highest-scoring candidate in history — not necessarily the last,
    /// since some transformers regress.
    pub best: Option<BestCandidate>,

    pub history: Vec<IterationRecord>,

    pub total_iterations: u32,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl RunReport {
    /// Whether the run ended in convergence.
    pub fn converged(&self) -> bool {
        self.outcome == RunOutcome::Converged
    }

    /// Flatten into the persisted artifact schema.
    pub fn to_artifact(&self) -> RunReportArtifact {
        RunReportArtifact {
            schema_version: "1.0".to_string(),
            generated_at: Utc::now(),
            run_id: self.run_id,
            summary: RunSummaryArtifact {
                outcome: self.outcome.to_string(),
                total_iterations: self.total_iterations,
                elapsed_ms: self.elapsed_ms,
                best_iteration: self.best.as_ref().map(|b| b.iteration),
                best_total: self.best.as_ref().map(|b| b.score.total),
            },
            iterations: self
                .history
                .iter()
                .map(|record| IterationRowArtifact {
                    iteration: record.iteration,
                    candidate_revision: record.candidate.revision,
                    candidate_digest: record.candidate.digest.clone(),
                    total: record.score.total,
                    decision: record.decision,
                    unavailable_signals: record.score.unavailable.len(),
                    instructions: record.instructions.len(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(iteration: u32, total: f32) -> IterationRecord {
        IterationRecord {
            iteration,
            candidate: Candidate::seed(json!({"i": iteration})),
            score: AggregateScore {
                total,
                breakdown: Vec::new(),
                unavailable: Vec::new(),
            },
            decision: Decision::Continue,
            human_verdict: None,
            instructions: Vec::new(),
        }
    }

    #[test]
    fn test_cancel_token_shares_flag_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_best_picks_highest_score() {
        let mut state = RunState::new(Candidate::seed(json!({})));
        state.history.push(record(1, 0.4));
        state.history.push(record(2, 0.8));
        state.history.push(record(3, 0.6));
        assert_eq!(state.best().map(|r| r.iteration), Some(2));
    }

    #[test]
    fn test_best_tie_goes_to_earliest_iteration() {
        let mut state = RunState::new(Candidate::seed(json!({})));
        state.history.push(record(1, 0.7));
        state.history.push(record(2, 0.7));
        assert_eq!(state.best().map(|r| r.iteration), Some(1));
    }

    #[test]
    fn test_best_is_none_without_history() {
        let state = RunState::new(Candidate::seed(json!({})));
        assert!(state.best().is_none());
    }

    #[test]
    fn test_run_outcome_display() {
        assert_eq!(RunOutcome::Converged.to_string(), "converged");
        assert_eq!(
            RunOutcome::Aborted {
                stage: RunStage::Transform,
                iteration: 4,
                reason: "boom".to_string(),
            }
            .to_string(),
            "aborted(transform)"
        );
    }

    #[test]
    fn test_report_to_artifact_maps_rows() {
        let report = RunReport {
            run_id: Uuid::new_v4(),
            outcome: RunOutcome::BudgetExhausted,
            best: None,
            history: vec![record(1, 0.4), record(2, 0.5)],
            total_iterations: 2,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            elapsed_ms: 42,
        };
        let artifact = report.to_artifact();
        assert_eq!(artifact.summary.outcome, "budget_exhausted");
        assert_eq!(artifact.iterations.len(), 2);
        assert_eq!(artifact.iterations[1].iteration, 2);
        assert!(artifact.summary.best_iteration.is_none());
    }
}
