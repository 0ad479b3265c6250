//! The loop controller: iterate, score, decide, transform.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use anneal_core::{
    aggregate, decide, generate_instructions, obs, resolve_verdict, AggregateError, AnnealError,
    Candidate, Decision, Finding, Instruction, Reference, RunConfig,
};

use crate::run::{BestCandidate, CancelToken, IterationRecord, RunOutcome, RunReport, RunStage, RunState};
use crate::scoring::score_all;
use crate::traits::{AutoContinue, CheckpointHandler, CheckpointRequest, ScoreContext, Scorer, Transformer};

/// Drives the iterate → score → decide → transform cycle for one run.
///
/// Built once and reused across runs; each run owns its own [`RunState`],
/// so concurrent runs are fully independent. Scorer registration order is
/// the deterministic tie-break order for instruction generation and
/// reporting.
pub struct ConvergenceLoop {
    scorers: Vec<Arc<dyn Scorer>>,
    transformer: Arc<dyn Transformer>,
    checkpoint: Arc<dyn CheckpointHandler>,
    context: ScoreContext,
    config: RunConfig,
}

impl ConvergenceLoop {
    /// Create a loop around a transformer. Defaults to the headless
    /// [`AutoContinue`] checkpoint handler and an empty score context.
    pub fn new(transformer: Arc<dyn Transformer>, config: RunConfig) -> Self {
        Self {
            scorers: Vec::new(),
            transformer,
            checkpoint: Arc::new(AutoContinue),
            context: ScoreContext::default(),
            config,
        }
    }

    /// Register a scorer. Registration order is preserved everywhere
    /// downstream.
    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorers.push(scorer);
        self
    }

    /// Route checkpoints to a reviewer.
    pub fn with_checkpoint_handler(mut self, handler: Arc<dyn CheckpointHandler>) -> Self {
        self.checkpoint = handler;
        self
    }

    /// Share a read-only knowledge source with scorers.
    pub fn with_context(mut self, context: ScoreContext) -> Self {
        self.context = context;
        self
    }

    /// Run the loop to a terminal outcome.
    ///
    /// Only configuration problems return `Err`. Every mid-run failure is
    /// reported through [`RunReport::outcome`] with full history and the
    /// best candidate found so far — an abort never discards the trail.
    pub async fn run(
        &self,
        seed: Candidate,
        reference: &Reference,
        cancel: &CancelToken,
    ) -> Result<RunReport, AnnealError> {
        self.config.validate()?;
        if self.scorers.is_empty() {
            return Err(AnnealError::ConfigurationInvalid(
                "at least one scorer must be registered".to_string(),
            ));
        }

        let mut state = RunState::new(seed);
        let run_id = state.run_id.to_string();
        let _span = obs::RunSpan::enter(&run_id);
        obs::emit_run_started(&run_id, self.scorers.len());

        let outcome = self.drive(&mut state, reference, cancel).await;

        let finished_at = Utc::now();
        let elapsed_ms = (finished_at - state.started_at).num_milliseconds().max(0) as u64;
        obs::emit_run_finished(&run_id, &outcome.to_string(), state.iteration, elapsed_ms);

        let best = state.best().map(|record| BestCandidate {
            candidate: record.candidate.clone(),
            score: record.score.clone(),
            iteration: record.iteration,
        });

        Ok(RunReport {
            run_id: state.run_id,
            outcome,
            best,
            history: state.history,
            total_iterations: state.iteration,
            started_at: state.started_at,
            finished_at,
            elapsed_ms,
        })
    }

    async fn drive(
        &self,
        state: &mut RunState,
        reference: &Reference,
        cancel: &CancelToken,
    ) -> RunOutcome {
        let run_id = state.run_id.to_string();

        loop {
            if cancel.is_cancelled() {
                info!(run_id = %run_id, iteration = state.iteration, "Run cancelled between iterations");
                return RunOutcome::Cancelled;
            }

            state.iteration += 1;
            let iteration = state.iteration;

            let outcomes = score_all(
                &self.scorers,
                &state.current,
                reference,
                &self.context,
                self.config.scorer_timeout,
            )
            .await;
            for outcome in &outcomes {
                if let anneal_core::SignalOutcome::Unavailable { signal, reason } = outcome {
                    obs::emit_scorer_unavailable(&run_id, signal, reason);
                }
            }

            let score = match aggregate(&outcomes, &self.config.weights) {
                Ok(score) => score,
                Err(AggregateError::NoScorersAvailable(reason)) => {
                    return RunOutcome::Aborted {
                        stage: RunStage::Scoring,
                        iteration,
                        reason,
                    };
                }
            };
            obs::emit_iteration_scored(&run_id, iteration, score.total, score.unavailable.len());

            let decision = decide(score.total, iteration, &self.config);
            obs::emit_decision(&run_id, iteration, &decision.to_string());

            // History is appended before the decision is acted on, so the
            // trail stays complete through checkpoints and aborts.
            state.history.push(IterationRecord {
                iteration,
                candidate: state.current.clone(),
                score: score.clone(),
                decision,
                human_verdict: None,
                instructions: Vec::new(),
            });

            match decision {
                Decision::Converged => return RunOutcome::Converged,
                Decision::BudgetExhausted => return RunOutcome::BudgetExhausted,
                Decision::Continue | Decision::AwaitHumanCheckpoint => {}
            }

            // Findings in scorer registration order feed the delta generator.
            let findings: Vec<Finding> = outcomes
                .iter()
                .filter_map(|o| o.as_scored())
                .flat_map(|r| r.findings.iter().cloned())
                .collect();
            let mut instructions = generate_instructions(
                &state.current,
                reference,
                &findings,
                self.config.severity_floor,
                &self.config.aspect_filter,
            );

            if decision == Decision::AwaitHumanCheckpoint {
                obs::emit_checkpoint_requested(&run_id, iteration, score.total);
                let request = CheckpointRequest {
                    iteration,
                    candidate: &state.current,
                    score: &score,
                    instructions: &instructions,
                };
                let verdict = match self.checkpoint.review(request).await {
                    Ok(verdict) => verdict,
                    Err(e) => {
                        return RunOutcome::Aborted {
                            stage: RunStage::Checkpoint,
                            iteration,
                            reason: e.to_string(),
                        };
                    }
                };
                obs::emit_checkpoint_resolved(&run_id, iteration, &verdict.decision.to_string());

                let resumed = resolve_verdict(&verdict);
                let note = verdict.note.clone();
                if let Some(last) = state.history.last_mut() {
                    last.human_verdict = Some(verdict);
                }
                match resumed {
                    Decision::Converged => return RunOutcome::Converged,
                    Decision::BudgetExhausted => return RunOutcome::BudgetExhausted,
                    _ => {
                        // Reviewer feedback joins the next transform's
                        // instruction set as a critical directive.
                        if let Some(note) = note {
                            instructions.insert(0, Instruction::human_feedback(note));
                        }
                    }
                }
            }

            if let Some(last) = state.history.last_mut() {
                last.instructions = instructions.clone();
            }

            let transform = self.transformer.transform(&state.current, &instructions);
            let next = match tokio::time::timeout(self.config.transform_timeout, transform).await {
                Ok(Ok(next)) => next,
                Ok(Err(failed)) => {
                    return RunOutcome::Aborted {
                        stage: RunStage::Transform,
                        iteration,
                        reason: failed.reason,
                    };
                }
                Err(_) => {
                    return RunOutcome::Aborted {
                        stage: RunStage::Transform,
                        iteration,
                        reason: format!(
                            "timed out after {}ms",
                            self.config.transform_timeout.as_millis()
                        ),
                    };
                }
            };
            state.current = next;
        }
    }
}
