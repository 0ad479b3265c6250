//! Structured observability hooks for convergence run lifecycle events.
//!
//! This module provides:
//! - Run-scoped tracing spans via the `RunSpan` RAII guard
//! - Emission functions for key lifecycle events: start, iteration scored,
//!   decision, checkpoint, finish
//!
//! Events are emitted at `info!` level; scorer failures at `warn!`.

use tracing::{info, warn};

/// RAII guard that enters a run-scoped tracing span for the duration of a run.
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run_id.
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("anneal.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: run started with the number of registered scorers.
pub fn emit_run_started(run_id: &str, scorers: usize) {
    info!(event = "run.started", run_id = %run_id, scorers = scorers);
}

/// Emit event: one scoring pass aggregated.
pub fn emit_iteration_scored(run_id: &str, iteration: u32, total: f32, unavailable: usize) {
    info!(
        event = "run.iteration_scored",
        run_id = %run_id,
        iteration = iteration,
        total = total,
        unavailable = unavailable,
    );
}

/// Emit event: the convergence policy produced a decision.
pub fn emit_decision(run_id: &str, iteration: u32, decision: &str) {
    info!(event = "run.decision", run_id = %run_id, iteration = iteration, decision = %decision);
}

/// Emit event: the run paused for human review.
pub fn emit_checkpoint_requested(run_id: &str, iteration: u32, total: f32) {
    info!(
        event = "checkpoint.requested",
        run_id = %run_id,
        iteration = iteration,
        total = total,
    );
}

/// Emit event: a reviewer resolved a checkpoint.
pub fn emit_checkpoint_resolved(run_id: &str, iteration: u32, verdict: &str) {
    info!(
        event = "checkpoint.resolved",
        run_id = %run_id,
        iteration = iteration,
        verdict = %verdict,
    );
}

/// Emit event: one signal produced no score this iteration (warning level).
pub fn emit_scorer_unavailable(run_id: &str, signal: &str, reason: &str) {
    warn!(event = "scorer.unavailable", run_id = %run_id, signal = %signal, reason = %reason);
}

/// Emit event: run reached a terminal outcome.
pub fn emit_run_finished(run_id: &str, outcome: &str, total_iterations: u32, elapsed_ms: u64) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        outcome = %outcome,
        total_iterations = total_iterations,
        elapsed_ms = elapsed_ms,
    );
}
