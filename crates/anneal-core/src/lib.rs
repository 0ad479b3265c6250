//! Anneal Core Library
//!
//! Domain types and pure convergence logic for the Anneal refinement loop:
//! scoring signals, weighted aggregation, the convergence policy, and
//! corrective instruction generation. Orchestration lives in `anneal-engine`.

pub mod aggregate;
pub mod candidate;
pub mod config;
pub mod delta;
pub mod error;
pub mod obs;
pub mod policy;
pub mod reporting;
pub mod score;
pub mod telemetry;

pub use aggregate::{
    aggregate, AggregateError, AggregateScore, SignalBreakdown, UnavailableSignal,
};
pub use candidate::{payload_digest, Candidate, Reference};
pub use config::RunConfig;
pub use delta::{generate_instructions, AspectFilter, Instruction};
pub use error::{AnnealError, Result};
pub use obs::{
    emit_checkpoint_requested, emit_checkpoint_resolved, emit_decision, emit_iteration_scored,
    emit_run_finished, emit_run_started, emit_scorer_unavailable, RunSpan,
};
pub use policy::{decide, resolve_verdict, CheckpointVerdict, Decision, HumanDecision};
pub use reporting::{
    render_run_summary_md, write_run_report_json, write_run_summary_md, IterationRowArtifact,
    RunReportArtifact, RunSummaryArtifact,
};
pub use score::{Finding, ScoreResult, ScorerUnavailable, Severity, SignalOutcome};
pub use telemetry::init_tracing;

/// Anneal version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
