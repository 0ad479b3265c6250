//! External collaborator seams: scoring, transforming, human review.
//!
//! The engine never depends on what backs these traits — an LLM call, a
//! Blender render diff, a UX signal extractor, a human in a web UI. Any
//! implementation that honours the contracts plugs in.

use std::sync::Arc;

use async_trait::async_trait;

use anneal_core::{
    AggregateScore, Candidate, CheckpointVerdict, Instruction, Reference, ScoreResult,
    ScorerUnavailable,
};

/// Read-only knowledge lookup shared with scorers — a RAG store, vector
/// index, or reference corpus. The engine treats it as an external service
/// and never writes through it.
#[async_trait]
pub trait ContextLookup: Send + Sync {
    async fn lookup(&self, query: &str) -> anyhow::Result<serde_json::Value>;
}

/// Context handed to every scorer call.
#[derive(Clone, Default)]
pub struct ScoreContext {
    /// Optional shared knowledge source.
    pub knowledge: Option<Arc<dyn ContextLookup>>,
}

/// One named scoring dimension.
///
/// Scorers are treated as independent pure functions of
/// `(candidate, reference, context)` and are invoked concurrently; they must
/// not rely on shared mutable state. A scorer that cannot produce a score
/// reports [`ScorerUnavailable`] rather than returning 0, so the aggregator
/// can tell "scored zero" apart from "not scored".
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Signal name used for weighting and reporting.
    fn signal(&self) -> &str;

    async fn score(
        &self,
        candidate: &Candidate,
        reference: &Reference,
        ctx: &ScoreContext,
    ) -> Result<ScoreResult, ScorerUnavailable>;
}

/// Failure reported by the external transformer.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("transform failed: {reason}")]
pub struct TransformFailed {
    pub reason: String,
}

impl TransformFailed {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Applies corrective instructions to a candidate, producing the next revision.
///
/// May be an arbitrarily long external pipeline. At most one transform is in
/// flight per run, and the loop never retries a failed transform — retries
/// are the transformer's own internal concern.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(
        &self,
        candidate: &Candidate,
        instructions: &[Instruction],
    ) -> Result<Candidate, TransformFailed>;
}

/// What a checkpoint reviewer sees.
#[derive(Debug, Clone)]
pub struct CheckpointRequest<'a> {
    pub iteration: u32,
    pub candidate: &'a Candidate,
    pub score: &'a AggregateScore,
    pub instructions: &'a [Instruction],
}

/// Human checkpoint surface.
///
/// Blocking or asynchronous; the run stays suspended until a verdict comes
/// back. A handler error aborts the run (history preserved).
#[async_trait]
pub trait CheckpointHandler: Send + Sync {
    async fn review(&self, request: CheckpointRequest<'_>) -> anyhow::Result<CheckpointVerdict>;
}

/// Headless handler for runs without a reviewer: always rejects and
/// continues, which makes checkpoints pass-through while keeping the
/// cadence visible in history.
pub struct AutoContinue;

#[async_trait]
impl CheckpointHandler for AutoContinue {
    async fn review(&self, _request: CheckpointRequest<'_>) -> anyhow::Result<CheckpointVerdict> {
        Ok(CheckpointVerdict::reject_continue(None))
    }
}
