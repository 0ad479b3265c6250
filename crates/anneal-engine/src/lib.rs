//! Anneal Engine
//!
//! Orchestrates the iterate → score → decide → transform cycle over an
//! opaque candidate artifact. Hosts supply scorers, a transformer, and
//! (optionally) a human checkpoint handler; the engine supplies the loop,
//! concurrency, timeouts, cancellation, and the audit trail.

pub mod controller;
pub mod run;
pub mod scoring;
pub mod traits;

pub use controller::ConvergenceLoop;
pub use run::{
    BestCandidate, CancelToken, IterationRecord, RunOutcome, RunReport, RunStage, RunState,
};
pub use scoring::score_all;
pub use traits::{
    AutoContinue, CheckpointHandler, CheckpointRequest, ContextLookup, ScoreContext, Scorer,
    TransformFailed, Transformer,
};

/// Anneal version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
