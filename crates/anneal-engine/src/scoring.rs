//! Concurrent scorer fan-out with per-call deadlines.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::warn;

use anneal_core::{Candidate, Reference, SignalOutcome};

use crate::traits::{ScoreContext, Scorer};

/// Run every registered scorer against one candidate, concurrently.
///
/// Waits for all scorers to finish (or individually fail) before returning —
/// aggregation never runs over a partial set. Output order matches
/// registration order. A timeout or scorer error collapses to
/// [`SignalOutcome::Unavailable`] for that signal only and never aborts the
/// run by itself.
pub async fn score_all(
    scorers: &[Arc<dyn Scorer>],
    candidate: &Candidate,
    reference: &Reference,
    ctx: &ScoreContext,
    timeout: Duration,
) -> Vec<SignalOutcome> {
    let calls = scorers.iter().map(|scorer| async move {
        let signal = scorer.signal().to_string();
        match tokio::time::timeout(timeout, scorer.score(candidate, reference, ctx)).await {
            Ok(Ok(result)) => SignalOutcome::Scored(result),
            Ok(Err(unavailable)) => {
                warn!(signal = %signal, reason = %unavailable.reason, "Scorer unavailable");
                SignalOutcome::Unavailable {
                    signal,
                    reason: unavailable.reason,
                }
            }
            Err(_) => {
                let reason = format!("timed out after {}ms", timeout.as_millis());
                warn!(signal = %signal, reason = %reason, "Scorer unavailable");
                SignalOutcome::Unavailable { signal, reason }
            }
        }
    });
    join_all(calls).await
}
