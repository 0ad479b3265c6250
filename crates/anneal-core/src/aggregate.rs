//! Weighted aggregation of per-signal scores.
//!
//! Combines one iteration's [`SignalOutcome`]s into a single
//! [`AggregateScore`] with a per-signal breakdown kept for audit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::score::SignalOutcome;

/// Aggregation failure.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AggregateError {
    /// Every registered signal failed to score, or the effective weight sum
    /// over scored signals is zero — there is nothing to average.
    #[error("no scorers available: {0}")]
    NoScorersAvailable(String),
}

/// Per-signal line in an aggregate breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalBreakdown {
    pub signal: String,
    pub value: f32,
    pub weight: f32,
    pub weighted: f32,
}

/// A signal that produced no score this iteration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnavailableSignal {
    pub signal: String,
    pub reason: String,
}

/// Weighted aggregate of one candidate's signal scores. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateScore {
    /// Normalised total in 0.0–1.0.
    pub total: f32,

    /// Per-signal contributions, in scorer registration order.
    pub breakdown: Vec<SignalBreakdown>,

    /// Signals excluded from the total this iteration, with reasons.
    pub unavailable: Vec<UnavailableSignal>,
}

/// Combine per-signal outcomes into one [`AggregateScore`].
///
/// `total = Σ(weight·value) / Σ(weight)` over signals that actually scored.
/// Unavailable signals are excluded from numerator and denominator rather
/// than counted as zero, so one failed upstream cannot tank the total on its
/// own. Weights are non-negative and need not sum to 1 — normalisation
/// happens here. A scored signal with no configured weight gets weight 0:
/// it stays in the breakdown for audit but contributes nothing.
///
/// `outcomes` must be in scorer registration order; the breakdown preserves it.
pub fn aggregate(
    outcomes: &[SignalOutcome],
    weights: &BTreeMap<String, f32>,
) -> Result<AggregateScore, AggregateError> {
    let mut breakdown = Vec::new();
    let mut unavailable = Vec::new();
    let mut numerator = 0.0f64;
    let mut denominator = 0.0f64;

    for outcome in outcomes {
        match outcome {
            SignalOutcome::Scored(result) => {
                let weight = weights.get(&result.signal).copied().unwrap_or(0.0);
                let weighted = weight * result.value;
                numerator += f64::from(weighted);
                denominator += f64::from(weight);
                breakdown.push(SignalBreakdown {
                    signal: result.signal.clone(),
                    value: result.value,
                    weight,
                    weighted,
                });
            }
            SignalOutcome::Unavailable { signal, reason } => {
                unavailable.push(UnavailableSignal {
                    signal: signal.clone(),
                    reason: reason.clone(),
                });
            }
        }
    }

    if breakdown.is_empty() {
        return Err(AggregateError::NoScorersAvailable(format!(
            "all {} signals unavailable",
            unavailable.len()
        )));
    }
    if denominator <= 0.0 {
        return Err(AggregateError::NoScorersAvailable(
            "effective weight sum over scored signals is zero".to_string(),
        ));
    }

    let total = (numerator / denominator) as f32;
    Ok(AggregateScore {
        total: total.clamp(0.0, 1.0),
        breakdown,
        unavailable,
    })
}
