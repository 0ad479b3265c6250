//! Corrective instruction generation from scoring findings.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candidate::{Candidate, Reference};
use crate::score::{Finding, Severity};

/// One atomic correction directive handed to the transformer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instruction {
    /// Aspect of the candidate to fix.
    pub aspect: String,

    pub severity: Severity,

    /// Actionable text, e.g. "scale mesh to 1.0m tall to match reference".
    pub directive: String,
}

impl Instruction {
    /// Wrap a reviewer note from a checkpoint rejection as a critical
    /// directive for the next transform.
    pub fn human_feedback(note: impl Into<String>) -> Self {
        Self {
            aspect: "human_feedback".to_string(),
            severity: Severity::Critical,
            directive: note.into(),
        }
    }
}

/// Which aspects are in scope for instruction generation.
///
/// Supplied by the caller as configuration — e.g. exclude "material.*"
/// aspects when the consumer only cares about geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AspectFilter {
    /// Every aspect is in scope.
    All,
    /// Everything except the listed aspects.
    Exclude { aspects: Vec<String> },
    /// Only the listed aspects.
    Include { aspects: Vec<String> },
}

impl AspectFilter {
    /// Whether instructions may target this aspect.
    pub fn in_scope(&self, aspect: &str) -> bool {
        match self {
            Self::All => true,
            Self::Exclude { aspects } => !aspects.iter().any(|a| a == aspect),
            Self::Include { aspects } => aspects.iter().any(|a| a == aspect),
        }
    }
}

/// Derive ordered instructions from one iteration's findings.
///
/// The candidate and reference under comparison are part of the contract so
/// a context-aware generator can consult them; the default derivation works
/// from findings alone, since scorers already embed the expected/actual gap
/// in each [`Finding`].
///
/// `findings` must be in scorer registration order (findings within one
/// signal keep the order the scorer emitted them). One instruction per
/// finding at or above `floor`; findings below it are dropped as acceptable
/// deviation, and out-of-scope aspects are skipped entirely. Output is
/// sorted by severity descending with a stable sort, so equal severities
/// keep their input order — required for reproducible runs.
pub fn generate_instructions(
    candidate: &Candidate,
    reference: &Reference,
    findings: &[Finding],
    floor: Severity,
    filter: &AspectFilter,
) -> Vec<Instruction> {
    let mut instructions: Vec<Instruction> = findings
        .iter()
        .filter(|f| f.severity >= floor && filter.in_scope(&f.aspect))
        .map(|f| Instruction {
            aspect: f.aspect.clone(),
            severity: f.severity,
            directive: format!("expected {}, got {}", f.expected, f.actual),
        })
        .collect();

    // Vec::sort_by is stable; ties preserve registration order.
    instructions.sort_by(|a, b| b.severity.cmp(&a.severity));
    debug!(
        event = "delta.instructions_generated",
        candidate_revision = candidate.revision,
        reference_digest = %reference.digest,
        findings = findings.len(),
        instructions = instructions.len(),
    );
    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn finding(aspect: &str, severity: Severity) -> Finding {
        Finding {
            aspect: aspect.to_string(),
            expected: format!("{aspect}-expected"),
            actual: format!("{aspect}-actual"),
            severity,
        }
    }

    fn artifacts() -> (Candidate, Reference) {
        (
            Candidate::seed(json!({"mesh": "cube"})),
            Reference::new(json!({"mesh": "reference"})),
        )
    }

    fn generate(findings: &[Finding], floor: Severity, filter: &AspectFilter) -> Vec<Instruction> {
        let (candidate, reference) = artifacts();
        generate_instructions(&candidate, &reference, findings, floor, filter)
    }

    #[test]
    fn test_orders_by_severity_descending() {
        let findings = vec![
            finding("a", Severity::Medium),
            finding("b", Severity::Critical),
            finding("c", Severity::High),
        ];
        let out = generate(&findings, Severity::Low, &AspectFilter::All);
        let severities: Vec<Severity> = out.iter().map(|i| i.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Critical, Severity::High, Severity::Medium]
        );
    }

    #[test]
    fn test_equal_severity_preserves_registration_order() {
        let findings = vec![
            finding("first", Severity::High),
            finding("second", Severity::High),
            finding("third", Severity::High),
        ];
        let out = generate(&findings, Severity::Low, &AspectFilter::All);
        let aspects: Vec<&str> = out.iter().map(|i| i.aspect.as_str()).collect();
        assert_eq!(aspects, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_mixed_severities_stable_within_tier() {
        let findings = vec![
            finding("m1", Severity::Medium),
            finding("h1", Severity::High),
            finding("m2", Severity::Medium),
            finding("h2", Severity::High),
        ];
        let out = generate(&findings, Severity::Low, &AspectFilter::All);
        let aspects: Vec<&str> = out.iter().map(|i| i.aspect.as_str()).collect();
        assert_eq!(aspects, vec!["h1", "h2", "m1", "m2"]);
    }

    #[test]
    fn test_floor_drops_findings_below_it() {
        let findings = vec![
            finding("low", Severity::Low),
            finding("medium", Severity::Medium),
            finding("high", Severity::High),
        ];
        let out = generate(&findings, Severity::Medium, &AspectFilter::All);
        let aspects: Vec<&str> = out.iter().map(|i| i.aspect.as_str()).collect();
        assert_eq!(aspects, vec!["high", "medium"]);
    }

    #[test]
    fn test_exclude_filter_skips_out_of_scope_aspects() {
        let findings = vec![
            finding("geometry.scale", Severity::Critical),
            finding("material.albedo", Severity::Critical),
        ];
        let filter = AspectFilter::Exclude {
            aspects: vec!["material.albedo".to_string()],
        };
        let out = generate(&findings, Severity::Low, &filter);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].aspect, "geometry.scale");
    }

    #[test]
    fn test_include_filter_keeps_only_listed_aspects() {
        let findings = vec![
            finding("geometry.scale", Severity::High),
            finding("material.albedo", Severity::High),
            finding("geometry.topology", Severity::High),
        ];
        let filter = AspectFilter::Include {
            aspects: vec!["geometry.scale".to_string(), "geometry.topology".to_string()],
        };
        let out = generate(&findings, Severity::Low, &filter);
        let aspects: Vec<&str> = out.iter().map(|i| i.aspect.as_str()).collect();
        assert_eq!(aspects, vec!["geometry.scale", "geometry.topology"]);
    }

    #[test]
    fn test_directive_embeds_expected_and_actual() {
        let findings = vec![finding("timing", Severity::High)];
        let out = generate(&findings, Severity::Low, &AspectFilter::All);
        assert!(out[0].directive.contains("timing-expected"));
        assert!(out[0].directive.contains("timing-actual"));
    }

    #[test]
    fn test_human_feedback_is_critical() {
        let instruction = Instruction::human_feedback("widen the base");
        assert_eq!(instruction.severity, Severity::Critical);
        assert_eq!(instruction.aspect, "human_feedback");
        assert_eq!(instruction.directive, "widen the base");
    }

    #[test]
    fn test_aspect_filter_serde_roundtrip() {
        let filters = vec![
            AspectFilter::All,
            AspectFilter::Exclude {
                aspects: vec!["a".into()],
            },
            AspectFilter::Include {
                aspects: vec!["b".into(), "c".into()],
            },
        ];
        for filter in filters {
            let json = serde_json::to_string(&filter).expect("serialize");
            let back: AspectFilter = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(filter, back);
        }
    }
}
