//! Persisted run report artifacts for audit and ops reporting.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::policy::Decision;

/// One iteration row in the persisted run report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IterationRowArtifact {
    pub iteration: u32,
    pub candidate_revision: u32,
    pub candidate_digest: String,
    pub total: f32,
    pub decision: Decision,
    /// Signals that produced no score this iteration.
    pub unavailable_signals: usize,
    /// Instructions handed to the transformer after this iteration.
    pub instructions: usize,
}

/// Summary section persisted in run_report.json.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummaryArtifact {
    pub outcome: String,
    pub total_iterations: u32,
    pub elapsed_ms: u64,
    pub best_iteration: Option<u32>,
    pub best_total: Option<f32>,
}

/// Canonical run report artifact written for audit and reporting surfaces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReportArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub run_id: Uuid,
    pub summary: RunSummaryArtifact,
    pub iterations: Vec<IterationRowArtifact>,
}

/// Write run_report.json in pretty JSON format.
pub fn write_run_report_json(path: &Path, artifact: &RunReportArtifact) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact).context("serialize run report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render a markdown summary for PR/comment/ops output.
pub fn render_run_summary_md(artifact: &RunReportArtifact) -> String {
    let mut out = String::new();
    out.push_str("# Run Summary\n\n");
    out.push_str(&format!(
        "- run: `{}`\n- outcome: **{}**\n- iterations: {}\n- elapsed: {}ms\n",
        artifact.run_id,
        artifact.summary.outcome,
        artifact.summary.total_iterations,
        artifact.summary.elapsed_ms,
    ));
    match (artifact.summary.best_iteration, artifact.summary.best_total) {
        (Some(iteration), Some(total)) => {
            out.push_str(&format!(
                "- best: iteration {} at {:.3}\n\n",
                iteration, total
            ));
        }
        _ => out.push_str("- best: none\n\n"),
    }

    if !artifact.iterations.is_empty() {
        out.push_str("## Iterations\n\n");
        out.push_str("| # | revision | total | decision | unavailable | instructions |\n");
        out.push_str("|---|----------|-------|----------|-------------|--------------|\n");
        for row in &artifact.iterations {
            out.push_str(&format!(
                "| {} | {} | {:.3} | {} | {} | {} |\n",
                row.iteration,
                row.candidate_revision,
                row.total,
                row.decision,
                row.unavailable_signals,
                row.instructions,
            ));
        }
    }
    out
}

/// Write run_summary.md.
pub fn write_run_summary_md(path: &Path, artifact: &RunReportArtifact) -> Result<()> {
    let md = render_run_summary_md(artifact);
    std::fs::write(path, md).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_artifact() -> RunReportArtifact {
        RunReportArtifact {
            schema_version: "1.0".to_string(),
            generated_at: DateTime::parse_from_rfc3339("2026-02-01T00:00:00Z")
                .expect("parse RFC3339")
                .with_timezone(&Utc),
            run_id: Uuid::parse_str("22222222-2222-2222-2222-222222222222").expect("valid UUID"),
            summary: RunSummaryArtifact {
                outcome: "converged".to_string(),
                total_iterations: 2,
                elapsed_ms: 1200,
                best_iteration: Some(2),
                best_total: Some(0.93),
            },
            iterations: vec![
                IterationRowArtifact {
                    iteration: 1,
                    candidate_revision: 0,
                    candidate_digest: "abc".to_string(),
                    total: 0.71,
                    decision: Decision::Continue,
                    unavailable_signals: 0,
                    instructions: 3,
                },
                IterationRowArtifact {
                    iteration: 2,
                    candidate_revision: 1,
                    candidate_digest: "def".to_string(),
                    total: 0.93,
                    decision: Decision::Converged,
                    unavailable_signals: 1,
                    instructions: 0,
                },
            ],
        }
    }

    #[test]
    fn run_report_schema_has_expected_keys() {
        let artifact = sample_artifact();
        let value = serde_json::to_value(&artifact).expect("serialize");
        assert_eq!(value["schema_version"], "1.0");
        assert!(value["summary"]["outcome"].is_string());
        assert_eq!(value["iterations"].as_array().map(|a| a.len()), Some(2));
        assert_eq!(value["iterations"][0]["decision"], "continue");
    }

    #[test]
    fn write_and_read_back_run_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run_report.json");
        let artifact = sample_artifact();

        write_run_report_json(&path, &artifact).expect("write");
        let content = std::fs::read_to_string(&path).expect("read");
        let back: RunReportArtifact = serde_json::from_str(&content).expect("deserialize");
        assert_eq!(artifact, back);
    }

    #[test]
    fn write_and_read_back_run_summary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run_summary.md");
        let artifact = sample_artifact();

        write_run_summary_md(&path, &artifact).expect("write");
        let content = std::fs::read_to_string(&path).expect("read");
        assert_eq!(content, render_run_summary_md(&artifact));
        assert!(content.contains("# Run Summary"));
    }

    #[test]
    fn markdown_summary_lists_iterations() {
        let md = render_run_summary_md(&sample_artifact());
        assert!(md.contains("# Run Summary"));
        assert!(md.contains("**converged**"));
        assert!(md.contains("| 1 | 0 | 0.710 | continue | 0 | 3 |"));
        assert!(md.contains("| 2 | 1 | 0.930 | converged | 1 | 0 |"));
    }

    #[test]
    fn markdown_summary_without_best() {
        let mut artifact = sample_artifact();
        artifact.summary.best_iteration = None;
        artifact.summary.best_total = None;
        artifact.iterations.clear();
        let md = render_run_summary_md(&artifact);
        assert!(md.contains("best: none"));
        assert!(!md.contains("## Iterations"));
    }
}
