//! Plain-text run summary printed by the CLI after the artifacts are written.

use blobgap_data::analysis::{AnalysisResult, GapOutcome};

use crate::ReportArtifacts;

/// One line per fact; no trailing newline.
pub fn run_summary(result: &AnalysisResult, artifacts: &ReportArtifacts) -> String {
    let mut lines = Vec::new();

    match &result.outcome {
        GapOutcome::Insufficient { ordered } => {
            lines.push(format!(
                "Insufficient data: {} valid record(s), at least 2 are needed",
                ordered.len()
            ));
        }
        GapOutcome::Analyzed(analysis) => {
            lines.push(format!(
                "Loaded {} blobs  |  Computed {} gaps",
                analysis.ordered.len(),
                analysis.gaps.len()
            ));
        }
    }

    let ingest = &result.ingest;
    if ingest.records_rejected > 0 || ingest.fragments_skipped > 0 || ingest.files_failed > 0 {
        lines.push(format!(
            "Skipped: {} invalid record(s), {} malformed fragment(s), {} unreadable file(s)",
            ingest.records_rejected, ingest.fragments_skipped, ingest.files_failed
        ));
    }

    if let Some(path) = &artifacts.timeline {
        lines.push(format!("Timeline: {}", path.display()));
    }
    if let Some(path) = &artifacts.histogram {
        lines.push(format!("Histogram: {}", path.display()));
    }
    lines.push(format!("Report: {}", artifacts.report.display()));
    lines.push(format!("Proof CSV: {}", artifacts.proof_list.display()));
    if let Some(path) = &artifacts.statistics {
        lines.push(format!("Statistics: {}", path.display()));
    }

    if let GapOutcome::Analyzed(analysis) = &result.outcome {
        let stats = &analysis.statistics;
        lines.push(format!(
            "Outliers (> mean + {}*std): {}  |  Largest gap: {:.2} h",
            stats.std_k,
            stats.outlier_count,
            stats.max_gap_seconds / 3600.0
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobgap_core::models::CanonicalEvent;
    use blobgap_data::analysis::AnalysisMetadata;
    use blobgap_data::analyzer::GapAnalyzer;
    use blobgap_data::reader::IngestReport;
    use chrono::{NaiveDate, TimeDelta};
    use serde_json::json;
    use std::path::PathBuf;

    fn result(outcome: GapOutcome, ingest: IngestReport) -> AnalysisResult {
        AnalysisResult {
            metadata: AnalysisMetadata {
                generated_at: String::new(),
                source: None,
                events_processed: outcome.record_count(),
                load_time_seconds: 0.0,
                analysis_time_seconds: 0.0,
            },
            outcome,
            ingest,
        }
    }

    fn artifacts(with_charts: bool) -> ReportArtifacts {
        let chart = |name: &str| with_charts.then(|| PathBuf::from("out").join(name));
        ReportArtifacts {
            report: PathBuf::from("out/blob_consistency_report.md"),
            proof_list: PathBuf::from("out/proof_list.csv"),
            timeline: chart("gaps_over_time.svg"),
            histogram: chart("blob_gap_histogram.svg"),
            statistics: chart("gap_statistics.json"),
        }
    }

    #[test]
    fn test_summary_for_analyzed_run() {
        let t0 = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let events: Vec<CanonicalEvent> = [0, 3600, 9000]
            .iter()
            .map(|&s| CanonicalEvent::new(json!(null), t0 + TimeDelta::seconds(s), -1, ""))
            .collect();
        let outcome = GapOutcome::Analyzed(GapAnalyzer::new(2.0).analyze(&events).unwrap());

        let text = run_summary(&result(outcome, IngestReport::default()), &artifacts(true));
        assert!(text.starts_with("Loaded 3 blobs  |  Computed 2 gaps"));
        assert!(text.contains("Timeline: "));
        assert!(text.ends_with("Outliers (> mean + 2*std): 0  |  Largest gap: 1.50 h"));
        assert!(!text.contains("Skipped"));
    }

    #[test]
    fn test_summary_for_insufficient_run() {
        let ingest = IngestReport {
            records_rejected: 3,
            ..IngestReport::default()
        };
        let outcome = GapOutcome::Insufficient { ordered: vec![] };
        let text = run_summary(&result(outcome, ingest), &artifacts(false));
        assert!(text.starts_with("Insufficient data: 0 valid record(s)"));
        assert!(text.contains("Skipped: 3 invalid record(s)"));
        assert!(!text.contains("Timeline"));
        assert!(!text.contains("Outliers"));
    }
}
