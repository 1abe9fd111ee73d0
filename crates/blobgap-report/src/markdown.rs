//! Markdown consistency report.

use blobgap_core::formatting::{format_gap, format_number, seconds_with_hours};
use blobgap_core::models::{CanonicalEvent, ConsistencyVerdict};
use blobgap_data::analysis::GapOutcome;
use blobgap_data::analyzer::GapAnalysis;
use chrono::NaiveDateTime;

use crate::{ReportConfig, HISTOGRAM_FILE, TIMELINE_FILE};

const TITLE: &str = "Celestia Blob Posting Consistency Analysis";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the full report for one analysis outcome.
///
/// `generated_at` is printed as the analysis date; passing it in keeps the
/// output reproducible.
pub fn render_report(outcome: &GapOutcome, config: &ReportConfig, generated_at: NaiveDateTime) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("# {}\n", TITLE));
    lines.push(format!(
        "**Analysis Date:** {} UTC  \n**Namespace:** `{}`\n",
        generated_at.format(DATE_FORMAT),
        config.namespace
    ));

    lines.push("## Executive Summary\n".to_string());
    match outcome {
        GapOutcome::Insufficient { .. } => lines.push(
            "\u{274c} **Insufficient data** - Need at least 2 blobs to analyze consistency.\n"
                .to_string(),
        ),
        GapOutcome::Analyzed(analysis) => {
            let verdict = analysis.statistics.verdict();
            lines.push(format!(
                "{} **{}** - {} (coefficient of variation {:.2})\n",
                verdict_icon(verdict),
                verdict.label(),
                verdict.description(),
                analysis.statistics.coefficient_of_variation()
            ));
            if analysis.statistics.outlier_count > 0 {
                lines.push(format!(
                    "**{} significant gaps** detected that are much longer than usual.\n",
                    analysis.statistics.outlier_count
                ));
            } else {
                lines.push("**No significant gaps** detected - posting appears regular.\n".to_string());
            }
        }
    }

    let ordered: &[CanonicalEvent] = match outcome {
        GapOutcome::Analyzed(analysis) => &analysis.ordered,
        GapOutcome::Insufficient { ordered } => ordered,
    };
    let gap_count = outcome.analysis().map_or(0, |a| a.gaps.len());
    push_overview(&mut lines, ordered, gap_count);

    if let GapOutcome::Analyzed(analysis) = outcome {
        push_statistics(&mut lines, analysis);
        push_significant_gaps(&mut lines, analysis, config.max_outlier_rows);

        lines.push("\n## Visual Analysis\n".to_string());
        lines.push(format!("![Gaps Over Time]({})", TIMELINE_FILE));
        lines.push(format!("![Gap Distribution]({})\n", HISTOGRAM_FILE));
    }

    lines.push("---\n*Report generated automatically.*\n".to_string());
    lines.join("\n")
}

fn verdict_icon(verdict: ConsistencyVerdict) -> &'static str {
    match verdict {
        ConsistencyVerdict::Consistent => "\u{2705}",
        ConsistencyVerdict::ModeratelyConsistent => "\u{26a0}\u{fe0f}",
        ConsistencyVerdict::Inconsistent => "\u{274c}",
    }
}

fn push_overview(lines: &mut Vec<String>, ordered: &[CanonicalEvent], gap_count: usize) {
    let period_days = match (ordered.first(), ordered.last()) {
        (Some(first), Some(last)) => {
            blobgap_core::time_utils::seconds_between(&first.timestamp, &last.timestamp) / 86_400.0
        }
        _ => 0.0,
    };

    lines.push("## Data Overview\n".to_string());
    lines.push(format!("- **Total Blobs:** {}", format_number(ordered.len() as f64, 0)));
    lines.push(format!("- **Time Gaps Analyzed:** {}", format_number(gap_count as f64, 0)));
    lines.push(format!("- **Analysis Period:** {:.1} days\n", period_days));
    if let (Some(first), Some(last)) = (ordered.first(), ordered.last()) {
        lines.push(format!("- **First Blob:** {} UTC", first.timestamp.format(DATE_FORMAT)));
        lines.push(format!("- **Last Blob:** {} UTC\n", last.timestamp.format(DATE_FORMAT)));
    }
}

fn push_statistics(lines: &mut Vec<String>, analysis: &GapAnalysis) {
    let stats = &analysis.statistics;
    lines.push("## Gap Statistics\n".to_string());
    lines.push(format!("- **Average Gap:** {}", seconds_with_hours(stats.mean_gap_seconds)));
    lines.push(format!("- **Median Gap:** {}", seconds_with_hours(stats.median_gap_seconds)));
    lines.push(format!("- **Std Dev:** {}", seconds_with_hours(stats.std_gap_seconds)));
    lines.push(format!(
        "- **Shortest Gap:** {} s",
        format_number(stats.min_gap_seconds, 0)
    ));
    lines.push(format!(
        "- **Longest Gap:** {} ({})\n",
        seconds_with_hours(stats.max_gap_seconds),
        format_gap(stats.max_gap_seconds)
    ));
}

fn push_significant_gaps(lines: &mut Vec<String>, analysis: &GapAnalysis, max_rows: usize) {
    let stats = &analysis.statistics;
    lines.push("## Significant Gaps Identified\n".to_string());
    lines.push(format!(
        "**Outlier Threshold:** {} (mean + {} \u{00d7} std)\n",
        seconds_with_hours(stats.outlier_threshold),
        stats.std_k
    ));
    lines.push(
        "| Gap # | Duration (s) | Hours | Days | Before Time (UTC) | After Time (UTC) |".to_string(),
    );
    lines.push("|------:|-------------:|------:|-----:|-------------------|------------------|".to_string());

    let outliers = analysis.outlier_samples();
    for (number, sample) in outliers.iter().take(max_rows) {
        lines.push(format!(
            "| {} | {:.0} | {:.1} | {:.1} | {} | {} |",
            number,
            sample.delta_seconds,
            sample.hours(),
            sample.delta_seconds / 86_400.0,
            sample.previous.timestamp.format(DATE_FORMAT),
            sample.next.timestamp.format(DATE_FORMAT)
        ));
    }

    let hidden = outliers.len().saturating_sub(max_rows);
    if hidden > 0 {
        lines.push(format!("\n*\u{2026} and more ({} hidden)*", hidden));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use blobgap_data::analyzer::GapAnalyzer;
    use chrono::{NaiveDate, TimeDelta};
    use serde_json::json;
    use std::path::PathBuf;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn events(offsets: &[i64]) -> Vec<CanonicalEvent> {
        offsets
            .iter()
            .enumerate()
            .map(|(i, &s)| CanonicalEvent::new(json!(i), t0() + TimeDelta::seconds(s), i as i64, ""))
            .collect()
    }

    fn config(max_rows: usize) -> ReportConfig {
        ReportConfig {
            out_dir: PathBuf::from("output"),
            namespace: "0x736f76".to_string(),
            max_outlier_rows: max_rows,
        }
    }

    fn analyzed(offsets: &[i64], k: f64) -> GapOutcome {
        GapOutcome::Analyzed(GapAnalyzer::new(k).analyze(&events(offsets)).unwrap())
    }

    // ── header / summary ──────────────────────────────────────────────────────

    #[test]
    fn test_header_and_namespace() {
        let report = render_report(&analyzed(&[0, 60, 120], 2.0), &config(15), t0());
        assert!(report.starts_with("# Celestia Blob Posting Consistency Analysis"));
        assert!(report.contains("**Analysis Date:** 2024-02-01 00:00:00 UTC"));
        assert!(report.contains("**Namespace:** `0x736f76`"));
    }

    #[test]
    fn test_regular_posting_is_consistent() {
        let report = render_report(&analyzed(&[0, 60, 120, 180], 2.0), &config(15), t0());
        assert!(report.contains("**CONSISTENT**"));
        assert!(report.contains("**No significant gaps** detected"));
        assert!(report.contains("- **Total Blobs:** 4"));
        assert!(report.contains("- **Time Gaps Analyzed:** 3"));
        assert!(report.contains("![Gaps Over Time](gaps_over_time.svg)"));
        assert!(report.contains("![Gap Distribution](blob_gap_histogram.svg)"));
    }

    #[test]
    fn test_insufficient_data_message() {
        let outcome = GapOutcome::Insufficient {
            ordered: events(&[0]),
        };
        let report = render_report(&outcome, &config(15), t0());
        assert!(report.contains("**Insufficient data**"));
        assert!(report.contains("- **Total Blobs:** 1"));
        assert!(report.contains("- **Time Gaps Analyzed:** 0"));
        assert!(!report.contains("## Gap Statistics"));
        assert!(!report.contains("## Visual Analysis"));
    }

    #[test]
    fn test_insufficient_data_without_events() {
        let outcome = GapOutcome::Insufficient { ordered: vec![] };
        let report = render_report(&outcome, &config(15), t0());
        assert!(report.contains("- **Total Blobs:** 0"));
        assert!(!report.contains("First Blob"));
    }

    // ── significant gaps ──────────────────────────────────────────────────────

    #[test]
    fn test_outlier_table_rows() {
        // Eight 60s gaps then one 7200s gap.
        let mut offsets: Vec<i64> = (0..9).map(|i| i * 60).collect();
        offsets.push(8 * 60 + 7200);
        let report = render_report(&analyzed(&offsets, 2.0), &config(15), t0());

        assert!(report.contains("**1 significant gaps** detected"));
        assert!(report.contains("| 9 | 7200 | 2.0 | 0.1 | 2024-02-01 00:08:00 | 2024-02-01 02:08:00 |"));
        assert!(!report.contains("hidden"));
    }

    #[test]
    fn test_outlier_table_capped() {
        // Small k so every gap above the mean is flagged.
        let offsets = [0, 10, 20, 1000, 1010, 2000, 2010, 3000, 3010, 4000];
        let outcome = analyzed(&offsets, 0.1);
        let flagged = outcome.analysis().unwrap().statistics.outlier_count;
        assert!(flagged > 2);

        let report = render_report(&outcome, &config(2), t0());
        let rows = report
            .lines()
            .filter(|l| l.starts_with("| ") && !l.starts_with("| Gap #"))
            .count();
        assert_eq!(rows, 2);
        assert!(report.contains(&format!("and more ({} hidden)", flagged - 2)));
    }

    #[test]
    fn test_statistics_section() {
        let report = render_report(&analyzed(&[0, 60, 600], 2.0), &config(15), t0());
        assert!(report.contains("- **Average Gap:** 300 s (0.08 h)"));
        assert!(report.contains("- **Std Dev:** 240 s (0.07 h)"));
        assert!(report.contains("- **Shortest Gap:** 60 s"));
        assert!(report.contains("**Outlier Threshold:** 780 s (0.22 h)"));
    }
}
