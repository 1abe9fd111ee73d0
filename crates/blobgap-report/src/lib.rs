//! Reporting layer for the blob gap analyser.
//!
//! Turns an [`AnalysisResult`] into the run's output artifacts: the Markdown
//! consistency report, the per-pair audit CSV, the statistics JSON and two
//! SVG charts.

pub mod charts;
pub mod markdown;
pub mod proof_list;
pub mod summary;

use std::path::{Path, PathBuf};

use blobgap_core::error::Result;
use blobgap_core::settings::{Settings, DEFAULT_MAX_OUTLIER_ROWS};
use blobgap_data::analysis::{AnalysisResult, GapOutcome};
use chrono::Utc;
use tracing::{debug, info};

pub const TIMELINE_FILE: &str = "gaps_over_time.svg";
pub const HISTOGRAM_FILE: &str = "blob_gap_histogram.svg";
pub const REPORT_FILE: &str = "blob_consistency_report.md";
pub const PROOF_LIST_FILE: &str = "proof_list.csv";
pub const STATISTICS_FILE: &str = "gap_statistics.json";

// ── ReportConfig ──────────────────────────────────────────────────────────────

/// Where and how the reporting layer writes its artifacts.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub out_dir: PathBuf,
    /// Namespace shown in the report header.
    pub namespace: String,
    /// Maximum rows in the significant-gaps table.
    pub max_outlier_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("output"),
            namespace: "N/A".to_string(),
            max_outlier_rows: DEFAULT_MAX_OUTLIER_ROWS,
        }
    }
}

impl From<&Settings> for ReportConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            out_dir: settings.out_dir.clone(),
            namespace: settings.namespace.clone(),
            max_outlier_rows: settings.max_outlier_rows,
        }
    }
}

// ── ReportArtifacts ───────────────────────────────────────────────────────────

/// Paths written by [`write_reports`]. Charts and statistics are only
/// produced when there were gaps to analyse.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifacts {
    pub report: PathBuf,
    pub proof_list: PathBuf,
    pub timeline: Option<PathBuf>,
    pub histogram: Option<PathBuf>,
    pub statistics: Option<PathBuf>,
}

impl ReportArtifacts {
    /// Every path that exists after the run.
    pub fn paths(&self) -> Vec<&Path> {
        let mut paths = vec![self.report.as_path(), self.proof_list.as_path()];
        paths.extend(
            [&self.timeline, &self.histogram, &self.statistics]
                .into_iter()
                .flatten()
                .map(PathBuf::as_path),
        );
        paths
    }
}

// ── write_reports ─────────────────────────────────────────────────────────────

/// Write every artifact for `result` into `config.out_dir`.
///
/// The directory is created when missing and existing files are overwritten.
/// For an under-populated run the report and an empty audit CSV are still
/// written; chart and statistics files left by an earlier run are removed.
pub fn write_reports(result: &AnalysisResult, config: &ReportConfig) -> Result<ReportArtifacts> {
    std::fs::create_dir_all(&config.out_dir)?;
    let out = |name: &str| config.out_dir.join(name);

    let report_path = out(REPORT_FILE);
    let markdown = markdown::render_report(&result.outcome, config, Utc::now().naive_utc());
    std::fs::write(&report_path, markdown)?;
    info!("Wrote report to {}", report_path.display());

    let proof_path = out(PROOF_LIST_FILE);
    let samples = result
        .outcome
        .analysis()
        .map(|a| a.samples())
        .unwrap_or_default();
    proof_list::write_proof_list_file(&proof_path, &samples)?;

    let mut artifacts = ReportArtifacts {
        report: report_path,
        proof_list: proof_path,
        timeline: None,
        histogram: None,
        statistics: None,
    };

    match &result.outcome {
        GapOutcome::Analyzed(analysis) => {
            let timeline = out(TIMELINE_FILE);
            std::fs::write(&timeline, charts::timeline_svg(analysis))?;
            let histogram = out(HISTOGRAM_FILE);
            std::fs::write(&histogram, charts::histogram_svg(&analysis.gaps))?;
            let statistics = out(STATISTICS_FILE);
            std::fs::write(
                &statistics,
                serde_json::to_string_pretty(&analysis.statistics)?,
            )?;
            debug!("Wrote charts and statistics to {}", config.out_dir.display());

            artifacts.timeline = Some(timeline);
            artifacts.histogram = Some(histogram);
            artifacts.statistics = Some(statistics);
        }
        GapOutcome::Insufficient { .. } => {
            for name in [TIMELINE_FILE, HISTOGRAM_FILE, STATISTICS_FILE] {
                remove_stale(&out(name))?;
            }
        }
    }

    Ok(artifacts)
}

fn remove_stale(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale artifact {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
