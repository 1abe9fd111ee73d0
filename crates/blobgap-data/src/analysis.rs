//! Main analysis pipeline.
//!
//! Orchestrates ingestion and the gap engine, returning an
//! [`AnalysisResult`] ready for the reporting layer.

use blobgap_core::data_processors::RecordNormalizer;
use blobgap_core::error::{BlobGapError, Result};
use blobgap_core::models::CanonicalEvent;
use blobgap_core::settings::AnalysisConfig;
use chrono::Utc;
use tracing::{info, warn};

use crate::analyzer::{GapAnalysis, GapAnalyzer};
use crate::reader::{load_events, IngestReport, LoadedSource};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Path of the input that supplied the events, if any did.
    pub source: Option<String>,
    /// Number of valid canonical events.
    pub events_processed: usize,
    /// Wall-clock seconds spent loading and normalising input.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent in the gap engine.
    pub analysis_time_seconds: f64,
}

/// What the gap engine produced for this run.
#[derive(Debug, Clone, PartialEq)]
pub enum GapOutcome {
    Analyzed(GapAnalysis),
    /// Fewer than two valid events; the ordered events are still available.
    Insufficient { ordered: Vec<CanonicalEvent> },
}

impl GapOutcome {
    pub fn analysis(&self) -> Option<&GapAnalysis> {
        match self {
            GapOutcome::Analyzed(analysis) => Some(analysis),
            GapOutcome::Insufficient { .. } => None,
        }
    }

    pub fn record_count(&self) -> usize {
        match self {
            GapOutcome::Analyzed(analysis) => analysis.ordered.len(),
            GapOutcome::Insufficient { ordered } => ordered.len(),
        }
    }
}

/// The complete output of [`analyze_blobs`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub outcome: GapOutcome,
    pub ingest: IngestReport,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// `InsufficientData` for an under-populated run, `Ok` otherwise.
    pub fn require_analysis(&self) -> Result<&GapAnalysis> {
        self.outcome
            .analysis()
            .ok_or(BlobGapError::InsufficientData {
                records: self.outcome.record_count(),
            })
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full analysis pipeline.
///
/// 1. Load and normalise events per `config.source`.
/// 2. Order them and compute gaps via [`GapAnalyzer`].
/// 3. Return an [`AnalysisResult`].
///
/// Fewer than two events is not an error here: it yields
/// [`GapOutcome::Insufficient`]. Only an internal consistency violation in
/// the gap engine is returned as `Err`.
pub fn analyze_blobs(config: &AnalysisConfig, normalizer: &RecordNormalizer) -> Result<AnalysisResult> {
    // ── Step 1: Load events ───────────────────────────────────────────────────
    let load_start = std::time::Instant::now();
    let loaded = load_events(config, normalizer);
    let load_time = load_start.elapsed().as_secs_f64();

    let ingest = loaded.report;
    if ingest.fragments_skipped > 0 || ingest.records_rejected > 0 {
        warn!(
            "Ingestion dropped {} malformed fragment(s) and {} invalid record(s)",
            ingest.fragments_skipped, ingest.records_rejected
        );
    }

    // ── Step 2: Gap engine ────────────────────────────────────────────────────
    let analysis_start = std::time::Instant::now();
    let analyzer = GapAnalyzer::new(config.std_k);
    let outcome = match analyzer.analyze(&loaded.events) {
        Ok(analysis) => GapOutcome::Analyzed(analysis),
        Err(BlobGapError::InsufficientData { records }) => {
            info!("Only {} valid record(s); skipping gap statistics", records);
            GapOutcome::Insufficient {
                ordered: GapAnalyzer::order_events(&loaded.events),
            }
        }
        Err(e) => return Err(e),
    };
    let analysis_time = analysis_start.elapsed().as_secs_f64();

    // ── Step 3: Build result ──────────────────────────────────────────────────
    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        source: ingest.source.as_ref().map(|s| match s {
            LoadedSource::Aggregate(p) | LoadedSource::Directory(p) => p.display().to_string(),
        }),
        events_processed: outcome.record_count(),
        load_time_seconds: load_time,
        analysis_time_seconds: analysis_time,
    };

    Ok(AnalysisResult {
        outcome,
        ingest,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
