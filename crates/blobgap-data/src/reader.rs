//! Input discovery and loading for the blob gap analyser.
//!
//! Reads either one aggregate document (`result.json` holding `{"blobs": [...]}`)
//! or a directory of `blob_batch_<n>.json` files, and turns every recovered
//! object into a [`CanonicalEvent`]. Per-record and per-file failures are
//! logged, counted in an [`IngestReport`] and skipped.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use blobgap_core::data_processors::RecordNormalizer;
use blobgap_core::error::{BlobGapError, Result};
use blobgap_core::models::{CanonicalEvent, SourceMode};
use blobgap_core::settings::AnalysisConfig;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::fragments::extract_fragments;

/// Conventional key holding the record list in an aggregate document.
pub const AGGREGATE_KEY: &str = "blobs";

/// Secondary key tried when [`AGGREGATE_KEY`] is absent.
pub const AGGREGATE_FALLBACK_KEY: &str = "items";

fn batch_file_re() -> &'static Regex {
    static BATCH_FILE_RE: OnceLock<Regex> = OnceLock::new();
    BATCH_FILE_RE.get_or_init(|| {
        Regex::new(r"^blob_batch_(.+)\.json$").expect("valid batch file regex")
    })
}

// ── Public types ──────────────────────────────────────────────────────────────

/// Which input actually supplied the events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedSource {
    Aggregate(PathBuf),
    Directory(PathBuf),
}

/// Counters describing what ingestion read, recovered and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// The source whose events were returned, `None` when nothing loaded.
    pub source: Option<LoadedSource>,
    /// Files opened successfully (aggregate document included).
    pub files_read: usize,
    /// Files that could not be read or parsed at all.
    pub files_failed: usize,
    /// Raw objects handed to the record normaliser.
    pub fragments_recovered: usize,
    /// Text chunks no extraction strategy could decode.
    pub fragments_skipped: usize,
    /// Objects rejected by the record normaliser.
    pub records_rejected: usize,
}

/// The output of [`load_events`].
#[derive(Debug, Clone, Default)]
pub struct LoadedEvents {
    /// Canonical events in discovery order (not yet sorted).
    pub events: Vec<CanonicalEvent>,
    pub report: IngestReport,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load canonical events according to `config.source`.
///
/// In [`SourceMode::Auto`] the aggregate document wins when it exists and
/// yields at least one valid record; otherwise the batch directory is read.
/// Never fails: an empty result is reported through the returned value.
pub fn load_events(config: &AnalysisConfig, normalizer: &RecordNormalizer) -> LoadedEvents {
    let mut report = IngestReport::default();

    let try_aggregate = matches!(config.source, SourceMode::Auto | SourceMode::Aggregate);
    let try_directory = matches!(config.source, SourceMode::Auto | SourceMode::Directory);

    if try_aggregate {
        let path = &config.result_json;
        if config.source == SourceMode::Auto && !path.is_file() {
            debug!("Aggregate document {} not present", path.display());
        } else {
            match load_from_result_json(path, normalizer, &mut report) {
                Ok(events) if !events.is_empty() => {
                    info!("Loaded {} events from {}", events.len(), path.display());
                    report.source = Some(LoadedSource::Aggregate(path.clone()));
                    return LoadedEvents { events, report };
                }
                Ok(_) => warn!("No valid records in {}", path.display()),
                Err(e) => {
                    report.files_failed += 1;
                    warn!("{}", e);
                }
            }
        }
    }

    if try_directory {
        let dir = &config.data_dir;
        match load_from_data_dir(dir, normalizer, &mut report) {
            Ok(events) => {
                if !events.is_empty() {
                    info!("Loaded {} events from {}", events.len(), dir.display());
                    report.source = Some(LoadedSource::Directory(dir.clone()));
                }
                return LoadedEvents { events, report };
            }
            Err(e) => warn!("{}", e),
        }
    }

    LoadedEvents {
        events: Vec::new(),
        report,
    }
}

/// Find all `blob_batch_*.json` files directly inside `data_dir`.
///
/// Sorted by numeric batch index where the suffix is a number, then by name.
/// Batch entries that cannot be inspected (dangling links, permission
/// errors) are logged and counted in `report.files_failed`.
pub fn find_batch_files(data_dir: &Path, report: &mut IngestReport) -> Result<Vec<PathBuf>> {
    if !data_dir.is_dir() {
        return Err(BlobGapError::SourceUnavailable {
            path: data_dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let mut files: Vec<(Option<u64>, PathBuf)> = walkdir::WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                record_walk_error(&e, report);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let index = {
                let name = entry.file_name().to_str()?;
                let caps = batch_file_re().captures(name)?;
                caps.get(1).and_then(|m| m.as_str().parse::<u64>().ok())
            };
            Some((index, entry.into_path()))
        })
        .collect();

    // Numbered batches first, in numeric order; anything else by name.
    files.sort_by(|(ia, pa), (ib, pb)| match (ia, ib) {
        (Some(a), Some(b)) => a.cmp(b).then_with(|| pa.cmp(pb)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => pa.cmp(pb),
    });

    Ok(files.into_iter().map(|(_, p)| p).collect())
}

/// Load events from an aggregate document.
///
/// Fails only when the file cannot be read or is not JSON at all.
pub fn load_from_result_json(
    path: &Path,
    normalizer: &RecordNormalizer,
    report: &mut IngestReport,
) -> Result<Vec<CanonicalEvent>> {
    let text = std::fs::read_to_string(path).map_err(|source| BlobGapError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;
    report.files_read += 1;

    let items = aggregate_items(document);
    if items.is_empty() {
        warn!("{} holds no record list", path.display());
    }

    Ok(normalize_all(&items, normalizer, path, report))
}

/// Load events from every batch file in `data_dir`.
///
/// Only a missing directory is an error; unreadable files are skipped.
pub fn load_from_data_dir(
    data_dir: &Path,
    normalizer: &RecordNormalizer,
    report: &mut IngestReport,
) -> Result<Vec<CanonicalEvent>> {
    let failed_before = report.files_failed;
    let files = find_batch_files(data_dir, report)?;
    if files.is_empty() && report.files_failed == failed_before {
        warn!("No blob_batch_*.json files found in {}", data_dir.display());
    }

    let mut events = Vec::new();
    for file_path in &files {
        events.extend(process_batch_file(file_path, normalizer, report));
    }

    debug!(
        "Processed {} events from {} files",
        events.len(),
        files.len()
    );
    Ok(events)
}

/// Pick the record list out of an aggregate document.
///
/// `{"blobs": [...]}` is the convention; a bare array is used directly;
/// otherwise `"items"` and then the first list-valued field are tried.
pub fn aggregate_items(document: Value) -> Vec<Value> {
    match document {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove(AGGREGATE_KEY) {
                return items;
            }
            warn!(
                "Aggregate document has no '{}' list, trying a looser search",
                AGGREGATE_KEY
            );
            if let Some(Value::Array(items)) = map.remove(AGGREGATE_FALLBACK_KEY) {
                return items;
            }
            map.into_iter()
                .find_map(|(_, v)| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                })
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Report a directory entry walkdir could not resolve.
///
/// Only entries named like a batch file count as failed files.
fn record_walk_error(err: &walkdir::Error, report: &mut IngestReport) {
    let is_batch = err
        .path()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .is_some_and(|name| batch_file_re().is_match(name));
    if is_batch {
        report.files_failed += 1;
        warn!("Failed to inspect batch file: {}", err);
    } else {
        debug!("Skipping unreadable directory entry: {}", err);
    }
}

/// Read one batch file and normalise its fragments; failures are absorbed.
fn process_batch_file(
    file_path: &Path,
    normalizer: &RecordNormalizer,
    report: &mut IngestReport,
) -> Vec<CanonicalEvent> {
    let text = match std::fs::read_to_string(file_path) {
        Ok(t) => t,
        Err(e) => {
            report.files_failed += 1;
            warn!("Failed to read file {}: {}", file_path.display(), e);
            return Vec::new();
        }
    };
    report.files_read += 1;

    let extraction = extract_fragments(&text);
    for skip in &extraction.skipped {
        warn!("Skipping fragment in {}: {}", file_path.display(), skip);
    }
    report.fragments_skipped += extraction.skipped.len();

    debug!(
        "File {}: {} fragments via {} strategy",
        file_path.display(),
        extraction.fragments.len(),
        extraction.strategy.as_str()
    );

    normalize_all(&extraction.fragments, normalizer, file_path, report)
}

fn normalize_all(
    items: &[Value],
    normalizer: &RecordNormalizer,
    origin: &Path,
    report: &mut IngestReport,
) -> Vec<CanonicalEvent> {
    let mut events = Vec::with_capacity(items.len());
    for item in items {
        report.fragments_recovered += 1;
        if !item.is_object() {
            report.records_rejected += 1;
            warn!("Skipping non-object record in {}", origin.display());
            continue;
        }
        match normalizer.normalize(item) {
            Ok(event) => events.push(event),
            Err(e) => {
                report.records_rejected += 1;
                warn!("Skipping invalid record in {}: {}", origin.display(), e);
            }
        }
    }
    events
}

// ── Tests ─────────────────────────────────────────────────────────────────────
