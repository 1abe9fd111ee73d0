use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Height assigned to events whose height is absent or not an integer.
pub const UNKNOWN_HEIGHT: i64 = -1;

/// Selects which input source the ingestion loader reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Prefer the aggregate document, fall back to the batch directory.
    #[default]
    Auto,
    /// Only read the aggregate document.
    Aggregate,
    /// Only read the batch directory.
    Directory,
}

impl SourceMode {
    /// Parse the CLI spelling (`auto`, `aggregate`, `directory`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "aggregate" => Some(Self::Aggregate),
            "directory" | "dir" => Some(Self::Directory),
            _ => None,
        }
    }
}

/// One blob publication event after normalisation.
///
/// Never mutated once constructed; the only way to build one from raw data is
/// the record normaliser, which guarantees a valid timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// Opaque identifier, any JSON scalar or `null` when absent.
    #[serde(default)]
    pub id: Value,
    /// UTC instant with the offset already applied and discarded.
    pub timestamp: NaiveDateTime,
    /// Ordering hint; [`UNKNOWN_HEIGHT`] when unavailable.
    #[serde(default = "unknown_height")]
    pub height: i64,
    /// Signer hash or address, empty when absent.
    #[serde(default)]
    pub signer: String,
}

fn unknown_height() -> i64 {
    UNKNOWN_HEIGHT
}

impl CanonicalEvent {
    pub fn new(id: Value, timestamp: NaiveDateTime, height: i64, signer: impl Into<String>) -> Self {
        Self {
            id,
            timestamp,
            height,
            signer: signer.into(),
        }
    }

    /// Chronological order: timestamp first, then height (lowest wins).
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then(self.height.cmp(&other.height))
    }

    /// Identifier rendered for tabular output: strings bare, `null` empty.
    pub fn id_display(&self) -> String {
        match &self.id {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// The time between two chronologically adjacent events.
///
/// Attributed to the later event's position in the ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapSample<'a> {
    pub previous: &'a CanonicalEvent,
    pub next: &'a CanonicalEvent,
    pub delta_seconds: f64,
}

impl GapSample<'_> {
    pub fn minutes(&self) -> f64 {
        self.delta_seconds / 60.0
    }

    pub fn hours(&self) -> f64 {
        self.delta_seconds / 3600.0
    }
}

/// Summary statistics over the full gap population of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapStatistics {
    /// Number of canonical events that entered the analysis.
    pub record_count: usize,
    /// Number of consecutive-pair gaps.
    pub total_gaps: usize,
    pub mean_gap_seconds: f64,
    pub median_gap_seconds: f64,
    /// Population standard deviation.
    pub std_gap_seconds: f64,
    pub min_gap_seconds: f64,
    pub max_gap_seconds: f64,
    /// Multiplier `k` used for the threshold.
    pub std_k: f64,
    /// `mean + k * std`.
    pub outlier_threshold: f64,
    pub outlier_count: usize,
    /// Outlier gap values in sequence order.
    pub outliers: Vec<f64>,
}

impl GapStatistics {
    /// Coefficient of variation; infinite when the mean gap is not positive.
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean_gap_seconds > 0.0 {
            self.std_gap_seconds / self.mean_gap_seconds
        } else {
            f64::INFINITY
        }
    }

    pub fn verdict(&self) -> ConsistencyVerdict {
        ConsistencyVerdict::from_cv(self.coefficient_of_variation())
    }

    /// Whether `gap_seconds` lies strictly above the outlier threshold.
    pub fn is_outlier(&self, gap_seconds: f64) -> bool {
        gap_seconds > self.outlier_threshold
    }
}

/// Qualitative regularity of the posting cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyVerdict {
    Consistent,
    ModeratelyConsistent,
    Inconsistent,
}

impl ConsistencyVerdict {
    /// Classify a coefficient of variation: `< 0.5`, `< 1.0`, otherwise inconsistent.
    pub fn from_cv(cv: f64) -> Self {
        if cv < 0.5 {
            Self::Consistent
        } else if cv < 1.0 {
            Self::ModeratelyConsistent
        } else {
            Self::Inconsistent
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Consistent => "CONSISTENT",
            Self::ModeratelyConsistent => "MODERATELY CONSISTENT",
            Self::Inconsistent => "INCONSISTENT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Consistent => "Low variability in posting intervals",
            Self::ModeratelyConsistent => "Some variability in posting intervals",
            Self::Inconsistent => "High variability in posting intervals",
        }
    }
}
