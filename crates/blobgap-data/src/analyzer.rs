//! Gap and anomaly engine.
//!
//! Orders canonical events chronologically, measures the time between each
//! adjacent pair and flags gaps above `mean + k * std` of the whole gap
//! population. Everything is recomputed from scratch on every call.

use blobgap_core::error::{BlobGapError, Result};
use blobgap_core::models::{CanonicalEvent, GapSample, GapStatistics};
use blobgap_core::settings::DEFAULT_STD_K;
use blobgap_core::stats::{exact_mean_std_seconds, median, micros_to_seconds, sorted_copy};
use blobgap_core::time_utils::{format_space_separated, seconds_between};
use tracing::debug;

// ── GapAnalysis ───────────────────────────────────────────────────────────────

/// Ordered events, their gaps and the statistics derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct GapAnalysis {
    /// Events sorted by `(timestamp, height)`.
    pub ordered: Vec<CanonicalEvent>,
    /// `gaps[i]` is the gap from `ordered[i]` to `ordered[i + 1]`, in seconds.
    pub gaps: Vec<f64>,
    pub statistics: GapStatistics,
}

impl GapAnalysis {
    /// Consecutive pairs with their gap, in sequence order.
    pub fn samples(&self) -> Vec<GapSample<'_>> {
        self.ordered
            .windows(2)
            .zip(&self.gaps)
            .map(|(pair, &delta_seconds)| GapSample {
                previous: &pair[0],
                next: &pair[1],
                delta_seconds,
            })
            .collect()
    }

    /// Pairs whose gap exceeds the outlier threshold, with their 1-based gap number.
    pub fn outlier_samples(&self) -> Vec<(usize, GapSample<'_>)> {
        self.samples()
            .into_iter()
            .enumerate()
            .filter(|(_, s)| self.statistics.is_outlier(s.delta_seconds))
            .map(|(i, s)| (i + 1, s))
            .collect()
    }

    pub fn first_event(&self) -> Option<&CanonicalEvent> {
        self.ordered.first()
    }

    pub fn last_event(&self) -> Option<&CanonicalEvent> {
        self.ordered.last()
    }

    /// Days between the first and last event.
    pub fn period_days(&self) -> f64 {
        match (self.first_event(), self.last_event()) {
            (Some(first), Some(last)) => {
                seconds_between(&first.timestamp, &last.timestamp) / 86_400.0
            }
            _ => 0.0,
        }
    }
}

// ── GapAnalyzer ───────────────────────────────────────────────────────────────

/// Computes gaps and outlier statistics for a fixed multiplier `k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapAnalyzer {
    std_k: f64,
}

impl Default for GapAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_STD_K)
    }
}

impl GapAnalyzer {
    /// Create an analyser flagging gaps above `mean + std_k * std`.
    pub fn new(std_k: f64) -> Self {
        Self { std_k }
    }

    pub fn std_k(&self) -> f64 {
        self.std_k
    }

    // ── Public methods ────────────────────────────────────────────────────────

    /// Run the full engine over an unordered event collection.
    ///
    /// Fails with [`BlobGapError::InsufficientData`] for fewer than two
    /// events and with [`BlobGapError::Consistency`] if ordering ever yields
    /// a negative gap.
    pub fn analyze(&self, events: &[CanonicalEvent]) -> Result<GapAnalysis> {
        let ordered = Self::order_events(events);
        if ordered.len() < 2 {
            return Err(BlobGapError::InsufficientData {
                records: ordered.len(),
            });
        }

        let gap_micros = Self::compute_gap_micros(&ordered)?;
        let statistics = self.summarize(ordered.len(), &gap_micros)?;
        let gaps: Vec<f64> = gap_micros.into_iter().map(micros_to_seconds).collect();

        debug!(
            "Analysed {} events: {} gaps, threshold {:.3}s, {} outliers",
            ordered.len(),
            gaps.len(),
            statistics.outlier_threshold,
            statistics.outlier_count
        );

        Ok(GapAnalysis {
            ordered,
            gaps,
            statistics,
        })
    }

    /// Sort by `(timestamp, height)` ascending. Fully tied events keep their
    /// input order.
    pub fn order_events(events: &[CanonicalEvent]) -> Vec<CanonicalEvent> {
        let mut ordered = events.to_vec();
        ordered.sort_by(|a, b| a.chronological_cmp(b));
        ordered
    }

    /// Seconds between each adjacent pair of an ordered sequence.
    pub fn compute_gaps(ordered: &[CanonicalEvent]) -> Result<Vec<f64>> {
        Ok(Self::compute_gap_micros(ordered)?
            .into_iter()
            .map(micros_to_seconds)
            .collect())
    }

    /// Whole microseconds between each adjacent pair of an ordered sequence.
    pub fn compute_gap_micros(ordered: &[CanonicalEvent]) -> Result<Vec<i64>> {
        ordered
            .windows(2)
            .map(|pair| {
                let (prev, next) = (&pair[0].timestamp, &pair[1].timestamp);
                let delta = (*next - *prev).num_microseconds().ok_or_else(|| {
                    BlobGapError::Consistency(format!(
                        "gap between {} and {} overflows microsecond precision",
                        format_space_separated(prev),
                        format_space_separated(next)
                    ))
                })?;
                if delta < 0 {
                    return Err(BlobGapError::Consistency(format!(
                        "negative gap of {}s between {} and {}",
                        micros_to_seconds(delta),
                        format_space_separated(prev),
                        format_space_separated(next)
                    )));
                }
                Ok(delta)
            })
            .collect()
    }

    /// Population statistics and outliers for one gap population, given in
    /// whole microseconds.
    pub fn summarize(&self, record_count: usize, gap_micros: &[i64]) -> Result<GapStatistics> {
        if gap_micros.is_empty() {
            return Err(BlobGapError::InsufficientData {
                records: record_count,
            });
        }

        let gaps: Vec<f64> = gap_micros.iter().copied().map(micros_to_seconds).collect();
        let (mean_gap, std_gap) = exact_mean_std_seconds(gap_micros);
        let sorted = sorted_copy(&gaps);
        let threshold = mean_gap + self.std_k * std_gap;
        let outliers: Vec<f64> = gaps.iter().copied().filter(|&g| g > threshold).collect();

        Ok(GapStatistics {
            record_count,
            total_gaps: gaps.len(),
            mean_gap_seconds: mean_gap,
            median_gap_seconds: median(&sorted),
            std_gap_seconds: std_gap,
            min_gap_seconds: sorted[0],
            max_gap_seconds: sorted[sorted.len() - 1],
            std_k: self.std_k,
            outlier_threshold: threshold,
            outlier_count: outliers.len(),
            outliers,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
