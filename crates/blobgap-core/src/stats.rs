//! Population statistics over gap samples.

// ── Percentile helper ─────────────────────────────────────────────────────────

/// Compute the `p`-th percentile of a **sorted** slice using standard linear
/// interpolation (the same algorithm used by NumPy's `percentile` function).
///
/// Returns `0.0` for an empty slice.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    let len = sorted_data.len();
    if len == 1 {
        return sorted_data[0];
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (len as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted_data[lo];
    }
    let frac = rank - lo as f64;
    sorted_data[lo] + frac * (sorted_data[hi] - sorted_data[lo])
}

/// Return an ascending copy of `values`.
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Median of a **sorted** slice.
pub fn median(sorted_data: &[f64]) -> f64 {
    percentile(sorted_data, 50.0)
}

/// Convert whole microseconds to seconds.
pub fn micros_to_seconds(micros: i64) -> f64 {
    micros as f64 / 1_000_000.0
}

/// Population mean and standard deviation, in seconds, of durations given
/// in whole microseconds.
///
/// The sum is exact (`i128`) and divided once, so identical inputs yield a
/// mean equal to each input and a standard deviation of exactly zero.
/// Returns `(0.0, 0.0)` for an empty slice.
pub fn exact_mean_std_seconds(micros: &[i64]) -> (f64, f64) {
    if micros.is_empty() {
        return (0.0, 0.0);
    }
    let n = micros.len() as f64;
    let sum: i128 = micros.iter().map(|&us| i128::from(us)).sum();
    let mean_us = sum as f64 / n;
    let variance_us = micros
        .iter()
        .map(|&us| (us as f64 - mean_us).powi(2))
        .sum::<f64>()
        / n;
    (mean_us / 1_000_000.0, variance_us.sqrt() / 1_000_000.0)
}

// ── Histogram binning ─────────────────────────────────────────────────────────

/// Lower and upper bound on the Freedman–Diaconis bin count.
pub const MIN_BINS: usize = 10;
pub const MAX_BINS: usize = 200;
/// Bin count used when the spread cannot be estimated from the IQR.
pub const DEGENERATE_BINS: usize = 50;

/// Freedman–Diaconis bin count for a **sorted** slice, clamped to
/// [`MIN_BINS`]..=[`MAX_BINS`].
pub fn freedman_diaconis_bins(sorted_data: &[f64]) -> usize {
    if sorted_data.len() < 2 {
        return MIN_BINS;
    }
    let iqr = percentile(sorted_data, 75.0) - percentile(sorted_data, 25.0);
    if iqr <= 0.0 {
        return DEGENERATE_BINS;
    }
    let width = 2.0 * iqr * (sorted_data.len() as f64).powf(-1.0 / 3.0);
    if width <= 0.0 {
        return DEGENERATE_BINS;
    }
    let span = sorted_data[sorted_data.len() - 1] - sorted_data[0];
    ((span / width).ceil() as usize).clamp(MIN_BINS, MAX_BINS)
}

/// Whether a distribution is heavy-tailed enough for a logarithmic count axis.
pub fn is_heavy_tailed(sorted_data: &[f64]) -> bool {
    let p50 = percentile(sorted_data, 50.0);
    let p99 = percentile(sorted_data, 99.0);
    p50 > 0.0 && p99 / p50 > 50.0
}

// ── Tests ──────────────────────────────────────────────────────────────────────
