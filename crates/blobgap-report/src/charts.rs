//! SVG charts for the gap report.
//!
//! Two charts are produced, both as self-contained SVG documents:
//!
//! * **Timeline**: gap length in hours over the later event's timestamp,
//!   with a median line, outliers highlighted and labelled, and a summary box.
//! * **Histogram**: distribution of gap lengths in hours with mean, median
//!   and 95th-percentile markers. The count axis switches to a logarithmic
//!   scale for heavy-tailed distributions.

use blobgap_core::models::GapStatistics;
use blobgap_core::stats::{freedman_diaconis_bins, is_heavy_tailed, mean, median, percentile, sorted_copy};
use blobgap_core::time_utils::seconds_between;
use blobgap_data::analyzer::GapAnalysis;
use chrono::{NaiveDateTime, TimeDelta};

const TIMELINE_WIDTH: f64 = 1600.0;
const TIMELINE_HEIGHT: f64 = 900.0;
const HISTOGRAM_WIDTH: f64 = 1200.0;
const HISTOGRAM_HEIGHT: f64 = 700.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 90.0;
const MARGIN_BOTTOM: f64 = 90.0;
const Y_TICKS: usize = 5;
const X_TICKS: usize = 6;

const NORMAL_COLOR: &str = "#b0c4de";
const MEDIAN_COLOR: &str = "#2e8b57";
const OUTLIER_COLOR: &str = "#d9534f";
const OUTLIER_EDGE: &str = "#8b0000";
const BAR_COLOR: &str = "#1f77b4";
const GRID_COLOR: &str = "#dddddd";

// ── Plot geometry ─────────────────────────────────────────────────────────────

/// Inner drawing rectangle; fractions in `[0, 1]` map onto it.
#[derive(Debug, Clone, Copy)]
struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl PlotArea {
    fn for_canvas(width: f64, height: f64) -> Self {
        Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: width - MARGIN_LEFT - MARGIN_RIGHT,
            height: height - MARGIN_TOP - MARGIN_BOTTOM,
        }
    }

    fn x(&self, frac: f64) -> f64 {
        self.left + frac.clamp(0.0, 1.0) * self.width
    }

    fn y(&self, frac: f64) -> f64 {
        self.top + (1.0 - frac.clamp(0.0, 1.0)) * self.height
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

// ── Timeline ──────────────────────────────────────────────────────────────────

/// Render the gap timeline.
pub fn timeline_svg(analysis: &GapAnalysis) -> String {
    let stats = &analysis.statistics;
    let samples = analysis.samples();
    let area = PlotArea::for_canvas(TIMELINE_WIDTH, TIMELINE_HEIGHT);

    let hours: Vec<f64> = analysis.gaps.iter().map(|g| g / 3600.0).collect();
    let max_hours = hours.iter().copied().fold(0.0_f64, f64::max);
    let y_top = if max_hours > 0.0 { max_hours * 1.1 } else { 1.0 };

    let (start, end) = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => (first.next.timestamp, last.next.timestamp),
        _ => return empty_chart(TIMELINE_WIDTH, TIMELINE_HEIGHT, "No gaps to plot"),
    };
    let span = seconds_between(&start, &end);
    let x_frac = |ts: &NaiveDateTime| {
        if span > 0.0 {
            seconds_between(&start, ts) / span
        } else {
            0.5
        }
    };

    let mut svg = open_svg(TIMELINE_WIDTH, TIMELINE_HEIGHT);
    svg.push_str(&text(
        TIMELINE_WIDTH / 2.0,
        34.0,
        18,
        "middle",
        "Celestia Blob Posting Gaps Over Time",
    ));
    svg.push_str(&text(
        TIMELINE_WIDTH / 2.0,
        58.0,
        13,
        "middle",
        "(Red dots show abnormally long gaps)",
    ));

    draw_y_axis(&mut svg, &area, y_top, |v| format!("{:.1}", v));
    for i in 0..X_TICKS {
        let frac = i as f64 / (X_TICKS - 1) as f64;
        let micros = (span * frac * 1_000_000.0).round() as i64;
        let tick = start + TimeDelta::microseconds(micros);
        let x = area.x(frac);
        svg.push_str(&line(x, area.bottom(), x, area.bottom() + 6.0, "#333333", 1.0, None));
        svg.push_str(&text(
            x,
            area.bottom() + 22.0,
            11,
            "middle",
            &tick.format("%Y-%m-%d %H:%M").to_string(),
        ));
    }
    draw_frame(&mut svg, &area);
    svg.push_str(&text(
        area.left + area.width / 2.0,
        TIMELINE_HEIGHT - 30.0,
        13,
        "middle",
        "Date (UTC)",
    ));
    svg.push_str(&vertical_label(24.0, area.top + area.height / 2.0, "Gap Between Blobs (hours)"));

    // Series
    let points: Vec<String> = samples
        .iter()
        .zip(&hours)
        .map(|(s, h)| format!("{:.1},{:.1}", area.x(x_frac(&s.next.timestamp)), area.y(h / y_top)))
        .collect();
    svg.push_str(&format!(
        "<polyline points=\"{}\" fill=\"none\" stroke=\"{NORMAL_COLOR}\" stroke-width=\"1\"/>",
        points.join(" ")
    ));

    // Median
    let median_hours = stats.median_gap_seconds / 3600.0;
    let median_y = area.y(median_hours / y_top);
    svg.push_str(&line(area.left, median_y, area.right(), median_y, MEDIAN_COLOR, 2.0, None));

    // Outliers
    let mut outlier_count = 0usize;
    for (sample, h) in samples.iter().zip(&hours) {
        if !stats.is_outlier(sample.delta_seconds) {
            continue;
        }
        outlier_count += 1;
        let x = area.x(x_frac(&sample.next.timestamp));
        let y = area.y(h / y_top);
        svg.push_str(&format!(
            "<circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"6\" fill=\"{OUTLIER_COLOR}\" stroke=\"{OUTLIER_EDGE}\" stroke-width=\"1\"/>"
        ));
        svg.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"52\" height=\"18\" rx=\"4\" fill=\"{OUTLIER_COLOR}\" fill-opacity=\"0.75\"/>",
            x + 10.0,
            y - 28.0
        ));
        svg.push_str(&format!(
            "<text class=\"outlier-label\" x=\"{:.1}\" y=\"{:.1}\" font-family=\"sans-serif\" font-size=\"11\" font-weight=\"bold\" fill=\"white\">{:.1}h</text>",
            x + 14.0,
            y - 15.0,
            h
        ));
    }

    draw_timeline_summary(&mut svg, &area, stats, median_hours, outlier_count, max_hours);
    draw_legend(
        &mut svg,
        area.right() - 230.0,
        area.bottom() - 80.0,
        &[
            (NORMAL_COLOR, "Normal gaps".to_string()),
            (MEDIAN_COLOR, format!("Median: {:.2}h", median_hours)),
            (OUTLIER_COLOR, format!("Outliers ({} found)", outlier_count)),
        ],
    );

    svg.push_str("</svg>");
    svg
}

fn draw_timeline_summary(
    svg: &mut String,
    area: &PlotArea,
    stats: &GapStatistics,
    median_hours: f64,
    outlier_count: usize,
    max_hours: f64,
) {
    let x = area.left + 14.0;
    let y = area.top + 14.0;
    svg.push_str(&format!(
        "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"280\" height=\"104\" rx=\"6\" fill=\"#add8e6\" fill-opacity=\"0.8\"/>"
    ));
    let lines = [
        "Summary:".to_string(),
        format!("- Total gaps analyzed: {}", stats.total_gaps),
        format!("- Median gap: {:.2} hours", median_hours),
        format!("- Outliers detected: {}", outlier_count),
        format!("- Largest gap: {:.1}h", max_hours),
    ];
    for (i, l) in lines.iter().enumerate() {
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-family=\"monospace\" font-size=\"12\">{}</text>",
            x + 10.0,
            y + 22.0 + 18.0 * i as f64,
            xml_escape(l)
        ));
    }
}

// ── Histogram ─────────────────────────────────────────────────────────────────

/// Bucketed values: lower edge, bin width and per-bin counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub lower: f64,
    pub bin_width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bucket a **sorted** slice into `bins` equal-width bins spanning its range.
    ///
    /// A zero-width range is widened to `[v - 0.5, v + 0.5]`. The maximum
    /// lands in the last bin.
    pub fn from_sorted(sorted: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let (mut lower, mut upper) = match (sorted.first(), sorted.last()) {
            (Some(&lo), Some(&hi)) => (lo, hi),
            _ => (0.0, 1.0),
        };
        if upper <= lower {
            lower -= 0.5;
            upper += 0.5;
        }
        let bin_width = (upper - lower) / bins as f64;
        let mut counts = vec![0usize; bins];
        for v in sorted {
            let idx = ((v - lower) / bin_width).floor() as usize;
            counts[idx.min(bins - 1)] += 1;
        }
        Self {
            lower,
            bin_width,
            counts,
        }
    }

    pub fn upper(&self) -> f64 {
        self.lower + self.bin_width * self.counts.len() as f64
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Render the gap-length histogram (input in seconds, plotted in hours).
pub fn histogram_svg(gaps_seconds: &[f64]) -> String {
    if gaps_seconds.is_empty() {
        return empty_chart(HISTOGRAM_WIDTH, HISTOGRAM_HEIGHT, "No gaps to plot");
    }
    let hours: Vec<f64> = gaps_seconds.iter().map(|g| g / 3600.0).collect();
    let sorted = sorted_copy(&hours);
    let histogram = Histogram::from_sorted(&sorted, freedman_diaconis_bins(&sorted));
    let log_scale = is_heavy_tailed(&sorted);
    let area = PlotArea::for_canvas(HISTOGRAM_WIDTH, HISTOGRAM_HEIGHT);

    let max_count = histogram.max_count().max(1) as f64;
    let count_frac = |c: usize| {
        if log_scale {
            (1.0 + c as f64).ln() / (1.0 + max_count).ln()
        } else {
            c as f64 / max_count
        }
    };
    let (lower, upper) = (histogram.lower, histogram.upper());
    let value_frac = |v: f64| (v - lower) / (upper - lower);

    let mut svg = open_svg(HISTOGRAM_WIDTH, HISTOGRAM_HEIGHT);
    svg.push_str(&text(
        HISTOGRAM_WIDTH / 2.0,
        40.0,
        18,
        "middle",
        "Histogram of Blob Publish Gaps",
    ));

    if log_scale {
        draw_y_axis(&mut svg, &area, max_count, |v| {
            format!("{:.0}", ((1.0 + max_count).ln() * v / max_count).exp() - 1.0)
        });
    } else {
        draw_y_axis(&mut svg, &area, max_count, |v| format!("{:.0}", v));
    }

    let bar_px = area.width / histogram.counts.len() as f64;
    for (i, &count) in histogram.counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let top = area.y(count_frac(count));
        svg.push_str(&format!(
            "<rect class=\"bar\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{BAR_COLOR}\" fill-opacity=\"0.9\"/>",
            area.left + bar_px * i as f64,
            top,
            (bar_px - 1.0).max(0.5),
            area.bottom() - top
        ));
    }

    for i in 0..X_TICKS {
        let frac = i as f64 / (X_TICKS - 1) as f64;
        let x = area.x(frac);
        svg.push_str(&line(x, area.bottom(), x, area.bottom() + 6.0, "#333333", 1.0, None));
        svg.push_str(&text(
            x,
            area.bottom() + 22.0,
            11,
            "middle",
            &format!("{:.2}", lower + frac * (upper - lower)),
        ));
    }

    let markers = [
        ("#000000", None, format!("Mean \u{2248} {:.2}", mean(&hours))),
        ("#ff7f0e", Some("8,4"), format!("Median \u{2248} {:.2}", median(&sorted))),
        ("#9467bd", Some("2,3"), format!("95th pct \u{2248} {:.2}", percentile(&sorted, 95.0))),
    ];
    let marker_values = [mean(&hours), median(&sorted), percentile(&sorted, 95.0)];
    for ((color, dash, _), value) in markers.iter().zip(marker_values) {
        let x = area.x(value_frac(value));
        svg.push_str(&line(x, area.top, x, area.bottom(), color, 1.8, *dash));
    }

    draw_frame(&mut svg, &area);
    svg.push_str(&text(
        area.left + area.width / 2.0,
        HISTOGRAM_HEIGHT - 30.0,
        13,
        "middle",
        "Gap between consecutive blobs (hours)",
    ));
    let y_label = if log_scale {
        "Frequency (log scale)"
    } else {
        "Frequency"
    };
    svg.push_str(&vertical_label(24.0, area.top + area.height / 2.0, y_label));

    let legend: Vec<(&str, String)> = markers.iter().map(|(c, _, l)| (*c, l.clone())).collect();
    draw_legend(&mut svg, area.right() - 200.0, area.top + 12.0, &legend);

    svg.push_str("</svg>");
    svg
}

// ── SVG primitives ────────────────────────────────────────────────────────────

fn open_svg(width: f64, height: f64) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\"><rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"white\"/>"
    )
}

fn empty_chart(width: f64, height: f64, message: &str) -> String {
    let mut svg = open_svg(width, height);
    svg.push_str(&text(width / 2.0, height / 2.0, 16, "middle", message));
    svg.push_str("</svg>");
    svg
}

fn text(x: f64, y: f64, size: u32, anchor: &str, content: &str) -> String {
    format!(
        "<text x=\"{x:.1}\" y=\"{y:.1}\" font-family=\"sans-serif\" font-size=\"{size}\" text-anchor=\"{anchor}\">{}</text>",
        xml_escape(content)
    )
}

fn vertical_label(x: f64, y: f64, content: &str) -> String {
    format!(
        "<text x=\"{x:.1}\" y=\"{y:.1}\" font-family=\"sans-serif\" font-size=\"13\" text-anchor=\"middle\" transform=\"rotate(-90 {x:.1} {y:.1})\">{}</text>",
        xml_escape(content)
    )
}

fn line(x1: f64, y1: f64, x2: f64, y2: f64, color: &str, width: f64, dash: Option<&str>) -> String {
    let dash = dash
        .map(|d| format!(" stroke-dasharray=\"{d}\""))
        .unwrap_or_default();
    format!(
        "<line x1=\"{x1:.1}\" y1=\"{y1:.1}\" x2=\"{x2:.1}\" y2=\"{y2:.1}\" stroke=\"{color}\" stroke-width=\"{width}\"{dash}/>"
    )
}

/// Horizontal grid lines with tick labels; `y_top` is the value at the top edge.
fn draw_y_axis(svg: &mut String, area: &PlotArea, y_top: f64, label: impl Fn(f64) -> String) {
    for i in 0..=Y_TICKS {
        let frac = i as f64 / Y_TICKS as f64;
        let y = area.y(frac);
        svg.push_str(&line(area.left, y, area.right(), y, GRID_COLOR, 1.0, Some("4,4")));
        svg.push_str(&text(area.left - 8.0, y + 4.0, 11, "end", &label(y_top * frac)));
    }
}

fn draw_frame(svg: &mut String, area: &PlotArea) {
    svg.push_str(&format!(
        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"none\" stroke=\"#333333\" stroke-width=\"1\"/>",
        area.left, area.top, area.width, area.height
    ));
}

fn draw_legend(svg: &mut String, x: f64, y: f64, entries: &[(&str, String)]) {
    svg.push_str(&format!(
        "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"210\" height=\"{:.1}\" fill=\"white\" fill-opacity=\"0.85\" stroke=\"#cccccc\"/>",
        12.0 + 20.0 * entries.len() as f64
    ));
    for (i, (color, label)) in entries.iter().enumerate() {
        let row_y = y + 16.0 + 20.0 * i as f64;
        svg.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"14\" height=\"10\" fill=\"{color}\"/>",
            x + 10.0,
            row_y - 9.0
        ));
        svg.push_str(&text(x + 32.0, row_y, 12, "start", label));
    }
}

/// Whether `svg` is a complete document with at least one shape and one label.
pub fn looks_like_svg(svg: &str) -> bool {
    let trimmed = svg.trim();
    trimmed.starts_with("<svg")
        && trimmed.ends_with("</svg>")
        && trimmed.contains("<rect")
        && trimmed.contains("<text")
}

pub fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
