//! Per-pair audit table (`proof_list.csv`).
//!
//! One row per consecutive event pair in chronological order, so every gap
//! in the report can be traced back to the two records that produced it.

use std::io::Write;
use std::path::Path;

use blobgap_core::error::Result;
use blobgap_core::models::GapSample;
use blobgap_core::time_utils::format_space_separated;
use csv::Writer as CsvWriter;
use tracing::info;

pub const PROOF_LIST_HEADER: [&str; 12] = [
    "index",
    "prev_time_utc",
    "next_time_utc",
    "gap_seconds",
    "gap_minutes",
    "gap_hours",
    "prev_id",
    "next_id",
    "prev_height",
    "next_height",
    "prev_signer",
    "next_signer",
];

/// Render one sample as a CSV row; `index` is the 0-based pair position.
pub fn proof_row(index: usize, sample: &GapSample<'_>) -> [String; 12] {
    [
        index.to_string(),
        format_space_separated(&sample.previous.timestamp),
        format_space_separated(&sample.next.timestamp),
        format!("{:.6}", sample.delta_seconds),
        format!("{:.6}", sample.minutes()),
        format!("{:.6}", sample.hours()),
        sample.previous.id_display(),
        sample.next.id_display(),
        sample.previous.height.to_string(),
        sample.next.height.to_string(),
        sample.previous.signer.clone(),
        sample.next.signer.clone(),
    ]
}

/// Write the header and one row per sample; returns the number of rows.
pub fn write_proof_list<W: Write>(writer: W, samples: &[GapSample<'_>]) -> Result<usize> {
    let mut wtr = CsvWriter::from_writer(writer);
    wtr.write_record(PROOF_LIST_HEADER)?;
    for (i, sample) in samples.iter().enumerate() {
        wtr.write_record(&proof_row(i, sample))?;
    }
    wtr.flush()?;
    Ok(samples.len())
}

/// Create (or overwrite) the audit CSV at `path`.
pub fn write_proof_list_file(path: &Path, samples: &[GapSample<'_>]) -> Result<usize> {
    let file = std::fs::File::create(path)?;
    let rows = write_proof_list(file, samples)?;
    info!("Wrote {} audit rows to {}", rows, path.display());
    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use blobgap_core::models::CanonicalEvent;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn event(h: u32, m: u32, s: u32, micros: u32, id: Value, height: i64, signer: &str) -> CanonicalEvent {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_micro_opt(h, m, s, micros)
            .unwrap();
        CanonicalEvent::new(id, ts, height, signer)
    }

    fn to_string(samples: &[GapSample<'_>]) -> String {
        let mut buf = Vec::new();
        write_proof_list(&mut buf, samples).unwrap();
        String::from_utf8(buf).unwrap()
    }

    // ── proof_row ─────────────────────────────────────────────────────────────

    #[test]
    fn test_proof_row_formats() {
        let a = event(10, 0, 0, 0, json!("abc"), 100, "celestia1xyz");
        let b = event(11, 30, 0, 250_000, json!(null), -1, "");
        let sample = GapSample {
            previous: &a,
            next: &b,
            delta_seconds: 5400.25,
        };

        let row = proof_row(1, &sample);
        assert_eq!(row[0], "1");
        assert_eq!(row[1], "2024-05-06 10:00:00");
        assert_eq!(row[2], "2024-05-06 11:30:00.250000");
        assert_eq!(row[3], "5400.250000");
        assert_eq!(row[4], "90.004167");
        assert_eq!(row[5], "1.500069");
        assert_eq!(row[6], "abc");
        assert_eq!(row[7], "");
        assert_eq!(row[8], "100");
        assert_eq!(row[9], "-1");
        assert_eq!(row[10], "celestia1xyz");
        assert_eq!(row[11], "");
    }

    #[test]
    fn test_numeric_id_rendered_as_json_text() {
        let a = event(0, 0, 0, 0, json!(42), 1, "s");
        let b = event(0, 1, 0, 0, json!(43), 2, "s");
        let sample = GapSample {
            previous: &a,
            next: &b,
            delta_seconds: 60.0,
        };
        let row = proof_row(7, &sample);
        assert_eq!(row[0], "7");
        assert_eq!(row[6], "42");
        assert_eq!(row[7], "43");
    }

    // ── write_proof_list ──────────────────────────────────────────────────────

    #[test]
    fn test_header_only_when_no_samples() {
        let out = to_string(&[]);
        assert_eq!(out.trim_end(), PROOF_LIST_HEADER.join(","));
    }

    #[test]
    fn test_one_row_per_sample() {
        let a = event(0, 0, 0, 0, json!("a"), 1, "s,with,commas");
        let b = event(0, 1, 0, 0, json!("b"), 2, "s");
        let c = event(0, 3, 0, 0, json!("c"), 3, "s");
        let samples = vec![
            GapSample {
                previous: &a,
                next: &b,
                delta_seconds: 60.0,
            },
            GapSample {
                previous: &b,
                next: &c,
                delta_seconds: 120.0,
            },
        ];
        let out = to_string(&samples);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("0,2024-05-06 00:00:00,2024-05-06 00:01:00,60.000000,"));
        assert!(lines[1].contains("\"s,with,commas\""));
        assert!(lines[2].starts_with("1,"));
    }

    #[test]
    fn test_write_proof_list_file_overwrites() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("proof_list.csv");
        std::fs::write(&path, "stale content\nmore\nmore\n").unwrap();

        assert_eq!(write_proof_list_file(&path, &[]).unwrap(), 0);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("stale"));
        assert!(content.starts_with("index,prev_time_utc"));
    }
}
