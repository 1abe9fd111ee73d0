//! Recovery of JSON objects from batch files of inconsistent shape.
//!
//! Captured batches show up as a JSON array, a single object, objects
//! concatenated back to back, or one object per line. [`extract_fragments`]
//! tries one strategy per shape, in that order, and never fails outright:
//! unreadable chunks are reported as [`BlobGapError::MalformedFragment`] and
//! skipped.

use blobgap_core::error::BlobGapError;
use serde_json::{Deserializer, Value};
use tracing::debug;

// ── Strategy ──────────────────────────────────────────────────────────────────

/// The extraction strategy that produced a set of fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The whole text is one JSON array or object.
    WholeDocument,
    /// Values decoded back to back, separated by whitespace or commas.
    Concatenated,
    /// One JSON value per line.
    LineDelimited,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WholeDocument => "whole-document",
            Self::Concatenated => "concatenated",
            Self::LineDelimited => "line-delimited",
        }
    }
}

/// Fragments recovered from one text, plus what had to be skipped.
#[derive(Debug)]
pub struct Extraction {
    pub strategy: Strategy,
    pub fragments: Vec<Value>,
    /// Always [`BlobGapError::MalformedFragment`] values.
    pub skipped: Vec<BlobGapError>,
}

/// Outcome of the incremental decoder when it hits undecodable input.
#[derive(Debug)]
pub struct PartialDecode {
    /// Objects decoded before the failure.
    pub fragments: Vec<Value>,
    pub failure: BlobGapError,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Recover every parseable object from `text`.
///
/// 1. Whole document: an array contributes its object elements, an object
///    contributes itself.
/// 2. Concatenated values: decode one value at a time, skipping `,` and
///    whitespace between them.
/// 3. Line-delimited: parse each non-blank line on its own, ignoring a
///    trailing comma.
///
/// When step 2 stops part way, step 3 runs and whichever of the two
/// recovered more objects wins (ties go to step 3).
pub fn extract_fragments(text: &str) -> Extraction {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    if let Some(fragments) = whole_document(text) {
        return Extraction {
            strategy: Strategy::WholeDocument,
            fragments,
            skipped: Vec::new(),
        };
    }

    let partial = match concatenated(text) {
        Ok(fragments) => {
            return Extraction {
                strategy: Strategy::Concatenated,
                fragments,
                skipped: Vec::new(),
            };
        }
        Err(partial) => partial,
    };

    debug!(
        "incremental decode stopped after {} object(s): {}",
        partial.fragments.len(),
        partial.failure
    );

    let (line_fragments, line_skips) = line_delimited(text);
    for skip in &line_skips {
        debug!("skipping line: {}", skip);
    }

    if !line_fragments.is_empty() && line_fragments.len() >= partial.fragments.len() {
        Extraction {
            strategy: Strategy::LineDelimited,
            fragments: line_fragments,
            skipped: line_skips,
        }
    } else {
        Extraction {
            strategy: Strategy::Concatenated,
            fragments: partial.fragments,
            skipped: vec![partial.failure],
        }
    }
}

// ── Strategies ────────────────────────────────────────────────────────────────

/// Parse the entire text as a single array or object; `None` otherwise.
pub fn whole_document(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => Some(objects_only(items)),
        obj @ Value::Object(_) => Some(vec![obj]),
        _ => None,
    }
}

/// Decode consecutive JSON values until the text is exhausted.
///
/// Objects become fragments, arrays contribute their object elements and
/// scalars are dropped. Stops with a [`PartialDecode`] at the first offset
/// where no value can be decoded.
pub fn concatenated(text: &str) -> std::result::Result<Vec<Value>, PartialDecode> {
    let bytes = text.as_bytes();
    let mut fragments = Vec::new();
    let mut idx = 0usize;

    loop {
        while idx < bytes.len() && is_separator(bytes[idx]) {
            idx += 1;
        }
        if idx >= bytes.len() {
            return Ok(fragments);
        }

        let mut stream = Deserializer::from_str(&text[idx..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                let consumed = stream.byte_offset();
                push_value(&mut fragments, value);
                idx += consumed;
            }
            Some(Err(e)) => {
                return Err(PartialDecode {
                    fragments,
                    failure: BlobGapError::MalformedFragment {
                        offset: idx,
                        reason: e.to_string(),
                    },
                });
            }
            None => return Ok(fragments),
        }
    }
}

/// Parse every non-blank line independently.
///
/// Returns the recovered objects and one `MalformedFragment` per line that
/// failed to parse (offset = byte offset of the line start).
pub fn line_delimited(text: &str) -> (Vec<Value>, Vec<BlobGapError>) {
    let mut fragments = Vec::new();
    let mut skipped = Vec::new();
    let mut offset = 0usize;

    for raw_line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += raw_line.len();

        let line = raw_line.trim();
        let line = line.strip_suffix(',').unwrap_or(line).trim_end();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(value) => push_value(&mut fragments, value),
            Err(e) => skipped.push(BlobGapError::MalformedFragment {
                offset: line_start,
                reason: e.to_string(),
            }),
        }
    }

    (fragments, skipped)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_separator(b: u8) -> bool {
    matches!(b, b',' | b' ' | b'\t' | b'\r' | b'\n')
}

fn objects_only(items: Vec<Value>) -> Vec<Value> {
    items.into_iter().filter(Value::is_object).collect()
}

fn push_value(fragments: &mut Vec<Value>, value: Value) {
    match value {
        Value::Object(_) => fragments.push(value),
        Value::Array(items) => fragments.extend(objects_only(items)),
        _ => {}
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
