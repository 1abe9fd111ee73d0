use serde_json::Value;

use crate::error::{BlobGapError, Result};
use crate::models::{CanonicalEvent, UNKNOWN_HEIGHT};
use crate::time_utils::normalize_timestamp;

// ── FieldResolver ─────────────────────────────────────────────────────────────

/// Looks values up by dot-separated key-paths, trying candidates in order.
pub struct FieldResolver;

impl FieldResolver {
    /// Follow one key-path such as `"tx.time"` through nested objects.
    ///
    /// Returns `None` unless every segment is present as a key of an object
    /// at that depth. A present `null` still counts as resolved.
    pub fn resolve_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
        path.split('.')
            .try_fold(data, |current, segment| current.as_object()?.get(segment))
    }

    /// Return the value of the first candidate path that fully resolves.
    pub fn resolve<'a>(data: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
        candidates
            .iter()
            .find_map(|path| Self::resolve_path(data, path))
    }

    /// Like [`FieldResolver::resolve`] but falls back to `default`.
    pub fn resolve_or<'a>(data: &'a Value, candidates: &[&str], default: &'a Value) -> &'a Value {
        Self::resolve(data, candidates).unwrap_or(default)
    }
}

// ── FieldSchema ───────────────────────────────────────────────────────────────

/// Candidate key-paths for every canonical field, highest priority first.
///
/// Supporting a new data-source shape means adding a path here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub id: Vec<&'static str>,
    pub timestamp: Vec<&'static str>,
    pub height: Vec<&'static str>,
    pub signer: Vec<&'static str>,
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self {
            id: vec!["id", "tx.id", "commitment", "tx.hash"],
            timestamp: vec!["time", "tx.time"],
            height: vec!["height", "tx.height"],
            signer: vec!["signer.hash", "signer.address", "signer"],
        }
    }
}

// ── RecordNormalizer ──────────────────────────────────────────────────────────

/// Turns one raw JSON object into a [`CanonicalEvent`].
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    schema: FieldSchema,
}

impl RecordNormalizer {
    pub fn new(schema: FieldSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Normalise a raw record.
    ///
    /// Only the timestamp is mandatory; every other field has a default.
    /// Fails with [`BlobGapError::MissingOrInvalidTimestamp`] when no
    /// timestamp candidate resolves to a parseable value.
    pub fn normalize(&self, raw: &Value) -> Result<CanonicalEvent> {
        let id = FieldResolver::resolve(raw, &self.schema.id)
            .cloned()
            .unwrap_or(Value::Null);

        let timestamp = self.extract_timestamp(raw)?;

        let height = FieldResolver::resolve(raw, &self.schema.height)
            .and_then(parse_height)
            .unwrap_or(UNKNOWN_HEIGHT);

        let signer = FieldResolver::resolve(raw, &self.schema.signer)
            .map(scalar_to_string)
            .unwrap_or_default();

        Ok(CanonicalEvent::new(id, timestamp, height, signer))
    }

    fn extract_timestamp(&self, raw: &Value) -> Result<chrono::NaiveDateTime> {
        let missing = || {
            BlobGapError::MissingOrInvalidTimestamp(format!(
                "missing '{}'",
                self.schema.timestamp.join("'/'")
            ))
        };

        let value = FieldResolver::resolve(raw, &self.schema.timestamp).ok_or_else(missing)?;
        let text = scalar_to_string(value);
        if text.is_empty() {
            return Err(missing());
        }

        normalize_timestamp(&text).map_err(|_| {
            BlobGapError::MissingOrInvalidTimestamp(format!("bad time format: {}", text))
        })
    }
}

/// Accept integral JSON numbers and decimal-integer strings.
fn parse_height(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Strings bare, `null` empty, anything else as compact JSON.
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
