use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the blob gap analyser.
#[derive(Error, Debug)]
pub enum BlobGapError {
    /// A timestamp string could not be parsed as ISO 8601.
    #[error("Invalid timestamp format: {0}")]
    InvalidTimestamp(String),

    /// No candidate key-path resolved a usable timestamp.
    #[error("Missing or invalid timestamp: {0}")]
    MissingOrInvalidTimestamp(String),

    /// A chunk of file text could not be decoded by any extraction strategy.
    #[error("Malformed fragment at offset {offset}: {reason}")]
    MalformedFragment { offset: usize, reason: String },

    /// An expected file or directory is missing or unreadable.
    #[error("Source unavailable {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fewer than two valid records survived ingestion.
    #[error("Insufficient data: {records} valid record(s), at least 2 are needed")]
    InsufficientData { records: usize },

    /// Sorted output produced a negative gap.
    #[error("Consistency violation: {0}")]
    Consistency(String),

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The audit table could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the blobgap crates.
pub type Result<T> = std::result::Result<T, BlobGapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_timestamp() {
        let err = BlobGapError::InvalidTimestamp("not-a-timestamp".to_string());
        assert_eq!(err.to_string(), "Invalid timestamp format: not-a-timestamp");
    }

    #[test]
    fn test_error_display_missing_timestamp() {
        let err = BlobGapError::MissingOrInvalidTimestamp("missing 'time'/'tx.time'".to_string());
        assert_eq!(
            err.to_string(),
            "Missing or invalid timestamp: missing 'time'/'tx.time'"
        );
    }

    #[test]
    fn test_error_display_malformed_fragment() {
        let err = BlobGapError::MalformedFragment {
            offset: 42,
            reason: "expected value".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed fragment at offset 42: expected value"
        );
    }

    #[test]
    fn test_error_display_source_unavailable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = BlobGapError::SourceUnavailable {
            path: PathBuf::from("/some/result.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Source unavailable"));
        assert!(msg.contains("/some/result.json"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_insufficient_data() {
        let err = BlobGapError::InsufficientData { records: 1 };
        assert_eq!(
            err.to_string(),
            "Insufficient data: 1 valid record(s), at least 2 are needed"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = BlobGapError::Config("std_k must be positive".to_string());
        assert_eq!(err.to_string(), "Configuration error: std_k must be positive");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BlobGapError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: BlobGapError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
