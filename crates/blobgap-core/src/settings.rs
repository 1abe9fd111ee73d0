use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BlobGapError, Result};
use crate::models::SourceMode;

/// Default outlier multiplier `k` in `mean + k * std`.
pub const DEFAULT_STD_K: f64 = 2.0;

/// Default number of outlier rows listed in the Markdown report.
pub const DEFAULT_MAX_OUTLIER_ROWS: usize = 15;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Analyze blob publish gaps and render a timeline, histogram and report
#[derive(Parser, Debug, Clone)]
#[command(
    name = "blobgap",
    about = "Analyze blob publish gaps and render a timeline, histogram and report",
    version
)]
pub struct Settings {
    /// Aggregate JSON document containing {"blobs": [...]}
    #[arg(long, default_value = "result.json")]
    pub result_json: PathBuf,

    /// Fallback directory of blob_batch_*.json files
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Output directory (artifacts are overwritten)
    #[arg(long, default_value = "output")]
    pub out_dir: PathBuf,

    /// Outlier threshold multiplier: mean + k * std
    #[arg(long, default_value_t = DEFAULT_STD_K)]
    pub std_k: f64,

    /// Namespace shown in the report header
    #[arg(long, default_value = "N/A")]
    pub namespace: String,

    /// Maximum outlier rows listed in the report
    #[arg(long, default_value_t = DEFAULT_MAX_OUTLIER_ROWS)]
    pub max_outlier_rows: usize,

    /// Input source selection
    #[arg(long, default_value = "auto", value_parser = ["auto", "aggregate", "directory"])]
    pub source: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path (appended to, in addition to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// JSON config file; explicit flags take precedence over its values
    #[arg(long)]
    pub config: Option<PathBuf>,
}

// ── FileConfig ─────────────────────────────────────────────────────────────────

/// Optional JSON configuration file. Every field may be omitted.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_json: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std_k: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_outlier_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    /// Read and parse a config file. Unlike the CLI, a broken file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| BlobGapError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&content)
            .map_err(|e| BlobGapError::Config(format!("{}: {}", path.display(), e)))
    }
}

// ── AnalysisConfig ─────────────────────────────────────────────────────────────

/// Everything the ingestion loader and gap engine need for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub result_json: PathBuf,
    pub data_dir: PathBuf,
    pub source: SourceMode,
    pub std_k: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            result_json: PathBuf::from("result.json"),
            data_dir: PathBuf::from("data"),
            source: SourceMode::Auto,
            std_k: DEFAULT_STD_K,
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse process arguments, merge the optional config file and validate.
    pub fn load() -> Result<Self> {
        Self::load_from_args(std::env::args_os().collect())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args(args: Vec<std::ffi::OsString>) -> Result<Self> {
        // Raw matches let us tell explicit flags from defaults.
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if let Some(path) = settings.config.clone() {
            let file = FileConfig::load_from(&path)?;
            settings.merge_file_config(file, &matches);
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Apply file values for every field not given explicitly on the CLI.
    fn merge_file_config(&mut self, file: FileConfig, matches: &clap::ArgMatches) {
        // clap stores arg ids by field name (underscores).
        if !is_arg_explicitly_set(matches, "result_json") {
            if let Some(v) = file.result_json {
                self.result_json = v;
            }
        }
        if !is_arg_explicitly_set(matches, "data_dir") {
            if let Some(v) = file.data_dir {
                self.data_dir = v;
            }
        }
        if !is_arg_explicitly_set(matches, "out_dir") {
            if let Some(v) = file.out_dir {
                self.out_dir = v;
            }
        }
        if !is_arg_explicitly_set(matches, "std_k") {
            if let Some(v) = file.std_k {
                self.std_k = v;
            }
        }
        if !is_arg_explicitly_set(matches, "namespace") {
            if let Some(v) = file.namespace {
                self.namespace = v;
            }
        }
        if !is_arg_explicitly_set(matches, "max_outlier_rows") {
            if let Some(v) = file.max_outlier_rows {
                self.max_outlier_rows = v;
            }
        }
        if !is_arg_explicitly_set(matches, "source") {
            if let Some(v) = file.source {
                self.source = match v {
                    SourceMode::Auto => "auto",
                    SourceMode::Aggregate => "aggregate",
                    SourceMode::Directory => "directory",
                }
                .to_string();
            }
        }
        if !is_arg_explicitly_set(matches, "log_level") {
            if let Some(v) = file.log_level {
                self.log_level = v.to_uppercase();
            }
        }
        if !is_arg_explicitly_set(matches, "log_file") && self.log_file.is_none() {
            self.log_file = file.log_file;
        }
    }

    /// Reject values the analysis cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.std_k.is_finite() || self.std_k <= 0.0 {
            return Err(BlobGapError::Config(format!(
                "std_k must be a positive finite number, got {}",
                self.std_k
            )));
        }
        if SourceMode::from_name(&self.source).is_none() {
            return Err(BlobGapError::Config(format!(
                "unknown source mode: {}",
                self.source
            )));
        }
        Ok(())
    }

    pub fn source_mode(&self) -> SourceMode {
        SourceMode::from_name(&self.source).unwrap_or_default()
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            result_json: self.result_json.clone(),
            data_dir: self.data_dir.clone(),
            source: self.source_mode(),
            std_k: self.std_k,
        }
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_config(tmp: &TempDir, body: &str) -> PathBuf {
        let path = tmp.path().join("blobgap.json");
        std::fs::write(&path, body).expect("write config");
        path
    }

    fn args(list: &[&str]) -> Vec<std::ffi::OsString> {
        list.iter().map(|s| s.into()).collect()
    }

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["blobgap"]);

        assert_eq!(settings.result_json, PathBuf::from("result.json"));
        assert_eq!(settings.data_dir, PathBuf::from("data"));
        assert_eq!(settings.out_dir, PathBuf::from("output"));
        assert!((settings.std_k - 2.0).abs() < f64::EPSILON);
        assert_eq!(settings.namespace, "N/A");
        assert_eq!(settings.max_outlier_rows, 15);
        assert_eq!(settings.source, "auto");
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
        assert!(settings.config.is_none());
    }

    #[test]
    fn test_settings_cli_parsing() {
        let settings = Settings::parse_from([
            "blobgap",
            "--std-k",
            "2.5",
            "--data-dir",
            "batches",
            "--source",
            "directory",
        ]);
        assert!((settings.std_k - 2.5).abs() < f64::EPSILON);
        assert_eq!(settings.data_dir, PathBuf::from("batches"));
        assert_eq!(settings.source_mode(), SourceMode::Directory);
    }

    #[test]
    fn test_analysis_config_from_settings() {
        let settings = Settings::parse_from(["blobgap", "--result-json", "snap.json"]);
        let config = settings.analysis_config();
        assert_eq!(config.result_json, PathBuf::from("snap.json"));
        assert_eq!(config.source, SourceMode::Auto);
        assert!((config.std_k - DEFAULT_STD_K).abs() < f64::EPSILON);
    }

    // ── validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_non_positive_k() {
        for bad in ["--std-k=0", "--std-k=-1.5"] {
            let result = Settings::load_from_args(args(&["blobgap", bad]));
            assert!(matches!(result, Err(BlobGapError::Config(_))), "k = {bad}");
        }
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let settings = Settings::load_from_args(args(&["blobgap", "--debug"])).unwrap();
        assert_eq!(settings.log_level, "DEBUG");
    }

    // ── config file ───────────────────────────────────────────────────────────

    #[test]
    fn test_config_file_fills_unset_values() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_config(
            &tmp,
            r#"{"std_k": 3.0, "namespace": "0x00ab", "source": "aggregate"}"#,
        );

        let settings =
            Settings::load_from_args(args(&["blobgap", "--config", path.to_str().unwrap()]))
                .unwrap();
        assert!((settings.std_k - 3.0).abs() < f64::EPSILON);
        assert_eq!(settings.namespace, "0x00ab");
        assert_eq!(settings.source_mode(), SourceMode::Aggregate);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_config(&tmp, r#"{"std_k": 3.0, "out_dir": "elsewhere"}"#);

        let settings = Settings::load_from_args(args(&[
            "blobgap",
            "--config",
            path.to_str().unwrap(),
            "--std-k",
            "1.5",
        ]))
        .unwrap();
        assert!((settings.std_k - 1.5).abs() < f64::EPSILON);
        assert_eq!(settings.out_dir, PathBuf::from("elsewhere"));
    }

    #[test]
    fn test_config_file_invalid_k_rejected() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_config(&tmp, r#"{"std_k": -2.0}"#);
        let result =
            Settings::load_from_args(args(&["blobgap", "--config", path.to_str().unwrap()]));
        assert!(matches!(result, Err(BlobGapError::Config(_))));
    }

    #[test]
    fn test_config_file_unknown_field_rejected() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_config(&tmp, r#"{"colour": "red"}"#);
        let err = FileConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, BlobGapError::Config(_)));
    }

    #[test]
    fn test_missing_config_file_is_source_unavailable() {
        let tmp = TempDir::new().expect("tempdir");
        let err = FileConfig::load_from(&tmp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, BlobGapError::SourceUnavailable { .. }));
    }
}
