mod bootstrap;

use std::process::ExitCode;

use anyhow::{Context, Result};
use blobgap_core::data_processors::RecordNormalizer;
use blobgap_core::settings::Settings;
use blobgap_data::analysis::{analyze_blobs, GapOutcome};
use blobgap_report::summary::run_summary;
use blobgap_report::{write_reports, ReportConfig};

fn main() -> Result<ExitCode> {
    let settings = Settings::load()?;

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("blobgap v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Source: {}, std_k: {}, output: {}",
        settings.source,
        settings.std_k,
        settings.out_dir.display()
    );

    let analysis_config = settings.analysis_config();
    let result = analyze_blobs(&analysis_config, &RecordNormalizer::default())
        .context("gap analysis failed")?;

    let report_config = ReportConfig::from(&settings);
    let artifacts = write_reports(&result, &report_config).with_context(|| {
        format!(
            "failed to write artifacts to {}",
            report_config.out_dir.display()
        )
    })?;

    println!("{}", run_summary(&result, &artifacts));

    match result.outcome {
        GapOutcome::Analyzed(_) => Ok(ExitCode::SUCCESS),
        GapOutcome::Insufficient { .. } => {
            tracing::warn!(
                "No gap analysis possible: check {} or {}",
                analysis_config.result_json.display(),
                analysis_config.data_dir.display()
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
