use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use predictive_maintenance_pipeline::config::PipelineConfig;
use predictive_maintenance_pipeline::observability::TracingObserver;
use predictive_maintenance_pipeline::pipeline::Pipeline;

mod logging;

#[derive(Parser)]
#[command(name = "pm-pipeline")]
#[command(about = "Clean predictive-maintenance telemetry and derive failure-type labels")]
#[command(version)]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Raw input CSV
    #[arg(long)]
    file: Option<PathBuf>,

    /// Directory for processed_data.csv and logs
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write visualization_summary.json
    #[arg(long)]
    visualize: bool,

    /// Expected SHA-256 of the input file (hex)
    #[arg(long)]
    hash: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> Result<(PipelineConfig, String)> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_path(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(file) = self.file {
            config.input_path = file;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if self.visualize {
            config.visualize = true;
        }
        if self.hash.is_some() {
            config.expected_hash = self.hash;
        }
        Ok((config, self.log_level))
    }
}

fn main() -> ExitCode {
    let (config, log_level) = match Cli::parse().into_config() {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init_logging(&config.output_dir, &log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialise logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        input = %config.input_path.display(),
        output = %config.output_dir.display(),
        "starting pipeline"
    );

    let report = match Pipeline::new(&config, &TracingObserver).run() {
        Ok(report) => report,
        Err(e) => {
            error!("pipeline aborted: {e}");
            return ExitCode::FAILURE;
        }
    };

    if !report.failures.is_empty() {
        warn!("{} stage(s) failed during the run", report.failures.len());
    }
    match serde_json::to_string_pretty(&report) {
        Ok(json) => info!("pipeline report:\n{json}"),
        Err(e) => warn!("failed to serialise pipeline report: {e}"),
    }
    info!(rows = report.rows_out, "pipeline finished");
    ExitCode::SUCCESS
}
