//! `predictive-maintenance-pipeline` cleans machine-telemetry maintenance records (the AI4I 2020
//! layout) and derives a single categorical `Failure Type` label from the five per-cause flags.
//!
//! The primary entrypoint is [`pipeline::Pipeline`], which reads a raw CSV, runs the cleaning
//! stages and writes `processed_data.csv` into an output directory. Every stage is also exposed
//! on its own in [`processing`] as a pure `&DataSet -> DataSet` function.
//!
//! ## What the pipeline does
//!
//! 1. verify the input file exists (and optionally matches a SHA-256 hash)
//! 2. load the CSV with per-column type inference, filling missing cells with zero
//! 3. coerce selected columns to floats and strip unit suffixes from column names
//! 4. optionally write `visualization_summary.json`
//! 5. derive `Failure Type` from `TWF, HDF, PWF, OSF, RNF` (first maximum wins)
//! 6. drop rows labelled `Random Failure`
//! 7. drop rows whose `Machine failure` is set with no supporting cause flag
//! 8. report random failures that were not recorded as machine failures
//! 9. report the percentage of rows with missing data
//! 10. save the cleaned table
//!
//! Steps 1 and 2 are fatal on failure. Every later stage is fault-isolated: its failure is
//! reported through a [`observability::PipelineObserver`] and recorded in the
//! [`pipeline::PipelineReport`], and the next stage sees the table unchanged.
//!
//! ## Example
//!
//! ```no_run
//! use predictive_maintenance_pipeline::config::PipelineConfig;
//! use predictive_maintenance_pipeline::observability::TracingObserver;
//! use predictive_maintenance_pipeline::pipeline::Pipeline;
//!
//! # fn main() -> Result<(), predictive_maintenance_pipeline::PipelineError> {
//! let config = PipelineConfig {
//!     input_path: "ai4i2020.csv".into(),
//!     output_dir: "out".into(),
//!     ..Default::default()
//! };
//! let report = Pipeline::new(&config, &TracingObserver).run()?;
//! println!("rows kept={}", report.rows_out);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: file verification and CSV loading
//! - [`processing`]: the cleaning and diagnostic stages
//! - [`pipeline`]: stage orchestration and the run report
//! - [`export`]: CSV output
//! - [`observability`]: stage events and observers
//! - [`config`]: pipeline configuration
//! - [`types`]: schema + in-memory dataset types
//! - [`error`]: fatal and per-stage error types

pub mod config;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod observability;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult, StageError, StageResult};
pub use pipeline::{Pipeline, PipelineReport, run_pipeline};
