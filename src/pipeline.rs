//! Pipeline orchestration.
//!
//! [`Pipeline::run`] sequences
//! verify → load → normalize types → rename → (summary) → derive `Failure Type` →
//! remove random failures → remove inconsistent rows → analyze → audit missing data → save.
//!
//! Only verification, output-directory creation and loading are fatal. Every other stage is
//! fault-isolated: if it fails, the failure is reported to the observer, recorded in the
//! [`PipelineReport`], and the next stage receives the table the failed stage was given.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult, StageError, StageResult};
use crate::export::write_csv_to_path;
use crate::ingestion::{LoadOptions, ingest_csv_inferred_from_path, verify_file};
use crate::observability::{PipelineEvent, PipelineObserver, Stage, StageSeverity};
use crate::processing::{
    FailureRelationship, FailureType, analyze_failure_relationship, cast_columns_to_float,
    derive_failure_type, label_distribution, missing_fraction, remove_inconsistent,
    remove_random_failures, rename_columns, summarize,
};
use crate::types::DataSet;

/// A stage that failed without stopping the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub severity: StageSeverity,
    pub message: String,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    /// Rows in the table as loaded.
    pub rows_loaded: usize,
    /// Columns in the table as loaded.
    pub columns_loaded: usize,
    /// Rows left after every cleaning stage.
    pub rows_out: usize,
    /// `Failure Type` counts right after derivation, most frequent first.
    pub label_distribution: Vec<(FailureType, usize)>,
    pub random_failures_removed: usize,
    pub inconsistent_rows_removed: usize,
    /// `None` if the analysis could not run.
    pub failure_relationship: Option<FailureRelationship>,
    /// Percentage of remaining rows with a missing value.
    pub missing_percent: f64,
    /// Set once `processed_data.csv` has been written.
    pub output_path: Option<PathBuf>,
    /// Set once the summary JSON has been written.
    pub summary_path: Option<PathBuf>,
    /// Non-fatal stage failures, in the order they happened.
    pub failures: Vec<StageFailure>,
}

impl PipelineReport {
    /// `true` if any stage failed at [`StageSeverity::Error`] or above.
    pub fn has_errors(&self) -> bool {
        self.failures.iter().any(|f| f.severity >= StageSeverity::Error)
    }
}

/// Runs the cleaning stages with a given config, reporting to an observer.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    observer: &'a dyn PipelineObserver,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig, observer: &'a dyn PipelineObserver) -> Self {
        Self { config, observer }
    }

    /// Run end to end: read `config.input_path`, write `processed_data.csv` into
    /// `config.output_dir`.
    ///
    /// Returns an error only for fatal failures (verification, load, output directory), in which
    /// case nothing is written. A failed save is recorded in the report instead.
    pub fn run(&self) -> PipelineResult<PipelineReport> {
        let input = &self.config.input_path;

        verify_file(input, self.config.expected_hash.as_deref())
            .map_err(|e| self.fatal(Stage::Verify, e))?;
        self.observer.on_event(&PipelineEvent::FileVerified {
            path: input.clone(),
            hash_checked: self.config.expected_hash.is_some(),
        });

        let options = LoadOptions {
            fill_missing: self.config.fill_missing,
        };
        let data = ingest_csv_inferred_from_path(input, &options)
            .map_err(|e| self.fatal(Stage::Load, e))?;
        self.observer.on_event(&PipelineEvent::Loaded {
            rows: data.row_count(),
            columns: data.column_count(),
        });

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| self.fatal(Stage::Save, e.into()))?;

        let mut report = PipelineReport {
            rows_loaded: data.row_count(),
            columns_loaded: data.column_count(),
            ..Default::default()
        };

        let data = self.normalize(data);
        if self.config.visualize {
            self.write_summary(&data, &mut report);
        }
        let data = self.clean(data, &mut report);

        let path = self.config.processed_path();
        match write_csv_to_path(&data, &path) {
            Ok(()) => {
                self.observer.on_event(&PipelineEvent::Saved { path: path.clone() });
                report.output_path = Some(path);
            }
            Err(e) => self.record_failure(
                &mut report,
                Stage::Save,
                StageSeverity::Error,
                format!("failed to save processed data: {e}"),
            ),
        }

        Ok(report)
    }

    /// Run the in-memory stages (normalize through audit) on an already loaded table.
    ///
    /// No files are read or written and the summary is skipped.
    pub fn process(&self, data: DataSet) -> (DataSet, PipelineReport) {
        let mut report = PipelineReport {
            rows_loaded: data.row_count(),
            columns_loaded: data.column_count(),
            ..Default::default()
        };
        let data = self.normalize(data);
        let data = self.clean(data, &mut report);
        (data, report)
    }

    fn normalize(&self, data: DataSet) -> DataSet {
        let columns = &self.config.columns;
        let data = cast_columns_to_float(&data, &columns.float_columns, self.observer);
        rename_columns(&data, &columns.rename_map, self.observer)
    }

    fn clean(&self, data: DataSet, report: &mut PipelineReport) -> DataSet {
        let obs = self.observer;

        let data = self.apply(Stage::DeriveFailureType, StageSeverity::Error, data, report, |d| {
            derive_failure_type(d, obs)
        });
        report.label_distribution = label_distribution(&data);

        let before = data.row_count();
        let data = self.apply(
            Stage::RemoveRandomFailures,
            StageSeverity::Warning,
            data,
            report,
            |d| remove_random_failures(d, obs),
        );
        report.random_failures_removed = before - data.row_count();

        let before = data.row_count();
        let data = self.apply(Stage::RemoveInconsistent, StageSeverity::Warning, data, report, |d| {
            remove_inconsistent(d, obs)
        });
        report.inconsistent_rows_removed = before - data.row_count();

        match analyze_failure_relationship(&data) {
            Ok(relationship) => {
                for (label, matches) in &relationship {
                    obs.on_event(&PipelineEvent::RelationshipAnalyzed {
                        label: label.clone(),
                        count: matches.count,
                        rows: matches.rows.clone(),
                    });
                }
                report.failure_relationship = Some(relationship);
            }
            Err(err) => {
                let severity = severity_for_error(&err, StageSeverity::Error);
                self.record_failure(report, Stage::AnalyzeRelationship, severity, err.to_string());
            }
        }

        let percent = missing_fraction(&data);
        obs.on_event(&PipelineEvent::MissingData { percent });
        report.missing_percent = percent;
        report.rows_out = data.row_count();
        data
    }

    fn write_summary(&self, data: &DataSet, report: &mut PipelineReport) {
        let summary = summarize(data, &self.config.columns.summary_features, self.observer);
        let path = self.config.summary_path();
        let written = serde_json::to_string_pretty(&summary)
            .map_err(PipelineError::from)
            .and_then(|json| fs::write(&path, json).map_err(PipelineError::from));

        match written {
            Ok(()) => {
                self.observer.on_event(&PipelineEvent::SummaryWritten { path: path.clone() });
                report.summary_path = Some(path);
            }
            Err(e) => self.record_failure(
                report,
                Stage::Summarize,
                StageSeverity::Warning,
                format!("failed to generate summary: {e}"),
            ),
        }
    }

    /// Run one fault-isolated stage. On failure the input table is passed through unchanged.
    fn apply<F>(
        &self,
        stage: Stage,
        on_missing_columns: StageSeverity,
        data: DataSet,
        report: &mut PipelineReport,
        f: F,
    ) -> DataSet
    where
        F: FnOnce(&DataSet) -> StageResult<DataSet>,
    {
        let rows_before = data.row_count();
        match f(&data) {
            Ok(next) => {
                self.observer.on_event(&PipelineEvent::StageFinished {
                    stage,
                    rows_before,
                    rows_after: next.row_count(),
                });
                next
            }
            Err(err) => {
                let severity = severity_for_error(&err, on_missing_columns);
                self.record_failure(report, stage, severity, err.to_string());
                data
            }
        }
    }

    fn record_failure(
        &self,
        report: &mut PipelineReport,
        stage: Stage,
        severity: StageSeverity,
        message: String,
    ) {
        self.observer.on_event(&PipelineEvent::StageFailed {
            stage,
            severity,
            message: message.clone(),
        });
        report.failures.push(StageFailure {
            stage,
            severity,
            message,
        });
    }

    fn fatal(&self, stage: Stage, err: PipelineError) -> PipelineError {
        self.observer.on_event(&PipelineEvent::StageFailed {
            stage,
            severity: StageSeverity::Critical,
            message: err.to_string(),
        });
        err
    }
}

fn severity_for_error(err: &StageError, on_missing_columns: StageSeverity) -> StageSeverity {
    match err {
        StageError::MissingColumns { .. } => on_missing_columns,
        StageError::Computation { .. } => StageSeverity::Error,
    }
}

/// Convenience wrapper for `Pipeline::new(config, observer).run()`.
pub fn run_pipeline(
    config: &PipelineConfig,
    observer: &dyn PipelineObserver,
) -> PipelineResult<PipelineReport> {
    Pipeline::new(config, observer).run()
}
