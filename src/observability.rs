//! Reporting seam shared by every pipeline stage.
//!
//! Stages never log directly. They emit [`PipelineEvent`]s to a [`PipelineObserver`] that the
//! caller passes in, so tests can record events and the binary can route them to `tracing`.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::processing::label::FailureType;
use crate::types::DataType;

/// Severity classification for pipeline events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum StageSeverity {
    /// Informational event.
    Info,
    /// Non-fatal defect; the stage was skipped or partially applied.
    Warning,
    /// A stage failed; the pipeline continued with the stage's input.
    Error,
    /// Fatal failure; the run stopped.
    Critical,
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Verify,
    Load,
    NormalizeTypes,
    RenameColumns,
    Summarize,
    DeriveFailureType,
    RemoveRandomFailures,
    RemoveInconsistent,
    AnalyzeRelationship,
    AuditMissing,
    Save,
}

impl Stage {
    /// Stable snake_case name used in log fields.
    pub fn name(self) -> &'static str {
        match self {
            Self::Verify => "verify",
            Self::Load => "load",
            Self::NormalizeTypes => "normalize_types",
            Self::RenameColumns => "rename_columns",
            Self::Summarize => "summarize",
            Self::DeriveFailureType => "derive_failure_type",
            Self::RemoveRandomFailures => "remove_random_failures",
            Self::RemoveInconsistent => "remove_inconsistent",
            Self::AnalyzeRelationship => "analyze_relationship",
            Self::AuditMissing => "audit_missing",
            Self::Save => "save",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Events emitted while a pipeline runs.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    FileVerified { path: PathBuf, hash_checked: bool },
    Loaded { rows: usize, columns: usize },
    ColumnNotFound { stage: Stage, column: String },
    ColumnConverted { column: String, data_type: DataType },
    ColumnsRenamed { columns: Vec<String> },
    NoNumericFeatures,
    SummaryWritten { path: PathBuf },
    LabelDistribution { counts: Vec<(FailureType, usize)> },
    RowsRemoved { stage: Stage, count: usize },
    RelationshipAnalyzed { label: String, count: usize, rows: Vec<usize> },
    MissingData { percent: f64 },
    Saved { path: PathBuf },
    StageFinished { stage: Stage, rows_before: usize, rows_after: usize },
    StageFailed { stage: Stage, severity: StageSeverity, message: String },
}

impl PipelineEvent {
    /// The stage that emitted this event.
    pub fn stage(&self) -> Stage {
        match self {
            Self::FileVerified { .. } => Stage::Verify,
            Self::Loaded { .. } => Stage::Load,
            Self::ColumnConverted { .. } => Stage::NormalizeTypes,
            Self::ColumnsRenamed { .. } => Stage::RenameColumns,
            Self::NoNumericFeatures | Self::SummaryWritten { .. } => Stage::Summarize,
            Self::LabelDistribution { .. } => Stage::DeriveFailureType,
            Self::RelationshipAnalyzed { .. } => Stage::AnalyzeRelationship,
            Self::MissingData { .. } => Stage::AuditMissing,
            Self::Saved { .. } => Stage::Save,
            Self::ColumnNotFound { stage, .. }
            | Self::RowsRemoved { stage, .. }
            | Self::StageFinished { stage, .. }
            | Self::StageFailed { stage, .. } => *stage,
        }
    }

    /// Severity used for routing and alerting.
    pub fn severity(&self) -> StageSeverity {
        match self {
            Self::ColumnNotFound { .. } | Self::NoNumericFeatures => StageSeverity::Warning,
            Self::StageFailed { severity, .. } => *severity,
            _ => StageSeverity::Info,
        }
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileVerified { path, hash_checked } => {
                write!(f, "File verified: {} (sha256 checked: {hash_checked})", path.display())
            }
            Self::Loaded { rows, columns } => {
                write!(f, "Loaded data with {rows} rows and {columns} columns.")
            }
            Self::ColumnNotFound { column, .. } => {
                write!(f, "Column '{column}' not found in the dataset.")
            }
            Self::ColumnConverted { column, data_type } => {
                write!(f, "Converted column '{column}' to {data_type:?}.")
            }
            Self::ColumnsRenamed { columns } => write!(f, "Renamed columns: {columns:?}"),
            Self::NoNumericFeatures => f.write_str("No numeric features found in the dataset."),
            Self::SummaryWritten { path } => {
                write!(f, "Summary saved to '{}'.", path.display())
            }
            Self::LabelDistribution { counts } => {
                f.write_str("Derived 'Failure Type' column:")?;
                for (label, count) in counts {
                    write!(f, " {label}={count};")?;
                }
                Ok(())
            }
            Self::RowsRemoved { stage, count } => write!(f, "Removed {count} rows ({stage})."),
            Self::RelationshipAnalyzed { label, count, rows } => {
                write!(f, "{label}: {count} occurrences. Rows: {rows:?}")
            }
            Self::MissingData { percent } => {
                write!(f, "Percentage of rows with missing data: {percent:.3}%")
            }
            Self::Saved { path } => write!(f, "Processed data saved to '{}'.", path.display()),
            Self::StageFinished {
                stage,
                rows_before,
                rows_after,
            } => write!(f, "Stage {stage} finished: {rows_before} -> {rows_after} rows."),
            Self::StageFailed { stage, message, .. } => {
                write!(f, "Stage {stage} failed: {message}")
            }
        }
    }
}

/// Observer interface for pipeline events.
///
/// Implementors can record metrics, write logs, or collect events for tests.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}

/// Routes events to the `tracing` macros matching their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        let stage = event.stage();
        match event.severity() {
            StageSeverity::Info => tracing::info!(stage = %stage, "{event}"),
            StageSeverity::Warning => tracing::warn!(stage = %stage, "{event}"),
            StageSeverity::Error => tracing::error!(stage = %stage, "{event}"),
            StageSeverity::Critical => tracing::error!(stage = %stage, critical = true, "{event}"),
        }
    }
}

/// An observer that fans out events to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_event(&self, event: &PipelineEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }
}
