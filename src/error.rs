use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for load/verify/save operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Convenience result type for the in-memory cleaning stages.
pub type StageResult<T> = Result<T, StageError>;

/// Error type for operations that touch the filesystem or parse input.
///
/// These are the only errors that can abort a pipeline run (see [`crate::pipeline`]).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (config or summary) error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input does not conform to the provided schema (missing required columns, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be parsed into the required [`crate::types::DataType`].
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// The input path does not point at a regular file.
    #[error("file not found: {}", path.display())]
    NotAFile { path: PathBuf },

    /// The input file's SHA-256 differs from the expected digest.
    #[error(
        "file hash does not match the expected hash for {}: expected {expected}, got {actual}",
        path.display()
    )]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

/// Error type returned by a cleaning stage.
///
/// A stage error never aborts the pipeline: the orchestrator reports it and carries on with the
/// table the stage was given.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    /// One or more required columns are absent from the table.
    #[error("missing required columns: {missing:?}")]
    MissingColumns { missing: Vec<String> },

    /// A row-level computation failed; the stage produced no output.
    #[error("failed to compute at row {row} column '{column}': {message}")]
    Computation {
        row: usize,
        column: String,
        message: String,
    },
}
