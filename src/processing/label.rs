//! `Failure Type` derivation from the five cause flags.
//!
//! Each row is labelled with the cause flag holding the maximum value, scanning the flags in the
//! fixed order `TWF, HDF, PWF, OSF, RNF`. Ties go to the earliest flag in that order. That means
//! a row with no cause flag set is labelled [`FailureType::ToolWear`]; this is a known artifact of
//! the first-argmax rule and is kept for compatibility with existing processed datasets.

use std::fmt;

use serde::Serialize;

use crate::error::{StageError, StageResult};
use crate::observability::{PipelineEvent, PipelineObserver, Stage};
use crate::types::{DataSet, DataType, Field, Value};

use super::numeric_cell;
use super::validate::{require_column, validate_columns};

/// Cause-flag columns in precedence order.
pub const CAUSE_FLAG_COLUMNS: [&str; 5] = ["TWF", "HDF", "PWF", "OSF", "RNF"];

/// Aggregate failure flag column.
pub const MACHINE_FAILURE_COLUMN: &str = "Machine failure";

/// Column written by [`derive_failure_type`].
pub const FAILURE_TYPE_COLUMN: &str = "Failure Type";

/// Categorical failure label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FailureType {
    #[serde(rename = "Tool Wear Failure")]
    ToolWear,
    #[serde(rename = "Heat Dissipation Failure")]
    HeatDissipation,
    #[serde(rename = "Power Failure")]
    Power,
    #[serde(rename = "Overstrain Failure")]
    Overstrain,
    #[serde(rename = "Random Failure")]
    Random,
}

impl FailureType {
    /// All labels, in the same order as [`CAUSE_FLAG_COLUMNS`].
    pub const ALL: [FailureType; 5] = [
        Self::ToolWear,
        Self::HeatDissipation,
        Self::Power,
        Self::Overstrain,
        Self::Random,
    ];

    /// Label text written to the `Failure Type` column.
    pub fn label(self) -> &'static str {
        match self {
            Self::ToolWear => "Tool Wear Failure",
            Self::HeatDissipation => "Heat Dissipation Failure",
            Self::Power => "Power Failure",
            Self::Overstrain => "Overstrain Failure",
            Self::Random => "Random Failure",
        }
    }

    /// The cause-flag column this label is derived from.
    pub fn flag_column(self) -> &'static str {
        CAUSE_FLAG_COLUMNS[self as usize]
    }

    /// Parse label text back into a [`FailureType`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pick the label for one row of flag values (first maximum wins).
pub fn failure_type_for_flags(flags: [f64; 5]) -> FailureType {
    let mut best = 0;
    for (i, v) in flags.iter().enumerate().skip(1) {
        if *v > flags[best] {
            best = i;
        }
    }
    FailureType::ALL[best]
}

/// Return a copy of `dataset` with a `Failure Type` column derived from the cause flags.
///
/// Fails with [`StageError::MissingColumns`] if any cause flag is absent and with
/// [`StageError::Computation`] on the first null or non-numeric flag cell. On failure no row is
/// labelled. On success the label distribution is reported to `observer`.
pub fn derive_failure_type(
    dataset: &DataSet,
    observer: &dyn PipelineObserver,
) -> StageResult<DataSet> {
    validate_columns(dataset, &CAUSE_FLAG_COLUMNS)?;
    let idxs = flag_indexes(dataset);

    let mut labels = Vec::with_capacity(dataset.row_count());
    for (row_pos, row) in dataset.rows.iter().enumerate() {
        let mut flags = [0.0; 5];
        for (slot, (&idx, column)) in flags.iter_mut().zip(idxs.iter().zip(CAUSE_FLAG_COLUMNS)) {
            *slot = numeric_cell(row, idx, row_pos, column)?.ok_or_else(|| StageError::Computation {
                row: row_pos,
                column: column.to_owned(),
                message: "null cause flag".to_string(),
            })?;
        }
        labels.push(Value::Utf8(failure_type_for_flags(flags).label().to_owned()));
    }

    let out = dataset.with_column(Field::new(FAILURE_TYPE_COLUMN, DataType::Utf8), labels);
    observer.on_event(&PipelineEvent::LabelDistribution {
        counts: label_distribution(&out),
    });
    Ok(out)
}

/// Count rows per `Failure Type`, most frequent first (ties in label order).
///
/// Returns an empty list when the column is absent. Unrecognised labels are ignored.
pub fn label_distribution(dataset: &DataSet) -> Vec<(FailureType, usize)> {
    let Some(column) = dataset.column(FAILURE_TYPE_COLUMN) else {
        return Vec::new();
    };

    let mut counts = [0usize; 5];
    for value in column {
        if let Some(t) = value.as_str().and_then(FailureType::from_label) {
            counts[t as usize] += 1;
        }
    }

    let mut out: Vec<(FailureType, usize)> = FailureType::ALL
        .into_iter()
        .zip(counts)
        .filter(|(_, n)| *n > 0)
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    out
}

/// Return a copy of `dataset` without rows labelled `Random Failure`.
///
/// Fails with [`StageError::MissingColumns`] if `Failure Type` has not been derived. Reports the
/// removed row count.
pub fn remove_random_failures(
    dataset: &DataSet,
    observer: &dyn PipelineObserver,
) -> StageResult<DataSet> {
    let idx = require_column(dataset, FAILURE_TYPE_COLUMN)?;

    let random = FailureType::Random.label();
    let out = dataset.filter_rows(|row| row.get(idx).and_then(Value::as_str) != Some(random));

    observer.on_event(&PipelineEvent::RowsRemoved {
        stage: Stage::RemoveRandomFailures,
        count: dataset.row_count() - out.row_count(),
    });
    Ok(out)
}

fn flag_indexes(dataset: &DataSet) -> Vec<usize> {
    CAUSE_FLAG_COLUMNS
        .iter()
        .filter_map(|c| dataset.schema.index_of(c))
        .collect()
}
