//! Diagnostic report on random failures that the aggregate flag does not record.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::StageResult;
use crate::types::DataSet;

use super::label::MACHINE_FAILURE_COLUMN;
use super::numeric_cell;
use super::validate::{require_column, validate_columns};

/// Key of the single condition reported by [`analyze_failure_relationship`].
pub const RANDOM_WITHOUT_MACHINE_FAILURE: &str = "Random=1, Machine=0";

/// Rows matching one condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionMatches {
    /// Number of matching rows.
    pub count: usize,
    /// Origins of the matching rows (see [`DataSet::row_id`]): zero-based positions in the table
    /// as loaded, unaffected by rows dropped earlier.
    pub rows: Vec<usize>,
}

/// Condition label -> matches.
pub type FailureRelationship = BTreeMap<String, ConditionMatches>;

/// Find rows where `RNF == 1` while `Machine failure == 0`.
///
/// Read-only. Requires `RNF` and `Machine failure`.
pub fn analyze_failure_relationship(dataset: &DataSet) -> StageResult<FailureRelationship> {
    validate_columns(dataset, &["RNF", MACHINE_FAILURE_COLUMN])?;
    let rnf_idx = require_column(dataset, "RNF")?;
    let machine_idx = require_column(dataset, MACHINE_FAILURE_COLUMN)?;

    let mut rows = Vec::new();
    for (row_pos, row) in dataset.rows.iter().enumerate() {
        let rnf = numeric_cell(row, rnf_idx, row_pos, "RNF")?;
        let machine = numeric_cell(row, machine_idx, row_pos, MACHINE_FAILURE_COLUMN)?;
        if rnf == Some(1.0) && machine == Some(0.0) {
            rows.push(dataset.row_id(row_pos));
        }
    }

    let mut out = FailureRelationship::new();
    out.insert(
        RANDOM_WITHOUT_MACHINE_FAILURE.to_string(),
        ConditionMatches {
            count: rows.len(),
            rows,
        },
    );
    Ok(out)
}
