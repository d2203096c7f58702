//! Removal of rows whose aggregate failure flag is not backed by any cause flag.

use crate::error::StageResult;
use crate::observability::{PipelineEvent, PipelineObserver, Stage};
use crate::types::DataSet;

use super::label::{CAUSE_FLAG_COLUMNS, MACHINE_FAILURE_COLUMN};
use super::numeric_cell;
use super::validate::{require_column, validate_columns};

/// `true` when the aggregate flag asserts a failure that no cause flag supports.
pub fn is_inconsistent(machine_failure: Option<f64>, cause_flag_sum: f64) -> bool {
    machine_failure == Some(1.0) && cause_flag_sum == 0.0
}

/// Return a copy of `dataset` without rows where `Machine failure == 1` and every cause flag is 0.
///
/// Null cells are skipped when summing the cause flags, and a null `Machine failure` never counts
/// as `1`. Requires `Machine failure` and all five cause flags; reports the removed row count.
/// Applying the filter to its own output removes nothing.
pub fn remove_inconsistent(
    dataset: &DataSet,
    observer: &dyn PipelineObserver,
) -> StageResult<DataSet> {
    let mut required = vec![MACHINE_FAILURE_COLUMN];
    required.extend(CAUSE_FLAG_COLUMNS);
    validate_columns(dataset, &required)?;
    let machine_idx = require_column(dataset, MACHINE_FAILURE_COLUMN)?;
    let flag_idxs: Vec<(usize, &str)> = CAUSE_FLAG_COLUMNS
        .iter()
        .filter_map(|c| dataset.schema.index_of(c).map(|i| (i, *c)))
        .collect();

    // Decide every row up front so a bad cell fails the stage before anything is dropped.
    let mut keep = Vec::with_capacity(dataset.row_count());
    for (row_pos, row) in dataset.rows.iter().enumerate() {
        let machine_failure = numeric_cell(row, machine_idx, row_pos, MACHINE_FAILURE_COLUMN)?;
        let mut cause_sum = 0.0;
        for &(idx, column) in &flag_idxs {
            cause_sum += numeric_cell(row, idx, row_pos, column)?.unwrap_or(0.0);
        }
        keep.push(!is_inconsistent(machine_failure, cause_sum));
    }

    let mut verdicts = keep.into_iter();
    let out = dataset.filter_rows(|_| verdicts.next().unwrap_or(true));

    observer.on_event(&PipelineEvent::RowsRemoved {
        stage: Stage::RemoveInconsistent,
        count: dataset.row_count() - out.row_count(),
    });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageError;
    use crate::observability::NoopObserver;
    use crate::processing::test_support::flag_dataset;
    use crate::types::Value;

    fn sample() -> DataSet {
        flag_dataset(&[
            [0, 0, 0, 0, 0, 1], // inconsistent
            [1, 0, 0, 0, 0, 1],
            [0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 1, 0],
            [0, 0, 0, 0, 0, 1], // inconsistent
            [0, 1, 1, 0, 0, 1],
        ])
    }

    fn machine_failure_holds(ds: &DataSet) -> bool {
        let mf = ds.schema.index_of(MACHINE_FAILURE_COLUMN).unwrap();
        ds.rows.iter().all(|row| {
            let sum: f64 = CAUSE_FLAG_COLUMNS
                .iter()
                .map(|c| row[ds.schema.index_of(c).unwrap()].as_f64().unwrap_or(0.0))
                .sum();
            row[mf].as_f64() != Some(1.0) || sum >= 1.0
        })
    }

    #[test]
    fn removes_rows_with_failure_but_no_cause() {
        let ds = sample();
        let out = remove_inconsistent(&ds, &NoopObserver).unwrap();
        assert_eq!(out.row_count(), 4);
        assert!(machine_failure_holds(&out));
        assert!(!machine_failure_holds(&ds));
    }

    #[test]
    fn filter_is_idempotent() {
        let once = remove_inconsistent(&sample(), &NoopObserver).unwrap();
        let twice = remove_inconsistent(&once, &NoopObserver).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn null_machine_failure_is_kept_and_null_flags_count_as_zero() {
        let mut ds = flag_dataset(&[[0, 0, 0, 0, 0, 1], [0, 0, 0, 0, 0, 1]]);
        ds.rows[0][5] = Value::Null;
        ds.rows[1][0] = Value::Null;
        let out = remove_inconsistent(&ds, &NoopObserver).unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.rows[0][5], Value::Null);
    }

    #[test]
    fn missing_machine_failure_is_a_schema_error() {
        let ds = sample();
        let trimmed = DataSet::new(
            crate::types::Schema::new(ds.schema.fields[..5].to_vec()),
            ds.rows.iter().map(|r| r[..5].to_vec()).collect(),
        );
        let err = remove_inconsistent(&trimmed, &NoopObserver).unwrap_err();
        assert_eq!(
            err,
            StageError::MissingColumns {
                missing: vec![MACHINE_FAILURE_COLUMN.to_string()]
            }
        );
    }

    #[test]
    fn non_numeric_flag_fails_without_dropping_rows() {
        let mut ds = sample();
        ds.rows[3][1] = Value::Utf8("n/a".to_string());
        let err = remove_inconsistent(&ds, &NoopObserver).unwrap_err();
        assert!(matches!(err, StageError::Computation { row: 3, .. }));
    }

    #[test]
    fn predicate_matches_rule() {
        assert!(is_inconsistent(Some(1.0), 0.0));
        assert!(!is_inconsistent(Some(1.0), 2.0));
        assert!(!is_inconsistent(Some(0.0), 0.0));
        assert!(!is_inconsistent(None, 0.0));
    }
}
