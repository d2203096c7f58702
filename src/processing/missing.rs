//! Missing-data accounting.

use crate::types::{DataSet, DataType, Value};

/// Number of rows with at least one null cell.
pub fn rows_with_missing(dataset: &DataSet) -> usize {
    dataset.reduce_rows(0, |acc, row| {
        if row.iter().any(Value::is_null) {
            acc + 1
        } else {
            acc
        }
    })
}

/// Percentage (0-100) of rows with at least one null cell; `0.0` for an empty table.
pub fn missing_fraction(dataset: &DataSet) -> f64 {
    let total = dataset.row_count();
    if total == 0 {
        return 0.0;
    }
    100.0 * rows_with_missing(dataset) as f64 / total as f64
}

/// Replace every null cell with the zero value of its column type.
///
/// `Int64 -> 0`, `Float64 -> 0.0`, `Bool -> false`, `Utf8 -> "0"`.
pub fn fill_missing_with_zero(dataset: &DataSet) -> DataSet {
    let zeros: Vec<Value> = dataset
        .schema
        .fields
        .iter()
        .map(|f| match f.data_type {
            DataType::Int64 => Value::Int64(0),
            DataType::Float64 => Value::Float64(0.0),
            DataType::Bool => Value::Bool(false),
            DataType::Utf8 => Value::Utf8("0".to_string()),
        })
        .collect();

    dataset.map_rows(|row| {
        row.iter()
            .zip(&zeros)
            .map(|(v, zero)| if v.is_null() { zero.clone() } else { v.clone() })
            .collect()
    })
}
