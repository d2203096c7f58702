//! Column reductions and the dataset summary written when `--visualize` is set.
//!
//! The summary holds the numbers the exploratory plots were drawn from: machine-type shares, the
//! spread of numeric product IDs and per-feature min/max/mean. Rendering is left to downstream
//! tools.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::observability::{PipelineEvent, PipelineObserver, Stage};
use crate::types::{DataSet, DataType, Value};

/// Machine type column.
pub const TYPE_COLUMN: &str = "Type";

/// Product identifier column (e.g. `M14860`).
pub const PRODUCT_ID_COLUMN: &str = "Product ID";

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("static regex"));

/// Built-in reduction operations over a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Count all rows (including nulls).
    Count,
    /// Sum numeric values, ignoring nulls.
    Sum,
    /// Minimum numeric value, ignoring nulls.
    Min,
    /// Maximum numeric value, ignoring nulls.
    Max,
    /// Arithmetic mean of numeric values as `Float64`, ignoring nulls.
    Mean,
}

/// Reduce a column using a built-in [`ReduceOp`].
///
/// - Returns `None` if `column` does not exist in the schema.
/// - For `Sum`/`Min`/`Max`/`Mean`, returns `Some(Value::Null)` if there are no non-null values or
///   the column is not numeric. An integer `Sum` that overflows `i64` is also `Value::Null`.
/// - For `Count`, always returns `Some(Value::Int64(row_count))`.
pub fn reduce(dataset: &DataSet, column: &str, op: ReduceOp) -> Option<Value> {
    let idx = dataset.schema.index_of(column)?;
    let data_type = dataset.schema.fields[idx].data_type;

    let result = match (op, data_type) {
        (ReduceOp::Count, _) => Value::Int64(dataset.row_count() as i64),
        (_, dt) if !dt.is_numeric() => Value::Null,
        (ReduceOp::Mean, _) => {
            let (sum, n) = numeric_values(dataset, idx)
                .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            if n == 0 {
                Value::Null
            } else {
                Value::Float64(sum / n as f64)
            }
        }
        (_, DataType::Int64) => {
            let acc = dataset.rows.iter().filter_map(|row| match row.get(idx) {
                Some(Value::Int64(v)) => Some(*v),
                _ => None,
            });
            let acc = match op {
                // Overflow yields null.
                ReduceOp::Sum => acc.map(Some).reduce(|a, b| a?.checked_add(b?)).flatten(),
                ReduceOp::Min => acc.min(),
                _ => acc.max(),
            };
            acc.map(Value::Int64).unwrap_or(Value::Null)
        }
        _ => {
            let acc = numeric_values(dataset, idx);
            let acc = match op {
                ReduceOp::Sum => acc.reduce(|a, b| a + b),
                ReduceOp::Min => acc.reduce(f64::min),
                _ => acc.reduce(f64::max),
            };
            acc.map(Value::Float64).unwrap_or(Value::Null)
        }
    };
    Some(result)
}

fn numeric_values(dataset: &DataSet, idx: usize) -> impl Iterator<Item = f64> + '_ {
    dataset.rows.iter().filter_map(move |row| row.get(idx).and_then(Value::as_f64))
}

/// Min/max/mean of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    /// Column name.
    pub column: String,
    /// Number of non-null values.
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl NumericSummary {
    /// Summarise a numeric column. Returns `None` if the column is absent or not numeric.
    pub fn from_column(dataset: &DataSet, column: &str) -> Option<Self> {
        let idx = dataset.schema.index_of(column)?;
        if !dataset.schema.fields[idx].data_type.is_numeric() {
            return None;
        }
        Some(Self {
            column: column.to_owned(),
            count: numeric_values(dataset, idx).count(),
            min: reduce(dataset, column, ReduceOp::Min).and_then(|v| v.as_f64()),
            max: reduce(dataset, column, ReduceOp::Max).and_then(|v| v.as_f64()),
            mean: reduce(dataset, column, ReduceOp::Mean).and_then(|v| v.as_f64()),
        })
    }

    fn from_values(column: &str, values: &[f64]) -> Self {
        let count = values.len();
        Self {
            column: column.to_owned(),
            count,
            min: values.iter().copied().reduce(f64::min),
            max: values.iter().copied().reduce(f64::max),
            mean: (count > 0).then(|| values.iter().sum::<f64>() / count as f64),
        }
    }
}

/// Share of rows per category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub value: String,
    pub count: usize,
    /// Percentage of all rows (0-100).
    pub percent: f64,
}

/// Data behind the exploratory plots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    /// Total rows summarised.
    pub rows: usize,
    /// Percentage of machines by `Type`, most common first. Empty if the column is absent.
    pub machine_types: Vec<CategoryShare>,
    /// Spread of the numeric part of `Product ID`. `None` if the column is absent.
    pub product_id: Option<NumericSummary>,
    /// One entry per requested feature that is present and numeric.
    pub numeric_features: Vec<NumericSummary>,
}

/// Percentage of rows per distinct value of `column`, most common first (ties by first
/// appearance). Nulls are not counted as a category. Returns `None` if the column is absent.
pub fn value_shares(dataset: &DataSet, column: &str) -> Option<Vec<CategoryShare>> {
    let values = dataset.column(column)?;
    let total = dataset.row_count();

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for v in values.filter(|v| !v.is_null()) {
        let key = v.to_string();
        let n = counts.entry(key.clone()).or_insert(0);
        if *n == 0 {
            order.push(key);
        }
        *n += 1;
    }

    let mut shares: Vec<CategoryShare> = order
        .into_iter()
        .map(|value| {
            let count = counts[&value];
            CategoryShare {
                percent: 100.0 * count as f64 / total as f64,
                value,
                count,
            }
        })
        .collect();
    // Stable sort keeps first-appearance order among equal counts.
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    Some(shares)
}

/// Numeric part of a product identifier: the first run of digits, e.g. `M14860 -> 14860.0`.
pub fn product_id_number(id: &str) -> Option<f64> {
    DIGITS.find(id).and_then(|m| m.as_str().parse().ok())
}

/// Build the [`DatasetSummary`] for `dataset`.
///
/// Missing `Type`/`Product ID` columns and an empty numeric feature set are reported as warnings.
/// The dataset is not modified.
pub fn summarize<S: AsRef<str>>(
    dataset: &DataSet,
    numeric_features: &[S],
    observer: &dyn PipelineObserver,
) -> DatasetSummary {
    let machine_types = value_shares(dataset, TYPE_COLUMN).unwrap_or_else(|| {
        observer.on_event(&PipelineEvent::ColumnNotFound {
            stage: Stage::Summarize,
            column: TYPE_COLUMN.to_string(),
        });
        Vec::new()
    });

    let product_id = match dataset.column(PRODUCT_ID_COLUMN) {
        Some(ids) => {
            let numbers: Vec<f64> = ids
                .filter_map(|v| match v {
                    Value::Utf8(s) => product_id_number(s),
                    other => other.as_f64(),
                })
                .collect();
            Some(NumericSummary::from_values(PRODUCT_ID_COLUMN, &numbers))
        }
        None => {
            observer.on_event(&PipelineEvent::ColumnNotFound {
                stage: Stage::Summarize,
                column: PRODUCT_ID_COLUMN.to_string(),
            });
            None
        }
    };

    let numeric_features: Vec<NumericSummary> = numeric_features
        .iter()
        .filter_map(|c| NumericSummary::from_column(dataset, c.as_ref()))
        .collect();
    if numeric_features.is_empty() {
        observer.on_event(&PipelineEvent::NoNumericFeatures);
    }

    DatasetSummary {
        rows: dataset.row_count(),
        machine_types,
        product_id,
        numeric_features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::NoopObserver;
    use crate::types::{Field, Schema};

    fn numeric_dataset_with_nulls() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("UDI", DataType::Int64),
            Field::new("Torque", DataType::Float64),
        ]);

        let rows = vec![
            vec![Value::Int64(1), Value::Float64(10.0)],
            vec![Value::Int64(2), Value::Null],
            vec![Value::Int64(3), Value::Float64(5.5)],
        ];

        DataSet::new(schema, rows)
    }

    fn telemetry() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("Product ID", DataType::Utf8),
            Field::new("Type", DataType::Utf8),
            Field::new("Torque", DataType::Float64),
        ]);
        let row = |id: &str, t: &str, torque: f64| {
            vec![
                Value::Utf8(id.to_string()),
                Value::Utf8(t.to_string()),
                Value::Float64(torque),
            ]
        };
        DataSet::new(
            schema,
            vec![
                row("M14860", "M", 42.8),
                row("L47181", "L", 46.3),
                row("L47182", "L", 49.4),
                row("H29424", "H", 40.0),
            ],
        )
    }

    #[test]
    fn reduce_count_counts_rows() {
        let ds = numeric_dataset_with_nulls();
        assert_eq!(reduce(&ds, "Torque", ReduceOp::Count), Some(Value::Int64(3)));
    }

    #[test]
    fn reduce_sum_ignores_nulls_and_preserves_type() {
        let ds = numeric_dataset_with_nulls();
        assert_eq!(reduce(&ds, "Torque", ReduceOp::Sum), Some(Value::Float64(15.5)));
        assert_eq!(reduce(&ds, "UDI", ReduceOp::Sum), Some(Value::Int64(6)));
    }

    #[test]
    fn reduce_integer_sum_overflow_is_null() {
        let schema = Schema::new(vec![Field::new("UDI", DataType::Int64)]);
        let ds = DataSet::new(
            schema,
            vec![vec![Value::Int64(i64::MAX)], vec![Value::Null], vec![Value::Int64(1)]],
        );
        assert_eq!(reduce(&ds, "UDI", ReduceOp::Sum), Some(Value::Null));
        assert_eq!(reduce(&ds, "UDI", ReduceOp::Max), Some(Value::Int64(i64::MAX)));
    }

    #[test]
    fn reduce_min_max_mean_ignore_nulls() {
        let ds = numeric_dataset_with_nulls();
        assert_eq!(reduce(&ds, "Torque", ReduceOp::Min), Some(Value::Float64(5.5)));
        assert_eq!(reduce(&ds, "Torque", ReduceOp::Max), Some(Value::Float64(10.0)));
        assert_eq!(reduce(&ds, "Torque", ReduceOp::Mean), Some(Value::Float64(7.75)));
        assert_eq!(reduce(&ds, "UDI", ReduceOp::Max), Some(Value::Int64(3)));
        assert_eq!(reduce(&ds, "UDI", ReduceOp::Mean), Some(Value::Float64(2.0)));
    }

    #[test]
    fn reduce_returns_none_for_missing_column_and_null_for_all_null() {
        let ds = numeric_dataset_with_nulls();
        assert_eq!(reduce(&ds, "missing", ReduceOp::Sum), None);

        let schema = Schema::new(vec![Field::new("Torque", DataType::Float64)]);
        let ds = DataSet::new(schema, vec![vec![Value::Null], vec![Value::Null]]);
        assert_eq!(reduce(&ds, "Torque", ReduceOp::Mean), Some(Value::Null));
        assert_eq!(reduce(&ds, "Torque", ReduceOp::Min), Some(Value::Null));
    }

    #[test]
    fn product_id_number_takes_first_digit_run() {
        assert_eq!(product_id_number("M14860"), Some(14860.0));
        assert_eq!(product_id_number("L47181-2"), Some(47181.0));
        assert_eq!(product_id_number("none"), None);
    }

    #[test]
    fn machine_type_shares_sum_to_one_hundred() {
        let shares = value_shares(&telemetry(), "Type").unwrap();
        assert_eq!(shares[0].value, "L");
        assert_eq!(shares[0].count, 2);
        assert_eq!(shares[0].percent, 50.0);
        assert_eq!(shares[1].value, "M");
        let total: f64 = shares.iter().map(|s| s.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn summarize_collects_all_sections_without_mutating() {
        let ds = telemetry();
        let summary = summarize(&ds, &["Torque", "Air temperature"], &NoopObserver);

        assert_eq!(summary.rows, 4);
        let pid = summary.product_id.unwrap();
        assert_eq!(pid.count, 4);
        assert_eq!(pid.min, Some(14860.0));
        assert_eq!(pid.max, Some(47182.0));
        assert_eq!(summary.numeric_features.len(), 1);
        assert_eq!(summary.numeric_features[0].column, "Torque");
        assert_eq!(summary.numeric_features[0].max, Some(49.4));
        assert_eq!(ds, telemetry());
    }
}
