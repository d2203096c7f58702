//! Type coercion and canonical column names, applied before the cleaning stages.

use std::collections::BTreeMap;

use crate::error::{StageError, StageResult};
use crate::observability::{PipelineEvent, PipelineObserver, Stage, StageSeverity};
use crate::types::{DataSet, DataType, Field, Value};

use super::validate::require_column;

/// Return a copy of `dataset` with column `name` converted to `Float64`.
///
/// Integers and booleans convert directly, strings must parse as floats, nulls stay null.
pub fn cast_column_to_float(dataset: &DataSet, name: &str) -> StageResult<DataSet> {
    let idx = require_column(dataset, name)?;

    let values = dataset
        .rows
        .iter()
        .enumerate()
        .map(|(row_pos, row)| match row.get(idx).unwrap_or(&Value::Null) {
            Value::Null => Ok(Value::Null),
            Value::Utf8(s) => s.trim().parse::<f64>().map(Value::Float64).map_err(|e| {
                StageError::Computation {
                    row: row_pos,
                    column: name.to_owned(),
                    message: format!("cannot convert '{s}' to float: {e}"),
                }
            }),
            other => Ok(other.as_f64().map(Value::Float64).unwrap_or(Value::Null)),
        })
        .collect::<StageResult<Vec<_>>>()?;

    Ok(dataset.with_column(Field::new(name, DataType::Float64), values))
}

/// Convert each listed column to `Float64`.
///
/// A missing column is reported as a warning and a column that fails to convert is reported as
/// an error and left as it was. Neither stops the remaining columns from being converted.
pub fn cast_columns_to_float<S: AsRef<str>>(
    dataset: &DataSet,
    columns: &[S],
    observer: &dyn PipelineObserver,
) -> DataSet {
    let mut out = dataset.clone();
    for column in columns.iter().map(AsRef::as_ref) {
        match cast_column_to_float(&out, column) {
            Ok(next) => {
                out = next;
                observer.on_event(&PipelineEvent::ColumnConverted {
                    column: column.to_owned(),
                    data_type: DataType::Float64,
                });
            }
            Err(StageError::MissingColumns { .. }) => {
                observer.on_event(&PipelineEvent::ColumnNotFound {
                    stage: Stage::NormalizeTypes,
                    column: column.to_owned(),
                })
            }
            Err(err) => observer.on_event(&PipelineEvent::StageFailed {
                stage: Stage::NormalizeTypes,
                severity: StageSeverity::Error,
                message: format!("error converting column {column}: {err}"),
            }),
        }
    }
    out
}

/// Return a copy of `dataset` with columns renamed according to `rename_map` (old -> new).
///
/// Map entries that match no column are ignored. Reports the resulting column list.
pub fn rename_columns(
    dataset: &DataSet,
    rename_map: &BTreeMap<String, String>,
    observer: &dyn PipelineObserver,
) -> DataSet {
    let mut out = dataset.clone();
    for field in &mut out.schema.fields {
        if let Some(new_name) = rename_map.get(&field.name) {
            field.name = new_name.clone();
        }
    }
    observer.on_event(&PipelineEvent::ColumnsRenamed {
        columns: out.column_names(),
    });
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::observability::NoopObserver;
    use crate::types::Schema;

    #[derive(Default)]
    struct Recording(Mutex<Vec<PipelineEvent>>);

    impl PipelineObserver for Recording {
        fn on_event(&self, event: &PipelineEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn raw() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("Rotational speed [rpm]", DataType::Int64),
            Field::new("Tool wear [min]", DataType::Utf8),
            Field::new("Type", DataType::Utf8),
        ]);
        DataSet::new(
            schema,
            vec![
                vec![
                    Value::Int64(1551),
                    Value::Utf8("3".to_string()),
                    Value::Utf8("M".to_string()),
                ],
                vec![Value::Null, Value::Utf8("5.5".to_string()), Value::Utf8("L".to_string())],
            ],
        )
    }

    #[test]
    fn casts_integers_and_numeric_strings() {
        let out = cast_columns_to_float(
            &raw(),
            &["Rotational speed [rpm]", "Tool wear [min]"],
            &NoopObserver,
        );
        assert_eq!(out.schema.fields[0].data_type, DataType::Float64);
        assert_eq!(out.schema.fields[1].data_type, DataType::Float64);
        assert_eq!(out.rows[0][0], Value::Float64(1551.0));
        assert_eq!(out.rows[1][0], Value::Null);
        assert_eq!(out.rows[1][1], Value::Float64(5.5));
    }

    #[test]
    fn missing_and_unconvertible_columns_are_reported_not_fatal() {
        let obs = Recording::default();
        let out = cast_columns_to_float(&raw(), &["Type", "Torque [Nm]", "Tool wear [min]"], &obs);

        assert_eq!(out.schema.fields[2].data_type, DataType::Utf8);
        assert_eq!(out.schema.fields[1].data_type, DataType::Float64);

        let events = obs.0.lock().unwrap();
        let severities: Vec<StageSeverity> = events.iter().map(PipelineEvent::severity).collect();
        assert_eq!(
            severities,
            vec![StageSeverity::Error, StageSeverity::Warning, StageSeverity::Info]
        );
    }

    #[test]
    fn rename_maps_known_columns_and_keeps_order() {
        let mut map = BTreeMap::new();
        map.insert("Tool wear [min]".to_string(), "Tool wear".to_string());
        map.insert("Torque [Nm]".to_string(), "Torque".to_string());

        let obs = Recording::default();
        let out = rename_columns(&raw(), &map, &obs);

        assert_eq!(
            out.column_names(),
            vec!["Rotational speed [rpm]", "Tool wear", "Type"]
        );
        assert_eq!(out.rows, raw().rows);
        assert_eq!(
            obs.0.lock().unwrap().as_slice(),
            &[PipelineEvent::ColumnsRenamed {
                columns: out.column_names()
            }]
        );
    }
}
