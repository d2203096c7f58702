//! CSV ingestion implementation.

use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::error::{PipelineError, PipelineResult};
use crate::processing::missing::fill_missing_with_zero;
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Options for [`ingest_csv_inferred_from_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Replace every null cell with a type-appropriate zero after loading.
    pub fill_missing: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { fill_missing: true }
    }
}

/// Ingest a CSV file into an in-memory [`DataSet`] using an explicit schema.
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must contain all schema fields (order can differ).
/// - Each value is parsed according to the schema field type.
pub fn ingest_csv_from_path(path: impl AsRef<Path>, schema: &Schema) -> PipelineResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr, schema)
}

/// Ingest CSV data from an existing CSV reader using an explicit schema.
pub fn ingest_csv_from_reader<R: Read>(
    rdr: &mut csv::Reader<R>,
    schema: &Schema,
) -> PipelineResult<DataSet> {
    let headers = rdr.headers()?.clone();
    let col_idxs = column_indexes(&headers, schema)?;

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        let record = result?;
        rows.push(parse_row(row_idx0, &record, schema, &col_idxs)?);
    }

    Ok(DataSet::new(schema.clone(), rows))
}

/// Ingest a CSV file, inferring the column types from its contents.
///
/// Every column in the header is kept, in file order. See [`infer_schema`] for the type rules.
pub fn ingest_csv_inferred_from_path(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> PipelineResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    ingest_csv_inferred_from_reader(&mut rdr, options)
}

/// Ingest CSV data from an existing reader, inferring column types.
pub fn ingest_csv_inferred_from_reader<R: Read>(
    rdr: &mut csv::Reader<R>,
    options: &LoadOptions,
) -> PipelineResult<DataSet> {
    let headers = rdr.headers()?.clone();
    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;

    let schema = infer_schema(&headers, &records);
    let col_idxs: Vec<usize> = (0..schema.fields.len()).collect();

    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(records.len());
    for (row_idx0, record) in records.iter().enumerate() {
        rows.push(parse_row(row_idx0, record, &schema, &col_idxs)?);
    }

    let ds = DataSet::new(schema, rows);
    Ok(if options.fill_missing {
        fill_missing_with_zero(&ds)
    } else {
        ds
    })
}

/// Infer a [`Schema`] from CSV headers and records.
///
/// Per column, ignoring empty cells: `Int64` if every cell parses as an integer, else `Float64`
/// if every cell parses as a float, else `Bool` if every cell is `true`/`false` (any case), else
/// `Utf8`. An integer column with any empty cell is `Float64`, as is a column with no non-empty
/// cells.
pub fn infer_schema(headers: &StringRecord, records: &[StringRecord]) -> Schema {
    let fields = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells = records.iter().map(|r| r.get(idx).unwrap_or(""));
            Field::new(name, infer_column_type(cells))
        })
        .collect();
    Schema::new(fields)
}

fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str>) -> DataType {
    let (mut seen, mut has_empty) = (false, false);
    let (mut int, mut float, mut boolean) = (true, true, true);

    for raw in cells {
        let cell = raw.trim();
        if cell.is_empty() {
            has_empty = true;
            continue;
        }
        seen = true;
        int = int && cell.parse::<i64>().is_ok();
        float = float && cell.parse::<f64>().is_ok();
        boolean = boolean
            && (cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false"));
        if !(int || float || boolean) {
            return DataType::Utf8;
        }
    }

    match (seen, int, float, boolean) {
        (false, ..) => DataType::Float64,
        (true, true, _, _) if !has_empty => DataType::Int64,
        (true, true, _, _) => DataType::Float64,
        (true, false, true, _) => DataType::Float64,
        (true, false, false, true) => DataType::Bool,
        _ => DataType::Utf8,
    }
}

// Map schema fields -> CSV column indexes (allows re-ordered CSV columns).
fn column_indexes(headers: &StringRecord, schema: &Schema) -> PipelineResult<Vec<usize>> {
    schema
        .fields
        .iter()
        .map(|field| {
            headers
                .iter()
                .position(|h| h == field.name)
                .ok_or_else(|| PipelineError::SchemaMismatch {
                    message: format!(
                        "missing required column '{field}'. headers={:?}",
                        headers.iter().collect::<Vec<_>>(),
                        field = field.name
                    ),
                })
        })
        .collect()
}

fn parse_row(
    row_idx0: usize,
    record: &StringRecord,
    schema: &Schema,
    col_idxs: &[usize],
) -> PipelineResult<Vec<Value>> {
    // Report 1-based row number for users; +1 again because header is row 1.
    let user_row = row_idx0 + 2;
    schema
        .fields
        .iter()
        .zip(col_idxs)
        .map(|(field, &csv_idx)| {
            let raw = record.get(csv_idx).unwrap_or("");
            parse_typed_value(user_row, &field.name, field.data_type, raw)
        })
        .collect()
}

fn parse_typed_value(
    row: usize,
    column: &str,
    data_type: DataType,
    raw: &str,
) -> PipelineResult<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    let parse_error = |message: String| PipelineError::ParseError {
        row,
        column: column.to_owned(),
        raw: raw.to_owned(),
        message,
    };

    match data_type {
        DataType::Utf8 => Ok(Value::Utf8(trimmed.to_owned())),
        DataType::Int64 => trimmed
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| parse_error(e.to_string())),
        DataType::Float64 => trimmed
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|e| parse_error(e.to_string())),
        DataType::Bool => parse_bool(trimmed).map(Value::Bool).map_err(parse_error),
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}
