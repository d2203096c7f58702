//! Writing a [`DataSet`] back to CSV.
//!
//! Output has a header row followed by the rows in table order, columns in schema order, and no
//! index column. Cells are formatted with [`Value`]'s `Display` impl (nulls become empty cells).

use std::io::Write;
use std::path::Path;

use crate::error::PipelineResult;
use crate::types::{DataSet, Value};

/// Write `dataset` to a CSV file at `path`, replacing any existing file.
pub fn write_csv_to_path(dataset: &DataSet, path: impl AsRef<Path>) -> PipelineResult<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    write_csv_to_writer(dataset, &mut wtr)
}

/// Write `dataset` through an existing CSV writer, then flush it.
pub fn write_csv_to_writer<W: Write>(
    dataset: &DataSet,
    wtr: &mut csv::Writer<W>,
) -> PipelineResult<()> {
    wtr.write_record(dataset.schema.field_names())?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(Value::to_string))?;
    }
    wtr.flush()?;
    Ok(())
}
