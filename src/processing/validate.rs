//! Required-column checks shared by every stage.

use crate::error::{StageError, StageResult};
use crate::types::DataSet;

/// Return the required columns absent from `dataset`, in the order they were requested.
pub fn missing_columns<S: AsRef<str>>(dataset: &DataSet, required: &[S]) -> Vec<String> {
    required
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !dataset.schema.contains(name))
        .map(str::to_owned)
        .collect()
}

/// Check that every column in `required` is present.
///
/// Returns [`StageError::MissingColumns`] naming the missing subset otherwise. The check has no
/// side effects; callers decide how to report a failure.
pub fn validate_columns<S: AsRef<str>>(dataset: &DataSet, required: &[S]) -> StageResult<()> {
    let missing = missing_columns(dataset, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StageError::MissingColumns { missing })
    }
}

/// Index of a single required column, or [`StageError::MissingColumns`] naming it.
pub fn require_column(dataset: &DataSet, name: &str) -> StageResult<usize> {
    dataset
        .schema
        .index_of(name)
        .ok_or_else(|| StageError::MissingColumns {
            missing: vec![name.to_owned()],
        })
}
