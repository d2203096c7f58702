//! In-memory cleaning stages.
//!
//! Every stage takes a `&DataSet` and returns a new one; none of them touch the filesystem.
//! They are listed here in the order the pipeline runs them:
//!
//! - [`normalize`]: float coercion of selected columns, canonical column names
//! - [`summary`]: optional summary statistics (read-only)
//! - [`label`]: `Failure Type` derivation and removal of random failures
//! - [`consistency`]: removal of rows whose `Machine failure` has no supporting cause flag
//! - [`relationship`]: diagnostic count of random failures without `Machine failure` (read-only)
//! - [`missing`]: percentage of rows with missing values (read-only)
//!
//! [`validate`] holds the column-presence check the stages share.
//!
//! ## Example
//!
//! ```rust
//! use predictive_maintenance_pipeline::observability::NoopObserver;
//! use predictive_maintenance_pipeline::processing::{derive_failure_type, remove_random_failures};
//! use predictive_maintenance_pipeline::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let columns = ["TWF", "HDF", "PWF", "OSF", "RNF", "Machine failure"];
//! let schema = Schema::new(columns.iter().map(|c| Field::new(*c, DataType::Int64)).collect());
//! let ds = DataSet::new(
//!     schema,
//!     vec![[0, 0, 0, 0, 1, 1].iter().map(|v| Value::Int64(*v)).collect()],
//! );
//!
//! let labelled = derive_failure_type(&ds, &NoopObserver).unwrap();
//! assert_eq!(labelled.rows[0][6], Value::Utf8("Random Failure".to_string()));
//!
//! let cleaned = remove_random_failures(&labelled, &NoopObserver).unwrap();
//! assert_eq!(cleaned.row_count(), 0);
//! ```

pub mod consistency;
pub mod label;
pub mod missing;
pub mod normalize;
pub mod relationship;
pub mod summary;
pub mod validate;

pub use consistency::remove_inconsistent;
pub use label::{FailureType, derive_failure_type, label_distribution, remove_random_failures};
pub use missing::{fill_missing_with_zero, missing_fraction};
pub use normalize::{cast_columns_to_float, rename_columns};
pub use relationship::{FailureRelationship, analyze_failure_relationship};
pub use summary::{DatasetSummary, ReduceOp, reduce, summarize};
pub use validate::validate_columns;

use crate::error::{StageError, StageResult};
use crate::types::Value;

/// Numeric view of a flag cell: `Ok(None)` for null, an error for non-numeric content.
fn numeric_cell(
    row: &[Value],
    idx: usize,
    row_pos: usize,
    column: &str,
) -> StageResult<Option<f64>> {
    match row.get(idx).unwrap_or(&Value::Null) {
        v if v.is_null() => Ok(None),
        Value::Utf8(s) => Err(StageError::Computation {
            row: row_pos,
            column: column.to_owned(),
            message: format!("non-numeric value '{s}'"),
        }),
        v => Ok(v.as_f64()),
    }
}
