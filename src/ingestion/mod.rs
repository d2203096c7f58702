//! Loading raw telemetry into a [`crate::types::DataSet`].
//!
//! - [`verify`]: existence and SHA-256 integrity checks run before anything is parsed
//! - [`csv`]: CSV ingestion, either against an explicit [`crate::types::Schema`] or with
//!   per-column type inference

pub mod csv;
pub mod verify;

pub use csv::{
    LoadOptions, infer_schema, ingest_csv_from_path, ingest_csv_from_reader,
    ingest_csv_inferred_from_path, ingest_csv_inferred_from_reader,
};
pub use verify::{hash_file, verify_file};
