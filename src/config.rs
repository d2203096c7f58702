//! Pipeline configuration.
//!
//! Every field has a default matching the AI4I 2020 predictive-maintenance dataset layout, so an
//! empty JSON object (`{}`) is a valid config file. Command-line flags override file values.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;

/// File name of the cleaned CSV written into the output directory.
pub const PROCESSED_FILE_NAME: &str = "processed_data.csv";

/// File name of the JSON summary written when `visualize` is set.
pub const SUMMARY_FILE_NAME: &str = "visualization_summary.json";

/// Column handling: float coercion, renaming and the features to summarise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Raw column name -> canonical name.
    pub rename_map: BTreeMap<String, String>,
    /// Columns coerced to `Float64` before renaming (raw names).
    pub float_columns: Vec<String>,
    /// Numeric features included in the summary (canonical names).
    pub summary_features: Vec<String>,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        let rename_map = [
            ("Air temperature [K]", "Air temperature"),
            ("Process temperature [K]", "Process temperature"),
            ("Rotational speed [rpm]", "Rotational speed"),
            ("Torque [Nm]", "Torque"),
            ("Tool wear [min]", "Tool wear"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        Self {
            rename_map,
            float_columns: vec![
                "Tool wear [min]".to_string(),
                "Rotational speed [rpm]".to_string(),
            ],
            summary_features: [
                "Air temperature",
                "Process temperature",
                "Rotational speed",
                "Torque",
                "Tool wear",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw input CSV.
    pub input_path: PathBuf,
    /// Directory receiving `processed_data.csv` (created if missing).
    pub output_dir: PathBuf,
    /// Write `visualization_summary.json` alongside the processed data.
    pub visualize: bool,
    /// Expected SHA-256 of the input file, hex encoded.
    pub expected_hash: Option<String>,
    /// Replace nulls with zero right after loading.
    pub fill_missing: bool,
    pub columns: ColumnConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data/raw/kaggle_datasets/ai4i2020.csv"),
            output_dir: PathBuf::from("data/processed"),
            visualize: false,
            expected_hash: None,
            fill_missing: true,
            columns: ColumnConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a config from a JSON file. Missing keys take their defaults.
    pub fn from_json_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Where the cleaned CSV is written.
    pub fn processed_path(&self) -> PathBuf {
        self.output_dir.join(PROCESSED_FILE_NAME)
    }

    /// Where the summary JSON is written.
    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(SUMMARY_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert!(cfg.fill_missing);
        assert_eq!(cfg.columns.rename_map["Torque [Nm]"], "Torque");
    }

    #[test]
    fn partial_json_overrides_only_given_keys() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{"output_dir": "out", "columns": {"float_columns": ["Torque [Nm]"]}}"#,
        )
        .unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
        assert_eq!(cfg.columns.float_columns, vec!["Torque [Nm]".to_string()]);
        assert_eq!(cfg.columns.rename_map.len(), 5);
        assert_eq!(cfg.processed_path(), PathBuf::from("out").join("processed_data.csv"));
    }

    #[test]
    fn unknown_file_is_an_io_error() {
        let err = PipelineConfig::from_json_path("does/not/exist.json").unwrap_err();
        assert!(err.to_string().starts_with("io error"));
    }
}
