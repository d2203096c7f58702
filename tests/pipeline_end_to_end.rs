use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use predictive_maintenance_pipeline::config::PipelineConfig;
use predictive_maintenance_pipeline::ingestion::csv::{LoadOptions, ingest_csv_inferred_from_path};
use predictive_maintenance_pipeline::ingestion::hash_file;
use predictive_maintenance_pipeline::observability::{NoopObserver, Stage, StageSeverity};
use predictive_maintenance_pipeline::pipeline::Pipeline;
use predictive_maintenance_pipeline::processing::FailureType;
use predictive_maintenance_pipeline::processing::relationship::RANDOM_WITHOUT_MACHINE_FAILURE;
use predictive_maintenance_pipeline::types::Value;
use predictive_maintenance_pipeline::PipelineError;

const SAMPLE: &str = "tests/fixtures/ai4i_sample.csv";

fn temp_output_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("pm_pipeline_{tag}_{nanos}"))
}

fn config_for(input: &str, tag: &str) -> PipelineConfig {
    PipelineConfig {
        input_path: PathBuf::from(input),
        output_dir: temp_output_dir(tag),
        ..Default::default()
    }
}

#[test]
fn sample_run_labels_filters_and_saves() {
    let config = config_for(SAMPLE, "sample");
    let report = Pipeline::new(&config, &NoopObserver).run().unwrap();

    assert_eq!(report.rows_loaded, 16);
    assert_eq!(report.columns_loaded, 14);
    assert_eq!(
        report.label_distribution,
        vec![
            (FailureType::ToolWear, 12),
            (FailureType::Power, 2),
            (FailureType::HeatDissipation, 1),
            (FailureType::Random, 1),
        ]
    );
    assert_eq!(report.random_failures_removed, 1);
    assert_eq!(report.inconsistent_rows_removed, 1);
    assert_eq!(report.rows_out, 14);
    assert_eq!(report.missing_percent, 0.0);
    assert!(report.failures.is_empty());
    assert!(report.summary_path.is_none());

    let relationship = report.failure_relationship.unwrap();
    assert_eq!(relationship[RANDOM_WITHOUT_MACHINE_FAILURE].count, 0);

    let out = report.output_path.unwrap();
    assert_eq!(out, config.processed_path());
    let _ = fs::remove_dir_all(&config.output_dir);
}

#[test]
fn processed_csv_has_canonical_names_and_no_index() {
    let config = config_for(SAMPLE, "processed");
    Pipeline::new(&config, &NoopObserver).run().unwrap();

    let text = fs::read_to_string(config.processed_path()).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "UDI,Product ID,Type,Air temperature,Process temperature,Rotational speed,Torque,Tool wear,\
         Machine failure,TWF,HDF,PWF,OSF,RNF,Failure Type"
    );
    assert_eq!(
        lines.next().unwrap(),
        "1,M14860,M,298.1,308.6,1551.0,42.8,0.0,0,0,0,0,0,0,Tool Wear Failure"
    );

    let options = LoadOptions { fill_missing: false };
    let ds = ingest_csv_inferred_from_path(config.processed_path(), &options).unwrap();
    assert_eq!(ds.row_count(), 14);

    let labels: Vec<&Value> = ds.column("Failure Type").unwrap().collect();
    assert!(!labels.contains(&&Value::Utf8("Random Failure".to_string())));

    // Every remaining machine failure has at least one cause flag.
    let mf = ds.schema.index_of("Machine failure").unwrap();
    let flags: Vec<usize> = ["TWF", "HDF", "PWF", "OSF", "RNF"]
        .iter()
        .map(|c| ds.schema.index_of(c).unwrap())
        .collect();
    for row in &ds.rows {
        let sum: f64 = flags.iter().map(|&i| row[i].as_f64().unwrap()).sum();
        assert!(row[mf].as_f64() != Some(1.0) || sum > 0.0);
    }
    let _ = fs::remove_dir_all(&config.output_dir);
}

#[test]
fn visualize_writes_summary_json() {
    let mut config = PipelineConfig::from_json_path("tests/fixtures/config.json").unwrap();
    config.input_path = PathBuf::from(SAMPLE);
    config.output_dir = temp_output_dir("summary");

    let report = Pipeline::new(&config, &NoopObserver).run().unwrap();
    let path = report.summary_path.unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let summary: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(summary["rows"], 16);
    assert_eq!(summary["machine_types"][0]["value"], "L");
    assert_eq!(summary["machine_types"][0]["count"], 9);
    assert_eq!(summary["product_id"]["min"], 14860.0);
    assert_eq!(summary["numeric_features"].as_array().unwrap().len(), 5);
    let _ = fs::remove_dir_all(&config.output_dir);
}

#[test]
fn missing_cause_flags_degrade_but_still_save() {
    let config = config_for("tests/fixtures/no_flags.csv", "no_flags");
    let report = Pipeline::new(&config, &NoopObserver).run().unwrap();

    assert_eq!(report.rows_out, 2);
    assert!(report.output_path.is_some());
    assert_eq!(report.failures[0].stage, Stage::DeriveFailureType);
    assert_eq!(report.failures[0].severity, StageSeverity::Error);
    assert!(report.failures[0].message.contains("TWF"));

    let text = fs::read_to_string(config.processed_path()).unwrap();
    assert!(text.starts_with("UDI,Product ID,Type,Torque,Machine failure\n"));
    let _ = fs::remove_dir_all(&config.output_dir);
}

#[test]
fn relationship_rows_survive_earlier_removals() {
    let config = config_for("tests/fixtures/random_before_tool_wear.csv", "relationship");
    let report = Pipeline::new(&config, &NoopObserver).run().unwrap();

    assert_eq!(report.random_failures_removed, 1);
    assert_eq!(report.inconsistent_rows_removed, 1);
    let relationship = report.failure_relationship.unwrap();
    let matches = &relationship[RANDOM_WITHOUT_MACHINE_FAILURE];
    // Data rows 2 and 3 of the file (zero-based), not positions in the filtered table.
    assert_eq!(matches.rows, vec![2, 3]);
    assert_eq!(matches.count, 2);
    let _ = fs::remove_dir_all(&config.output_dir);
}

#[test]
fn matching_hash_is_accepted_in_any_case() {
    let mut config = config_for(SAMPLE, "hash_ok");
    config.expected_hash = Some(hash_file(SAMPLE).unwrap().to_uppercase());

    let report = Pipeline::new(&config, &NoopObserver).run().unwrap();
    assert_eq!(report.rows_out, 14);
    let _ = fs::remove_dir_all(&config.output_dir);
}

#[test]
fn hash_mismatch_aborts_before_writing() {
    let mut config = config_for(SAMPLE, "hash_bad");
    config.expected_hash = Some("0".repeat(64));

    let err = Pipeline::new(&config, &NoopObserver).run().unwrap_err();
    assert!(matches!(err, PipelineError::HashMismatch { .. }));
    assert!(!config.output_dir.exists());
}

#[test]
fn missing_input_aborts_before_writing() {
    let config = config_for("tests/fixtures/does_not_exist.csv", "missing");
    let err = Pipeline::new(&config, &NoopObserver).run().unwrap_err();
    assert!(matches!(err, PipelineError::NotAFile { .. }));
    assert!(!config.output_dir.exists());
}
