//! Dataset loading against a temporary directory tree.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use patternmine::agents::PatternKind;
use patternmine::{DatasetLoader, Message, Miner, MinerConfig, PatternError};

fn write(root: &Path, dataset: &str, year: &str, file: &str, content: &str) {
    let dir = root.join(dataset).join(year);
    fs::create_dir_all(&dir).expect("Failed to create year directory");
    fs::write(dir.join(file), content).expect("Failed to write dataset file");
}

fn erp_tree() -> TempDir {
    let root = TempDir::new().expect("Failed to create temp dir");
    write(
        root.path(),
        "erp_data",
        "2021",
        "erp_data.json",
        r#"[{"department": "Tech", "project": "X", "status": "Delayed"},
            {"department": "Tech", "project": "X", "status": "On time"}]"#,
    );
    write(
        root.path(),
        "erp_data",
        "2022",
        "erp_data.json",
        r#"[{"department": "Tech", "project": "X", "status": "Delayed"}, 42]"#,
    );
    write(root.path(), "erp_data", "2023", "erp_data.json", "{ not json");
    fs::create_dir_all(root.path().join("erp_data").join("notes")).expect("Failed to create dir");
    root
}

#[test]
fn test_load_concatenates_years() {
    let root = erp_tree();
    let loaded = DatasetLoader::new(root.path())
        .with_years([2021, 2022])
        .load("erp_data")
        .expect("Load failed");

    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded.sources.len(), 2);
    assert_eq!(loaded.sources[0].year, "2021");
    assert_eq!(loaded.sources[0].record_count, 2);
    assert_eq!(loaded.sources[1].record_count, 1);
    assert!(loaded.sources[0].hash.starts_with("sha256:"));
    assert_eq!(loaded.sources[0].file, "erp_data.json");
}

#[test]
fn test_missing_and_malformed_years_are_skipped() {
    let root = erp_tree();
    let loaded = DatasetLoader::new(root.path())
        .with_years(["2020", "2021", "2023"])
        .load("erp_data")
        .expect("Load failed");

    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.sources.len(), 1);
}

#[test]
fn test_year_discovery_ignores_non_numeric_dirs() {
    let root = erp_tree();
    let loader = DatasetLoader::new(root.path());
    assert_eq!(
        loader.discover_years("erp_data").expect("Discovery failed"),
        vec!["2021", "2022", "2023"]
    );

    let loaded = loader.load("erp_data").expect("Load failed");
    assert_eq!(loaded.len(), 3);
}

#[test]
fn test_missing_dataset_is_empty() {
    let root = TempDir::new().expect("Failed to create temp dir");
    let loader = DatasetLoader::new(root.path());

    assert!(matches!(
        loader.discover_years("hr_data"),
        Err(PatternError::Io { .. })
    ));
    assert!(loader.load("hr_data").expect("Load failed").is_empty());
}

#[test]
fn test_identical_files_share_hash() {
    let root = TempDir::new().expect("Failed to create temp dir");
    let content = r#"[{"a": 1}]"#;
    write(root.path(), "d", "2021", "d.json", content);
    write(root.path(), "d", "2022", "d.json", content);

    let loaded = DatasetLoader::new(root.path()).load("d").expect("Load failed");
    assert_eq!(loaded.sources[0].hash, loaded.sources[1].hash);
}

#[test]
fn test_miner_registry_from_tree() {
    let root = erp_tree();
    write(
        root.path(),
        "call_for_tenders",
        "2021",
        "tender_responses.json",
        r#"[{"responder": "Acme", "bid_amount": 1200}]"#,
    );

    let config = MinerConfig {
        data_root: root.path().to_path_buf(),
        ..Default::default()
    };
    let registry = Miner::with_config(config).registry().expect("Registry failed");
    assert_eq!(registry.len(), 10);

    let result = registry
        .send(&Message::request_pattern("test", "erp"))
        .expect("Dispatch failed")
        .into_pattern()
        .expect("Pattern reply");
    assert_eq!(result.kind, PatternKind::ErpDelay);
    assert!(!result.rules().expect("Rules")[0].is_sentinel());

    let bids = registry
        .send(&Message::request_pattern("test", "tenders").with_prompt("bid amount"))
        .expect("Dispatch failed")
        .into_pattern()
        .expect("Pattern reply");
    assert_eq!(bids.lines(), vec!["Bids: 1 (avg 1200.00, min 1,200, max 1,200)"]);
}

#[test]
fn test_config_from_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("miner.json");
    fs::write(&path, r#"{"years": ["2021"], "outlier_threshold": 2.5}"#).expect("Failed to write");

    let config = MinerConfig::from_file(&path).expect("Config failed");
    assert_eq!(config.years, Some(vec!["2021".to_string()]));
    assert_eq!(config.outlier_threshold, 2.5);
    assert_eq!(config.min_observations, 5);

    fs::write(&path, r#"{"outlier_threshold": 0}"#).expect("Failed to write");
    assert!(matches!(MinerConfig::from_file(&path), Err(PatternError::Config(_))));
}

#[test]
fn test_clean_load_coerces_declared_types() {
    let root = TempDir::new().expect("Failed to create temp dir");
    write(
        root.path(),
        "erp_data",
        "2021",
        "erp_data.json",
        r#"[{"department": "Tech", "project": "X", "status": "Delayed", "cost": "12000.5", "duration_months": "3"},
            {"department": "Ops", "project": "Y", "status": "On time", "cost": 8000, "duration_months": 2.7}]"#,
    );

    let raw = Miner::with_config(MinerConfig {
        data_root: root.path().to_path_buf(),
        ..Default::default()
    })
    .load("erp_data")
    .expect("Load failed");
    assert_eq!(raw.records[0].number("cost"), None);

    let cleaned = Miner::with_config(MinerConfig {
        data_root: root.path().to_path_buf(),
        clean: true,
        ..Default::default()
    })
    .load("erp_data")
    .expect("Load failed");

    assert_eq!(cleaned.records[0].number("cost"), Some(12000.5));
    assert_eq!(cleaned.records[0].get("duration_months"), Some(&serde_json::json!(3)));
    assert_eq!(cleaned.records[1].number("cost"), Some(8000.0));
    assert_eq!(cleaned.records[1].get("duration_months"), Some(&serde_json::json!(2)));
}
