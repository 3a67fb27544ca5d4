use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn churnlab(args: &[&str], cwd: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_churnlab"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn churnlab")
}

#[test]
fn run_registers_all_artifacts() {
    let dir = temp_dir("run");
    let output = churnlab(
        &["run", "--run-dir", "runs", "--seed", "5", "--customers", "300"],
        &dir,
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let runs: Vec<PathBuf> = fs::read_dir(dir.join("runs"))
        .expect("read runs")
        .map(|entry| entry.expect("entry").path())
        .collect();
    assert_eq!(runs.len(), 1);
    let run = &runs[0];
    assert!(
        run.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains("__run_"))
    );

    for file in [
        "config.json",
        "logs.ndjson",
        "data/customers_raw.csv",
        "data/generation_report.json",
        "data/customers_clean.csv",
        "data/cleaning_summary.json",
        "data/data_issues.json",
        "data/tables/subscriptions.csv",
        "outputs/churn_metrics.json",
        "outputs/churn_summary_report.txt",
    ] {
        assert!(run.join(file).is_file(), "missing {file}");
    }

    let logs = fs::read_to_string(run.join("logs.ndjson")).expect("read logs");
    let events: Vec<serde_json::Value> = logs
        .lines()
        .map(|line| serde_json::from_str(line).expect("ndjson line"))
        .collect();
    assert!(events.iter().any(|e| e["fields"]["event"] == "run_finished"));
    assert!(
        events
            .iter()
            .any(|e| e["fields"]["message"] == "generation completed")
    );

    let config: serde_json::Value =
        serde_json::from_slice(&fs::read(run.join("config.json")).expect("read config"))
            .expect("parse config");
    assert_eq!(config["config"]["generator"]["seed"], 5);
    assert_eq!(config["config"]["generator"]["customers"], 300);
}

#[test]
fn stages_chain_through_default_paths() {
    let dir = temp_dir("stages");
    for args in [
        vec!["generate", "--seed", "11", "--customers", "200"],
        vec!["clean"],
        vec!["report"],
    ] {
        let output = churnlab(&args, &dir);
        assert!(
            output.status.success(),
            "{args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let report =
        fs::read_to_string(dir.join("outputs/churn_summary_report.txt")).expect("read report");
    assert!(report.contains("DATA CLEANING"));
    assert!(report.contains("KEY METRICS"));
}

#[test]
fn config_file_overrides_defaults() {
    let dir = temp_dir("config");
    fs::write(dir.join("churnlab.toml"), "[report]\ntop_factors = 5\n").expect("write config");

    let output = churnlab(&["config", "--config", "churnlab.toml"], &dir);
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("top_factors = 5"));

    let output = churnlab(&["config", "--schema"], &dir);
    assert!(output.status.success());
    let schema: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("schema is json");
    assert!(schema["properties"]["generator"].is_object());
}

#[test]
fn invalid_customer_count_fails_without_output() {
    let dir = temp_dir("invalid");
    let output = churnlab(&["generate", "--customers", "-5"], &dir);
    assert!(!output.status.success());
    assert!(!dir.join("data/customers_raw.csv").exists());
}

fn temp_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("churnlab_cli_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}
