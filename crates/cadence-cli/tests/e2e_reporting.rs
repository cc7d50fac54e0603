//! E2E tests for the reporting commands:
//! `cad snapshots`, `cad cycles`, `cad summary`, `cad export`.
//!
//! Covers: JSON schemas, censoring and hold exclusion end to end, CSV
//! artifact contents, config overrides, and graceful handling of malformed
//! input.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test harness helpers
// ---------------------------------------------------------------------------

fn cad_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cad"));
    cmd.current_dir(dir);
    cmd.env("CADENCE_LOG", "error");
    cmd
}

/// Two items: HT-1 shipped through Beta, HT-2 parked in a hold status.
fn write_sample_export(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("export.json");
    let export = r#"[
      {
        "item_key": "HT-1",
        "created": "2025-01-01T00:00:00Z",
        "histories": [
          {"timestamp": "2025-01-03T00:00:00Z",
           "items": [{"field": "assignee", "to_value": "alice@example.com"},
                     {"field": "customfield_10238", "to_value": "On Track"}]},
          {"timestamp": "2025-01-10T00:00:00Z",
           "items": [{"field": "status", "to_value": "02 Generative Discovery"}]},
          {"timestamp": "2025-01-24T00:00:00Z",
           "items": [{"field": "status", "to_value": "06 Build"}]},
          {"timestamp": "2025-02-21T00:00:00Z",
           "items": [{"field": "status", "to_value": "07 Beta"}]}
        ]
      },
      {
        "item_key": "HT-2",
        "created": "2025-02-01T00:00:00Z",
        "histories": [
          {"timestamp": "2025-02-05T00:00:00Z",
           "items": [{"field": "status", "to_value": "04 Problem Discovery"}]},
          {"timestamp": "2025-02-12T00:00:00Z",
           "items": [{"field": "status", "to_value": "03 Committed"}]}
        ]
      }
    ]"#;
    std::fs::write(&path, export).expect("write sample export");
    path
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command should run");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON output")
}

// ---------------------------------------------------------------------------
// cad cycles
// ---------------------------------------------------------------------------

#[test]
fn cycles_json_reports_completed_and_censored_phases() {
    let dir = TempDir::new().expect("temp dir");
    let export = write_sample_export(dir.path());

    let json = json_output(cad_cmd(dir.path()).args([
        "cycles",
        "--events",
        export.to_str().expect("utf8 path"),
        "--as-of",
        "2025-03-05",
        "--json",
    ]));

    let records = json["records"].as_array().expect("records array");
    assert_eq!(records.len(), 3);

    let ht1_discovery = records
        .iter()
        .find(|r| r["item_key"] == "HT-1" && r["phase"] == "discovery")
        .expect("HT-1 discovery record");
    assert_eq!(ht1_discovery["censored"], false);
    assert!((ht1_discovery["calendar_weeks"].as_f64().expect("weeks") - 2.0).abs() < 1e-9);

    let ht2_discovery = records
        .iter()
        .find(|r| r["item_key"] == "HT-2" && r["phase"] == "discovery")
        .expect("HT-2 discovery record");
    assert_eq!(ht2_discovery["censored"], true);
    assert!(ht2_discovery["end"].is_null());
    // Feb 5 → Mar 5 calendar, Feb 12 → Mar 5 on hold.
    assert!((ht2_discovery["calendar_weeks"].as_f64().expect("weeks") - 4.0).abs() < 1e-9);
    assert!((ht2_discovery["active_weeks"].as_f64().expect("weeks") - 1.0).abs() < 1e-9);
}

#[test]
fn cycles_human_output_prints_a_table() {
    let dir = TempDir::new().expect("temp dir");
    let export = write_sample_export(dir.path());

    cad_cmd(dir.path())
        .args(["cycles", "--events", export.to_str().expect("utf8 path"), "--as-of", "2025-03-05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HT-1"))
        .stdout(predicate::str::contains("discovery"));
}

// ---------------------------------------------------------------------------
// cad summary
// ---------------------------------------------------------------------------

#[test]
fn summary_json_buckets_by_quarter() {
    let dir = TempDir::new().expect("temp dir");
    let export = write_sample_export(dir.path());

    let json = json_output(cad_cmd(dir.path()).args([
        "summary",
        "--events",
        export.to_str().expect("utf8 path"),
        "--as-of",
        "2025-03-05",
        "--json",
    ]));

    let rows = json["rows"].as_array().expect("rows array");
    let discovery_q1 = rows
        .iter()
        .find(|r| r["phase"] == "discovery" && r["bucket"] == "Q1 2025")
        .expect("discovery Q1 row");
    // HT-1 completed (2.0 weeks) + HT-2 censored-to-now (4.0 weeks).
    assert_eq!(discovery_q1["project_count"], 2);
    assert_eq!(discovery_q1["outlier_count"], 0);
    assert!((discovery_q1["calendar"]["median"].as_f64().expect("median") - 3.0).abs() < 1e-9);
}

#[test]
fn summary_threshold_overrides_turn_records_into_outliers() {
    let dir = TempDir::new().expect("temp dir");
    let export = write_sample_export(dir.path());

    let json = json_output(cad_cmd(dir.path()).args([
        "summary",
        "--events",
        export.to_str().expect("utf8 path"),
        "--as-of",
        "2025-03-05",
        "--max-weeks",
        "3",
        "--json",
    ]));

    let rows = json["rows"].as_array().expect("rows array");
    let discovery_q1 = rows
        .iter()
        .find(|r| r["phase"] == "discovery" && r["bucket"] == "Q1 2025")
        .expect("discovery Q1 row");
    // The 4.0-week censored record now exceeds the maximum.
    assert_eq!(discovery_q1["project_count"], 1);
    assert_eq!(discovery_q1["outlier_count"], 1);
}

// ---------------------------------------------------------------------------
// cad snapshots
// ---------------------------------------------------------------------------

#[test]
fn snapshots_json_has_the_three_parallel_tables() {
    let dir = TempDir::new().expect("temp dir");
    let export = write_sample_export(dir.path());

    let json = json_output(cad_cmd(dir.path()).args([
        "snapshots",
        "--events",
        export.to_str().expect("utf8 path"),
        "--from",
        "2025-01-01",
        "--to",
        "2025-02-26",
        "--json",
    ]));

    let members = json["members"].as_array().expect("members table");
    assert!(!members.is_empty());
    let alice_rows: Vec<_> = members
        .iter()
        .filter(|row| row["member"] == "alice@example.com")
        .collect();
    assert!(!alice_rows.is_empty());
    assert!(alice_rows.iter().all(|row| row["total"] == 1));

    assert!(json["health"].as_array().is_some_and(|rows| !rows.is_empty()));
    assert!(json["status"].as_array().is_some_and(|rows| !rows.is_empty()));
}

// ---------------------------------------------------------------------------
// cad export
// ---------------------------------------------------------------------------

#[test]
fn export_writes_the_full_csv_artifact_set() {
    let dir = TempDir::new().expect("temp dir");
    let export = write_sample_export(dir.path());
    let out_dir = dir.path().join("reports");

    cad_cmd(dir.path())
        .args([
            "export",
            "--events",
            export.to_str().expect("utf8 path"),
            "--from",
            "2025-01-01",
            "--to",
            "2025-03-05",
            "--out",
            out_dir.to_str().expect("utf8 path"),
        ])
        .assert()
        .success();

    for name in [
        "team_weekly.csv",
        "health_weekly.csv",
        "status_weekly.csv",
        "cycle_records.csv",
        "quarterly_summary.csv",
    ] {
        let path = out_dir.join(name);
        assert!(path.exists(), "{name} should be written");
        let content = std::fs::read_to_string(&path).expect("readable CSV");
        assert!(content.lines().count() >= 1, "{name} should have a header");
    }

    let cycles_csv = std::fs::read_to_string(out_dir.join("cycle_records.csv")).expect("read");
    assert!(cycles_csv.starts_with("item_key,phase,start_date,end_date"));
    assert!(cycles_csv.contains("HT-1,discovery,2025-01-10,2025-01-24,2.00,2.00,0.00,false"));
}

// ---------------------------------------------------------------------------
// Config + failure modes
// ---------------------------------------------------------------------------

#[test]
fn custom_config_changes_phase_classes() {
    let dir = TempDir::new().expect("temp dir");
    let export = write_sample_export(dir.path());
    let config_path = dir.path().join("cadence.toml");
    // Swap build and beta: the "build" phase now opens at 07 Beta.
    std::fs::write(
        &config_path,
        r#"
[classes]
build = ["07 Beta"]
completion = ["08 Live"]
"#,
    )
    .expect("write config");

    let json = json_output(cad_cmd(dir.path()).args([
        "cycles",
        "--events",
        export.to_str().expect("utf8 path"),
        "--as-of",
        "2025-03-05",
        "--config",
        config_path.to_str().expect("utf8 path"),
        "--json",
    ]));

    let records = json["records"].as_array().expect("records array");
    let ht1_build = records
        .iter()
        .find(|r| r["item_key"] == "HT-1" && r["phase"] == "build")
        .expect("HT-1 build record");
    // Build phase now starts at the Beta transition and is censored.
    assert_eq!(ht1_build["start"].as_str().expect("start"), "2025-02-21T00:00:00Z");
    assert_eq!(ht1_build["censored"], true);
}

#[test]
fn malformed_export_fails_with_structured_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{definitely not an export").expect("write broken file");

    cad_cmd(dir.path())
        .args(["cycles", "--events", path.to_str().expect("utf8 path"), "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn missing_export_file_fails() {
    let dir = TempDir::new().expect("temp dir");

    cad_cmd(dir.path())
        .args(["cycles", "--events", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn invalid_config_is_fatal() {
    let dir = TempDir::new().expect("temp dir");
    let export = write_sample_export(dir.path());
    let config_path = dir.path().join("bad.toml");
    std::fs::write(&config_path, "[classes]\nhold = []\n").expect("write config");

    cad_cmd(dir.path())
        .args([
            "cycles",
            "--events",
            export.to_str().expect("utf8 path"),
            "--config",
            config_path.to_str().expect("utf8 path"),
        ])
        .assert()
        .failure();
}
