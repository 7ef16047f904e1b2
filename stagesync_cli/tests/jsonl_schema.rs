use assert_cmd::prelude::*;
use rstest::rstest;
use serde_json::Value;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const CONFIG: &str = r#"
[stagesync.extruder]
stages = ["left", "right"]
temp_ratio = [0.5, 1.2]
verbosity = "quiet"

[stagesync.bed]
stages = "bed_outer"
temp_ratio = "0.9"
poll_interval = 0.5

[[sim.target_changes]]
at = 1.0
heater = "extruder"
target = 200.0

[[sim.target_changes]]
at = 2.0
heater = "bed"
target = 60.0
"#;

fn json_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("not JSON ({e}): {l}")))
        .collect()
}

/// Validate the JSONL schema of a simulated run with two instances.
#[rstest]
fn jsonl_simulate_schema() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, CONFIG).unwrap();

    let out = Command::cargo_bin("stagesync")
        .unwrap()
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .args(["simulate", "--duration", "4"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let lines = json_lines(&out);

    let batches: Vec<&Value> = lines.iter().filter(|v| v["event"] == "batch").collect();
    assert_eq!(batches.len(), 2, "lines: {lines:?}");
    assert_eq!(batches[0]["primary"], "extruder");
    // Changes land after the poll due at the same instant.
    assert_eq!(batches[0]["at"], 2.0);
    assert_eq!(
        batches[0]["commands"][1],
        r#"SET_HEATER_TEMPERATURE HEATER="right" TARGET="240.00""#
    );
    assert_eq!(batches[1]["primary"], "bed");
    assert_eq!(batches[1]["at"], 2.5);
    assert_eq!(
        batches[1]["commands"][0],
        r#"SET_HEATER_TEMPERATURE HEATER="bed_outer" TARGET="54.00""#
    );

    let statuses: Vec<&Value> = lines.iter().filter(|v| v["event"] == "status").collect();
    assert_eq!(statuses.len(), 2);
    for s in statuses {
        assert_eq!(s["phase"], "polling");
        assert!(s["fault"].is_null());
        assert!(s["stages"].is_array());
    }
}

/// Errors under --json are a single JSON object on stderr.
#[rstest]
fn jsonl_error_schema() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(
        &cfg,
        "[stagesync.extruder]\nstages = \"left\"\ntemp_ratio = \"7\"\n",
    )
    .unwrap();

    let out = Command::cargo_bin("stagesync")
        .unwrap()
        .arg("--json")
        .arg("--log-level")
        .arg("off")
        .arg("--config")
        .arg(&cfg)
        .arg("check")
        .assert()
        .code(3)
        .get_output()
        .stderr
        .clone();
    let err: Value = serde_json::from_str(String::from_utf8_lossy(&out).trim()).unwrap();
    assert_eq!(err["reason"], "InvalidConfig");
    assert_eq!(err["exit_code"], 3);
    assert!(err["error"].as_str().unwrap().contains("invalid ratio for 'left'"));
}
