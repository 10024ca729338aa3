use assert_cmd::Command;
use serde_json::Value;
use std::{fs, path::PathBuf};
use tempfile::tempdir;

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

#[test]
fn simulate_writes_bundle_and_estimate_recovers_targets() {
    let temp = tempdir().unwrap();
    let out = temp.path().join("windows/resting");
    let design = workspace_root().join("test_data/resting_design.toml");

    Command::cargo_bin("oxi")
        .unwrap()
        .args([
            "simulate",
            "--design",
            design.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let window = out.join("window.csv");
    assert!(window.exists());
    let manifest: Value =
        serde_json::from_str(&fs::read_to_string(out.join("window.json")).unwrap()).unwrap();
    assert_eq!(manifest["design"], "resting");
    assert_eq!(manifest["hr_bpm"], 75.0);

    let output = Command::cargo_bin("oxi")
        .unwrap()
        .args([
            "estimate",
            "--fs",
            "25",
            "--input",
            window.to_str().unwrap(),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let est: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(est["heart_rate_valid"], true);
    let hr = est["heart_rate_bpm"].as_i64().unwrap();
    assert!((hr - 75).abs() <= 3, "hr {hr}");
    assert_eq!(est["spo2_valid"], true);
    let spo2 = est["spo2_percent"].as_i64().unwrap();
    assert!((spo2 - 97).abs() <= 2, "spo2 {spo2}");
}
