use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures").join(name)
}

fn replay_json(args: &[&str]) -> Value {
    let output = cargo_bin_cmd!("takeoff")
        .arg("replay")
        .args(args)
        .env_remove("TAKEOFF_UNIT")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    serde_json::from_slice(&output).expect("stdout should contain valid json")
}

#[test]
fn replay_emits_measurement_records() {
    let script = fixture("line_and_area.json");
    let value = replay_json(&[script.to_str().expect("fixture path is utf-8")]);

    let records = value.as_array().expect("records should be an array");
    assert_eq!(records.len(), 2);

    assert_eq!(records[0]["id"], "L1");
    assert_eq!(records[0]["type"], "line");
    assert_eq!(records[0]["length_px"], 50.0);
    assert_eq!(records[0]["length_units"], 5.0);
    assert_eq!(records[0]["units"], "ft");

    assert_eq!(records[1]["id"], "A2");
    assert_eq!(records[1]["type"], "area");
    assert_eq!(records[1]["area_px2"], 600.0);
    let area = records[1]["area_units"].as_f64().expect("area should be calibrated");
    assert!((area - 6.0).abs() < 1e-9);
}

#[test]
fn replay_honors_unit_override() {
    let script = fixture("line_and_area.json");
    let value = replay_json(&[script.to_str().expect("fixture path is utf-8"), "--unit", "in"]);

    assert_eq!(value[0]["units"], "in");
    let inches = value[0]["length_units"].as_f64().expect("length should be calibrated");
    assert!((inches - 60.0).abs() < 1e-9);
}

#[test]
fn replay_snaps_in_page_space_after_zoom() {
    let script = fixture("zoomed_snap.json");
    let value = replay_json(&[script.to_str().expect("fixture path is utf-8")]);

    assert_eq!(value[1]["a"]["x"], 50.0);
    assert_eq!(value[1]["a"]["y"], 50.0);
    assert_eq!(value[1]["length_units"], 5.0);
}

#[test]
fn replay_skips_rejected_events_by_default() {
    cargo_bin_cmd!("takeoff")
        .arg("replay")
        .arg(fixture("uncalibrated.json"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[]"));
}

#[test]
fn replay_strict_fails_on_rejected_event() {
    cargo_bin_cmd!("takeoff")
        .arg("replay")
        .arg(fixture("uncalibrated.json"))
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("event 4 rejected"))
        .stderr(predicate::str::contains("calibrate the page"));
}

#[test]
fn replay_writes_csv_file() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let output_path = temp.path().join("out/takeoff.csv");

    cargo_bin_cmd!("takeoff")
        .arg("replay")
        .arg(fixture("line_and_area.json"))
        .arg("--format")
        .arg("csv")
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    let csv = std::fs::read_to_string(&output_path).expect("csv output should exist");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("ID,Page,Type"));
    assert!(lines[1].starts_with("L1,1,Line,50.00"));
    assert!(lines[2].starts_with("A2,1,Area"));
}

#[test]
fn replay_view_format_describes_overlay() {
    let script = fixture("line_and_area.json");
    let value = replay_json(&[script.to_str().expect("fixture path is utf-8"), "--format", "view"]);

    assert_eq!(value["calibrated"], true);
    assert_eq!(value["tool"], "area");
    assert_eq!(value["page_label"], "1 / 2");
    assert_eq!(value["overlay"][1]["label"], "6.00 ft²  (P: 12′ 0.0″)");
    assert!(value["draft"].is_null());
}

#[test]
fn replay_reads_config_file() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let config_path = temp.path().join("takeoff.toml");
    std::fs::write(&config_path, "display_unit = \"m\"\n").expect("config should be written");

    let script = fixture("line_and_area.json");
    let value = replay_json(&[
        script.to_str().expect("fixture path is utf-8"),
        "--config",
        config_path.to_str().expect("temp path is utf-8"),
    ]);

    assert_eq!(value[0]["units"], "m");
}

#[test]
fn replay_fails_for_missing_script() {
    cargo_bin_cmd!("takeoff")
        .arg("replay")
        .arg(fixture("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn replay_fails_for_unknown_event() {
    cargo_bin_cmd!("takeoff")
        .arg("replay")
        .arg(fixture("invalid_event.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse event script"));
}

#[test]
fn convert_prints_value() {
    cargo_bin_cmd!("takeoff")
        .args(["convert", "1", "--from", "yd", "--to", "ft"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn convert_rejects_unknown_unit() {
    cargo_bin_cmd!("takeoff")
        .args(["convert", "1", "--from", "cubit", "--to", "ft"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown unit"));
}

#[test]
fn version_prints_package_version() {
    cargo_bin_cmd!("takeoff")
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
