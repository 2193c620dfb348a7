//! CLI Integration Tests
//!
//! These tests run the `linak-desk` binary against a temporary settings file.
//! None of them touch the Bluetooth adapter.
//!
//! ```
//! cargo test --package linak-cli --test cli_integration
//! ```

use std::path::Path;
use std::process::{Command, Output, Stdio};

fn run(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_linak-desk"))
        .arg("--no-color")
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("LINAK_DESK_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run linak-desk binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn temp_config() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("linak_desk.json");
    (dir, path)
}

#[test]
fn test_help_lists_commands() {
    let output = Command::new(env!("CARGO_BIN_EXE_linak-desk"))
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success(), "Help should succeed");

    let text = stdout(&output);
    for command in [
        "scan",
        "lowest_pos_mm",
        "device_id",
        "config",
        "position",
        "positions",
        "save",
        "del",
    ] {
        assert!(text.contains(command), "Help should list {command}");
    }
}

#[test]
fn test_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_linak-desk"))
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("linak-desk"));
}

#[test]
fn test_config_is_created_empty() {
    let (_dir, path) = temp_config();

    let output = run(&path, &["config"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "{}");
    assert!(path.exists());
}

#[test]
fn test_set_and_show_config() {
    let (_dir, path) = temp_config();

    let output = run(&path, &["lowest_pos_mm", "620"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Saved config.lowest_pos_mm = 620"));

    let output = run(&path, &["device_id", "E1:AA:BB:CC:DD:EE"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Saved config.device_id = E1:AA:BB:CC:DD:EE"));

    let output = run(&path, &["config"]);
    let document: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(document["lowest_pos_mm"], 620);
    assert_eq!(document["device_id"], "E1:AA:BB:CC:DD:EE");
}

#[test]
fn test_preset_round_trip() {
    let (_dir, path) = temp_config();

    let output = run(&path, &["positions"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No saved positions"));

    let output = run(&path, &["save", "desk_sit", "700"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Saved new position \"desk_sit\": 700 mm"));

    let output = run(&path, &["ps"]);
    let text = stdout(&output);
    assert!(text.contains("Saved positions [1]:"));
    assert!(text.contains("desk_sit"));
    assert!(text.contains("700"));

    let output = run(&path, &["del", "desk_sit"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Position \"desk_sit\" deleted."));

    let output = run(&path, &["positions"]);
    assert!(stdout(&output).contains("No saved positions"));
}

#[test]
fn test_save_non_positive_height_deletes() {
    let (_dir, path) = temp_config();

    run(&path, &["save", "stand", "1100"]);
    let output = run(&path, &["save", "stand", "-1"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("deleted"));

    let output = run(&path, &["del", "stand"]);
    assert!(output.status.success(), "Deleting an absent name is a no-op");
}

#[test]
fn test_empty_preset_name_is_usage_error() {
    let (_dir, path) = temp_config();

    let output = run(&path, &["save", "", "700"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Position name can not be empty"));
}

#[test]
fn test_position_without_settings_reports_both_keys() {
    let (_dir, path) = temp_config();

    let output = run(&path, &["position"]);
    assert_eq!(output.status.code(), Some(2));

    let text = stderr(&output);
    assert!(text.contains("device_id"));
    assert!(text.contains("lowest_pos_mm"));
    assert!(text.contains("[Config 1/2]"));
    assert!(text.contains("[Config 2/2]"));
}

#[test]
fn test_scan_without_terminal_is_usage_error() {
    let (_dir, path) = temp_config();

    let output = Command::new(env!("CARGO_BIN_EXE_linak-desk"))
        .arg("--no-color")
        .arg("--config")
        .arg(&path)
        .arg("scan")
        .stdin(Stdio::null())
        .env_remove("LINAK_DESK_CONFIG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("interactive terminal"));
}

#[test]
fn test_invalid_calibration_argument() {
    let (_dir, path) = temp_config();

    let output = run(&path, &["lowest_pos_mm", "low"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_corrupt_settings_file_is_reported() {
    let (_dir, path) = temp_config();
    std::fs::write(&path, "{ not json").unwrap();

    let output = run(&path, &["config"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error:"));
}
