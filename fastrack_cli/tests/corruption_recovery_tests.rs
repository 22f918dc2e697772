//! Corruption recovery tests for the fastrack binary.
//!
//! These tests verify the system can handle:
//! - Corrupted active-fast, history and journal records
//! - Partially valid history files, across later writes
//! - A fast left both active and recorded by an interrupted end

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cli(data_dir: &Path) -> Command {
    let config_path = data_dir.join("test-config.toml");
    if !config_path.exists() {
        fs::write(&config_path, "").expect("Failed to write config");
    }
    let mut cmd = Command::cargo_bin("fastrack").expect("Failed to find fastrack binary");
    cmd.arg("--data-dir")
        .arg(data_dir)
        .arg("--config")
        .arg(config_path);
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_active_fast_starts_idle() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("activeFast.json"), "{ invalid json }}}}")
        .expect("Failed to write corrupted record");

    cli(data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No fast running"));

    // Moved aside for manual recovery
    assert!(!data_dir.join("activeFast.json").exists());
    assert!(data_dir.join("activeFast.json.corrupt").exists());

    // A new fast can be started afterwards
    cli(data_dir).arg("start").assert().success();
    assert!(data_dir.join("activeFast.json").exists());
}

#[test]
fn test_corrupted_history_is_replaced() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("fastingHistory.json"), "not json at all")
        .expect("Failed to write corrupted record");

    cli(data_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No completed fasts yet"));

    cli(data_dir)
        .args(["--now", "2024-06-01T20:00:00Z", "start"])
        .assert()
        .success();
    cli(data_dir)
        .args(["--now", "2024-06-02T12:00:00Z", "end"])
        .assert()
        .success();

    let raw = fs::read_to_string(data_dir.join("fastingHistory.json")).unwrap();
    let history: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[test]
fn test_legacy_tick_duration_survives_next_end() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(
        data_dir.join("fastingHistory.json"),
        r#"[{"startTime":"2024-05-01T20:00:00.120Z","plan":{"name":"16:8","hours":16,"description":""},"endTime":"2024-05-02T12:00:00.900Z","durationSeconds":57599}]"#,
    )
    .unwrap();

    cli(data_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("16h 0m"));

    cli(data_dir)
        .args(["--now", "2024-06-01T20:00:00Z", "start"])
        .assert()
        .success();
    cli(data_dir)
        .args(["--now", "2024-06-01T21:00:00Z", "end"])
        .assert()
        .success();

    let raw = fs::read_to_string(data_dir.join("fastingHistory.json")).unwrap();
    let history: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["durationSeconds"], 3600);
    assert_eq!(history[1]["durationSeconds"], 57_600);
}

#[test]
fn test_unloadable_history_entries_are_kept_aside() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let original = r#"[
            {"startTime":"2024-05-01T20:00:00Z","plan":{"name":"16:8","targetHours":16},"endTime":"2024-05-02T12:00:00Z","durationSeconds":57600},
            {"startTime":"2024-05-03T20:00:00Z","plan":{"name":"16:8","targetHours":16},"endTime":"2024-05-03T10:00:00Z","durationSeconds":0},
            {"unrelated":true}
        ]"#;
    fs::write(data_dir.join("fastingHistory.json"), original).unwrap();

    // Only the well-formed entry is listed
    let output = cli(data_dir).arg("history").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.contains("16h 0m"));

    cli(data_dir)
        .args(["--now", "2024-06-01T20:00:00Z", "start"])
        .assert()
        .success();
    cli(data_dir)
        .args(["--now", "2024-06-01T21:00:00Z", "end"])
        .assert()
        .success();

    let raw = fs::read_to_string(data_dir.join("fastingHistory.json")).unwrap();
    let history: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(history.as_array().unwrap().len(), 2);

    // The unreadable entries are still on disk for manual recovery
    let kept = fs::read_to_string(data_dir.join("fastingHistory.json.corrupt")).unwrap();
    assert_eq!(kept, original);
}

#[test]
fn test_malformed_history_document_is_moved_aside() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(
        data_dir.join("fastingHistory.json"),
        r#"[{"startTime":"2024-06-01T20:00:00Z","plan":{"name":"16:8","targetHours":16}}, {"partial":"#,
    )
    .unwrap();

    cli(data_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No completed fasts yet"));

    assert!(data_dir.join("fastingHistory.json.corrupt").exists());
}

#[test]
fn test_corrupted_journal_starts_empty() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("journalLogs.json"), "[[[").unwrap();

    cli(data_dir)
        .args(["journal", "water", "add", "--date", "2024-06-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 units"));

    assert!(data_dir.join("journalLogs.json.corrupt").exists());
}

#[test]
fn test_interrupted_end_is_reconciled() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let session = r#"{"startTime":"2024-06-01T20:00:00Z","plan":{"name":"16:8","targetHours":16.0,"description":""}}"#;
    fs::write(data_dir.join("activeFast.json"), session).unwrap();
    fs::write(
        data_dir.join("fastingHistory.json"),
        r#"[{"startTime":"2024-06-01T20:00:00Z","plan":{"name":"16:8","targetHours":16.0,"description":""},"endTime":"2024-06-02T12:00:00Z","durationSeconds":57600}]"#,
    )
    .unwrap();

    cli(data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No fast running"));

    assert!(!data_dir.join("activeFast.json").exists());
}

#[test]
fn test_legacy_records_are_read() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(
        data_dir.join("activeFast.json"),
        r#"{"startTime":"2024-06-01T20:00:00.000Z","plan":{"name":"18:6","hours":18,"description":"Step up"}}"#,
    )
    .unwrap();

    cli(data_dir)
        .args(["--now", "2024-06-02T14:00:00Z", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("18:00:00"))
        .stdout(predicate::str::contains("100.0%"));
}
