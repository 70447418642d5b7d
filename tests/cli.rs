//! End-to-end tests for the mailroom binary.
//!
//! Every test runs with `--offline` against a throwaway data directory, so
//! nothing here needs a reachable backend.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mailroom(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mailroom").unwrap();
    cmd.env_remove("MAILROOM_API_URL")
        .env_remove("MAILROOM_LOG")
        .env("NO_COLOR", "1")
        .arg("--offline")
        .arg("--data-dir")
        .arg(dir.path());
    cmd
}

#[test]
fn offline_intake_is_queued() {
    let dir = TempDir::new().unwrap();

    mailroom(&dir)
        .args(["intake", "1Z999AA10123456784", "--tenant", "42", "--carrier", "UPS"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Package Intake queued for sync"));

    mailroom(&dir)
        .args(["queue", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending:    1"));
}

#[test]
fn queue_survives_between_runs_in_order() {
    let dir = TempDir::new().unwrap();

    mailroom(&dir)
        .args(["intake", "FIRST", "--tenant", "1"])
        .assert()
        .success();
    mailroom(&dir)
        .args(["pickup", "--tenant", "1", "--package", "5", "--name", "Ada", "--signature", "sig"])
        .assert()
        .success();

    let output = mailroom(&dir)
        .args(["--output", "json", "queue", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["count"], 2);
    assert_eq!(value["items"][0]["type"], "package_intake");
    assert_eq!(value["items"][0]["payload"]["tracking_number"], "FIRST");
    assert_eq!(value["items"][1]["type"], "package_pickup");
}

#[test]
fn json_submit_outcome() {
    let dir = TempDir::new().unwrap();

    let output = mailroom(&dir)
        .args(["--output", "json", "signature", "--package", "9", "--signature", "sig"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["operation"], "signature_capture");
    assert_eq!(value["result"]["status"], "queued");
    assert_eq!(value["result"]["pending"], 1);
}

#[test]
fn clear_requires_force() {
    let dir = TempDir::new().unwrap();

    mailroom(&dir)
        .args(["intake", "A", "--tenant", "1"])
        .assert()
        .success();

    mailroom(&dir)
        .args(["queue", "clear"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    mailroom(&dir)
        .args(["queue", "clear", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 1 operations"));

    mailroom(&dir)
        .args(["queue", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending operations"));
}

#[test]
fn offline_sync_leaves_queue_alone() {
    let dir = TempDir::new().unwrap();

    mailroom(&dir)
        .args(["intake", "A", "--tenant", "1"])
        .assert()
        .success();

    mailroom(&dir)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline: 1 operations waiting"));

    mailroom(&dir)
        .args(["--output", "json", "queue", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pending\": 1"));
}

#[test]
fn unparseable_config_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.yaml"), "api: [not, a, map").unwrap();

    mailroom(&dir)
        .args(["queue", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn config_init_then_show() {
    let dir = TempDir::new().unwrap();

    mailroom(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.yaml"));
    assert!(dir.path().join("config.yaml").exists());

    mailroom(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    mailroom(&dir)
        .args(["--api-url", "https://desk.example.org/api", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://desk.example.org/api"));
}
