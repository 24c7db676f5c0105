//! End-to-end tests for the `ma` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn ma(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ma").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn write_case(dir: &TempDir, body: &str) {
    fs::write(dir.path().join("case.cfg"), body).unwrap();
}

#[test]
fn test_plan_prints_schedule() {
    let temp = TempDir::new().unwrap();
    write_case(
        &temp,
        "ADAP_COMPLEXITIES= (1000, 2000, 4000)\nADAP_SUBITE= (2, 2, 1)\nADAP_HMIN= 1e-6\nMESH_FILENAME= mesh.meshb\n",
    );

    ma(&temp)
        .args(["plan", "-f", "case.cfg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complexity 4000"))
        .stdout(predicate::str::contains("Total global iterations: 5"))
        .stdout(predicate::str::contains("hmin: 1e-6"))
        .stdout(predicate::str::contains("Start: cold"));
}

#[test]
fn test_plan_json() {
    let temp = TempDir::new().unwrap();
    write_case(&temp, "ADAP_COMPLEXITIES= (1000)\nADAP_SUBITE= (3)\nMESH_FILENAME= mesh.meshb\n");

    let output = ma(&temp).args(["plan", "-f", "case.cfg", "--format", "json"]).output().unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["total_global_iterations"], 3);
    assert_eq!(value["warm_start"], false);
    assert_eq!(value["plan"]["options"]["gradation"], 3.0);
}

#[test]
fn test_run_with_mismatched_schedule_fails() {
    let temp = TempDir::new().unwrap();
    write_case(&temp, "ADAP_COMPLEXITIES= (1000, 2000)\nADAP_SUBITE= (1)\nMESH_FILENAME= mesh.meshb\n");

    ma(&temp)
        .args(["run", "-f", "case.cfg", "--no-warn"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("(2)").and(predicate::str::contains("(1)")));

    assert!(!temp.path().join("ADAP").exists());
}

#[test]
fn test_run_with_missing_case_file_fails() {
    let temp = TempDir::new().unwrap();

    ma(&temp)
        .args(["run", "-f", "nope.cfg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.cfg"));
}

#[test]
fn test_status_without_journal() {
    let temp = TempDir::new().unwrap();

    ma(&temp)
        .args(["status", "--dir", "ADAP"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No archived iterations"));
}

#[test]
fn test_status_lists_journal() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("ADAP");
    fs::create_dir(&dir).unwrap();
    fs::write(
        dir.join("adaptation.jsonl"),
        r#"{"global_iteration":1,"complexity":1000.0,"mesh":"ite.1.1000.meshb","sensor":"ite.1.1000.solb","restart":"ite.1.1000_restart.solb","history":null,"archived_at":"2026-01-05T10:00:00Z"}
"#,
    )
    .unwrap();

    ma(&temp)
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ite.1.1000.meshb"))
        .stdout(predicate::str::contains("2026-01-05 10:00:00"));
}

#[test]
fn test_help_lists_tools() {
    let temp = TempDir::new().unwrap();

    ma(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("External tools"));
}
