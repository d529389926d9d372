#![cfg(feature = "cli")]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::{TempDir, tempdir};

const EXPORT: &str = "Issue key,Assignee,Sprint,Project,Issue Type,Status,Story Points,Summary\n\
APP-1,Ana,Sprint 7,Payments,Story,In Progress,11,Checkout\n\
APP-2,Ana,Sprint 7,Payments,Story,To Do,6,Refunds\n\
APP-3,Ben,Sprint 7,Web,Task,To Do,2,Header\n";

#[allow(deprecated)]
fn run_cli(prefs: &Path, script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env("SPRINT_INSIGHT_PREFS", prefs)
        .write_stdin(script.to_string())
        .assert()
}

fn workspace() -> (TempDir, String) {
    let dir = tempdir().expect("create temp dir");
    let export = dir.path().join("export.csv");
    fs::write(&export, EXPORT).expect("write export");
    let export = export.to_string_lossy().into_owned();
    (dir, export)
}

#[test]
fn cli_loads_export_and_shows_stats() {
    let (dir, export) = workspace();
    let prefs = dir.path().join("prefs.json");
    run_cli(&prefs, &format!("load {export}\nstats\nquit\n"))
        .success()
        .stdout(str_contains("Loaded 3 rows"))
        .stdout(str_contains("Over Allocated"));
}

#[test]
fn cli_suggests_moves_for_overloaded_assignee() {
    let (dir, export) = workspace();
    let prefs = dir.path().join("prefs.json");
    run_cli(&prefs, &format!("load {export}\ncap Ana 14\ncap Ben 14\nsuggest\nquit\n"))
        .success()
        .stdout(str_contains("Move APP-1 (11 SP) from Ana to Ben"));
}

#[test]
fn cli_persists_capacity_between_sessions() {
    let (dir, export) = workspace();
    let prefs = dir.path().join("prefs.json");
    run_cli(&prefs, "cap Ana Lopez 20\nprogram 2025-06-30\nquit\n")
        .success()
        .stdout(str_contains("Capacity for Ana Lopez: 20"));

    let saved = fs::read_to_string(&prefs).expect("prefs written");
    assert!(saved.contains("Ana Lopez"));
    assert!(saved.contains("2025-06-30"));

    run_cli(&prefs, &format!("load {export}\nprogram\nquit\n"))
        .success()
        .stdout(str_contains("Program end date: 2025-06-30"));
}

#[test]
fn cli_rejects_bad_arguments() {
    let (dir, _export) = workspace();
    let prefs = dir.path().join("prefs.json");
    run_cli(&prefs, "whatif lots\nprogram 30/06/2025\nload notes.pdf\nfrobnicate\nquit\n")
        .success()
        .stdout(str_contains("Invalid multiplier"))
        .stdout(str_contains("invalid date '30/06/2025'"))
        .stdout(str_contains("unsupported file type"))
        .stdout(str_contains("Unknown command: frobnicate"));
}

#[test]
fn cli_exports_filtered_rows() {
    let (dir, export) = workspace();
    let prefs = dir.path().join("prefs.json");
    let out = dir.path().join("ben.tsv");
    run_cli(
        &prefs,
        &format!("load {export}\nassignee Ben\nexport {}\nquit\n", out.display()),
    )
    .success()
    .stdout(str_contains("Wrote 1 rows"));

    let written = fs::read_to_string(&out).expect("export written");
    assert!(written.starts_with("Issue key\tAssignee"));
    assert!(written.contains("APP-3"));
    assert!(!written.contains("APP-1"));
}
