mod common;

use common::{test_log, xctriage};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn project_with_bundles() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let logs = dir.path().join("DerivedData/Logs/Test");
    for name in ["Run-A.xcresult", "Run-B.xcresult"] {
        let bundle = logs.join(name);
        fs::create_dir_all(bundle.join("Data")).expect("create bundle");
        fs::write(bundle.join("Info.plist"), "<plist/>").expect("write plist");
    }
    // Bundles are opaque; nothing inside one is reported.
    fs::create_dir_all(logs.join("Run-A.xcresult/Nested.xcresult")).expect("create nested");
    dir
}

#[test]
fn e2e_find_lists_bundles() {
    let _log = test_log("e2e_find_lists_bundles");
    let project = project_with_bundles();

    xctriage(project.path())
        .args(["find"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Run-A.xcresult"))
        .stdout(predicate::str::contains("Run-B.xcresult"))
        .stdout(predicate::str::contains("Nested.xcresult").not());
}

#[test]
fn e2e_find_limit() {
    let _log = test_log("e2e_find_limit");
    let project = project_with_bundles();

    let output = xctriage(project.path())
        .args(["find", "-n", "1"])
        .output()
        .expect("run find");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1);
}

#[test]
fn e2e_find_json_reports_sizes() {
    let _log = test_log("e2e_find_json_reports_sizes");
    let project = project_with_bundles();

    let output = xctriage(project.path())
        .args(["find", "--json"])
        .output()
        .expect("run find --json");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let bundles = json.as_array().expect("array");
    assert_eq!(bundles.len(), 2);
    for bundle in bundles {
        assert_eq!(bundle["size_bytes"], 8);
        assert!(bundle["modified"].is_string());
    }
}

#[test]
fn e2e_find_empty_directory_is_an_error() {
    let _log = test_log("e2e_find_empty_directory_is_an_error");
    let empty = TempDir::new().expect("tempdir");

    let output = xctriage(empty.path())
        .args(["find"])
        .output()
        .expect("run find");
    assert_eq!(output.status.code(), Some(4));
    let json: Value = serde_json::from_slice(&output.stderr).expect("json error");
    assert_eq!(json["error"]["code"], "NO_RESULT_BUNDLES");
}

#[test]
fn e2e_show_project_without_bundles_is_an_error() {
    let _log = test_log("e2e_show_project_without_bundles_is_an_error");
    let empty = TempDir::new().expect("tempdir");

    xctriage(empty.path())
        .args(["show", "."])
        .assert()
        .code(4);
}

#[test]
fn e2e_show_project_dir_uses_newest_bundle() {
    let _log = test_log("e2e_show_project_dir_uses_newest_bundle");
    let project = TempDir::new().expect("tempdir");
    let bundle = project.path().join("Logs/Test/Run.xcresult");
    fs::create_dir_all(&bundle).expect("create bundle");
    fs::write(bundle.join("summary.json"), common::summary_json()).expect("write summary");
    fs::write(bundle.join("tests.json"), common::tests_json()).expect("write tests");

    xctriage(project.path())
        .args(["show", ".", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ testB()"))
        .stderr(predicate::str::contains("Using newest result bundle:"))
        .stderr(predicate::str::contains("Run.xcresult"));
}

#[test]
fn e2e_version_json() {
    let _log = test_log("e2e_version_json");
    let dir = TempDir::new().expect("tempdir");

    let output = xctriage(dir.path())
        .args(["version", "--json"])
        .output()
        .expect("run version");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn e2e_completions_bash() {
    let _log = test_log("e2e_completions_bash");
    let dir = TempDir::new().expect("tempdir");

    xctriage(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("xctriage"));
}
