//! End-to-end tests for the `devprune` binary against registry files in a
//! temporary directory.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

fn devprune_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("devprune");
    cmd.current_dir(dir).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn write_doc(dir: &Path, file: &str, key: &str, records: Value) {
    let doc = json!({ "version": 1, "key": file, "data": { key: records } });
    fs::write(dir.join(file), serde_json::to_string_pretty(&doc).unwrap()).unwrap();
}

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_doc(
        dir.path(),
        "core.device_registry",
        "devices",
        json!([
            {"id": "d1", "name": "Hub", "name_by_user": null, "via_device_id": null, "config_entries": ["c1"], "connections": []},
            {"id": "d2", "name": "Bulb", "name_by_user": "Desk bulb", "via_device_id": "d1", "config_entries": ["c1", "c2"], "connections": []},
            {"id": "l1", "name": "Lamp", "name_by_user": null, "via_device_id": null, "config_entries": ["c3"], "connections": [["mac", "aa:bb"]]},
            {"id": "l2", "name": "Lamp", "name_by_user": null, "via_device_id": null, "config_entries": ["c3"], "connections": []},
        ]),
    );
    write_doc(
        dir.path(),
        "core.config_entries",
        "entries",
        json!([
            {"entry_id": "c1", "title": "X"},
            {"entry_id": "c2", "title": "Y"},
            {"entry_id": "c3", "title": "Lamps"},
        ]),
    );
    write_doc(
        dir.path(),
        "core.entity_registry",
        "entities",
        json!([
            {"id": "e1", "device_id": "d2", "original_name": "Light"},
            {"id": "e2", "device_id": "l1", "original_name": "Lamp light"},
        ]),
    );
    dir
}

fn snapshot_files(dir: &Path) -> Vec<Vec<u8>> {
    ["core.config_entries", "core.entity_registry", "core.device_registry"]
        .iter()
        .map(|f| fs::read(dir.join(f)).unwrap())
        .collect()
}

fn ids(dir: &Path, file: &str, key: &str, id_field: &str) -> Vec<String> {
    let doc: Value = serde_json::from_slice(&fs::read(dir.join(file)).unwrap()).unwrap();
    doc["data"][key]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r[id_field].as_str().unwrap().to_string())
        .collect()
}

// ── Usage ───────────────────────────────────────────────────────────

#[test]
fn test_no_selector_prints_help_and_fails() {
    let dir = fixture();
    let before = snapshot_files(dir.path());
    devprune_cmd(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Usage").and(predicate::str::contains("--name")));
    assert_eq!(snapshot_files(dir.path()), before);
}

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    devprune_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--id")
                .and(predicate::str::contains("--dry-run"))
                .and(predicate::str::contains("--dir")),
        );
}

// ── Removal ─────────────────────────────────────────────────────────

#[test]
fn test_remove_by_id() {
    let dir = fixture();
    devprune_cmd(dir.path())
        .args(["--id", "d1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Deleting the device with id \"d1\".")
                .and(predicate::str::contains("d2 - Bulb"))
                .and(predicate::str::contains("c2 - Y"))
                .and(predicate::str::contains("e1 - Light"))
                .and(predicate::str::contains("DONE.")),
        );

    assert_eq!(ids(dir.path(), "core.device_registry", "devices", "id"), vec!["l1", "l2"]);
    assert_eq!(ids(dir.path(), "core.config_entries", "entries", "entry_id"), vec!["c3"]);
    assert_eq!(ids(dir.path(), "core.entity_registry", "entities", "id"), vec!["e2"]);
}

#[test]
fn test_remove_by_user_name() {
    let dir = fixture();
    devprune_cmd(dir.path())
        .args(["--name", "Desk bulb"])
        .assert()
        .success();
    assert_eq!(
        ids(dir.path(), "core.device_registry", "devices", "id"),
        vec!["d1", "l1", "l2"]
    );
    assert_eq!(ids(dir.path(), "core.config_entries", "entries", "entry_id"), vec!["c1", "c3"]);
}

#[test]
fn test_dir_flag() {
    let dir = fixture();
    let elsewhere = TempDir::new().unwrap();
    devprune_cmd(elsewhere.path())
        .arg("--dir")
        .arg(dir.path())
        .args(["--id", "d2"])
        .assert()
        .success();
    assert_eq!(
        ids(dir.path(), "core.device_registry", "devices", "id"),
        vec!["d1", "l1", "l2"]
    );
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = fixture();
    let before = snapshot_files(dir.path());
    devprune_cmd(dir.path())
        .args(["--id", "d1", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run").and(predicate::str::contains("DONE.").not()));
    assert_eq!(snapshot_files(dir.path()), before);
}

#[test]
fn test_id_overrides_unique_name() {
    let dir = fixture();
    devprune_cmd(dir.path())
        .args(["--name", "Hub", "--id", "l2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("any given name will be ignored"));
    assert_eq!(
        ids(dir.path(), "core.device_registry", "devices", "id"),
        vec!["d1", "d2", "l1"]
    );
    // c3 is still used by l1.
    assert_eq!(
        ids(dir.path(), "core.config_entries", "entries", "entry_id"),
        vec!["c1", "c2", "c3"]
    );
}

#[test]
fn test_id_with_duplicate_name_fails_without_writing() {
    let dir = fixture();
    let before = snapshot_files(dir.path());
    devprune_cmd(dir.path())
        .args(["--name", "Lamp", "--id", "l2"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("shared by 2 devices"));
    assert_eq!(snapshot_files(dir.path()), before);
}

// ── Failures ────────────────────────────────────────────────────────

#[test]
fn test_ambiguous_name_fails_without_writing() {
    let dir = fixture();
    let before = snapshot_files(dir.path());
    devprune_cmd(dir.path())
        .args(["--name", "Lamp"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("WARNING: You have multiple devices with the same name."))
        .stderr(predicate::str::contains("ERROR:").and(predicate::str::contains("shared by 2 devices")));
    assert_eq!(snapshot_files(dir.path()), before);
}

#[test]
fn test_unknown_device_fails_without_writing() {
    let dir = fixture();
    let before = snapshot_files(dir.path());
    devprune_cmd(dir.path())
        .args(["--id", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no such device"));
    assert_eq!(snapshot_files(dir.path()), before);
}

#[test]
fn test_missing_files_fail() {
    let dir = TempDir::new().unwrap();
    devprune_cmd(dir.path())
        .args(["--id", "d1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("core.config_entries"));
}
