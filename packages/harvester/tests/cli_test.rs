//! Command-line tests for the `siro-harvester` binary.

use std::fs;
use std::path::Path;

use assert_cmd::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command running in an isolated temp directory without colors.
fn harvester_cmd(work_dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("siro-harvester");
    cmd.current_dir(work_dir.path());
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("DPLA_API_KEY");
    cmd
}

fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .display()
        .to_string()
}

#[test]
fn test_help_lists_commands() {
    cargo_bin_cmd!("siro-harvester")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("harvest"))
        .stdout(predicate::str::contains("registry"));
}

#[test]
fn test_build_writes_batches_and_registry() {
    let dir = TempDir::new().unwrap();

    harvester_cmd(&dir)
        .args(["build", &fixture("records.tsv"), "--batch-size", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed: 2"));

    assert!(dir.path().join("rdf/records.xml").exists());
    assert!(dir.path().join("rdf/records_1.xml").exists());
    let registry = fs::read_to_string(dir.path().join("data/processed_ids.json")).unwrap();
    assert!(registry.contains("0a1b2c"));
    assert!(registry.contains("3d4e5f"));
}

#[test]
fn test_build_second_run_reports_duplicates() {
    let dir = TempDir::new().unwrap();

    harvester_cmd(&dir)
        .args(["build", &fixture("records.tsv")])
        .assert()
        .success();

    harvester_cmd(&dir)
        .args(["build", &fixture("records.tsv")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed: 0"))
        .stdout(predicate::str::contains("Duplicates skipped: 2"));
}

#[test]
fn test_build_missing_input_fails() {
    let dir = TempDir::new().unwrap();

    harvester_cmd(&dir)
        .args(["build", "missing.tsv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Invalid path"));
}

#[test]
fn test_build_rejects_zero_batch_size() {
    let dir = TempDir::new().unwrap();

    harvester_cmd(&dir)
        .args(["build", &fixture("records.tsv"), "--batch-size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("batch size must be at least 1"));
}

#[test]
fn test_build_with_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("harvester.yaml"),
        "output:\n  path: out/siro.xml\ndedup:\n  enabled: false\nbuilder:\n  record_element: msu\n",
    )
    .unwrap();

    harvester_cmd(&dir)
        .args(["build", &fixture("records.tsv"), "--config", "harvester.yaml"])
        .assert()
        .success();

    let xml = fs::read_to_string(dir.path().join("out/siro.xml")).unwrap();
    assert!(xml.contains("<sro:msu rdf:about=\"http://dp.la/api/items/0a1b2c\">"));
    assert!(!dir.path().join("data/processed_ids.json").exists());
}

#[test]
fn test_harvest_without_api_key_fails() {
    let dir = TempDir::new().unwrap();

    harvester_cmd(&dir)
        .args(["harvest", "anarchism"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DPLA API key is not set"));
}

#[test]
fn test_registry_rebuild() {
    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records");
    fs::create_dir_all(records.join("nested")).unwrap();
    fs::write(records.join("aa11.xml"), "<x/>").unwrap();
    fs::write(records.join("nested").join("bb22.xml"), "<x/>").unwrap();
    fs::write(records.join("notes.txt"), "skip").unwrap();

    harvester_cmd(&dir)
        .args(["registry", "rebuild", "records"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 new"));

    let registry = fs::read_to_string(dir.path().join("data/processed_ids.json")).unwrap();
    assert!(registry.contains("aa11"));
    assert!(registry.contains("bb22"));
    assert!(!registry.contains("notes"));
}
