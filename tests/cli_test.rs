/*!
 * Integration tests for the bucketscan binary
 *
 * None of these reach the network: they cover argument handling, the
 * input checks made before a run starts, and the read-only subcommands.
 */

use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

fn bucketscan() -> Command {
    let mut cmd = Command::cargo_bin("bucketscan").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    bucketscan()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("runs"))
        .stdout(predicate::str::contains("found"));
}

#[test]
fn test_missing_input_fails_before_run() {
    let temp = assert_fs::TempDir::new().unwrap();
    let db = temp.child("scan.db");

    bucketscan()
        .args(["scan", "--no-progress", "--input-file"])
        .arg(temp.child("missing.txt").path())
        .arg("--db")
        .arg(db.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Input file not found"))
        .stderr(predicate::str::contains("Nothing was scanned"));

    // No ledger, so no run record
    db.assert(predicate::path::missing());
}

#[test]
fn test_directory_as_input_is_rejected() {
    let temp = assert_fs::TempDir::new().unwrap();

    bucketscan()
        .args(["scan", "--no-progress", "--dry-run", "--input-file"])
        .arg(temp.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_bad_endpoint_fails_before_run() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("words.txt");
    input.write_str("mybucket\n").unwrap();
    let db = temp.child("scan.db");

    bucketscan()
        .args(["scan", "--no-progress", "--endpoint", "https://s3.amazonaws.com/"])
        .arg("--input-file")
        .arg(input.path())
        .arg("--db")
        .arg(db.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid probe configuration"));

    db.assert(predicate::path::missing());
}

#[test]
fn test_dry_run_on_empty_input() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("empty.txt");
    input.touch().unwrap();

    bucketscan()
        .args(["scan", "--no-progress", "--dry-run", "--input-file"])
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Summary"))
        .stdout(predicate::str::contains("Candidates Probed"));
}

#[test]
fn test_runs_on_fresh_ledger() {
    let temp = assert_fs::TempDir::new().unwrap();
    let db = temp.child("scan.db");

    bucketscan()
        .args(["runs", "--db"])
        .arg(db.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No scan runs recorded yet"));
}

#[test]
fn test_found_on_fresh_ledger() {
    let temp = assert_fs::TempDir::new().unwrap();
    let db = temp.child("scan.db");

    bucketscan()
        .args(["found", "--db"])
        .arg(db.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No open buckets recorded yet"));
}

#[test]
fn test_invalid_config_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config = temp.child("bucketscan.toml");
    config.write_str("probe = \"not a table\"\n").unwrap();

    bucketscan()
        .arg("--config")
        .arg(config.path())
        .args(["runs", "--db"])
        .arg(temp.child("scan.db").path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration error"));
}
