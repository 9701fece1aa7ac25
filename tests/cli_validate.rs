//! Integration tests for the validate and tables commands
//!
//! These tests verify end-to-end behavior of the CLI by running the binary
//! against generated data directories and checking exit codes and output.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Get the path to the sdb binary
fn sdb_binary() -> PathBuf {
    if let Some(path) = option_env!("CARGO_BIN_EXE_sdb") {
        return PathBuf::from(path);
    }

    let release = Path::new("target/release/sdb");
    if release.exists() {
        return release.to_path_buf();
    }

    let debug = Path::new("target/debug/sdb");
    if debug.exists() {
        return debug.to_path_buf();
    }

    panic!("sdb binary not found. Run 'cargo build' first.");
}

/// Write a small data directory with two schema tables and one without a
/// registered schema.
fn write_data_dir(attributes: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("database.json"),
        r#"[
            {"TableName": "Attributes", "JSON": [{"File": "attributes.json"}]},
            {"TableName": "Names", "JSON": [{"File": "names.json"}]},
            {"TableName": "Sprites", "JSON": [{"File": "sprites.json"}]}
        ]"#,
    )
    .unwrap();
    fs::write(dir.path().join("attributes.json"), attributes).unwrap();
    fs::write(
        dir.path().join("names.json"),
        r#"[{"ID": "Human", "Names": ["Ada", "Brin", "Cleo"]}]"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("sprites.json"),
        r#"[{"ID": "GrassFloor", "BaseSprite": "GrassBase"}]"#,
    )
    .unwrap();
    dir
}

#[test]
fn test_validate_clean_data_succeeds() {
    // Lenient syntax in a content file: unquoted keys, trailing comma
    let dir = write_data_dir("[{ID: \"Strength\"}, {ID: \"Agility\"},]");

    let output = Command::new(sdb_binary())
        .arg("validate")
        .arg(dir.path())
        .output()
        .expect("Failed to execute sdb");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "Expected success, got {:?}\nstdout: {}\nstderr: {}",
        output.status.code(),
        stdout,
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("Attributes: 2 rows OK"), "stdout: {}", stdout);
    assert!(stdout.contains("Names: 1 rows OK"), "stdout: {}", stdout);
    // No registered schema for the sprite table, rows still counted
    assert!(
        stdout.contains("Sprites: 1 rows (no schema)"),
        "stdout: {}",
        stdout
    );
}

#[test]
fn test_validate_reports_unknown_key() {
    let dir = write_data_dir(r#"[{"ID": "Strength", "Bogus": 1}]"#);

    let output = Command::new(sdb_binary())
        .arg("validate")
        .arg(dir.path())
        .output()
        .expect("Failed to execute sdb");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("unknown key 'Bogus'"),
        "stdout: {}",
        stdout
    );
    assert!(stdout.contains("ID=Strength"), "stdout: {}", stdout);
    assert!(stdout.contains("attributes.json"), "stdout: {}", stdout);
}

#[test]
fn test_validate_reports_invalid_value() {
    // Names must be an array of strings
    let dir = write_data_dir(r#"[{"ID": "Strength"}]"#);
    fs::write(
        dir.path().join("names.json"),
        r#"[{"ID": "Human", "Names": 7}]"#,
    )
    .unwrap();

    let output = Command::new(sdb_binary())
        .arg("validate")
        .arg(dir.path())
        .output()
        .expect("Failed to execute sdb");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("validation of key 'Names' failed"),
        "stdout: {}",
        stdout
    );
}

#[test]
fn test_validate_missing_manifest_is_usage_error() {
    let dir = TempDir::new().unwrap();

    let output = Command::new(sdb_binary())
        .arg("validate")
        .arg(dir.path())
        .output()
        .expect("Failed to execute sdb");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "stderr: {}", stderr);
}

#[test]
fn test_tables_lists_row_counts() {
    let dir = write_data_dir(r#"[{"ID": "Strength"}, {"ID": "Agility"}]"#);

    let output = Command::new(sdb_binary())
        .arg("tables")
        .arg(dir.path())
        .output()
        .expect("Failed to execute sdb");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Attributes: 2 rows (attributes.json)"),
        "stdout: {}",
        stdout
    );
    assert!(
        stdout.contains("Sprites: 1 rows (sprites.json)"),
        "stdout: {}",
        stdout
    );
}

#[test]
fn test_tables_reports_broken_file() {
    let dir = write_data_dir(r#"[{"ID": "Strength"}]"#);
    fs::write(dir.path().join("names.json"), "{not an array}").unwrap();

    let output = Command::new(sdb_binary())
        .arg("tables")
        .arg(dir.path())
        .output()
        .expect("Failed to execute sdb");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Names: error:"), "stdout: {}", stdout);
}
