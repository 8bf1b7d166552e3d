//! Integration tests for the export and load commands.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn get_binary_path() -> String {
    std::env::var("CARGO_BIN_EXE_sql-loader")
        .unwrap_or_else(|_| "target/debug/sql-loader".to_string())
}

fn run(args: &[&str]) -> Output {
    Command::new(get_binary_path())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute sql-loader")
}

fn create_source(dir: &TempDir) -> String {
    let path = dir.path().join("source.db");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
         INSERT INTO users VALUES (1, 'alice'), (2, 'bob'), (3, 'carol');",
    )
    .unwrap();
    format!("sqlite:{}", path.display())
}

fn create_target(dir: &TempDir) -> (String, std::path::PathBuf) {
    let path = dir.path().join("target.db");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);")
        .unwrap();
    (format!("sqlite:{}", path.display()), path)
}

fn target_count(path: &Path) -> i64 {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
        .unwrap()
}

fn export(dir: &TempDir, file: &str) -> std::path::PathBuf {
    let source = create_source(dir);
    let out = dir.path().join(file);
    let output = run(&[
        "export",
        "--db",
        &source,
        "--query",
        "SELECT id, name FROM users ORDER BY id",
        "-o",
        out.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "export failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    out
}

#[test]
fn test_export_then_load_json() {
    let dir = TempDir::new().unwrap();
    let stream = export(&dir, "users.dat");
    let (target, target_path) = create_target(&dir);

    let output = run(&[
        "load",
        stream.to_str().unwrap(),
        "--db",
        &target,
        "--table",
        "users",
        "--dialect",
        "oci8",
        "--json",
    ]);
    assert!(
        output.status.success(),
        "load failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["statistics"]["rows_loaded"], 3);
    assert_eq!(json["statistics"]["table"], "users");
    assert_eq!(json["dialect"], "oci8");
    assert_eq!(json["truncate"], false);
    assert_eq!(target_count(&target_path), 3);
}

#[test]
fn test_compressed_stream() {
    let dir = TempDir::new().unwrap();
    let stream = export(&dir, "users.dat.gz");
    let (target, target_path) = create_target(&dir);

    let output = run(&[
        "load",
        stream.to_str().unwrap(),
        "--db",
        &target,
        "--table",
        "users",
    ]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("finish"), "stderr: {}", stderr);
    assert_eq!(target_count(&target_path), 3);
}

#[test]
fn test_truncate_flag() {
    let dir = TempDir::new().unwrap();
    let stream = export(&dir, "users.dat");
    let (target, target_path) = create_target(&dir);

    for _ in 0..2 {
        let output = run(&[
            "load",
            stream.to_str().unwrap(),
            "--db",
            &target,
            "--table",
            "users",
            "--truncate",
        ]);
        assert!(output.status.success());
    }
    assert_eq!(target_count(&target_path), 3);
}

#[test]
fn test_second_load_without_truncate_fails_on_key() {
    let dir = TempDir::new().unwrap();
    let stream = export(&dir, "users.dat");
    let (target, target_path) = create_target(&dir);
    let args = [
        "load",
        stream.to_str().unwrap(),
        "--db",
        &target,
        "--table",
        "users",
    ];

    assert!(run(&args).status.success());
    let output = run(&args);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("row 1: insert failed"), "stderr: {}", stderr);
    assert_eq!(target_count(&target_path), 3);
}

#[test]
fn test_config_file_supplies_defaults() {
    let dir = TempDir::new().unwrap();
    let stream = export(&dir, "users.dat");
    let (target, target_path) = create_target(&dir);

    let config = dir.path().join("load.yaml");
    fs::write(
        &config,
        format!("db: \"{}\"\ntable: users\ndialect: mysql\ncheckpoint_secs: 1\n", target),
    )
    .unwrap();

    let output = run(&[
        "load",
        stream.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "load failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(target_count(&target_path), 3);
}

#[test]
fn test_unknown_dialect_fails() {
    let dir = TempDir::new().unwrap();
    let stream = export(&dir, "users.dat");
    let (target, target_path) = create_target(&dir);

    let output = run(&[
        "load",
        stream.to_str().unwrap(),
        "--db",
        &target,
        "--table",
        "users",
        "--dialect",
        "sybase",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported dialect 'sybase'"), "stderr: {}", stderr);
    assert_eq!(target_count(&target_path), 0);
}

#[test]
fn test_missing_db_fails() {
    let dir = TempDir::new().unwrap();
    let stream = export(&dir, "users.dat");

    let output = run(&["load", stream.to_str().unwrap(), "--table", "users"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--db"));
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let (target, _) = create_target(&dir);
    let missing = dir.path().join("missing.dat");

    let output = run(&[
        "load",
        missing.to_str().unwrap(),
        "--db",
        &target,
        "--table",
        "users",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot open input stream"));
}

#[test]
fn test_completions() {
    let output = run(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("sql-loader"));
}
