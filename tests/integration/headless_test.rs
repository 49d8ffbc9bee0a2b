//! Runs the binary with `--execute` against the mock database.

use std::path::Path;
use std::process::Command;

/// Runs pgdash with an isolated config path and returns (exit code, stdout, stderr).
fn run_pgdash(args: &[&str], config_dir: &Path) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_pgdash"))
        .arg("--config")
        .arg(config_dir.join("config.toml"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run pgdash");

    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn test_execute_prints_csv() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_pgdash(
        &[
            "--mock-db",
            "--execute",
            "SELECT * FROM information_schema.tables LIMIT 10;",
        ],
        dir.path(),
    );

    assert_eq!(code, 0);
    assert!(stdout.starts_with("table_catalog,table_schema,table_name,table_type\n"));
    assert_eq!(stdout.lines().count(), 6);
}

#[test]
fn test_execute_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.csv");
    let (code, stdout, _) = run_pgdash(
        &[
            "--mock-db",
            "--execute",
            "SELECT 1",
            "--output-file",
            out.to_str().unwrap(),
        ],
        dir.path(),
    );

    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    let csv = std::fs::read_to_string(&out).unwrap();
    assert_eq!(csv, "result\nMock result for: SELECT 1\n");
}

#[test]
fn test_query_error_exits_with_category() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_pgdash(&["--mock-db", "--execute", "SELEC 1"], dir.path());

    assert_eq!(code, 1);
    assert!(stderr.contains("Query Error: ERROR: syntax error"), "{stderr}");
}

#[test]
fn test_read_only_refuses_delete() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_pgdash(
        &["--mock-db", "--read-only", "--execute", "DELETE FROM orders"],
        dir.path(),
    );

    assert_eq!(code, 1);
    assert!(stderr.contains("not allowed in read-only mode"), "{stderr}");
}

#[test]
fn test_read_only_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[explorer]\nread_only = true\n",
    )
    .unwrap();

    let (code, _, stderr) = run_pgdash(
        &["--mock-db", "--execute", "DROP TABLE orders"],
        dir.path(),
    );

    assert_eq!(code, 1);
    assert!(stderr.contains("Query Error"), "{stderr}");
}

#[test]
fn test_bad_config_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[explorer\n").unwrap();

    let (code, _, stderr) = run_pgdash(&["--mock-db", "--execute", "SELECT 1"], dir.path());

    assert_eq!(code, 1);
    assert!(stderr.contains("Configuration Error"), "{stderr}");
}
