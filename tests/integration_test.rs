//! Integration tests for the `minic-analyze` binary.
//!
//! These are smoke tests that verify the CLI end to end: argument parsing,
//! exit codes, and both output formats. Deeper functional coverage of the
//! analyses themselves lives in the `#[cfg(test)]` modules under `src/` and
//! in `tests/expect_harness.rs`.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn bin_path() -> PathBuf {
    std::env::var("CARGO_BIN_EXE_minic-analyze")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("target/debug/minic-analyze"))
}

fn write_source(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path()).args(args).output().expect("failed to run minic-analyze")
}

#[test]
fn clean_program_exits_zero() {
    let file = write_source("int main() { return 0; }");
    let output = run(&["analyze", file.path().to_str().unwrap()]);
    assert!(output.status.success());
}

#[test]
fn missing_return_exits_one() {
    let file = write_source("int f(int a) { if (a > 0) { return 1; } }");
    let output = run(&["analyze", file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("missing-return") || stdout.contains("does not return"));
}

#[test]
fn nonexistent_file_is_an_invocation_error() {
    let output = run(&["analyze", "/no/such/file.minic"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!String::from_utf8_lossy(&output.stderr).is_empty());
}

#[test]
fn json_output_is_an_array_of_diagnostics() {
    let file = write_source("int main() { int x = 10; x = 20; print(x); return 0; }");
    let output = run(&["analyze", file.path().to_str().unwrap(), "--output", "json"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("stdout must be valid JSON");
    assert!(parsed.is_array());
    assert!(parsed.as_array().unwrap().iter().any(|d| d["kind"] == "dead-store"));
}

#[test]
fn rejects_invocation_with_no_arguments() {
    let output = run(&[]);
    assert_eq!(output.status.code(), Some(2));
}
