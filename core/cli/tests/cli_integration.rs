//! Integration tests for the pawc CLI.
//!
//! These tests spawn the compiled binary and assert on exit codes, stderr
//! and the produced artifact. The downstream compiler (`--compile`/`--run`)
//! is not exercised here; it needs a system toolchain.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn write_program(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn pawc() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("pawc"))
}

#[test]
fn missing_input_exits_with_io_code() {
    let mut cmd = pawc();
    cmd.arg("this-file-does-not-exist.paw");
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("input file not found"));
}

#[test]
fn cli_misuse_exits_with_64() {
    let mut cmd = pawc();
    cmd.arg("--backend=fortran").arg("x.paw");
    cmd.assert().code(64);
}

#[test]
fn emits_c_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_program(&dir, "main.paw", "fn main() -> i32 { 42 }");
    let mut cmd = pawc();
    cmd.current_dir(dir.path()).arg(&input);
    cmd.assert().success();
    let artifact = std::fs::read_to_string(dir.path().join("output.c")).unwrap();
    assert!(artifact.contains("#include <stdint.h>"));
    assert!(artifact.contains("int main(void)"));
}

#[test]
fn emits_llvm_ir_when_requested() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_program(&dir, "main.paw", "fn main() -> i32 { 42 }");
    let output = dir.path().join("main.ll");
    let mut cmd = pawc();
    cmd.current_dir(dir.path())
        .arg(&input)
        .arg("--backend=llvm")
        .arg("-o")
        .arg(&output);
    cmd.assert().success();
    let artifact = std::fs::read_to_string(&output).unwrap();
    assert!(artifact.contains("define"));
    assert!(artifact.contains("@main"));
}

#[test]
fn diagnostic_failure_writes_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_program(
        &dir,
        "main.paw",
        "fn main() -> i32 {\n    let x = 1\n    x = 2\n    x\n}",
    );
    let mut cmd = pawc();
    cmd.current_dir(dir.path()).arg(&input);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("immutable"));
    assert!(
        !dir.path().join("output.c").exists(),
        "no output file may be written on failure"
    );
}

#[test]
fn verbose_reports_phases() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_program(&dir, "main.paw", "fn main() -> i32 { 0 }");
    let mut cmd = pawc();
    cmd.current_dir(dir.path()).arg(&input).arg("-v");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("compiling"))
        .stderr(predicate::str::contains("wrote"));
}
