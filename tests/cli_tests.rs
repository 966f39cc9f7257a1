//! CLI integration tests for the `pcc` binary.
//!
//! Spawns the binary with `assert_cmd` and checks exit codes, stdout and
//! stderr.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn pcc() -> Command {
    Command::cargo_bin("pcc").expect("pcc binary is built")
}

#[test]
fn help_exits_0_with_description() {
    pcc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Compile a small C subset"));
}

#[test]
fn string_source_prints_assembly() {
    pcc()
        .args(["-s", "int main() { return 1 + 2; }"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_main:"))
        .stdout(predicate::str::contains("add w8, w8, w9"))
        .stdout(predicate::str::contains("ret"));
}

#[test]
fn file_source_prints_assembly() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("prog.c");
    fs::write(&path, "int twice(int x) {\n    return x * 2;\n}\n").expect("write source");

    pcc()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(".globl _twice"))
        .stdout(predicate::str::contains("mul w8, w8, w9"));
}

#[test]
fn output_flag_writes_file() {
    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("out.s");

    pcc()
        .args(["-s", "int main() { return 0; }", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&out).expect("output written");
    assert!(written.contains("_main:"));
}

#[test]
fn emit_ast_prints_tree() {
    pcc()
        .args(["--emit", "ast", "-s", "int a = 1 + 2;"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Definition"))
        .stdout(predicate::str::contains("BinaryExpr"));
}

#[test]
fn parse_failure_exits_1() {
    pcc()
        .args(["-s", "int main( {"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Parse error at line 1"));
}

#[test]
fn unresolved_identifier_exits_1() {
    pcc()
        .args(["-s", "int f() { return x; }"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unresolved identifier 'x'"));
}

#[test]
fn recursion_limit_is_an_internal_fault() {
    pcc()
        .args(["--max-depth", "5", "-s", "int main() { return ((((1)))); }"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("recursion limit"));
}

#[test]
fn file_and_string_conflict() {
    pcc()
        .args(["prog.c", "-s", "int a;"])
        .assert()
        .code(2);
}

#[test]
fn missing_input_is_a_usage_error() {
    pcc().assert().code(2);
}

#[test]
fn missing_file_exits_1() {
    pcc()
        .arg("definitely/not/here.c")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("I/O error"));
}

#[test]
fn very_verbose_traces_rule_attempts() {
    pcc()
        .args(["-vv", "-s", "int a;"])
        .assert()
        .success()
        .stderr(predicate::str::contains("PARSING TOP"))
        .stderr(predicate::str::contains("cache hits"));
}

#[test]
fn right_associativity_and_no_memo_still_compile() {
    pcc()
        .args([
            "--associativity",
            "right",
            "--cache-capacity",
            "0",
            "-s",
            "int f() { int a = 9 - 3 - 1; return a; }",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("sub sp, sp, #8"));
}

#[test]
fn out_of_range_constant_exits_1() {
    pcc()
        .args(["-s", "int g = 4294967296;"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not fit in 32 bits"));
}

#[test]
fn quiet_by_default_and_debug_with_v() {
    pcc()
        .args(["-s", "int a;"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());

    pcc()
        .args(["-v", "-s", "int a;"])
        .assert()
        .success()
        .stderr(predicate::str::contains("cache hits"))
        .stderr(predicate::str::contains("PARSING").not());
}
