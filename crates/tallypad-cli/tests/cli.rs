//! Smoke tests running the built `tally` binary

use pretty_assertions::assert_eq;
use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn tally() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tally"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_expr_prints_result() {
    let output = tally().args(["expr", "20% of $150"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output), "$30\n");
}

#[test]
fn test_expr_error_exits_nonzero() {
    let output = tally().args(["expr", "$10 + €5"]).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains('€'), "{}", stderr);
}

#[test]
fn test_precision_flag() {
    let output = tally().args(["--precision", "3", "expr", "1 / 3"]).output().unwrap();
    assert_eq!(stdout(&output), "0.333\n");
}

#[test]
fn test_eval_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("budget.tally");
    fs::write(&path, "# budget\nrent = $1000\nrent * 12\n").unwrap();

    let output = tally().arg("eval").arg(&path).output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "# budget\nrent = $1000  = $1000\nrent * 12     = $12000\n"
    );
}

#[test]
fn test_eval_missing_file() {
    let dir = TempDir::new().unwrap();
    let output = tally().arg("eval").arg(dir.path().join("nope.tally")).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.tally"));
}

#[test]
fn test_repl_session() {
    let mut child = tally()
        .arg("repl")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"price = $4\nqty = 3\nprice * qty\nans + $1\n:vars\n:del qty\n:del qty\n:quit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "= $4\n= 3\n= $12\n= $13\nprice = $4  ($4)\nqty = 3  (3)\ndeleted qty\nno variable named qty\n"
    );
}
