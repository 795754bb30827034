//! Integration tests for the command-line driver

use std::process::Command;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn run_command(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .arg("run")
        .arg("-q")
        .arg("--")
        // Tests must not depend on a user's ~/.config/quizgrid/config.toml.
        .arg("--config")
        .arg(fixture("settings.toml"))
        .args(args)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

#[test]
fn test_basic_arithmetic() {
    let (stdout, _, code) = run_command(&["-c", "1+2*3"]);
    assert_eq!(stdout.trim(), "7");
    assert_eq!(code, 0);
}

#[test]
fn test_auto_prepend_equals() {
    let (stdout1, _, _) = run_command(&["-c", "10 + 5"]);
    let (stdout2, _, _) = run_command(&["-c", "=10 + 5"]);
    assert_eq!(stdout1, stdout2);
    assert_eq!(stdout1.trim(), "15");
}

#[test]
fn test_fractional_result() {
    let (stdout, _, code) = run_command(&["-c", "7/2"]);
    assert_eq!(stdout.trim(), "3.5");
    assert_eq!(code, 0);
}

#[test]
fn test_unknown_function_exit_code() {
    let (stdout, _, code) = run_command(&["-c", "FOO(1)"]);
    assert!(stdout.starts_with("#ERR"), "{stdout}");
    assert_eq!(code, 1);
}

#[test]
fn test_division_by_zero() {
    let (stdout, _, code) = run_command(&["-c", "1/0"]);
    assert!(stdout.starts_with("#ERR"), "{stdout}");
    assert_eq!(code, 1);
}

#[test]
fn test_incomplete_formula() {
    let (stdout, _, code) = run_command(&["-c", "=2*"]);
    assert!(stdout.contains("incomplete"), "{stdout}");
    assert_eq!(code, 1);
}

#[test]
fn test_set_then_evaluate() {
    let (stdout, _, code) = run_command(&["-s", "A1=4", "-s", "A2=-9", "-c", "SUM(A1:A2)+ABS(A2)"]);
    assert_eq!(stdout.trim(), "4");
    assert_eq!(code, 0);
}

#[test]
fn test_fixture_recalculates_after_edit() {
    let quiz = fixture("quiz.toml");
    let (stdout, _, code) = run_command(&[&quiz, "-c", "B1"]);
    assert_eq!(stdout.trim(), "30");
    assert_eq!(code, 0);

    let (stdout, _, code) = run_command(&[&quiz, "-s", "A2=25", "-c", "B1"]);
    assert_eq!(stdout.trim(), "35");
    assert_eq!(code, 0);
}

#[test]
fn test_fill_rewrites_references() {
    let quiz = fixture("quiz.toml");
    let (stdout, _, code) = run_command(&[&quiz, "-s", "A3=7", "--fill", "B2:B3", "-c", "B3"]);
    assert_eq!(stdout.trim(), "14");
    assert_eq!(code, 0);
}

#[test]
fn test_prints_grid_without_command() {
    let quiz = fixture("quiz.toml");
    let (stdout, _, code) = run_command(&[&quiz]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "\tA\tB");
    assert_eq!(lines[1], "1\t10\t30");
    assert_eq!(lines[2], "2\t20\t40");
    assert_eq!(code, 0);
}

#[test]
fn test_read_only_cell_is_an_error() {
    let quiz = fixture("quiz.toml");
    let (_, stderr, code) = run_command(&[&quiz, "-s", "A1=1"]);
    assert!(stderr.contains("read-only"), "{stderr}");
    assert_eq!(code, 1);
}

#[test]
fn test_unknown_option() {
    let (_, stderr, code) = run_command(&["--bogus"]);
    assert!(stderr.contains("Unknown option"), "{stderr}");
    assert_eq!(code, 1);
}

#[test]
fn test_help_lists_functions() {
    let (_, stderr, code) = run_command(&["--help"]);
    assert!(stderr.contains("SUM(A1:B2)"), "{stderr}");
    assert!(stderr.contains("Average of numeric values in a cell range"), "{stderr}");
    assert!(stderr.contains("ABS(x)"), "{stderr}");
    assert_eq!(code, 0);
}

#[test]
fn test_long_reference_chain() {
    let chain: Vec<String> = (1..=10).map(|row| format!("A{}", row)).collect();
    let mut args = Vec::new();
    for row in 1..=10 {
        args.push("-s".to_string());
        args.push(format!("A{}=1", row));
    }
    args.push("-c".to_string());
    args.push(format!("{}+{}+{}+{}", chain.join("+"), chain.join("+"), chain.join("+"), chain.join("+")));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let (stdout, _, code) = run_command(&args);
    assert_eq!(stdout.trim(), "40");
    assert_eq!(code, 0);
}
