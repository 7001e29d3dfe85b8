use std::fs;

use anyhow::Result;
use java2rs_cli::{build_command, run_with_args};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn run_capture(args: &[&str]) -> Result<(i32, String)> {
    let mut out = Vec::new();
    let code = run_with_args(args.iter().copied(), &mut out)?;
    Ok((code, String::from_utf8(out)?))
}

#[test]
fn test_command_definition_is_consistent() {
    build_command().debug_assert();
}

#[test]
fn test_single_file_goes_to_stdout() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("A.java");
    fs::write(&input, "class A { int i; }")?;
    let (code, out) = run_capture(&["java2rs", input.to_str().unwrap()])?;
    assert_eq!(code, 0);
    assert_eq!(out, "struct A {\n    i: i32,\n}\n\nimpl A {}\n");
    Ok(())
}

#[test]
fn test_directory_with_text_report() -> Result<()> {
    let source = TempDir::new()?;
    let output = TempDir::new()?;
    fs::write(source.path().join("A.java"), "class A { }")?;
    fs::write(source.path().join("B.java"), "class B { }")?;
    let (code, out) = run_capture(&[
        "java2rs",
        source.path().to_str().unwrap(),
        "-o",
        output.path().to_str().unwrap(),
    ])?;
    assert_eq!(code, 0);
    assert_eq!(out, "Converted 2 of 2 file(s), 0 failed\n");
    assert!(output.path().join("a.rs").exists());
    assert_eq!(fs::read_to_string(output.path().join("lib.rs"))?, "pub mod a;\npub mod b;\n");
    Ok(())
}

#[test]
fn test_failed_unit_sets_exit_code() -> Result<()> {
    let source = TempDir::new()?;
    let output = TempDir::new()?;
    fs::write(source.path().join("Bad.java"), "class Bad {")?;
    let (code, out) = run_capture(&[
        "java2rs",
        source.path().to_str().unwrap(),
        "--output",
        output.path().to_str().unwrap(),
        "--report",
        "json",
    ])?;
    assert_eq!(code, 1);
    let report: serde_json::Value = serde_json::from_str(&out)?;
    assert_eq!(report["files_failed"], 1);
    Ok(())
}

#[test]
fn test_config_file_sets_indentation() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("A.java");
    let config = dir.path().join("config.json");
    fs::write(&input, "class A { int i; }")?;
    fs::write(&config, r#"{ "indent": "  " }"#)?;
    let (code, out) = run_capture(&[
        "java2rs",
        input.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ])?;
    assert_eq!(code, 0);
    assert_eq!(out, "struct A {\n  i: i32,\n}\n\nimpl A {}\n");
    Ok(())
}

#[test]
fn test_missing_input_is_rejected() {
    let mut out = Vec::new();
    assert!(run_with_args(["java2rs"], &mut out).is_err());
}

#[test]
fn test_unknown_report_format_is_rejected() {
    let mut out = Vec::new();
    assert!(run_with_args(["java2rs", "A.java", "--report", "xml"], &mut out).is_err());
}
