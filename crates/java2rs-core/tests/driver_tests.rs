//! Directory driver: module tree layout and summaries

use std::fs;

use anyhow::Result;
use java2rs_core::{FileDriver, TranspileConfig};
use tempfile::TempDir;

#[test]
fn test_directory_becomes_module_tree() -> Result<()> {
    let source = TempDir::new()?;
    let output = TempDir::new()?;
    fs::create_dir_all(source.path().join("shapes"))?;
    fs::write(source.path().join("Main.java"), "class Main { }")?;
    fs::write(source.path().join("shapes/Circle.java"), "class Circle { double radius; }")?;
    fs::write(source.path().join("notes.txt"), "not java")?;

    let summary = FileDriver::new().transform_directory(source.path(), output.path())?;
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.files_converted, 2);
    assert!(summary.success());

    let lib = fs::read_to_string(output.path().join("lib.rs"))?;
    assert_eq!(lib, "pub mod main;\npub mod shapes;\n");
    let shapes = fs::read_to_string(output.path().join("shapes/mod.rs"))?;
    assert_eq!(shapes, "pub mod circle;\n");
    let circle = fs::read_to_string(output.path().join("shapes/circle.rs"))?;
    assert!(circle.contains("radius: f64,"), "{circle}");
    assert!(!output.path().join("notes.rs").exists());
    Ok(())
}

#[test]
fn test_cross_file_references_use_module_paths() -> Result<()> {
    let source = TempDir::new()?;
    let output = TempDir::new()?;
    fs::create_dir_all(source.path().join("model"))?;
    fs::write(source.path().join("model/Point.java"), "class Point { int x; }")?;
    fs::write(source.path().join("Line.java"), "class Line { Point start; }")?;

    FileDriver::new().transform_directory(source.path(), output.path())?;
    let line = fs::read_to_string(output.path().join("line.rs"))?;
    assert!(line.contains("start: crate::model::point::Point,"), "{line}");
    Ok(())
}

#[test]
fn test_parse_failures_are_counted() -> Result<()> {
    let source = TempDir::new()?;
    let output = TempDir::new()?;
    fs::write(source.path().join("Broken.java"), "class Broken {")?;
    fs::write(source.path().join("Good.java"), "class Good { }")?;

    let summary = FileDriver::new().transform_directory(source.path(), output.path())?;
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.errors.len(), 1);
    assert!(!summary.success());
    let broken = fs::read_to_string(output.path().join("broken.rs"))?;
    assert!(broken.starts_with("/*\nFIXME: "));
    Ok(())
}

#[test]
fn test_single_file_transform() -> Result<()> {
    let source = TempDir::new()?;
    let output = TempDir::new()?;
    let input = source.path().join("Single.java");
    fs::write(&input, "class Single { int i; }")?;
    let target = output.path().join("out/single.rs");

    let summary = FileDriver::new().transform_file(&input, &target)?;
    assert_eq!(summary.files_converted, 1);
    assert_eq!(fs::read_to_string(target)?, "struct Single {\n    i: i32,\n}\n\nimpl Single {}\n");
    Ok(())
}

#[test]
fn test_configured_extensions() -> Result<()> {
    let source = TempDir::new()?;
    let output = TempDir::new()?;
    fs::write(source.path().join("A.jav"), "class A { }")?;
    fs::write(source.path().join("B.java"), "class B { }")?;

    let config = TranspileConfig {
        source_extensions: vec!["jav".to_string()],
        ..TranspileConfig::default()
    };
    let summary = FileDriver::new()
        .config(config)
        .transform_directory(source.path(), output.path())?;
    assert_eq!(summary.files_processed, 1);
    assert!(output.path().join("a.rs").exists());
    Ok(())
}

#[test]
fn test_missing_source_directory_is_an_error() {
    let output = TempDir::new().unwrap();
    let result = FileDriver::new().transform_directory("/definitely/not/here", output.path());
    assert!(result.is_err());
}

#[test]
fn test_summary_serializes_to_json() -> Result<()> {
    let source = TempDir::new()?;
    let output = TempDir::new()?;
    fs::write(source.path().join("A.java"), "class A { }")?;
    let summary = FileDriver::new().transform_directory(source.path(), output.path())?;
    let json = serde_json::to_value(&summary)?;
    assert_eq!(json["files_converted"], 1);
    Ok(())
}
