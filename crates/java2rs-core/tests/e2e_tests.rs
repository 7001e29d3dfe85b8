//! End-to-end pins of the rendered text shape

use anyhow::Result;
use java2rs_core::{transpile_source, Transpiler, TranspileConfig, UnitStatus};
use pretty_assertions::assert_eq;

#[test]
fn test_field_without_initializer() -> Result<()> {
    assert_eq!(
        transpile_source("class A { int i; }")?,
        "struct A {\n    i: i32,\n}\n\nimpl A {}\n"
    );
    Ok(())
}

#[test]
fn test_method_without_receiver() -> Result<()> {
    assert_eq!(
        transpile_source("class A { void m(int i) { }; }")?,
        "struct A;\n\nimpl A {\n    fn m(i: i32) {}\n}\n"
    );
    Ok(())
}

#[test]
fn test_interface_conformance() -> Result<()> {
    assert_eq!(
        transpile_source("interface B {}\nclass A implements B {}")?,
        "trait B {}\n\nstruct A;\n\nimpl A {}\n\nimpl B for A {}\n"
    );
    Ok(())
}

#[test]
fn test_superclass_is_embedded() -> Result<()> {
    assert_eq!(
        transpile_source("class Base { int x; }\nclass Sub extends Base { }")?,
        "struct Base {\n    x: i32,\n}\n\nimpl Base {}\n\nstruct Sub {\n    base: Base,\n}\n\nimpl Sub {}\n"
    );
    Ok(())
}

#[test]
fn test_cyclic_inheritance_still_renders() -> Result<()> {
    let out = transpile_source("class A extends B { }\nclass B extends A { }")?;
    assert!(out.contains("struct A {\n    base: B,\n}"), "{out}");
    assert!(out.contains("struct B {\n    base: A,\n}"), "{out}");
    Ok(())
}

#[test]
fn test_package_and_imports_are_echoed() -> Result<()> {
    let out = transpile_source("package a.b;\nimport java.util.List;\nclass A { }")?;
    assert_eq!(out, "// package a.b;\n// import java.util.List;\n\nstruct A;\n\nimpl A {}\n");
    Ok(())
}

#[test]
fn test_trait_methods_are_signatures() -> Result<()> {
    let out = transpile_source("public interface Shape { double area(); int SIDES = 0; }")?;
    assert_eq!(
        out,
        "pub trait Shape {\n    const SIDES: i32 = 0;\n\n    fn area(&self) -> f64;\n}\n"
    );
    Ok(())
}

#[test]
fn test_custom_indentation() -> Result<()> {
    let config = TranspileConfig {
        indent: "\t".to_string(),
        ..TranspileConfig::default()
    };
    let out = java2rs_core::transpiler::transpile_source_with("class A { int i; }", config)?;
    assert_eq!(out, "struct A {\n\ti: i32,\n}\n\nimpl A {}\n");
    Ok(())
}

#[test]
fn test_failing_unit_does_not_abort_siblings() -> Result<()> {
    let mut transpiler = Transpiler::new(TranspileConfig::default())?;
    transpiler.add_unit("Broken.java", "class Broken {");
    transpiler.add_unit("Fine.java", "class Fine { }");
    let outcomes = transpiler.run();
    assert_eq!(outcomes[0].status, UnitStatus::ParseFailure);
    assert!(outcomes[0].text.starts_with("/*\nFIXME: "));
    assert_eq!(outcomes[1].status, UnitStatus::Success);
    assert_eq!(outcomes[1].text, "struct Fine;\n\nimpl Fine {}\n");
    Ok(())
}

#[test]
fn test_identical_input_gives_identical_output() -> Result<()> {
    let source = "class Counter { private int count; public void add(int n) { count += n; } public int get() { return count; } }";
    assert_eq!(transpile_source(source)?, transpile_source(source)?);
    Ok(())
}
