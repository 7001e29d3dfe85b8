// Tests for rendering the target item model

use pretty_assertions::assert_eq;

use super::render::{braced, indent_lines};
use super::*;

const INDENT: &str = "    ";

fn class(name: &str) -> Item {
    Item::new(name, UnitId(0), ItemKind::Class, name)
}

fn field(name: &str, ty: &str) -> Field {
    let mut field = Field::new(format!("A.{name}"), name);
    field.ty = ty.to_string();
    field
}

#[test]
fn test_field_without_initializer() {
    let mut item = class("A");
    item.fields.push(field("i", "i32"));
    assert_eq!(item.to_rust(INDENT), "struct A {\n    i: i32,\n}\n\nimpl A {}");
}

#[test]
fn test_field_with_initializer() {
    let mut item = class("A");
    let mut f = field("i", "i32");
    f.init = Some("3".to_string());
    item.fields.push(f);
    assert_eq!(item.to_rust(INDENT), "struct A {\n    i: i32 = 3,\n}\n\nimpl A {}");
}

#[test]
fn test_generic_bounds_only_on_impl_header() {
    let mut item = class("A");
    item.generics.params = vec![
        GenericParam { name: "B".into(), bounds: vec![] },
        GenericParam { name: "C".into(), bounds: vec!["D".into()] },
        GenericParam { name: "E".into(), bounds: vec![] },
    ];
    item.fields.push(field("i", "C"));
    assert_eq!(
        item.to_rust(INDENT),
        "struct A<B, C, E> {\n    i: C,\n}\n\nimpl<B, C: D, E> A<B, C, E> {}"
    );
}

#[test]
fn test_method_without_receiver() {
    let mut item = class("A");
    let mut m = Method::new("A.m(int)", "m");
    m.params.push(Param { name: "i".into(), ty: "i32".into() });
    m.body = Some("{}".into());
    item.methods.push(m);
    assert_eq!(item.to_rust(INDENT), "struct A;\n\nimpl A {\n    fn m(i: i32) {}\n}");
}

#[test]
fn test_conformance_blocks_follow_impl() {
    let mut item = class("A");
    item.traits.push("B".into());
    let module = Module {
        items: vec![Item::new("B", UnitId(0), ItemKind::Trait, "B"), item],
        ..Module::new("crate")
    };
    assert_eq!(
        module.to_rust(INDENT),
        "trait B {}\n\nstruct A;\n\nimpl A {}\n\nimpl B for A {}\n"
    );
}

#[test]
fn test_base_is_embedded_field() {
    let mut item = class("Derived");
    item.base = Some("Base".into());
    assert_eq!(
        item.to_rust(INDENT),
        "struct Derived {\n    base: Base,\n}\n\nimpl Derived {}"
    );
}

#[test]
fn test_throwing_method_signature() {
    let mut m = Method::new("A.read()", "read");
    m.visibility = Visibility::Public;
    m.receiver = Receiver::Ref;
    m.return_type = Some("i32".into());
    m.thrown = vec!["IOException".into()];
    m.body = Some("{\n    Ok(1)\n}".into());
    assert_eq!(
        m.to_rust(INDENT),
        "pub fn read(&self) -> Result<i32, IOException> /* throws IOException */ {\n    Ok(1)\n}"
    );

    m.thrown.push("ParseException".into());
    m.return_type = None;
    m.body = None;
    assert_eq!(
        m.to_rust(INDENT),
        "pub fn read(&self) -> Result<(), Box<dyn std::error::Error>> /* throws IOException | ParseException */;"
    );
}

#[test]
fn test_trait_with_members() {
    let mut item = Item::new("Shape", UnitId(0), ItemKind::Trait, "Shape");
    item.visibility = Visibility::Public;
    item.supertraits.push("Comparable".into());
    let mut sides = Field::new("Shape.SIDES", "SIDES");
    sides.is_static = true;
    sides.ty = "i32".into();
    sides.init = Some("0".into());
    item.fields.push(sides);
    let mut area = Method::new("Shape.area()", "area");
    area.receiver = Receiver::Ref;
    area.return_type = Some("f64".into());
    item.methods.push(area);
    assert_eq!(
        item.to_rust(INDENT),
        "pub trait Shape: Comparable {\n    const SIDES: i32 = 0;\n\n    fn area(&self) -> f64;\n}"
    );
}

#[test]
fn test_enum_variants_and_impl() {
    let mut item = Item::new("Color", UnitId(0), ItemKind::Enum, "Color");
    for name in ["Red", "Green"] {
        item.variants.push(Variant {
            name: name.into(),
            node: None,
            note: None,
            docs: vec![],
        });
    }
    assert_eq!(item.to_rust(INDENT), "enum Color {\n    Red,\n    Green,\n}");

    let mut code = Method::new("Color.code()", "code");
    code.receiver = Receiver::Ref;
    code.return_type = Some("i32".into());
    code.body = Some("{\n    match self {\n        Color::Red => 1,\n        Color::Green => 2,\n    }\n}".into());
    item.methods.push(code);
    let text = item.to_rust(INDENT);
    assert!(text.ends_with(
        "impl Color {\n    fn code(&self) -> i32 {\n        match self {\n            Color::Red => 1,\n            Color::Green => 2,\n        }\n    }\n}"
    ));
}

#[test]
fn test_module_header_and_static_consts() {
    let mut item = class("A");
    let mut max = Field::new("p.A.MAX", "MAX");
    max.is_static = true;
    max.visibility = Visibility::Public;
    max.ty = "i32".into();
    max.init = Some("10".into());
    item.fields.push(max);
    let module = Module {
        package: Some("p".into()),
        imports: vec!["java.util.List".into()],
        items: vec![item],
        ..Module::new("crate::p::a")
    };
    assert_eq!(
        module.to_rust(INDENT),
        "// package p;\n// import java.util.List;\n\nstruct A;\n\nimpl A {\n    pub const MAX: i32 = 10;\n}\n"
    );
}

#[test]
fn test_indent_lines_skips_blank_lines() {
    assert_eq!(indent_lines("a\n\nb", "  "), "  a\n\n  b");
    assert_eq!(braced("", "  "), "{}");
}
