use pretty_assertions::assert_eq;

use super::*;
use crate::ast::{NodeKind, PrimitiveType, SyntaxTree};
use crate::parser::{JavaParser, Parser};

fn parse(source: &str) -> SyntaxTree {
    JavaParser::new().unwrap().parse(source).unwrap()
}

fn index_of(trees: &[SyntaxTree]) -> ProjectIndex {
    ProjectIndex::build(trees.iter().enumerate().map(|(i, t)| (UnitId(i), t)))
}

fn find(tree: &SyntaxTree, pred: impl Fn(&NodeKind) -> bool) -> NodeId {
    tree.ids()
        .find(|id| pred(tree.kind(*id)))
        .expect("node not found")
}

fn call_named(tree: &SyntaxTree, name: &str) -> NodeId {
    find(tree, |k| matches!(k, NodeKind::Call { name: n, .. } if n == name))
}

fn name_use(tree: &SyntaxTree, name: &str) -> NodeId {
    find(tree, |k| matches!(k, NodeKind::Name { name: n } if n == name))
}

#[test]
fn test_declaration_identifiers() {
    let trees = vec![parse(
        "package p;\nclass A { int x; A(int a) {} void m(int i, String s) {} class Inner {} }",
    )];
    let index = index_of(&trees);
    let tree = &trees[0];
    let unit = UnitId(0);

    let method = find(tree, |k| matches!(k, NodeKind::Method(_)));
    let ctor = find(tree, |k| matches!(k, NodeKind::Constructor(_)));
    let field = find(tree, |k| matches!(k, NodeKind::Declarator { name, .. } if name == "x"));
    let inner = tree.type_decls()[1];

    assert_eq!(
        index.resolve_declaration(unit, method).as_deref(),
        Some("p.A.m(int,String)")
    );
    assert_eq!(
        index.resolve_declaration(unit, ctor).as_deref(),
        Some("p.A.<init>(int)")
    );
    assert_eq!(index.resolve_declaration(unit, field).as_deref(), Some("p.A.x"));
    assert_eq!(
        index.resolve_declaration(unit, inner).as_deref(),
        Some("p.A.Inner")
    );
    assert!(index.contains_type("p.A.Inner"));
}

#[test]
fn test_type_resolution_across_units() {
    let trees = vec![
        parse("package p;\nimport q.B;\nimport java.util.List;\nclass A { B b; C c; List<String> l; Missing m; }"),
        parse("package q;\npublic class B {}"),
        parse("package p;\nclass C {}"),
    ];
    let index = index_of(&trees);
    let tree = &trees[0];

    let field_type = |name: &str| {
        let decl = find(tree, |k| matches!(k, NodeKind::Declarator { name: n, .. } if n == name));
        let ty = match tree.kind(tree.parent(decl).unwrap()) {
            NodeKind::Field { ty, .. } => ty.clone(),
            other => panic!("unexpected {other:?}"),
        };
        index.resolve_type(Site::new(UnitId(0), tree, decl), &ty)
    };

    assert_eq!(field_type("b").declared_id(), Some("q.B"));
    assert_eq!(field_type("c").declared_id(), Some("p.C"));
    assert_eq!(
        field_type("l"),
        ResolvedType::Library {
            name: "java.util.List".into(),
            args: vec![ResolvedType::string()],
        }
    );
    assert!(field_type("m").is_unknown());
}

#[test]
fn test_nested_type_resolves_from_outer_scope() {
    let trees = vec![parse("class Outer { class Inner {} Inner make() { return null; } }")];
    let index = index_of(&trees);
    let info = index.type_info("Outer").unwrap();
    let make = &info.methods[0];
    assert_eq!(
        index.resolve_in_type("Outer", &[], &make.return_type).declared_id(),
        Some("Outer.Inner")
    );
}

#[test]
fn test_overload_picked_by_argument_types() {
    let trees = vec![parse(
        "class A { void f(int i) {} void f(String s) {} void f(int a, int b) {} void g() { f(\"x\"); f(1, 2); } }",
    )];
    let index = index_of(&trees);
    let tree = &trees[0];

    let calls: Vec<NodeId> = tree
        .ids()
        .filter(|id| matches!(tree.kind(*id), NodeKind::Call { .. }))
        .collect();
    let ids: Vec<String> = calls
        .iter()
        .map(|c| index.resolve_callee(Site::new(UnitId(0), tree, *c)).unwrap().id)
        .collect();
    assert_eq!(ids, vec!["A.f(String)".to_string(), "A.f(int,int)".to_string()]);
}

#[test]
fn test_callee_through_receiver_and_superclass() {
    let trees = vec![parse(
        "class Base { int get() throws Exception { return 1; } }\n\
         class A extends Base { void run(A other) { other.get(); } }",
    )];
    let index = index_of(&trees);
    let tree = &trees[0];
    let call = call_named(tree, "get");
    let callee = index.resolve_callee(Site::new(UnitId(0), tree, call)).unwrap();
    assert_eq!(callee.owner, "Base");
    assert_eq!(callee.return_type, ResolvedType::Primitive(PrimitiveType::Int));
    assert_eq!(callee.declared_thrown, vec![ResolvedType::library("java.lang.Exception")]);
}

#[test]
fn test_constructor_callee() {
    let trees = vec![parse("class A { A() {} A(int x) {} static A make() { return new A(3); } }")];
    let index = index_of(&trees);
    let tree = &trees[0];
    let creation = find(tree, |k| matches!(k, NodeKind::New { .. }));
    let callee = index.resolve_callee(Site::new(UnitId(0), tree, creation)).unwrap();
    assert!(callee.is_constructor);
    assert_eq!(callee.id, "A.<init>(int)");
}

#[test]
fn test_expression_types() {
    let trees = vec![parse(
        "class A { double d; int[] xs; void m(long n) { var s = \"a\" + n; int k = xs[0]; use(s, k, d, n, xs.length); } void use(Object... o) {} }",
    )];
    let index = index_of(&trees);
    let tree = &trees[0];
    let call = call_named(tree, "use");
    let NodeKind::Call { args, .. } = tree.kind(call) else {
        unreachable!()
    };
    let types: Vec<ResolvedType> = args
        .iter()
        .map(|a| index.resolve_expression_type(Site::new(UnitId(0), tree, *a)))
        .collect();
    assert_eq!(
        types,
        vec![
            ResolvedType::string(),
            ResolvedType::Primitive(PrimitiveType::Int),
            ResolvedType::Primitive(PrimitiveType::Double),
            ResolvedType::Primitive(PrimitiveType::Long),
            ResolvedType::Primitive(PrimitiveType::Int),
        ]
    );
}

#[test]
fn test_local_declared_after_use_is_not_visible() {
    let trees = vec![parse("class A { String v; void m() { v.length(); int v = 1; } }")];
    let index = index_of(&trees);
    let tree = &trees[0];
    let first_use = name_use(tree, "v");
    assert!(index
        .resolve_expression_type(Site::new(UnitId(0), tree, first_use))
        .is_string());
}

#[test]
fn test_numeric_promotion() {
    let trees = vec![parse("class A { void m(byte b, float f) { g(b + b, b * f); } void g(int a, float c) {} }")];
    let index = index_of(&trees);
    let tree = &trees[0];
    let NodeKind::Call { args, .. } = tree.kind(call_named(tree, "g")) else {
        unreachable!()
    };
    let site = Site::new(UnitId(0), tree, args[0]);
    assert_eq!(
        index.resolve_expression_type(site),
        ResolvedType::Primitive(PrimitiveType::Int)
    );
    assert_eq!(
        index.resolve_expression_type(site.at(args[1])),
        ResolvedType::Primitive(PrimitiveType::Float)
    );
}

#[test]
fn test_transitive_interfaces() {
    let trees = vec![parse(
        "interface I {} interface J extends I {} class Base implements J {} class A extends Base implements Comparable<A> {}",
    )];
    let index = index_of(&trees);
    let keys: Vec<String> = index
        .transitive_interfaces("A")
        .iter()
        .map(|t| t.key())
        .collect();
    assert_eq!(keys, vec!["java.lang.Comparable", "J", "I"]);
}

#[test]
fn test_record_components_become_fields_and_accessors() {
    let trees = vec![parse("record P(int x, int y) {}")];
    let index = index_of(&trees);
    let info = index.type_info("P").unwrap();
    let fields: Vec<&str> = info.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["x", "y"]);
    assert!(info.methods.iter().all(|m| m.implicit));
    assert_eq!(info.methods[0].id, "P.x()");
}

#[test]
fn test_enum_constants_are_static_fields() {
    let trees = vec![parse("enum Color { RED, GREEN; boolean warm() { return this == RED; } }")];
    let index = index_of(&trees);
    let tree = &trees[0];
    let red = name_use(tree, "RED");
    assert_eq!(
        index
            .resolve_expression_type(Site::new(UnitId(0), tree, red))
            .declared_id(),
        Some("Color")
    );
    let info = index.type_info("Color").unwrap();
    assert_eq!(info.constants, vec!["RED".to_string(), "GREEN".to_string()]);
}

#[test]
fn test_supertypes_resolve_without_looping() {
    let trees = vec![parse("interface B {}\nclass A implements B {}\nclass Base { int x; }\nclass Sub extends Base {}")];
    let index = index_of(&trees);
    assert_eq!(index.direct_supertypes("A"), vec!["B".to_string()]);
    assert_eq!(index.superclass_of("Sub").unwrap().declared_id(), Some("Base"));
    assert!(index.find_field("Sub", "x").is_some());
}

#[test]
fn test_cyclic_supertypes_terminate() {
    let trees = vec![parse("class A extends B { int a; }\nclass B extends A { }")];
    let index = index_of(&trees);
    assert_eq!(index.direct_supertypes("A"), vec!["B".to_string()]);
    assert_eq!(index.direct_supertypes("B"), vec!["A".to_string()]);
    assert!(index.find_field("B", "a").is_some());
    assert!(index.find_field("A", "missing").is_none());
    assert!(index.find_methods("A", "missing").is_empty());
    assert!(index.transitive_interfaces("A").is_empty());
}

#[test]
fn test_nested_type_inherited_from_superclass() {
    let trees = vec![parse(
        "class Outer { static class Node {} }\nclass Sub extends Outer { Node head; }",
    )];
    let index = index_of(&trees);
    let info = index.type_info("Sub").unwrap();
    assert_eq!(
        index.resolve_in_type("Sub", &[], &info.fields[0].ty).declared_id(),
        Some("Outer.Node")
    );
}
