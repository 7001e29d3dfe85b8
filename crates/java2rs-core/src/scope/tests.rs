use super::*;
use crate::ast::NodeKind;
use crate::parser::{JavaParser, Parser};
use crate::resolve::{ProjectIndex, UnitId};

fn analyze(source: &str) -> (SyntaxTree, ScopeTracker) {
    let tree = JavaParser::new().unwrap().parse(source).unwrap();
    let index = ProjectIndex::build([(UnitId(0), &tree)]);
    let scopes = build_scopes(UnitId(0), &tree, &index).unwrap();
    (tree, scopes)
}

fn declarator(tree: &SyntaxTree, name: &str, nth: usize) -> NodeId {
    tree.ids()
        .filter(|id| matches!(tree.kind(*id), NodeKind::Declarator { name: n, .. } if n == name))
        .nth(nth)
        .expect("declarator")
}

fn name_uses(tree: &SyntaxTree, name: &str) -> Vec<NodeId> {
    tree.ids()
        .filter(|id| matches!(tree.kind(*id), NodeKind::Name { name: n } if n == name))
        .collect()
}

#[test]
fn test_root_block_is_first_and_dominant() {
    let (tree, scopes) = analyze("class A { void m() { int x = 1; } }");
    let root = scopes.root().unwrap();
    assert_eq!(root.id, 1);
    assert_eq!(root.node, tree.root());
    assert!(scopes.blocks().iter().all(|b| b.size() <= root.size()));
    assert!(scopes.check_structure().is_empty());
    assert!(scopes.diagnostics().is_empty());
}

#[test]
fn test_unchanged_local_is_immutable() {
    let (tree, scopes) = analyze("class A { void m() { int x = 1; int y = x + 1; } }");
    assert!(!scopes.is_changed(&tree, "x", declarator(&tree, "x", 0)));
    assert!(!scopes.is_changed(&tree, "y", declarator(&tree, "y", 0)));
}

#[test]
fn test_change_in_nested_loop_marks_outer_declaration() {
    let (tree, scopes) = analyze(
        "class A { int m() { int sum = 0; for (int i = 0; i < 3; i++) { sum += i; } return sum; } }",
    );
    assert!(scopes.is_changed(&tree, "sum", declarator(&tree, "sum", 0)));
    assert!(scopes.is_changed(&tree, "i", declarator(&tree, "i", 0)));
}

#[test]
fn test_redeclaring_block_hides_inner_changes() {
    let (tree, scopes) = analyze(
        "class A { void m() { int x = 1; { int x = 2; x = 3; } } }",
    );
    assert!(!scopes.is_changed(&tree, "x", declarator(&tree, "x", 0)));
    assert!(scopes.is_changed(&tree, "x", declarator(&tree, "x", 1)));
}

#[test]
fn test_this_field_assignment_records_field_name() {
    let (tree, scopes) = analyze("class A { int count; void bump() { this.count = count + 1; } }");
    let routine = tree
        .ids()
        .find(|id| matches!(tree.kind(*id), NodeKind::Method(_)))
        .unwrap();
    assert!(scopes.is_changed(&tree, "count", routine));
}

#[test]
fn test_shadowing_resolves_to_nested_declaration() {
    let (tree, scopes) = analyze(
        "class A { int v; void m() { v = 0; { int v = 5; print(v); } } void print(int p) {} }",
    );
    let uses = name_uses(&tree, "v");
    assert_eq!(uses.len(), 2);

    let outer = scopes.find_declaration(&tree, "v", uses[0]).unwrap();
    assert_eq!(outer.kind, DeclKind::Field { is_static: false });

    let inner = scopes.find_declaration(&tree, "v", uses[1]).unwrap();
    assert_eq!(inner.kind, DeclKind::Local);
    assert_eq!(inner.node, declarator(&tree, "v", 1));
}

#[test]
fn test_local_is_not_visible_before_its_declaration() {
    let (tree, scopes) = analyze("class A { int w; void m() { w = 1; int w = 2; } }");
    let first = name_uses(&tree, "w")[0];
    let decl = scopes.find_declaration(&tree, "w", first).unwrap();
    assert!(decl.kind.is_member());
}

#[test]
fn test_parameters_and_catch_variables() {
    let (tree, scopes) = analyze(
        "class A { void m(String s) { try { s.length(); } catch (Exception e) { e.getMessage(); } } }",
    );
    let s = name_uses(&tree, "s")[0];
    let param = scopes.find_declaration(&tree, "s", s).unwrap();
    assert_eq!(param.kind, DeclKind::Param);
    assert!(param.ty.resolved.is_string());

    let e = name_uses(&tree, "e")[0];
    let caught = scopes.find_declaration(&tree, "e", e).unwrap();
    assert_eq!(caught.ty.resolved.key(), "java.lang.Exception");
}

#[test]
fn test_redeclaration_is_advisory() {
    let (_, scopes) = analyze("class A { void m() { int a = 1; int a = 2; } }");
    let messages: Vec<String> = scopes.diagnostics().iter().map(|d| d.message.clone()).collect();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("'a' is already declared"));
}

#[test]
fn test_overloads_share_one_declaration() {
    let (_, scopes) = analyze("class A { void f() {} void f(int x) {} }");
    assert!(scopes.diagnostics().is_empty());
}

#[test]
fn test_lambda_bodies_are_skipped() {
    let (tree, scopes) = analyze(
        "class A { void m() { int n = 0; Runnable r = () -> { int inner = n; }; } }",
    );
    let inner = declarator(&tree, "inner", 0);
    assert!(scopes.find_declaration(&tree, "inner", inner).is_none());
}

#[test]
fn test_block_escaping_parent_is_containment_error() {
    let tree = JavaParser::new().unwrap().parse("class A { void m() {} }").unwrap();
    let method = tree
        .ids()
        .find(|id| matches!(tree.kind(*id), NodeKind::Method(_)))
        .unwrap();
    let mut scopes = ScopeTracker::new(tree.len());
    scopes.push_block(&tree, method).unwrap();
    let err = scopes.push_block(&tree, tree.root()).unwrap_err();
    assert!(matches!(err, ScopeError::Containment { .. }));
}

#[test]
fn test_try_labels_count_per_unit() {
    let mut scopes = ScopeTracker::default();
    assert_eq!(scopes.next_try(), 1);
    assert_eq!(scopes.next_try(), 2);
}

#[test]
fn test_structural_problems_are_reported_once() {
    let tree = JavaParser::new().unwrap().parse("class A { void m() {} }").unwrap();
    let method = tree
        .ids()
        .find(|id| matches!(tree.kind(*id), NodeKind::Method(_)))
        .unwrap();
    let mut scopes = ScopeTracker::new(tree.len());
    scopes.push_block(&tree, tree.root()).unwrap();
    scopes.pop_block().unwrap();
    scopes.push_block(&tree, method).unwrap();
    scopes.pop_block().unwrap();
    let messages: Vec<String> = scopes.diagnostics().iter().map(|d| d.message.clone()).collect();
    assert_eq!(messages, vec!["expected one root block, found 2".to_string()]);
}
