use super::*;
use crate::parser::{JavaParser, Parser};
use crate::resolve::{ProjectIndex, UnitId};
use crate::scope::{build_scopes, ScopeTracker};

fn analyze(source: &str) -> (SyntaxTree, ScopeTracker) {
    let tree = JavaParser::new().unwrap().parse(source).unwrap();
    let index = ProjectIndex::build([(UnitId(0), &tree)]);
    let mut scopes = build_scopes(UnitId(0), &tree, &index).unwrap();
    infer_types(UnitId(0), &tree, &index, &mut scopes);
    (tree, scopes)
}

fn literal(tree: &SyntaxTree, text: &str) -> NodeId {
    tree.ids()
        .find(|id| matches!(tree.kind(*id), NodeKind::Literal { text: t, .. } if t == text))
        .expect("literal")
}

fn first_binary(tree: &SyntaxTree) -> NodeId {
    tree.ids()
        .find(|id| matches!(tree.kind(*id), NodeKind::Binary { .. }))
        .expect("binary")
}

#[test]
fn test_literal_kinds() {
    let (tree, scopes) = analyze("class A { void m() { int a = 7; String s = \"x\"; boolean b = true; char c = 'q'; } }");
    assert_eq!(scopes.types.get(literal(&tree, "7")), Some(&ValueType::Integral));
    assert_eq!(scopes.types.get(literal(&tree, "\"x\"")), Some(&ValueType::Text));
    assert_eq!(scopes.types.get(literal(&tree, "true")), Some(&ValueType::Boolean));
    assert_eq!(scopes.types.get(literal(&tree, "'q'")), Some(&ValueType::Char));
}

#[test]
fn test_concatenation_is_textual() {
    let (tree, scopes) = analyze("class A { String m(int n) { return \"n=\" + n; } }");
    assert!(scopes.types.is_text(first_binary(&tree)));
}

#[test]
fn test_arithmetic_with_floating_operand() {
    let (tree, scopes) = analyze("class A { double m(double d, int i) { return d * i; } }");
    assert!(scopes.types.is_floating(first_binary(&tree)));
}

#[test]
fn test_bitwise_on_booleans_is_boolean() {
    let (tree, scopes) = analyze("class A { boolean m(boolean a, boolean b) { return a & b; } }");
    assert_eq!(scopes.types.get(first_binary(&tree)), Some(&ValueType::Boolean));
}

#[test]
fn test_shift_and_comparison() {
    let (tree, scopes) = analyze("class A { boolean m(long x) { return (x << 2) > 0; } }");
    let binaries: Vec<NodeId> = tree
        .ids()
        .filter(|id| matches!(tree.kind(*id), NodeKind::Binary { .. }))
        .collect();
    assert_eq!(scopes.types.get(binaries[0]), Some(&ValueType::Boolean));
    assert_eq!(scopes.types.get(binaries[1]), Some(&ValueType::Integral));
}

#[test]
fn test_declared_floating_promotes_integer_initializer() {
    let (tree, scopes) = analyze("class A { void m() { double d = 1; int i = 2; } }");
    assert!(scopes.types.is_floating(literal(&tree, "1")));
    assert!(!scopes.types.is_floating(literal(&tree, "2")));
}

#[test]
fn test_floating_context_through_siblings() {
    let (tree, scopes) = analyze("class A { void m(double d) { double r = d * 2; int k = 3 * 4; } }");
    assert!(scopes.types.floating_context(&tree, literal(&tree, "2")));
    assert!(!scopes.types.floating_context(&tree, literal(&tree, "3")));
}

#[test]
fn test_floating_context_stops_at_array_index_and_dimensions() {
    let (tree, scopes) = analyze(
        "class A { void m() { double[] xs = new double[4]; double y = xs[1] + 1; } }",
    );
    assert!(!scopes.types.floating_context(&tree, literal(&tree, "4")));
    let ones: Vec<NodeId> = tree
        .ids()
        .filter(|id| matches!(tree.kind(*id), NodeKind::Literal { text, .. } if text == "1"))
        .collect();
    assert!(!scopes.types.floating_context(&tree, ones[0]));
    assert!(scopes.types.floating_context(&tree, ones[1]));
}

#[test]
fn test_call_arguments_take_parameter_types() {
    let (tree, scopes) = analyze("class A { void scale(double f) {} void m() { scale(3); } }");
    assert!(scopes.types.is_floating(literal(&tree, "3")));
}

#[test]
fn test_array_initializer_elements_promoted() {
    let (tree, scopes) = analyze("class A { double[] xs = {1, 2}; }");
    assert!(scopes.types.floating_context(&tree, literal(&tree, "1")));
    assert!(scopes.types.floating_context(&tree, literal(&tree, "2")));
}

#[test]
fn test_type_table_is_monotonic() {
    let mut table = TypeTable::new(2);
    let node = NodeId(1);
    table.put(node, ValueType::Integral);
    table.put(node, ValueType::Text);
    assert_eq!(table.get(node), Some(&ValueType::Integral));
    table.put(node, ValueType::Floating);
    table.put(node, ValueType::Integral);
    assert_eq!(table.get(node), Some(&ValueType::Floating));
}

#[test]
fn test_description_of_arrays() {
    let desc = TypeDescription::of(ResolvedType::Array {
        element: Box::new(ResolvedType::Primitive(PrimitiveType::Double)),
        dims: 2,
    });
    assert_eq!(desc.depth, 2);
    assert_eq!(desc.value, Some(ValueType::Floating));
    assert!(!desc.is_primitive_scalar());
}
