use super::*;
use crate::ast::{CommentStyle, LiteralKind, NodeKind, TypeKind, TypeRef};

fn parse(source: &str) -> SyntaxTree {
    JavaParser::new().unwrap().parse(source).unwrap()
}

fn type_decl(tree: &SyntaxTree, index: usize) -> &crate::ast::TypeDecl {
    match tree.kind(tree.type_decls()[index]) {
        NodeKind::TypeDecl(decl) => decl,
        other => panic!("expected type declaration, got {other:?}"),
    }
}

#[test]
fn test_class_with_field_and_method() {
    let tree = parse("class A { int i; void m(int j) { } }");
    let decl = type_decl(&tree, 0);
    assert_eq!(decl.kind, TypeKind::Class);
    assert_eq!(decl.name, "A");
    assert_eq!(decl.members.len(), 2);

    match tree.kind(decl.members[1]) {
        NodeKind::Method(m) => {
            assert_eq!(m.name, "m");
            assert_eq!(m.params.len(), 1);
            assert!(m.return_type.is_void());
        }
        other => panic!("expected method, got {other:?}"),
    }
}

#[test]
fn test_package_and_imports() {
    let tree = parse("package a.b;\nimport java.util.List;\nimport static java.lang.Math.*;\nclass A {}");
    match tree.kind(tree.root()) {
        NodeKind::CompilationUnit {
            package, imports, ..
        } => {
            assert_eq!(package.as_deref(), Some("a.b"));
            assert_eq!(imports.len(), 2);
            assert!(matches!(
                tree.kind(imports[1]),
                NodeKind::Import { is_static: true, wildcard: true, .. }
            ));
        }
        other => panic!("expected unit, got {other:?}"),
    }
}

#[test]
fn test_generics_and_interfaces() {
    let tree = parse("class A<B, C extends D, E> extends Base implements I, J { }");
    let decl = type_decl(&tree, 0);
    assert_eq!(decl.type_params.len(), 3);
    assert_eq!(decl.type_params[1].bounds, vec![TypeRef::named("D")]);
    assert_eq!(decl.extends, Some(TypeRef::named("Base")));
    assert_eq!(decl.implements.len(), 2);
}

#[test]
fn test_array_declarator_dimensions() {
    let tree = parse("class A { void m() { int b[] = {1, 2}; int[][] c = new int[1][2]; } }");
    let declarators: Vec<_> = tree
        .ids()
        .filter_map(|id| match tree.kind(id) {
            NodeKind::Declarator { name, dims, .. } => Some((name.clone(), *dims)),
            _ => None,
        })
        .collect();
    assert_eq!(declarators, vec![("b".to_string(), 1), ("c".to_string(), 0)]);

    let creation = tree
        .ids()
        .find_map(|id| match tree.kind(id) {
            NodeKind::NewArray { dims, .. } => Some(dims.len()),
            _ => None,
        })
        .unwrap();
    assert_eq!(creation, 2);
}

#[test]
fn test_update_expression_position() {
    let tree = parse("class A { void m() { int i = 0; i++; ++i; } }");
    let updates: Vec<bool> = tree
        .ids()
        .filter_map(|id| match tree.kind(id) {
            NodeKind::Update { prefix, .. } => Some(*prefix),
            _ => None,
        })
        .collect();
    assert_eq!(updates, vec![false, true]);
}

#[test]
fn test_literal_kinds() {
    let tree = parse("class A { void m() { long a = 1L; float b = 2f; double c = .5; char d = 'x'; } }");
    let kinds: Vec<LiteralKind> = tree
        .ids()
        .filter_map(|id| match tree.kind(id) {
            NodeKind::Literal { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            LiteralKind::Long,
            LiteralKind::Float,
            LiteralKind::Double,
            LiteralKind::Char
        ]
    );
}

#[test]
fn test_text_blocks_are_distinguished_from_strings() {
    let tree = parse("class A { String a = \"x\"; String b = \"\"\"\n    y\n    \"\"\"; }");
    let kinds: Vec<LiteralKind> = tree
        .ids()
        .filter_map(|id| match tree.kind(id) {
            NodeKind::Literal { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![LiteralKind::String, LiteralKind::TextBlock]);
}

#[test]
fn test_comments_hoisted_into_containers() {
    let tree = parse("class A {\n  // field\n  int i;\n  void m() {\n    /* inner */\n    int j = 0;\n  }\n}");
    let comments: Vec<(String, CommentStyle, &str)> = tree
        .ids()
        .filter_map(|id| match tree.kind(id) {
            NodeKind::Comment { text, style } => {
                let parent = tree.parent(id).map(|p| tree.kind(p).label()).unwrap_or("");
                Some((text.clone(), *style, parent))
            }
            _ => None,
        })
        .collect();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].1, CommentStyle::Line);
    assert_eq!(comments[0].2, "type declaration");
    assert_eq!(comments[1].1, CommentStyle::Block);
    assert_eq!(comments[1].2, "block");
}

#[test]
fn test_children_sorted_by_position() {
    let tree = parse("class A {\n  int a;\n  // between\n  int b;\n}");
    let class = tree.type_decls()[0];
    let starts: Vec<usize> = tree
        .children(class)
        .iter()
        .map(|c| tree.range(*c).start_byte)
        .collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);
}

#[test]
fn test_syntax_error_reports_position() {
    let err = JavaParser::new()
        .unwrap()
        .parse("class A { void m( { }")
        .unwrap_err();
    match err {
        ParseError::Syntax { problems } => {
            assert!(!problems.is_empty());
            assert_eq!(problems[0].position.line, 1);
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_create_parser_rejects_unknown_language() {
    assert!(create_parser("java").is_ok());
    assert!(matches!(
        create_parser("cobol"),
        Err(ParseError::UnknownLanguage(_))
    ));
}
