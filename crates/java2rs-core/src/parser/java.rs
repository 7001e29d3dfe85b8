use tracing::{debug, trace};
use tree_sitter::Node as TsNode;

use super::{ParseError, Parser, SyntaxProblem};
use crate::ast::{
    AssignOp, BinaryOp, CommentStyle, ConstructorDecl, JavaVisibility, LiteralKind, MethodDecl,
    Modifiers, NodeId, NodeKind, Position, PrimitiveType, SourceRange, SyntaxTree, TypeDecl,
    TypeKind, TypeParam, TypeRef, UnaryOp, UpdateOp,
};

/// Java front-end backed by tree-sitter-java
pub struct JavaParser {
    parser: tree_sitter::Parser,
}

impl JavaParser {
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| ParseError::Language(e.to_string()))?;
        Ok(Self { parser })
    }
}

impl Parser for JavaParser {
    fn parse(&mut self, source: &str) -> Result<SyntaxTree, ParseError> {
        let cst = self.parser.parse(source, None).ok_or(ParseError::NoTree)?;
        let root = cst.root_node();
        if root.has_error() {
            let mut problems = Vec::new();
            collect_problems(root, source, &mut problems);
            if problems.is_empty() {
                problems.push(SyntaxProblem {
                    position: position_of(root.start_position()),
                    message: "malformed compilation unit".to_string(),
                });
            }
            debug!("parse failed with {} problem(s)", problems.len());
            return Err(ParseError::Syntax { problems });
        }
        let tree = Converter::new(source).convert(root);
        trace!("converted {} nodes", tree.len());
        Ok(tree)
    }

    fn name(&self) -> &'static str {
        "tree-sitter-java"
    }
}

fn position_of(point: tree_sitter::Point) -> Position {
    Position {
        line: point.row + 1,
        column: point.column + 1,
    }
}

fn range_of(node: TsNode) -> SourceRange {
    SourceRange {
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        start: position_of(node.start_position()),
        end: position_of(node.end_position()),
    }
}

fn collect_problems(node: TsNode, source: &str, problems: &mut Vec<SyntaxProblem>) {
    if node.is_error() {
        let text = source.get(node.byte_range()).unwrap_or("");
        let snippet: String = text.chars().take(40).collect();
        problems.push(SyntaxProblem {
            position: position_of(node.start_position()),
            message: format!("unexpected `{}`", snippet.trim()),
        });
        return;
    }
    if node.is_missing() {
        problems.push(SyntaxProblem {
            position: position_of(node.start_position()),
            message: format!("missing `{}`", node.kind()),
        });
        return;
    }
    if node.has_error() {
        for child in all_children(node) {
            collect_problems(child, source, problems);
        }
    }
}

fn is_comment(node: TsNode) -> bool {
    matches!(node.kind(), "line_comment" | "block_comment")
}

fn all_children(node: TsNode) -> Vec<TsNode> {
    let mut cursor = node.walk();
    let children = node.children(&mut cursor).collect::<Vec<_>>();
    children
}

fn named_children(node: TsNode) -> Vec<TsNode> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|c| !is_comment(*c))
        .collect::<Vec<_>>();
    children
}

fn field_children<'t>(node: TsNode<'t>, field: &str) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    let children = node
        .children_by_field_name(field, &mut cursor)
        .filter(|c| !is_comment(*c))
        .collect::<Vec<_>>();
    children
}

fn named_child_of_kind<'t>(node: TsNode<'t>, kind: &str) -> Option<TsNode<'t>> {
    named_children(node).into_iter().find(|c| c.kind() == kind)
}

fn count_dims(node: TsNode) -> usize {
    all_children(node).iter().filter(|c| c.kind() == "[").count()
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Drop `<...>` sections from a qualified type spelling
fn strip_generics(text: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 && !c.is_whitespace() => out.push(c),
            _ => {}
        }
    }
    out
}

const TYPE_DECLARATION_KINDS: [&str; 4] = [
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
];

struct Converter<'s> {
    source: &'s str,
    tree: SyntaxTree,
}

impl<'s> Converter<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            tree: SyntaxTree::new(source.to_string()),
        }
    }

    fn text(&self, node: TsNode) -> &'s str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    fn field_text(&self, node: TsNode, field: &str) -> String {
        node.child_by_field_name(field)
            .map(|n| self.text(n).to_string())
            .unwrap_or_default()
    }

    fn alloc(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        self.tree.alloc(range_of(node), Some(parent))
    }

    fn finish(&mut self, id: NodeId, kind: NodeKind) -> NodeId {
        self.tree.set_kind(id, kind);
        id
    }

    fn convert(mut self, root: TsNode) -> SyntaxTree {
        let unit = self.tree.alloc(range_of(root), None);
        self.tree.set_root(unit);

        let mut package = None;
        let mut imports = Vec::new();
        let mut types = Vec::new();
        for child in named_children(root) {
            match child.kind() {
                "package_declaration" => {
                    package = named_children(child)
                        .into_iter()
                        .find(|c| matches!(c.kind(), "identifier" | "scoped_identifier"))
                        .map(|c| compact(self.text(c)));
                }
                "import_declaration" => imports.push(self.import(child, unit)),
                kind if TYPE_DECLARATION_KINDS.contains(&kind) => {
                    types.push(self.type_decl(child, unit))
                }
                _ => types.push(self.unsupported(child, unit)),
            }
        }
        self.tree.set_kind(
            unit,
            NodeKind::CompilationUnit {
                package,
                imports,
                types,
            },
        );

        let mut comments = Vec::new();
        gather_comments(root, &mut comments);
        for comment in comments {
            self.attach_comment(comment, unit);
        }
        self.tree
    }

    /// Hoist a comment into the innermost container spanning it
    fn attach_comment(&mut self, node: TsNode, root: NodeId) {
        let range = range_of(node);
        let container = self
            .tree
            .ids()
            .filter(|id| {
                self.tree.kind(*id).is_comment_container() && self.tree.range(*id).contains(&range)
            })
            .min_by_key(|id| self.tree.range(*id).size())
            .unwrap_or(root);
        let text = self.text(node).to_string();
        let style = if text.starts_with("/**") {
            CommentStyle::Doc
        } else if text.starts_with("/*") {
            CommentStyle::Block
        } else {
            CommentStyle::Line
        };
        let id = self.tree.alloc(range, None);
        self.tree.set_kind(id, NodeKind::Comment { text, style });
        self.tree.reparent(id, container);
    }

    fn unsupported(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        let id = self.alloc(node, parent);
        self.finish(
            id,
            NodeKind::Unsupported {
                grammar_kind: node.kind().to_string(),
            },
        )
    }

    fn import(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        let id = self.alloc(node, parent);
        let children = all_children(node);
        let is_static = children.iter().any(|c| c.kind() == "static");
        let wildcard = children.iter().any(|c| c.kind() == "asterisk");
        let path = children
            .iter()
            .find(|c| matches!(c.kind(), "identifier" | "scoped_identifier"))
            .map(|c| compact(self.text(*c)))
            .unwrap_or_default();
        self.finish(
            id,
            NodeKind::Import {
                path,
                is_static,
                wildcard,
            },
        )
    }

    fn modifiers_of(&self, node: TsNode) -> Modifiers {
        let mut modifiers = Modifiers::default();
        let Some(list) = named_child_of_kind(node, "modifiers") else {
            return modifiers;
        };
        for child in all_children(list) {
            match child.kind() {
                "public" => modifiers.visibility = JavaVisibility::Public,
                "protected" => modifiers.visibility = JavaVisibility::Protected,
                "private" => modifiers.visibility = JavaVisibility::Private,
                "static" => modifiers.is_static = true,
                "final" => modifiers.is_final = true,
                "abstract" => modifiers.is_abstract = true,
                "default" => modifiers.is_default = true,
                "marker_annotation" | "annotation" => {
                    modifiers.annotations.push(compact(&self.field_text(child, "name")))
                }
                "line_comment" | "block_comment" => {}
                other => modifiers.other.push(other.to_string()),
            }
        }
        modifiers
    }

    fn type_ref(&self, node: TsNode) -> TypeRef {
        match node.kind() {
            "integral_type" | "floating_point_type" | "boolean_type" => {
                let text = self.text(node).trim();
                PrimitiveType::from_keyword(text)
                    .map(TypeRef::Primitive)
                    .unwrap_or_else(|| TypeRef::Unknown(text.to_string()))
            }
            "void_type" => TypeRef::Void,
            "type_identifier" | "identifier" => match self.text(node) {
                "var" => TypeRef::Inferred,
                name => TypeRef::named(name),
            },
            "scoped_type_identifier" | "scoped_identifier" => {
                TypeRef::named(strip_generics(self.text(node)))
            }
            "generic_type" => {
                let children = named_children(node);
                let name = children
                    .iter()
                    .find(|c| c.kind() != "type_arguments")
                    .map(|c| strip_generics(self.text(*c)))
                    .unwrap_or_default();
                let args = children
                    .iter()
                    .find(|c| c.kind() == "type_arguments")
                    .map(|args| {
                        named_children(*args)
                            .into_iter()
                            .map(|a| self.type_ref(a))
                            .collect()
                    })
                    .unwrap_or_default();
                TypeRef::Named { name, args }
            }
            "array_type" => {
                let element = node
                    .child_by_field_name("element")
                    .map(|e| self.type_ref(e))
                    .unwrap_or_else(|| TypeRef::Unknown(self.text(node).to_string()));
                let dims = node
                    .child_by_field_name("dimensions")
                    .map(count_dims)
                    .unwrap_or(1);
                element.with_extra_dims(dims)
            }
            "wildcard" => {
                let children = named_children(node);
                let is_super = children.iter().any(|c| c.kind() == "super");
                let bound = children
                    .into_iter()
                    .filter(|c| {
                        !matches!(c.kind(), "super" | "marker_annotation" | "annotation")
                    })
                    .last()
                    .map(|b| Box::new(self.type_ref(b)));
                TypeRef::Wildcard { bound, is_super }
            }
            "annotated_type" => named_children(node)
                .into_iter()
                .last()
                .map(|t| self.type_ref(t))
                .unwrap_or_else(|| TypeRef::Unknown(self.text(node).to_string())),
            _ => TypeRef::Unknown(self.text(node).to_string()),
        }
    }

    fn type_list(&self, node: TsNode) -> Vec<TypeRef> {
        let list = named_child_of_kind(node, "type_list").unwrap_or(node);
        named_children(list)
            .into_iter()
            .map(|t| self.type_ref(t))
            .collect()
    }

    fn type_params(&self, node: TsNode) -> Vec<TypeParam> {
        let Some(params) = node.child_by_field_name("type_parameters") else {
            return Vec::new();
        };
        named_children(params)
            .into_iter()
            .filter(|p| p.kind() == "type_parameter")
            .map(|p| {
                let children = named_children(p);
                let name = children
                    .iter()
                    .find(|c| matches!(c.kind(), "type_identifier" | "identifier"))
                    .map(|c| self.text(*c).to_string())
                    .unwrap_or_default();
                let bounds = children
                    .iter()
                    .find(|c| c.kind() == "type_bound")
                    .map(|b| {
                        named_children(*b)
                            .into_iter()
                            .map(|t| self.type_ref(t))
                            .collect()
                    })
                    .unwrap_or_default();
                TypeParam { name, bounds }
            })
            .collect()
    }

    fn throws_of(&self, node: TsNode) -> Vec<TypeRef> {
        named_child_of_kind(node, "throws")
            .map(|t| {
                named_children(t)
                    .into_iter()
                    .map(|ty| self.type_ref(ty))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn type_decl(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        let id = self.alloc(node, parent);
        let kind = match node.kind() {
            "interface_declaration" => TypeKind::Interface,
            "enum_declaration" => TypeKind::Enum,
            "record_declaration" => TypeKind::Record,
            _ => TypeKind::Class,
        };
        let extends = node
            .child_by_field_name("superclass")
            .and_then(|s| named_children(s).into_iter().last())
            .map(|t| self.type_ref(t));
        let mut implements = node
            .child_by_field_name("interfaces")
            .map(|i| self.type_list(i))
            .unwrap_or_default();
        if let Some(extended) = named_child_of_kind(node, "extends_interfaces") {
            implements.extend(self.type_list(extended));
        }
        let components = match node.child_by_field_name("parameters") {
            Some(params) => self.formal_params(params, id),
            None => Vec::new(),
        };

        let mut constants = Vec::new();
        let mut members = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for child in named_children(body) {
                match child.kind() {
                    "enum_constant" => constants.push(self.enum_constant(child, id)),
                    "enum_body_declarations" => {
                        for decl in named_children(child) {
                            members.push(self.member(decl, id));
                        }
                    }
                    _ => members.push(self.member(child, id)),
                }
            }
        }

        let decl = TypeDecl {
            kind,
            name: self.field_text(node, "name"),
            modifiers: self.modifiers_of(node),
            type_params: self.type_params(node),
            extends,
            implements,
            components,
            constants,
            members,
        };
        self.finish(id, NodeKind::TypeDecl(decl))
    }

    fn member(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        match node.kind() {
            "field_declaration" | "constant_declaration" => self.field(node, parent),
            "method_declaration" => self.method(node, parent),
            "constructor_declaration" | "compact_constructor_declaration" => {
                self.constructor(node, parent)
            }
            kind if TYPE_DECLARATION_KINDS.contains(&kind) => self.type_decl(node, parent),
            "block" => {
                let id = self.alloc(node, parent);
                let body = self.block(node, id);
                self.finish(
                    id,
                    NodeKind::Initializer {
                        is_static: false,
                        body,
                    },
                )
            }
            "static_initializer" => {
                let id = self.alloc(node, parent);
                let body = match named_child_of_kind(node, "block") {
                    Some(block) => self.block(block, id),
                    None => self.unsupported(node, id),
                };
                self.finish(
                    id,
                    NodeKind::Initializer {
                        is_static: true,
                        body,
                    },
                )
            }
            _ => self.unsupported(node, parent),
        }
    }

    fn field(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        let id = self.alloc(node, parent);
        let modifiers = self.modifiers_of(node);
        let ty = node
            .child_by_field_name("type")
            .map(|t| self.type_ref(t))
            .unwrap_or_else(|| TypeRef::Unknown(String::new()));
        let declarators = field_children(node, "declarator")
            .into_iter()
            .map(|d| self.declarator(d, id))
            .collect();
        self.finish(
            id,
            NodeKind::Field {
                modifiers,
                ty,
                declarators,
            },
        )
    }

    fn declarator(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        let id = self.alloc(node, parent);
        let name = self.field_text(node, "name");
        let dims = node
            .child_by_field_name("dimensions")
            .map(count_dims)
            .unwrap_or(0);
        let init = node
            .child_by_field_name("value")
            .map(|v| self.expression(v, id));
        self.finish(id, NodeKind::Declarator { name, dims, init })
    }

    fn formal_params(&mut self, node: TsNode, parent: NodeId) -> Vec<NodeId> {
        let mut params = Vec::new();
        for param in named_children(node) {
            match param.kind() {
                "formal_parameter" => {
                    let id = self.alloc(param, parent);
                    let dims = param
                        .child_by_field_name("dimensions")
                        .map(count_dims)
                        .unwrap_or(0);
                    let ty = param
                        .child_by_field_name("type")
                        .map(|t| self.type_ref(t))
                        .unwrap_or_else(|| TypeRef::Unknown(String::new()))
                        .with_extra_dims(dims);
                    let kind = NodeKind::Param {
                        modifiers: self.modifiers_of(param),
                        ty,
                        name: self.field_text(param, "name"),
                        varargs: false,
                    };
                    params.push(self.finish(id, kind));
                }
                "spread_parameter" => {
                    let id = self.alloc(param, parent);
                    let children = named_children(param);
                    let ty = children
                        .iter()
                        .find(|c| !matches!(c.kind(), "modifiers" | "variable_declarator"))
                        .map(|t| self.type_ref(*t))
                        .unwrap_or_else(|| TypeRef::Unknown(String::new()))
                        .with_extra_dims(1);
                    let name = children
                        .iter()
                        .find(|c| c.kind() == "variable_declarator")
                        .map(|d| self.field_text(*d, "name"))
                        .unwrap_or_default();
                    let kind = NodeKind::Param {
                        modifiers: self.modifiers_of(param),
                        ty,
                        name,
                        varargs: true,
                    };
                    params.push(self.finish(id, kind));
                }
                _ => {}
            }
        }
        params
    }

    fn method(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        let id = self.alloc(node, parent);
        let dims = node
            .child_by_field_name("dimensions")
            .map(count_dims)
            .unwrap_or(0);
        let return_type = node
            .child_by_field_name("type")
            .map(|t| self.type_ref(t))
            .unwrap_or(TypeRef::Void)
            .with_extra_dims(dims);
        let params = match node.child_by_field_name("parameters") {
            Some(p) => self.formal_params(p, id),
            None => Vec::new(),
        };
        let body = node
            .child_by_field_name("body")
            .map(|b| self.block(b, id));
        let decl = MethodDecl {
            modifiers: self.modifiers_of(node),
            type_params: self.type_params(node),
            return_type,
            name: self.field_text(node, "name"),
            params,
            throws: self.throws_of(node),
            body,
        };
        self.finish(id, NodeKind::Method(decl))
    }

    fn constructor(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        let id = self.alloc(node, parent);
        let params = match node.child_by_field_name("parameters") {
            Some(p) => self.formal_params(p, id),
            None => Vec::new(),
        };
        let body = match node.child_by_field_name("body") {
            Some(b) => self.block(b, id),
            None => {
                let empty = self.alloc(node, id);
                self.finish(empty, NodeKind::Block { stmts: Vec::new() })
            }
        };
        let decl = ConstructorDecl {
            modifiers: self.modifiers_of(node),
            name: self.field_text(node, "name"),
            params,
            throws: self.throws_of(node),
            body,
        };
        self.finish(id, NodeKind::Constructor(decl))
    }

    fn enum_constant(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        let id = self.alloc(node, parent);
        let args = match node.child_by_field_name("arguments") {
            Some(a) => self.arguments(a, id),
            None => Vec::new(),
        };
        let body = match node.child_by_field_name("body") {
            Some(b) => named_children(b)
                .into_iter()
                .map(|m| self.member(m, id))
                .collect(),
            None => Vec::new(),
        };
        let name = self.field_text(node, "name");
        self.finish(id, NodeKind::EnumConstant { name, args, body })
    }

    fn arguments(&mut self, node: TsNode, parent: NodeId) -> Vec<NodeId> {
        named_children(node)
            .into_iter()
            .map(|a| self.expression(a, parent))
            .collect()
    }

    fn block(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        let id = self.alloc(node, parent);
        let stmts = named_children(node)
            .into_iter()
            .map(|s| self.statement(s, id))
            .collect();
        self.finish(id, NodeKind::Block { stmts })
    }

    /// Parenthesized conditions are unwrapped; the parentheses are syntax only
    fn condition(&mut self, node: Option<TsNode>, parent: NodeId, owner: TsNode) -> NodeId {
        match node {
            Some(n) if n.kind() == "parenthesized_expression" => {
                match named_children(n).into_iter().next() {
                    Some(inner) => self.expression(inner, parent),
                    None => self.unsupported(n, parent),
                }
            }
            Some(n) => self.expression(n, parent),
            None => self.unsupported(owner, parent),
        }
    }

    fn statement_field(&mut self, node: TsNode, field: &str, parent: NodeId) -> NodeId {
        match node.child_by_field_name(field) {
            Some(s) => self.statement(s, parent),
            None => {
                let id = self.alloc(node, parent);
                self.finish(id, NodeKind::Empty)
            }
        }
    }

    fn local_var(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        let id = self.alloc(node, parent);
        let modifiers = self.modifiers_of(node);
        let ty = node
            .child_by_field_name("type")
            .map(|t| self.type_ref(t))
            .unwrap_or(TypeRef::Inferred);
        let declarators = field_children(node, "declarator")
            .into_iter()
            .map(|d| self.declarator(d, id))
            .collect();
        self.finish(
            id,
            NodeKind::LocalVar {
                modifiers,
                ty,
                declarators,
            },
        )
    }

    fn statement(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        match node.kind() {
            "block" | "constructor_body" => return self.block(node, parent),
            "local_variable_declaration" => return self.local_var(node, parent),
            "switch_expression" => return self.switch(node, parent, false),
            kind if TYPE_DECLARATION_KINDS.contains(&kind) => return self.type_decl(node, parent),
            _ => {}
        }

        let id = self.alloc(node, parent);
        let kind = match node.kind() {
            "expression_statement" => match named_children(node).into_iter().next() {
                Some(expr) => NodeKind::ExprStmt {
                    expr: self.expression(expr, id),
                },
                None => NodeKind::Empty,
            },
            "if_statement" => {
                let cond = self.condition(node.child_by_field_name("condition"), id, node);
                let then_branch = self.statement_field(node, "consequence", id);
                let else_branch = node
                    .child_by_field_name("alternative")
                    .map(|s| self.statement(s, id));
                NodeKind::If {
                    cond,
                    then_branch,
                    else_branch,
                }
            }
            "while_statement" => {
                let cond = self.condition(node.child_by_field_name("condition"), id, node);
                let body = self.statement_field(node, "body", id);
                NodeKind::While { cond, body }
            }
            "do_statement" => {
                let body = self.statement_field(node, "body", id);
                let cond = self.condition(node.child_by_field_name("condition"), id, node);
                NodeKind::DoWhile { body, cond }
            }
            "for_statement" => {
                let init = field_children(node, "init")
                    .into_iter()
                    .map(|i| {
                        if i.kind() == "local_variable_declaration" {
                            self.local_var(i, id)
                        } else {
                            self.expression(i, id)
                        }
                    })
                    .collect();
                let cond = node
                    .child_by_field_name("condition")
                    .map(|c| self.expression(c, id));
                let update = field_children(node, "update")
                    .into_iter()
                    .map(|u| self.expression(u, id))
                    .collect();
                let body = self.statement_field(node, "body", id);
                NodeKind::For {
                    init,
                    cond,
                    update,
                    body,
                }
            }
            "enhanced_for_statement" => {
                let dims = node
                    .child_by_field_name("dimensions")
                    .map(count_dims)
                    .unwrap_or(0);
                let ty = node
                    .child_by_field_name("type")
                    .map(|t| self.type_ref(t))
                    .unwrap_or(TypeRef::Inferred)
                    .with_extra_dims(dims);
                let name = self.field_text(node, "name");
                let iterable = match node.child_by_field_name("value") {
                    Some(v) => self.expression(v, id),
                    None => self.unsupported(node, id),
                };
                let body = self.statement_field(node, "body", id);
                NodeKind::ForEach {
                    ty,
                    name,
                    iterable,
                    body,
                }
            }
            "return_statement" => NodeKind::Return {
                value: named_children(node)
                    .into_iter()
                    .next()
                    .map(|v| self.expression(v, id)),
            },
            "break_statement" => NodeKind::Break {
                label: named_child_of_kind(node, "identifier").map(|l| self.text(l).to_string()),
            },
            "continue_statement" => NodeKind::Continue {
                label: named_child_of_kind(node, "identifier").map(|l| self.text(l).to_string()),
            },
            "throw_statement" => match named_children(node).into_iter().next() {
                Some(expr) => NodeKind::Throw {
                    expr: self.expression(expr, id),
                },
                None => NodeKind::Unsupported {
                    grammar_kind: node.kind().to_string(),
                },
            },
            "try_statement" | "try_with_resources_statement" => {
                let resources = match node.child_by_field_name("resources") {
                    Some(spec) => named_children(spec)
                        .into_iter()
                        .map(|r| self.resource(r, id))
                        .collect(),
                    None => Vec::new(),
                };
                let body = self.statement_field(node, "body", id);
                let mut catches = Vec::new();
                let mut finally = None;
                for child in named_children(node) {
                    match child.kind() {
                        "catch_clause" => catches.push(self.catch_clause(child, id)),
                        "finally_clause" => {
                            finally = named_child_of_kind(child, "block").map(|b| self.block(b, id))
                        }
                        _ => {}
                    }
                }
                NodeKind::Try {
                    resources,
                    body,
                    catches,
                    finally,
                }
            }
            "labeled_statement" => {
                let children = named_children(node);
                let label = children
                    .iter()
                    .find(|c| c.kind() == "identifier")
                    .map(|l| self.text(*l).to_string())
                    .unwrap_or_default();
                let body = match children.iter().rfind(|c| c.kind() != "identifier") {
                    Some(s) => self.statement(*s, id),
                    None => self.unsupported(node, id),
                };
                NodeKind::Labeled { label, body }
            }
            "synchronized_statement" => {
                let lock =
                    self.condition(named_child_of_kind(node, "parenthesized_expression"), id, node);
                let body = self.statement_field(node, "body", id);
                NodeKind::Synchronized { lock, body }
            }
            "assert_statement" => {
                let mut exprs = named_children(node).into_iter();
                match exprs.next() {
                    Some(cond) => {
                        let cond = self.expression(cond, id);
                        let message = exprs.next().map(|m| self.expression(m, id));
                        NodeKind::Assert { cond, message }
                    }
                    None => NodeKind::Empty,
                }
            }
            "yield_statement" => match named_children(node).into_iter().next() {
                Some(value) => NodeKind::Yield {
                    value: self.expression(value, id),
                },
                None => NodeKind::Empty,
            },
            "explicit_constructor_invocation" => {
                let is_super = node
                    .child_by_field_name("constructor")
                    .map(|c| c.kind() == "super")
                    .unwrap_or(false);
                let args = match node.child_by_field_name("arguments") {
                    Some(a) => self.arguments(a, id),
                    None => Vec::new(),
                };
                NodeKind::CtorCall { is_super, args }
            }
            ";" => NodeKind::Empty,
            other => NodeKind::Unsupported {
                grammar_kind: other.to_string(),
            },
        };
        self.finish(id, kind)
    }

    fn resource(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        if node.child_by_field_name("type").is_none() {
            return match named_children(node).into_iter().next() {
                Some(expr) => self.expression(expr, parent),
                None => self.unsupported(node, parent),
            };
        }
        let id = self.alloc(node, parent);
        let modifiers = self.modifiers_of(node);
        let ty = node
            .child_by_field_name("type")
            .map(|t| self.type_ref(t))
            .unwrap_or(TypeRef::Inferred);
        let declarator = self.alloc(node, id);
        let init = node
            .child_by_field_name("value")
            .map(|v| self.expression(v, declarator));
        let name = self.field_text(node, "name");
        self.finish(
            declarator,
            NodeKind::Declarator {
                name,
                dims: 0,
                init,
            },
        );
        self.finish(
            id,
            NodeKind::LocalVar {
                modifiers,
                ty,
                declarators: vec![declarator],
            },
        )
    }

    fn catch_clause(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        let id = self.alloc(node, parent);
        let param = named_child_of_kind(node, "catch_formal_parameter");
        let types = param
            .and_then(|p| named_child_of_kind(p, "catch_type"))
            .map(|t| {
                named_children(t)
                    .into_iter()
                    .map(|ty| self.type_ref(ty))
                    .collect()
            })
            .unwrap_or_default();
        let name = param
            .map(|p| self.field_text(p, "name"))
            .unwrap_or_default();
        let body = self.statement_field(node, "body", id);
        self.finish(id, NodeKind::Catch { types, name, body })
    }

    fn switch(&mut self, node: TsNode, parent: NodeId, is_expr: bool) -> NodeId {
        let id = self.alloc(node, parent);
        let selector = self.condition(node.child_by_field_name("condition"), id, node);
        let mut cases = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for group in named_children(body) {
                let arrow = match group.kind() {
                    "switch_block_statement_group" => false,
                    "switch_rule" => true,
                    _ => continue,
                };
                let case = self.alloc(group, id);
                let mut labels = Vec::new();
                let mut is_default = false;
                let mut stmts = Vec::new();
                for child in named_children(group) {
                    if child.kind() == "switch_label" {
                        if self.text(child).trim_start().starts_with("default") {
                            is_default = true;
                        }
                        for label in named_children(child) {
                            labels.push(self.expression(label, case));
                        }
                    } else {
                        stmts.push(self.statement(child, case));
                    }
                }
                cases.push(self.finish(
                    case,
                    NodeKind::SwitchCase {
                        labels,
                        is_default,
                        arrow,
                        body: stmts,
                    },
                ));
            }
        }
        self.finish(
            id,
            NodeKind::Switch {
                selector,
                cases,
                is_expr,
            },
        )
    }

    fn literal(&self, node: TsNode) -> Option<NodeKind> {
        let text = self.text(node).to_string();
        let kind = match node.kind() {
            "decimal_integer_literal"
            | "hex_integer_literal"
            | "octal_integer_literal"
            | "binary_integer_literal" => {
                if text.ends_with(['l', 'L']) {
                    LiteralKind::Long
                } else {
                    LiteralKind::Int
                }
            }
            "decimal_floating_point_literal" | "hex_floating_point_literal" => {
                if text.ends_with(['f', 'F']) {
                    LiteralKind::Float
                } else {
                    LiteralKind::Double
                }
            }
            "true" | "false" => LiteralKind::Bool,
            "null_literal" => LiteralKind::Null,
            "character_literal" => LiteralKind::Char,
            "text_block" => LiteralKind::TextBlock,
            "string_literal" if text.starts_with("\"\"\"") => LiteralKind::TextBlock,
            "string_literal" => LiteralKind::String,
            _ => return None,
        };
        Some(NodeKind::Literal { kind, text })
    }

    fn expression(&mut self, node: TsNode, parent: NodeId) -> NodeId {
        if node.kind() == "switch_expression" {
            return self.switch(node, parent, true);
        }
        let id = self.alloc(node, parent);
        if let Some(literal) = self.literal(node) {
            return self.finish(id, literal);
        }

        let kind = match node.kind() {
            "identifier" => NodeKind::Name {
                name: self.text(node).to_string(),
            },
            "this" => NodeKind::This,
            "super" => NodeKind::Super,
            "parenthesized_expression" => match named_children(node).into_iter().next() {
                Some(inner) => NodeKind::Paren {
                    expr: self.expression(inner, id),
                },
                None => NodeKind::Empty,
            },
            "assignment_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .and_then(|o| AssignOp::from_token(o.kind()))
                    .unwrap_or(AssignOp::Assign);
                match (
                    node.child_by_field_name("left"),
                    node.child_by_field_name("right"),
                ) {
                    (Some(left), Some(right)) => NodeKind::Assign {
                        op,
                        target: self.expression(left, id),
                        value: self.expression(right, id),
                    },
                    _ => unsupported_kind(node),
                }
            }
            "binary_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .and_then(|o| BinaryOp::from_token(o.kind()));
                match (
                    op,
                    node.child_by_field_name("left"),
                    node.child_by_field_name("right"),
                ) {
                    (Some(op), Some(left), Some(right)) => NodeKind::Binary {
                        op,
                        left: self.expression(left, id),
                        right: self.expression(right, id),
                    },
                    _ => unsupported_kind(node),
                }
            }
            "unary_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .and_then(|o| UnaryOp::from_token(o.kind()));
                match (op, node.child_by_field_name("operand")) {
                    (Some(op), Some(operand)) => NodeKind::Unary {
                        op,
                        operand: self.expression(operand, id),
                    },
                    _ => unsupported_kind(node),
                }
            }
            "update_expression" => {
                let children = all_children(node);
                let prefix = children.first().map(|c| !c.is_named()).unwrap_or(false);
                let op = if children.iter().any(|c| c.kind() == "--") {
                    UpdateOp::Decrement
                } else {
                    UpdateOp::Increment
                };
                match children.iter().find(|c| c.is_named() && !is_comment(**c)) {
                    Some(operand) => NodeKind::Update {
                        op,
                        prefix,
                        operand: self.expression(*operand, id),
                    },
                    None => unsupported_kind(node),
                }
            }
            "ternary_expression" => match (
                node.child_by_field_name("condition"),
                node.child_by_field_name("consequence"),
                node.child_by_field_name("alternative"),
            ) {
                (Some(c), Some(t), Some(e)) => NodeKind::Conditional {
                    cond: self.expression(c, id),
                    then_expr: self.expression(t, id),
                    else_expr: self.expression(e, id),
                },
                _ => unsupported_kind(node),
            },
            "cast_expression" => match node.child_by_field_name("value") {
                Some(value) => NodeKind::Cast {
                    ty: node
                        .child_by_field_name("type")
                        .map(|t| self.type_ref(t))
                        .unwrap_or_else(|| TypeRef::Unknown(String::new())),
                    expr: self.expression(value, id),
                },
                None => unsupported_kind(node),
            },
            "instanceof_expression" => match node.child_by_field_name("left") {
                Some(left) => NodeKind::InstanceOf {
                    expr: self.expression(left, id),
                    ty: node
                        .child_by_field_name("right")
                        .map(|t| self.type_ref(t))
                        .unwrap_or_else(|| TypeRef::Unknown(String::new())),
                    binding: node
                        .child_by_field_name("name")
                        .map(|n| self.text(n).to_string()),
                },
                None => unsupported_kind(node),
            },
            "lambda_expression" => {
                let params = match node.child_by_field_name("parameters") {
                    Some(p) if p.kind() == "identifier" => vec![self.text(p).to_string()],
                    Some(p) => named_children(p)
                        .into_iter()
                        .map(|param| match param.child_by_field_name("name") {
                            Some(name) => self.text(name).to_string(),
                            None => self.text(param).to_string(),
                        })
                        .collect(),
                    None => Vec::new(),
                };
                match node.child_by_field_name("body") {
                    Some(b) if b.kind() == "block" => NodeKind::Lambda {
                        params,
                        body: self.block(b, id),
                    },
                    Some(b) => NodeKind::Lambda {
                        params,
                        body: self.expression(b, id),
                    },
                    None => unsupported_kind(node),
                }
            }
            "method_reference" => {
                let text = compact(self.text(node));
                let (target, name) = text.rsplit_once("::").unwrap_or((text.as_str(), ""));
                NodeKind::MethodRef {
                    target: target.to_string(),
                    name: name.to_string(),
                }
            }
            "object_creation_expression" => {
                let ty = node
                    .child_by_field_name("type")
                    .map(|t| self.type_ref(t))
                    .unwrap_or_else(|| TypeRef::Unknown(String::new()));
                let args = match node.child_by_field_name("arguments") {
                    Some(a) => self.arguments(a, id),
                    None => Vec::new(),
                };
                let body = match named_child_of_kind(node, "class_body") {
                    Some(b) => named_children(b)
                        .into_iter()
                        .map(|m| self.member(m, id))
                        .collect(),
                    None => Vec::new(),
                };
                NodeKind::New { ty, args, body }
            }
            "array_creation_expression" => {
                let element = node
                    .child_by_field_name("type")
                    .map(|t| self.type_ref(t))
                    .unwrap_or_else(|| TypeRef::Unknown(String::new()));
                let mut dims = Vec::new();
                let mut extra_dims = 0;
                for dim in field_children(node, "dimensions") {
                    match dim.kind() {
                        "dimensions_expr" => {
                            if let Some(expr) = named_children(dim).into_iter().last() {
                                dims.push(self.expression(expr, id));
                            }
                        }
                        "dimensions" => extra_dims += count_dims(dim),
                        _ => {}
                    }
                }
                let init = node
                    .child_by_field_name("value")
                    .map(|v| self.expression(v, id));
                NodeKind::NewArray {
                    element,
                    dims,
                    extra_dims,
                    init,
                }
            }
            "array_initializer" => NodeKind::ArrayInit {
                elements: named_children(node)
                    .into_iter()
                    .map(|e| self.expression(e, id))
                    .collect(),
            },
            "field_access" => match node.child_by_field_name("object") {
                Some(object) => NodeKind::FieldAccess {
                    target: self.expression(object, id),
                    name: self.field_text(node, "field"),
                },
                None => unsupported_kind(node),
            },
            "array_access" => match (
                node.child_by_field_name("array"),
                node.child_by_field_name("index"),
            ) {
                (Some(array), Some(index)) => NodeKind::ArrayAccess {
                    array: self.expression(array, id),
                    index: self.expression(index, id),
                },
                _ => unsupported_kind(node),
            },
            "method_invocation" => {
                let receiver = node
                    .child_by_field_name("object")
                    .map(|o| self.expression(o, id));
                let args = match node.child_by_field_name("arguments") {
                    Some(a) => self.arguments(a, id),
                    None => Vec::new(),
                };
                NodeKind::Call {
                    receiver,
                    name: self.field_text(node, "name"),
                    args,
                }
            }
            "class_literal" => NodeKind::ClassLiteral {
                ty: named_children(node)
                    .into_iter()
                    .next()
                    .map(|t| self.type_ref(t))
                    .unwrap_or_else(|| TypeRef::Unknown(self.text(node).to_string())),
            },
            _ => unsupported_kind(node),
        };
        self.finish(id, kind)
    }
}

fn unsupported_kind(node: TsNode) -> NodeKind {
    NodeKind::Unsupported {
        grammar_kind: node.kind().to_string(),
    }
}

fn gather_comments<'t>(node: TsNode<'t>, found: &mut Vec<TsNode<'t>>) {
    for child in all_children(node) {
        if is_comment(child) {
            found.push(child);
        } else {
            gather_comments(child, found);
        }
    }
}
