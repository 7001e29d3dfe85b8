// Arena syntax tree for Java compilation units.
// Nodes are addressed by `NodeId` indices assigned at parse time; every pass
// keeps its facts in side tables keyed by those indices.

pub mod ops;
pub mod types;

pub use ops::{AssignOp, BinaryOp, UnaryOp, UpdateOp};
pub use types::{PrimitiveType, TypeParam, TypeRef};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a node inside its [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 1-based line/column position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Source span of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceRange {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: Position,
    pub end: Position,
}

impl SourceRange {
    /// Whether `other` lies entirely within this range
    pub fn contains(&self, other: &SourceRange) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    /// Whether the two ranges share at least one byte
    pub fn overlaps(&self, other: &SourceRange) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }

    /// Size metric used to order containment
    pub fn size(&self) -> usize {
        self.end_byte.saturating_sub(self.start_byte)
    }
}

/// Java visibility as written in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JavaVisibility {
    Public,
    Protected,
    #[default]
    Package,
    Private,
}

/// Modifier list of a declaration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub visibility: JavaVisibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_default: bool,
    /// Remaining keywords (synchronized, native, transient, volatile, ...)
    pub other: Vec<String>,
    /// Annotation names without the leading `@`
    pub annotations: Vec<String>,
}

impl Modifiers {
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name || a.ends_with(&format!(".{name}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeParam>,
    /// Superclass of a class
    pub extends: Option<TypeRef>,
    /// Implemented interfaces, or extended interfaces for an interface
    pub implements: Vec<TypeRef>,
    /// Record components (`Param` nodes)
    pub components: Vec<NodeId>,
    /// Enum constants (`EnumConstant` nodes)
    pub constants: Vec<NodeId>,
    pub members: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeParam>,
    pub return_type: TypeRef,
    pub name: String,
    pub params: Vec<NodeId>,
    pub throws: Vec<TypeRef>,
    pub body: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    pub modifiers: Modifiers,
    pub name: String,
    pub params: Vec<NodeId>,
    pub throws: Vec<TypeRef>,
    pub body: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    TextBlock,
    Bool,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentStyle {
    Line,
    Block,
    Doc,
}

/// Closed set of node kinds; every pass matches on it exhaustively
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // Declarations
    CompilationUnit {
        package: Option<String>,
        imports: Vec<NodeId>,
        types: Vec<NodeId>,
    },
    Import {
        path: String,
        is_static: bool,
        wildcard: bool,
    },
    TypeDecl(TypeDecl),
    Field {
        modifiers: Modifiers,
        ty: TypeRef,
        declarators: Vec<NodeId>,
    },
    Declarator {
        name: String,
        dims: usize,
        init: Option<NodeId>,
    },
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Param {
        modifiers: Modifiers,
        ty: TypeRef,
        name: String,
        varargs: bool,
    },
    EnumConstant {
        name: String,
        args: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    Initializer {
        is_static: bool,
        body: NodeId,
    },

    // Statements
    Block {
        stmts: Vec<NodeId>,
    },
    LocalVar {
        modifiers: Modifiers,
        ty: TypeRef,
        declarators: Vec<NodeId>,
    },
    ExprStmt {
        expr: NodeId,
    },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        cond: NodeId,
    },
    For {
        init: Vec<NodeId>,
        cond: Option<NodeId>,
        update: Vec<NodeId>,
        body: NodeId,
    },
    ForEach {
        ty: TypeRef,
        name: String,
        iterable: NodeId,
        body: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    Break {
        label: Option<String>,
    },
    Continue {
        label: Option<String>,
    },
    Throw {
        expr: NodeId,
    },
    Try {
        resources: Vec<NodeId>,
        body: NodeId,
        catches: Vec<NodeId>,
        finally: Option<NodeId>,
    },
    Catch {
        types: Vec<TypeRef>,
        name: String,
        body: NodeId,
    },
    Switch {
        selector: NodeId,
        cases: Vec<NodeId>,
        is_expr: bool,
    },
    SwitchCase {
        labels: Vec<NodeId>,
        is_default: bool,
        arrow: bool,
        body: Vec<NodeId>,
    },
    Labeled {
        label: String,
        body: NodeId,
    },
    Synchronized {
        lock: NodeId,
        body: NodeId,
    },
    Assert {
        cond: NodeId,
        message: Option<NodeId>,
    },
    Yield {
        value: NodeId,
    },
    CtorCall {
        is_super: bool,
        args: Vec<NodeId>,
    },
    Empty,

    // Expressions
    Literal {
        kind: LiteralKind,
        text: String,
    },
    Name {
        name: String,
    },
    FieldAccess {
        target: NodeId,
        name: String,
    },
    ArrayAccess {
        array: NodeId,
        index: NodeId,
    },
    Call {
        receiver: Option<NodeId>,
        name: String,
        args: Vec<NodeId>,
    },
    New {
        ty: TypeRef,
        args: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    NewArray {
        element: TypeRef,
        dims: Vec<NodeId>,
        extra_dims: usize,
        init: Option<NodeId>,
    },
    ArrayInit {
        elements: Vec<NodeId>,
    },
    Assign {
        op: AssignOp,
        target: NodeId,
        value: NodeId,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        operand: NodeId,
    },
    Conditional {
        cond: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    Cast {
        ty: TypeRef,
        expr: NodeId,
    },
    InstanceOf {
        expr: NodeId,
        ty: TypeRef,
        binding: Option<String>,
    },
    Lambda {
        params: Vec<String>,
        body: NodeId,
    },
    MethodRef {
        target: String,
        name: String,
    },
    This,
    Super,
    ClassLiteral {
        ty: TypeRef,
    },
    Paren {
        expr: NodeId,
    },

    // Trivia and fallbacks
    Comment {
        text: String,
        style: CommentStyle,
    },
    Unsupported {
        grammar_kind: String,
    },
}

impl NodeKind {
    /// Short label for diagnostics and unsupported markers
    pub fn label(&self) -> &str {
        match self {
            NodeKind::CompilationUnit { .. } => "compilation unit",
            NodeKind::Import { .. } => "import",
            NodeKind::TypeDecl(_) => "type declaration",
            NodeKind::Field { .. } => "field",
            NodeKind::Declarator { .. } => "declarator",
            NodeKind::Method(_) => "method",
            NodeKind::Constructor(_) => "constructor",
            NodeKind::Param { .. } => "parameter",
            NodeKind::EnumConstant { .. } => "enum constant",
            NodeKind::Initializer { .. } => "initializer",
            NodeKind::Block { .. } => "block",
            NodeKind::LocalVar { .. } => "local variable",
            NodeKind::ExprStmt { .. } => "expression statement",
            NodeKind::If { .. } => "if",
            NodeKind::While { .. } => "while",
            NodeKind::DoWhile { .. } => "do",
            NodeKind::For { .. } => "for",
            NodeKind::ForEach { .. } => "for-each",
            NodeKind::Return { .. } => "return",
            NodeKind::Break { .. } => "break",
            NodeKind::Continue { .. } => "continue",
            NodeKind::Throw { .. } => "throw",
            NodeKind::Try { .. } => "try",
            NodeKind::Catch { .. } => "catch",
            NodeKind::Switch { .. } => "switch",
            NodeKind::SwitchCase { .. } => "case",
            NodeKind::Labeled { .. } => "labeled statement",
            NodeKind::Synchronized { .. } => "synchronized",
            NodeKind::Assert { .. } => "assert",
            NodeKind::Yield { .. } => "yield",
            NodeKind::CtorCall { .. } => "constructor invocation",
            NodeKind::Empty => "empty statement",
            NodeKind::Literal { .. } => "literal",
            NodeKind::Name { .. } => "name",
            NodeKind::FieldAccess { .. } => "field access",
            NodeKind::ArrayAccess { .. } => "array access",
            NodeKind::Call { .. } => "method call",
            NodeKind::New { .. } => "object creation",
            NodeKind::NewArray { .. } => "array creation",
            NodeKind::ArrayInit { .. } => "array initializer",
            NodeKind::Assign { .. } => "assignment",
            NodeKind::Binary { .. } => "binary expression",
            NodeKind::Unary { .. } => "unary expression",
            NodeKind::Update { .. } => "update expression",
            NodeKind::Conditional { .. } => "conditional",
            NodeKind::Cast { .. } => "cast",
            NodeKind::InstanceOf { .. } => "instanceof",
            NodeKind::Lambda { .. } => "lambda",
            NodeKind::MethodRef { .. } => "method reference",
            NodeKind::This => "this",
            NodeKind::Super => "super",
            NodeKind::ClassLiteral { .. } => "class literal",
            NodeKind::Paren { .. } => "parenthesized expression",
            NodeKind::Comment { .. } => "comment",
            NodeKind::Unsupported { grammar_kind } => grammar_kind,
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Block { .. }
                | NodeKind::LocalVar { .. }
                | NodeKind::ExprStmt { .. }
                | NodeKind::If { .. }
                | NodeKind::While { .. }
                | NodeKind::DoWhile { .. }
                | NodeKind::For { .. }
                | NodeKind::ForEach { .. }
                | NodeKind::Return { .. }
                | NodeKind::Break { .. }
                | NodeKind::Continue { .. }
                | NodeKind::Throw { .. }
                | NodeKind::Try { .. }
                | NodeKind::Catch { .. }
                | NodeKind::Switch { is_expr: false, .. }
                | NodeKind::SwitchCase { .. }
                | NodeKind::Labeled { .. }
                | NodeKind::Synchronized { .. }
                | NodeKind::Assert { .. }
                | NodeKind::Yield { .. }
                | NodeKind::CtorCall { .. }
                | NodeKind::Empty
        )
    }

    /// Whether this node opens a list whose comments are re-emitted in place
    pub fn is_comment_container(&self) -> bool {
        matches!(
            self,
            NodeKind::CompilationUnit { .. }
                | NodeKind::TypeDecl(_)
                | NodeKind::Block { .. }
                | NodeKind::SwitchCase { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub range: SourceRange,
    pub parent: Option<NodeId>,
    /// All child nodes in source order, comments included
    pub children: Vec<NodeId>,
}

/// Owned arena of nodes for one compilation unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
    source: String,
}

impl SyntaxTree {
    pub(crate) fn new(source: String) -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
            source,
        }
    }

    /// Reserve a node; its kind is filled in once its children are converted
    pub(crate) fn alloc(&mut self, range: SourceRange, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind: NodeKind::Empty,
            range,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        id
    }

    pub(crate) fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.index()].kind = kind;
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    /// Move `child` under `parent`, keeping children in source order
    pub(crate) fn reparent(&mut self, child: NodeId, parent: NodeId) {
        if let Some(old) = self.nodes[child.index()].parent {
            self.nodes[old.index()].children.retain(|c| *c != child);
        }
        self.nodes[child.index()].parent = Some(parent);
        let start = self.nodes[child.index()].range.start_byte;
        let position = self.nodes[parent.index()]
            .children
            .iter()
            .position(|c| self.nodes[c.index()].range.start_byte > start)
            .unwrap_or(self.nodes[parent.index()].children.len());
        self.nodes[parent.index()].children.insert(position, child);
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn range(&self, id: NodeId) -> SourceRange {
        self.nodes[id.index()].range
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Source text covered by a node
    pub fn text(&self, id: NodeId) -> &str {
        let range = self.range(id);
        self.source.get(range.start_byte..range.end_byte).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Strict ancestors, innermost first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Nearest enclosing type declaration of a node (the node itself included)
    pub fn enclosing_type(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| matches!(self.kind(*n), NodeKind::TypeDecl(_)))
    }

    /// Nearest enclosing method or constructor (the node itself included)
    pub fn enclosing_routine(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .take_while(|n| !matches!(self.kind(*n), NodeKind::TypeDecl(_)))
            .find(|n| matches!(self.kind(*n), NodeKind::Method(_) | NodeKind::Constructor(_)))
    }

    /// Top-level and nested type declarations in pre-order
    pub fn type_decls(&self) -> Vec<NodeId> {
        let mut found = Vec::new();
        if let NodeKind::CompilationUnit { types, .. } = self.kind(self.root) {
            for ty in types {
                self.collect_type_decls(*ty, &mut found);
            }
        }
        found
    }

    fn collect_type_decls(&self, id: NodeId, found: &mut Vec<NodeId>) {
        if let NodeKind::TypeDecl(decl) = self.kind(id) {
            found.push(id);
            for member in &decl.members {
                self.collect_type_decls(*member, found);
            }
        }
    }

    /// Strip parentheses around an expression
    pub fn unparen(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Paren { expr } = self.kind(id) {
            id = *expr;
        }
        id
    }

    /// Name whose value an assignment target mutates: `x`, `this.x` -> `x`,
    /// `a[i]` and `a.f` -> `a`
    pub fn assigned_root(&self, target: NodeId) -> Option<&str> {
        match self.kind(self.unparen(target)) {
            NodeKind::Name { name } => Some(name),
            NodeKind::FieldAccess { target, name } => match self.kind(self.unparen(*target)) {
                NodeKind::This => Some(name),
                _ => self.assigned_root(*target),
            },
            NodeKind::ArrayAccess { array, .. } => self.assigned_root(*array),
            _ => None,
        }
    }

    /// Whether an expression is a `this.x` field access
    pub fn is_this_access(&self, id: NodeId) -> bool {
        matches!(
            self.kind(self.unparen(id)),
            NodeKind::FieldAccess { target, .. } if matches!(self.kind(self.unparen(*target)), NodeKind::This)
        )
    }
}

pub struct Ancestors<'t> {
    tree: &'t SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
