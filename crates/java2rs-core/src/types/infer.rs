// Type inference pass: a single post-order walk assigning value types
use tracing::debug;

use super::{TypeDescription, ValueType};
use crate::ast::{BinaryOp, LiteralKind, NodeId, NodeKind, SyntaxTree, TypeRef, UnaryOp};
use crate::resolve::{Resolve, Site, UnitId};
use crate::scope::ScopeTracker;

/// Fill the unit's type table. Runs after the scope model is built.
pub fn infer_types(unit: UnitId, tree: &SyntaxTree, resolver: &dyn Resolve, scopes: &mut ScopeTracker) {
    let mut pass = Inference {
        unit,
        tree,
        resolver,
        scopes,
        typed: 0,
    };
    pass.visit(tree.root());
    debug!("{unit}: typed {} expression(s)", pass.typed);
}

struct Inference<'a, 's> {
    unit: UnitId,
    tree: &'a SyntaxTree,
    resolver: &'a dyn Resolve,
    scopes: &'s mut ScopeTracker,
    typed: usize,
}

fn literal_type(kind: LiteralKind) -> Option<ValueType> {
    match kind {
        LiteralKind::Int | LiteralKind::Long => Some(ValueType::Integral),
        LiteralKind::Float | LiteralKind::Double => Some(ValueType::Floating),
        LiteralKind::Char => Some(ValueType::Char),
        LiteralKind::String | LiteralKind::TextBlock => Some(ValueType::Text),
        LiteralKind::Bool => Some(ValueType::Boolean),
        LiteralKind::Null => None,
    }
}

/// Binary operator rules, most specific first
fn binary_type(op: BinaryOp, left: Option<&ValueType>, right: Option<&ValueType>) -> Option<ValueType> {
    let either = |test: fn(&ValueType) -> bool| left.is_some_and(test) || right.is_some_and(test);
    let is_bool = |t: &ValueType| *t == ValueType::Boolean;
    if op.is_comparison() || op.is_logical() {
        return Some(ValueType::Boolean);
    }
    if op.is_bitwise() {
        return Some(if either(is_bool) {
            ValueType::Boolean
        } else {
            ValueType::Integral
        });
    }
    if op.is_shift() {
        return Some(ValueType::Integral);
    }
    if either(ValueType::is_text) {
        Some(ValueType::Text)
    } else if either(ValueType::is_floating) {
        Some(ValueType::Floating)
    } else if either(is_bool) {
        Some(ValueType::Boolean)
    } else if either(ValueType::is_integral) {
        Some(ValueType::Integral)
    } else {
        None
    }
}

impl<'a, 's> Inference<'a, 's> {
    fn site(&self, node: NodeId) -> Site<'a> {
        Site::new(self.unit, self.tree, node)
    }

    fn put(&mut self, node: NodeId, ty: Option<ValueType>) {
        if let Some(ty) = ty {
            self.scopes.types.put(node, ty);
            self.typed += 1;
        }
    }

    fn type_of(&self, node: NodeId) -> Option<&ValueType> {
        self.scopes.types.get(node)
    }

    fn resolved(&self, node: NodeId) -> Option<ValueType> {
        ValueType::from_resolved(&self.resolver.resolve_expression_type(self.site(node)))
    }

    /// Promote an initializer (and nested array initializer elements) to floating
    fn promote_floating(&mut self, node: NodeId) {
        let tree = self.tree;
        match tree.kind(node) {
            NodeKind::ArrayInit { elements } => {
                for element in elements {
                    self.promote_floating(*element);
                }
            }
            NodeKind::NewArray { init, .. } => {
                if let Some(init) = init {
                    self.promote_floating(*init);
                }
            }
            _ => self.scopes.types.put(node, ValueType::Floating),
        }
    }

    fn declared_floating(&self, desc: &TypeDescription) -> bool {
        desc.value.as_ref().is_some_and(ValueType::is_floating)
    }

    fn visit(&mut self, node: NodeId) {
        let tree = self.tree;
        if matches!(tree.kind(node), NodeKind::Lambda { .. }) {
            return;
        }
        for child in tree.children(node) {
            self.visit(*child);
        }
        let ty = self.infer(node);
        self.put(node, ty);
        self.push_down(node);
    }

    /// Value type of one node from its (already typed) children
    fn infer(&self, node: NodeId) -> Option<ValueType> {
        let tree = self.tree;
        match tree.kind(node) {
            NodeKind::Literal { kind, .. } => literal_type(*kind),
            NodeKind::Name { name } => match self.scopes.find_declaration(tree, name, node) {
                Some(decl) => ValueType::from_resolved(&decl.ty.resolved),
                None => self.resolved(node),
            },
            NodeKind::Binary { op, left, right } => {
                binary_type(*op, self.type_of(*left), self.type_of(*right))
                    .or_else(|| self.resolved(node))
            }
            NodeKind::Unary { op, operand } => match op {
                UnaryOp::Plus | UnaryOp::Minus => self.type_of(*operand).cloned(),
                UnaryOp::Not => Some(ValueType::Boolean),
                UnaryOp::BitNot => Some(ValueType::Integral),
            },
            NodeKind::Update { .. } => Some(ValueType::Integral),
            NodeKind::Paren { expr } => self.type_of(*expr).cloned(),
            NodeKind::Assign { target, .. } => self
                .type_of(*target)
                .cloned()
                .or_else(|| self.resolved(node)),
            NodeKind::Declarator { .. } => self.declarator_type(node).and_then(|d| d.value),
            NodeKind::FieldAccess { .. }
            | NodeKind::ArrayAccess { .. }
            | NodeKind::Call { .. }
            | NodeKind::New { .. }
            | NodeKind::NewArray { .. }
            | NodeKind::Conditional { .. }
            | NodeKind::Cast { .. }
            | NodeKind::InstanceOf { .. }
            | NodeKind::ClassLiteral { .. }
            | NodeKind::This => self.resolved(node),
            NodeKind::Switch { is_expr: true, .. } => None,
            NodeKind::CompilationUnit { .. }
            | NodeKind::Import { .. }
            | NodeKind::TypeDecl(_)
            | NodeKind::Field { .. }
            | NodeKind::Method(_)
            | NodeKind::Constructor(_)
            | NodeKind::Param { .. }
            | NodeKind::EnumConstant { .. }
            | NodeKind::Initializer { .. }
            | NodeKind::Block { .. }
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
            | NodeKind::Switch { .. }
            | NodeKind::SwitchCase { .. }
            | NodeKind::Labeled { .. }
            | NodeKind::Synchronized { .. }
            | NodeKind::Assert { .. }
            | NodeKind::Yield { .. }
            | NodeKind::CtorCall { .. }
            | NodeKind::Empty
            | NodeKind::ArrayInit { .. }
            | NodeKind::Lambda { .. }
            | NodeKind::MethodRef { .. }
            | NodeKind::Super
            | NodeKind::Comment { .. }
            | NodeKind::Unsupported { .. } => None,
        }
    }

    /// Declared type of a local or field declarator; `None` for `var`
    fn declarator_type(&self, node: NodeId) -> Option<TypeDescription> {
        let tree = self.tree;
        let NodeKind::Declarator { dims, .. } = tree.kind(node) else {
            return None;
        };
        let declared = match tree.kind(tree.parent(node)?) {
            NodeKind::LocalVar { ty, .. } | NodeKind::Field { ty, .. } => ty,
            _ => return None,
        };
        if *declared == TypeRef::Inferred {
            return None;
        }
        let ty = declared.clone().with_extra_dims(*dims);
        Some(TypeDescription::of(
            self.resolver.resolve_type(self.site(node), &ty),
        ))
    }

    /// Push declared and parameter types down onto initializers and arguments
    fn push_down(&mut self, node: NodeId) {
        let tree = self.tree;
        match tree.kind(node) {
            NodeKind::Declarator { init: Some(init), .. } => {
                if let Some(desc) = self.declarator_type(node) {
                    if self.declared_floating(&desc) {
                        self.promote_floating(*init);
                    }
                }
            }
            NodeKind::Call { args, .. } | NodeKind::New { args, .. } | NodeKind::CtorCall { args, .. } => {
                let Some(callee) = self.resolver.resolve_callee(self.site(node)) else {
                    return;
                };
                for (arg, param) in args.iter().zip(&callee.params) {
                    if param.as_primitive().is_some_and(|p| p.is_floating()) {
                        self.promote_floating(*arg);
                    }
                }
            }
            NodeKind::Assign { target, value, .. } => {
                if self.type_of(*target).is_some_and(ValueType::is_floating) {
                    self.promote_floating(*value);
                }
            }
            NodeKind::Return { value: Some(value) } => {
                let Some(routine) = tree.enclosing_routine(node) else {
                    return;
                };
                if let NodeKind::Method(method) = tree.kind(routine) {
                    let ret = self.resolver.resolve_type(self.site(routine), &method.return_type);
                    if ret.as_primitive().is_some_and(|p| p.is_floating()) {
                        self.promote_floating(*value);
                    }
                }
            }
            _ => {}
        }
    }
}
