// Scope model pass: one walk per unit building the block tree
use tracing::debug;

use super::{DeclKind, ScopeError, ScopeTracker};
use crate::ast::{NodeId, NodeKind, SyntaxTree, TypeKind, TypeRef};
use crate::diagnostics::Diagnostic;
use crate::resolve::{Resolve, ResolvedType, Site, UnitId};
use crate::types::TypeDescription;

/// Build the scope model of one unit.
///
/// Fails only when a block escapes its parent's range, which means the tree
/// itself is inconsistent. Redeclarations become advisory diagnostics.
pub fn build_scopes(
    unit: UnitId,
    tree: &SyntaxTree,
    resolver: &dyn Resolve,
) -> Result<ScopeTracker, ScopeError> {
    let mut builder = ScopeBuilder {
        unit,
        tree,
        resolver,
        scopes: ScopeTracker::new(tree.len()),
    };
    builder.visit(tree.root())?;
    debug!(
        "{unit}: {} block(s), {} advisory diagnostic(s)",
        builder.scopes.blocks().len(),
        builder.scopes.diagnostics().len()
    );
    Ok(builder.scopes)
}

struct ScopeBuilder<'a> {
    unit: UnitId,
    tree: &'a SyntaxTree,
    resolver: &'a dyn Resolve,
    scopes: ScopeTracker,
}

impl<'a> ScopeBuilder<'a> {
    fn site(&self, node: NodeId) -> Site<'a> {
        Site::new(self.unit, self.tree, node)
    }

    fn describe(&self, node: NodeId, ty: &TypeRef) -> TypeDescription {
        TypeDescription::of(self.resolver.resolve_type(self.site(node), ty))
    }

    fn declare(
        &mut self,
        name: &str,
        ty: TypeDescription,
        node: NodeId,
        kind: DeclKind,
    ) -> Result<(), ScopeError> {
        match self.scopes.add_declaration(self.tree, name, ty, node, kind) {
            Err(err @ ScopeError::Redeclared { .. }) => {
                self.scopes
                    .advise(Diagnostic::advisory(err.to_string()).at(self.tree.range(node).start));
                Ok(())
            }
            other => other,
        }
    }

    fn push(&mut self, node: NodeId) -> Result<(), ScopeError> {
        self.scopes.push_block(self.tree, node).map(|_| ())
    }

    fn visit_all(&mut self, nodes: &[NodeId]) -> Result<(), ScopeError> {
        for node in nodes {
            self.visit(*node)?;
        }
        Ok(())
    }

    fn visit_opt(&mut self, node: Option<NodeId>) -> Result<(), ScopeError> {
        match node {
            Some(node) => self.visit(node),
            None => Ok(()),
        }
    }

    /// Declare the members of a type body in the current block
    fn declare_members(&mut self, owner_kind: Option<TypeKind>, members: &[NodeId]) -> Result<(), ScopeError> {
        let tree = self.tree;
        let in_interface = owner_kind == Some(TypeKind::Interface);
        for member in members {
            match tree.kind(*member) {
                NodeKind::Field {
                    modifiers,
                    ty,
                    declarators,
                } => {
                    for declarator in declarators {
                        if let NodeKind::Declarator { name, dims, .. } = tree.kind(*declarator) {
                            let desc = self.describe(*declarator, &ty.clone().with_extra_dims(*dims));
                            let kind = DeclKind::Field {
                                is_static: modifiers.is_static || in_interface,
                            };
                            self.declare(name, desc, *declarator, kind)?;
                        }
                    }
                }
                NodeKind::Method(method) => {
                    // overloads share one entry
                    if self.scopes.declared_in_current(&method.name) {
                        continue;
                    }
                    let desc = self.describe(*member, &method.return_type);
                    let kind = DeclKind::Method {
                        is_static: method.modifiers.is_static,
                    };
                    self.declare(&method.name, desc, *member, kind)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn declare_params(&mut self, params: &[NodeId]) -> Result<(), ScopeError> {
        let tree = self.tree;
        for param in params {
            if let NodeKind::Param { ty, name, .. } = tree.kind(*param) {
                let desc = self.describe(*param, ty);
                self.declare(name, desc, *param, DeclKind::Param)?;
            }
        }
        Ok(())
    }

    fn type_decl(&mut self, node: NodeId) -> Result<(), ScopeError> {
        let tree = self.tree;
        let NodeKind::TypeDecl(decl) = tree.kind(node) else {
            return Ok(());
        };
        let resolved = match self.resolver.resolve_declaration(self.unit, node) {
            Some(id) => ResolvedType::Declared {
                id,
                args: Vec::new(),
            },
            None => ResolvedType::Unknown(decl.name.clone()),
        };
        self.declare(&decl.name, TypeDescription::of(resolved.clone()), node, DeclKind::Type)?;

        self.push(node)?;
        for component in &decl.components {
            if let NodeKind::Param { ty, name, .. } = tree.kind(*component) {
                let desc = self.describe(*component, ty);
                self.declare(name, desc, *component, DeclKind::Field { is_static: false })?;
            }
        }
        for constant in &decl.constants {
            if let NodeKind::EnumConstant { name, .. } = tree.kind(*constant) {
                self.declare(name, TypeDescription::of(resolved.clone()), *constant, DeclKind::EnumConstant)?;
            }
        }
        self.declare_members(Some(decl.kind), &decl.members)?;
        self.visit_all(&decl.constants)?;
        self.visit_all(&decl.members)?;
        self.scopes.pop_block()
    }

    fn routine(&mut self, node: NodeId, params: &[NodeId], body: Option<NodeId>) -> Result<(), ScopeError> {
        self.push(node)?;
        self.declare_params(params)?;
        self.visit_opt(body)?;
        self.scopes.pop_block()
    }

    fn local_declarators(&mut self, ty: &TypeRef, declarators: &[NodeId]) -> Result<(), ScopeError> {
        let tree = self.tree;
        for declarator in declarators {
            if let NodeKind::Declarator { name, dims, init } = tree.kind(*declarator) {
                self.visit_opt(*init)?;
                let desc = match (ty, init) {
                    (TypeRef::Inferred, Some(init)) => TypeDescription::of(
                        self.resolver.resolve_expression_type(self.site(*init)),
                    ),
                    _ => self.describe(*declarator, &ty.clone().with_extra_dims(*dims)),
                };
                self.declare(name, desc, *declarator, DeclKind::Local)?;
            }
        }
        Ok(())
    }

    fn visit(&mut self, node: NodeId) -> Result<(), ScopeError> {
        let tree = self.tree;
        match tree.kind(node) {
            NodeKind::CompilationUnit { imports, types, .. } => {
                self.push(node)?;
                for import in imports {
                    if let NodeKind::Import {
                        path,
                        is_static,
                        wildcard,
                    } = tree.kind(*import)
                    {
                        let mut text = String::new();
                        if *is_static {
                            text.push_str("static ");
                        }
                        text.push_str(path);
                        if *wildcard {
                            text.push_str(".*");
                        }
                        self.scopes.add_import(&text);
                    }
                }
                self.visit_all(types)?;
                self.scopes.pop_block()
            }
            NodeKind::TypeDecl(_) => self.type_decl(node),
            NodeKind::Field { declarators, .. } => self.visit_all(declarators),
            NodeKind::Declarator { init, .. } => self.visit_opt(*init),
            NodeKind::Method(method) => self.routine(node, &method.params, method.body),
            NodeKind::Constructor(ctor) => self.routine(node, &ctor.params, Some(ctor.body)),
            NodeKind::EnumConstant { args, body, .. } => {
                self.visit_all(args)?;
                if body.is_empty() {
                    return Ok(());
                }
                self.push(node)?;
                self.declare_members(None, body)?;
                self.visit_all(body)?;
                self.scopes.pop_block()
            }
            NodeKind::Initializer { body, .. } => self.visit(*body),
            NodeKind::Block { stmts } => {
                self.push(node)?;
                self.visit_all(stmts)?;
                self.scopes.pop_block()
            }
            NodeKind::LocalVar {
                ty, declarators, ..
            } => self.local_declarators(ty, declarators),
            NodeKind::ExprStmt { expr } => self.visit(*expr),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.visit(*cond)?;
                self.visit(*then_branch)?;
                self.visit_opt(*else_branch)
            }
            NodeKind::While { cond, body } => {
                self.visit(*cond)?;
                self.visit(*body)
            }
            NodeKind::DoWhile { body, cond } => {
                self.visit(*body)?;
                self.visit(*cond)
            }
            NodeKind::For {
                init,
                cond,
                update,
                body,
            } => {
                self.push(node)?;
                self.visit_all(init)?;
                self.visit_opt(*cond)?;
                self.visit_all(update)?;
                self.visit(*body)?;
                self.scopes.pop_block()
            }
            NodeKind::ForEach {
                ty,
                name,
                iterable,
                body,
            } => {
                self.visit(*iterable)?;
                self.push(node)?;
                let desc = match ty {
                    TypeRef::Inferred => TypeDescription::of(
                        self.resolver
                            .resolve_expression_type(self.site(*iterable))
                            .index_once(),
                    ),
                    ty => self.describe(node, ty),
                };
                self.declare(name, desc, node, DeclKind::Local)?;
                self.visit(*body)?;
                self.scopes.pop_block()
            }
            NodeKind::Return { value } => self.visit_opt(*value),
            NodeKind::Throw { expr } => self.visit(*expr),
            NodeKind::Try {
                resources,
                body,
                catches,
                finally,
            } => {
                self.push(node)?;
                self.visit_all(resources)?;
                self.visit(*body)?;
                self.visit_all(catches)?;
                self.visit_opt(*finally)?;
                self.scopes.pop_block()
            }
            NodeKind::Catch { types, name, body } => {
                self.push(node)?;
                let desc = match types.first() {
                    Some(ty) => self.describe(node, ty),
                    None => TypeDescription::unknown(),
                };
                self.declare(name, desc, node, DeclKind::Param)?;
                self.visit(*body)?;
                self.scopes.pop_block()
            }
            NodeKind::Switch {
                selector, cases, ..
            } => {
                self.visit(*selector)?;
                self.push(node)?;
                self.visit_all(cases)?;
                self.scopes.pop_block()
            }
            NodeKind::SwitchCase { labels, body, .. } => {
                self.visit_all(labels)?;
                self.visit_all(body)
            }
            NodeKind::Labeled { body, .. } => self.visit(*body),
            NodeKind::Synchronized { lock, body } => {
                self.visit(*lock)?;
                self.visit(*body)
            }
            NodeKind::Assert { cond, message } => {
                self.visit(*cond)?;
                self.visit_opt(*message)
            }
            NodeKind::Yield { value } => self.visit(*value),
            NodeKind::CtorCall { args, .. } => self.visit_all(args),
            NodeKind::Name { name } => self.scopes.add_usage(name, node),
            NodeKind::FieldAccess { target, .. } => self.visit(*target),
            NodeKind::ArrayAccess { array, index } => {
                self.visit(*array)?;
                self.visit(*index)
            }
            NodeKind::Call { receiver, args, .. } => {
                self.visit_opt(*receiver)?;
                self.visit_all(args)
            }
            NodeKind::New { args, body, .. } => {
                self.visit_all(args)?;
                if body.is_empty() {
                    return Ok(());
                }
                self.push(node)?;
                self.declare_members(None, body)?;
                self.visit_all(body)?;
                self.scopes.pop_block()
            }
            NodeKind::NewArray { dims, init, .. } => {
                self.visit_all(dims)?;
                self.visit_opt(*init)
            }
            NodeKind::ArrayInit { elements } => self.visit_all(elements),
            NodeKind::Assign { target, value, .. } => {
                if let Some(root) = tree.assigned_root(*target) {
                    self.scopes.add_change(root, node)?;
                }
                self.visit(*target)?;
                self.visit(*value)
            }
            NodeKind::Update { operand, .. } => {
                if let Some(root) = tree.assigned_root(*operand) {
                    self.scopes.add_change(root, node)?;
                }
                self.visit(*operand)
            }
            NodeKind::Binary { left, right, .. } => {
                self.visit(*left)?;
                self.visit(*right)
            }
            NodeKind::Unary { operand, .. } => self.visit(*operand),
            NodeKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                self.visit(*cond)?;
                self.visit(*then_expr)?;
                self.visit(*else_expr)
            }
            NodeKind::Cast { expr, .. }
            | NodeKind::InstanceOf { expr, .. }
            | NodeKind::Paren { expr } => self.visit(*expr),
            // lambda bodies are not analyzed
            NodeKind::Lambda { .. } => Ok(()),
            NodeKind::Import { .. }
            | NodeKind::Param { .. }
            | NodeKind::Break { .. }
            | NodeKind::Continue { .. }
            | NodeKind::Empty
            | NodeKind::Literal { .. }
            | NodeKind::MethodRef { .. }
            | NodeKind::This
            | NodeKind::Super
            | NodeKind::ClassLiteral { .. }
            | NodeKind::Comment { .. }
            | NodeKind::Unsupported { .. } => Ok(()),
        }
    }
}
