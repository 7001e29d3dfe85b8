// Statement emission
use crate::ast::{AssignOp, CommentStyle, LiteralKind, NodeId, NodeKind, TypeKind, TypeRef};
use crate::model::render::braced;
use crate::naming::{to_pascal_case, value_name};
use crate::resolve::{Resolve, ResolvedType};

use super::comments::comment_lines;
use super::{Emitter, TryFrame};

/// Locals whose name starts with an upper-case letter become constants
fn is_constant_name(name: &str) -> bool {
    name.starts_with(char::is_uppercase)
}

impl Emitter<'_, '_> {
    /// Statements of a comment container, source comments re-emitted in place
    pub(crate) fn statements(&mut self, container: NodeId, stmts: &[NodeId]) -> Vec<String> {
        let tree = self.tree;
        let mut lines = Vec::new();
        for child in tree.children(container) {
            if stmts.contains(child) {
                let text = self.stmt(*child);
                if !text.is_empty() {
                    lines.push(text);
                }
            } else if self.ctx.config.emit_comments {
                if let NodeKind::Comment { text, style } = tree.kind(*child) {
                    let style = match style {
                        CommentStyle::Doc => CommentStyle::Block,
                        other => *other,
                    };
                    lines.extend(comment_lines(text, style));
                }
            }
        }
        lines
    }

    /// Lines of a statement used as a body: a block's statements, or the statement itself
    pub(crate) fn body_lines(&mut self, node: NodeId) -> Vec<String> {
        match self.kind(node) {
            NodeKind::Block { stmts } => self.statements(node, stmts),
            _ => {
                let text = self.stmt(node);
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text]
                }
            }
        }
    }

    pub(crate) fn body(&mut self, node: NodeId) -> String {
        let lines = self.body_lines(node);
        braced(&lines.join("\n"), self.indent())
    }

    pub(crate) fn stmt(&mut self, node: NodeId) -> String {
        match self.kind(node) {
            NodeKind::Block { .. } => self.body(node),
            NodeKind::LocalVar { ty, declarators, .. } => declarators
                .iter()
                .map(|d| self.local_declarator(ty, *d))
                .collect::<Vec<_>>()
                .join("\n"),
            NodeKind::ExprStmt { expr } => format!("{};", self.effect(node, *expr)),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.tree.unparen(*cond);
                let mut out = format!("if {} {}", self.expr(cond), self.body(*then_branch));
                if let Some(else_branch) = else_branch {
                    out.push_str(" else ");
                    if matches!(self.kind(*else_branch), NodeKind::If { .. }) {
                        out.push_str(&self.stmt(*else_branch));
                    } else {
                        out.push_str(&self.body(*else_branch));
                    }
                }
                out
            }
            NodeKind::While { .. }
            | NodeKind::DoWhile { .. }
            | NodeKind::For { .. }
            | NodeKind::ForEach { .. } => self.loop_stmt(node, None),
            NodeKind::Return { value } => self.return_stmt(*value),
            NodeKind::Break { label: None } => "break;".to_string(),
            NodeKind::Break { label: Some(label) } => format!("break '{label};"),
            NodeKind::Continue { label: None } => "continue;".to_string(),
            NodeKind::Continue { label: Some(label) } => format!("continue '{label};"),
            NodeKind::Throw { expr } => self.throw_stmt(*expr),
            NodeKind::Try {
                resources,
                body,
                catches,
                finally,
            } => self.try_stmt(resources, *body, catches, *finally),
            NodeKind::Switch { .. } => self.switch(node),
            NodeKind::Labeled { label, body } => {
                if self.is_loop(*body) {
                    self.loop_stmt(*body, Some(label))
                } else {
                    format!("'{label}: {}", self.body(*body))
                }
            }
            NodeKind::Synchronized { lock, body } => {
                format!("// synchronized ({})\n{}", self.expr(*lock), self.body(*body))
            }
            NodeKind::Assert { cond, message } => {
                let cond = self.expr(self.tree.unparen(*cond));
                match message {
                    Some(message) => format!("assert!({cond}, \"{{}}\", {});", self.expr(*message)),
                    None => format!("assert!({cond});"),
                }
            }
            NodeKind::Yield { value } => self.expr(*value),
            NodeKind::CtorCall { is_super, args } => self.ctor_call(node, *is_super, args),
            NodeKind::Empty => String::new(),
            NodeKind::Comment { text, style } => comment_lines(text, *style).join("\n"),
            NodeKind::TypeDecl(_)
            | NodeKind::Catch { .. }
            | NodeKind::SwitchCase { .. }
            | NodeKind::Unsupported { .. } => self.unsupported(node),
            _ => format!("{};", self.expr(node)),
        }
    }

    fn local_declarator(&mut self, ty: &TypeRef, declarator: NodeId) -> String {
        let NodeKind::Declarator { name, dims, init } = self.kind(declarator) else {
            return self.unsupported(declarator);
        };
        let inferred = matches!(ty, TypeRef::Inferred);
        let resolved = if inferred {
            self.scopes
                .find_declaration(self.tree, name, declarator)
                .map(|d| d.ty.resolved.clone())
                .unwrap_or_else(|| ResolvedType::Unknown(String::new()))
        } else {
            self.resolve_at(declarator, &ty.clone().with_extra_dims(*dims))
        };

        if let (true, Some(init)) = (is_constant_name(name), init) {
            let const_ty = if resolved.is_string() {
                "&'static str".to_string()
            } else {
                self.rust_type(&resolved)
            };
            return format!("const {name}: {const_ty} = {};", self.expr(*init));
        }

        let binding = if self.scopes.is_changed(self.tree, name, declarator) {
            format!("let mut {}", value_name(name))
        } else {
            format!("let {}", value_name(name))
        };
        let extents = init.and_then(|i| self.literal_extents(i));
        let annotation = match (&extents, inferred) {
            (Some(extents), _) => Some(self.fixed_array_type(resolved.element(), extents)),
            (None, true) => None,
            (None, false) => Some(self.rust_type(&resolved)),
        };
        let head = match annotation {
            Some(annotation) => format!("{binding}: {annotation}"),
            None => binding,
        };
        match init {
            Some(init) => {
                let value = self.owned_value(*init, resolved.is_string());
                format!("{head} = {value};")
            }
            None => format!("{head};"),
        }
    }

    /// Expression evaluated for its effect, without the semicolon
    pub(crate) fn effect(&mut self, stmt: NodeId, expr: NodeId) -> String {
        match self.kind(expr) {
            NodeKind::Update { op, operand, .. } => {
                format!("{} {}", self.expr(*operand), self.update_step(*op, *operand))
            }
            NodeKind::Assign { op, target, value } => {
                if let Some(binding) = self.factory_binding(stmt, *op, *target, *value) {
                    return binding;
                }
                self.assignment(*op, *target, *value)
            }
            NodeKind::Paren { expr: inner } => self.effect(stmt, *inner),
            _ => self.expr(expr),
        }
    }

    /// `let f = e` for a top-level `this.f = e` of a factory body
    fn factory_binding(&mut self, stmt: NodeId, op: AssignOp, target: NodeId, value: NodeId) -> Option<String> {
        if op != AssignOp::Assign || !self.in_factory() || self.delegating() {
            return None;
        }
        let frame = self.routine.as_ref()?;
        let top_level = self.tree.parent(stmt).is_some_and(|p| Some(p) == frame.body);
        if !top_level {
            return None;
        }
        let field = self.assigned_field(target)?;
        if !frame.let_fields.contains(&field) {
            return None;
        }
        let value = self.owned_value(value, self.scopes.types.is_text(target));
        Some(format!("let {field} = {value}"))
    }

    fn loop_stmt(&mut self, node: NodeId, label: Option<&str>) -> String {
        let prefix = label.map(|l| format!("'{l}: ")).unwrap_or_default();
        let indent = self.indent();
        match self.kind(node) {
            NodeKind::While { cond, body } => {
                let cond = self.tree.unparen(*cond);
                if is_true(self.kind(cond)) {
                    format!("{prefix}loop {}", self.body(*body))
                } else {
                    format!("{prefix}while {} {}", self.expr(cond), self.body(*body))
                }
            }
            NodeKind::DoWhile { body, cond } => {
                let mut lines = self.body_lines(*body);
                let cond = self.expr(self.tree.unparen(*cond));
                lines.push(format!("if !({cond}) {}", braced("break;", indent)));
                format!("{prefix}loop {}", braced(&lines.join("\n"), indent))
            }
            NodeKind::For {
                init,
                cond,
                update,
                body,
            } => {
                let mut outer = Vec::new();
                for i in init {
                    if matches!(self.kind(*i), NodeKind::LocalVar { .. }) {
                        outer.push(self.stmt(*i));
                    } else {
                        outer.push(format!("{};", self.effect(*i, *i)));
                    }
                }
                let mut lines = self.body_lines(*body);
                for u in update {
                    lines.push(format!("{};", self.effect(*u, *u)));
                }
                let head = match cond.map(|c| self.tree.unparen(c)) {
                    Some(c) if !is_true(self.kind(c)) => format!("{prefix}while {} ", self.expr(c)),
                    _ => format!("{prefix}loop "),
                };
                let looped = format!("{head}{}", braced(&lines.join("\n"), indent));
                if outer.is_empty() {
                    looped
                } else {
                    outer.push(looped);
                    braced(&outer.join("\n"), indent)
                }
            }
            NodeKind::ForEach {
                name,
                iterable,
                body,
                ..
            } => {
                let iterable_type = self.ctx.index.resolve_expression_type(self.site(*iterable));
                let source = self.expr(*iterable);
                let source = if iterable_type.array_depth() > 0 {
                    format!("{source}.iter()")
                } else {
                    format!("&{source}")
                };
                format!("{prefix}for {} in {source} {}", value_name(name), self.body(*body))
            }
            _ => self.stmt(node),
        }
    }

    fn return_stmt(&mut self, value: Option<NodeId>) -> String {
        let throwing = self.routine_throws();
        let Some(value) = value else {
            return if throwing {
                "return Ok(());".to_string()
            } else {
                "return;".to_string()
            };
        };
        let text_slot = self.routine.as_ref().is_some_and(|r| r.return_type.is_string());
        let text = self.owned_value(value, text_slot);
        if throwing {
            format!("return Ok({text});")
        } else {
            format!("return {text};")
        }
    }

    fn throw_stmt(&mut self, expr: NodeId) -> String {
        let key = self.ctx.index.resolve_expression_type(self.site(expr)).key();
        if let Some((label, clause)) = self.catching_clause(&[key.as_str()]) {
            return format!("try_result_{label} = {clause};\nbreak 'try_{label};");
        }
        format!("return Err({}.into());", self.expr(expr))
    }

    /// Try statement as a labeled loop plus a discriminant matched after it
    fn try_stmt(&mut self, resources: &[NodeId], body: NodeId, catches: &[NodeId], finally: Option<NodeId>) -> String {
        let label = self.scopes.next_try();
        let indent = self.indent();
        let clauses = catches
            .iter()
            .map(|c| match self.kind(*c) {
                NodeKind::Catch { types, .. } => types.iter().map(|t| self.resolve_at(*c, t).key()).collect(),
                _ => Vec::new(),
            })
            .collect();
        self.tries.push(TryFrame { label, clauses });
        let mut lines: Vec<String> = resources.iter().map(|r| self.stmt(*r)).collect();
        lines.extend(self.body_lines(body));
        lines.push(format!("break 'try_{label};"));
        self.tries.pop();

        let mut out = vec![
            format!("let mut try_result_{label} = 0;"),
            format!("'try_{label}: loop {}", braced(&lines.join("\n"), indent)),
        ];
        if !catches.is_empty() {
            let mut arms = Vec::new();
            for (k, catch) in catches.iter().enumerate() {
                if let NodeKind::Catch { body, .. } = self.kind(*catch) {
                    arms.push(format!("{} => {}", k + 1, self.body(*body)));
                }
            }
            arms.push("_ => {}".to_string());
            out.push(format!("match try_result_{label} {}", braced(&arms.join("\n"), indent)));
        }
        if let Some(finally) = finally {
            out.extend(self.body_lines(finally));
        }
        out.join("\n")
    }

    /// Switch statement or expression as a `match`
    pub(crate) fn switch(&mut self, node: NodeId) -> String {
        let NodeKind::Switch {
            selector,
            cases,
            is_expr,
        } = self.kind(node)
        else {
            return self.unsupported(node);
        };
        let selector_type = self.ctx.index.resolve_expression_type(self.site(*selector));
        let mut selector_text = self.expr(*selector);
        if selector_type.is_string() {
            selector_text = format!("{selector_text}.as_str()");
        }

        let mut arms = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        let mut has_default = false;
        for case in cases {
            let NodeKind::SwitchCase {
                labels,
                is_default,
                arrow,
                body,
            } = self.kind(*case)
            else {
                continue;
            };
            if *is_default {
                has_default = true;
                pending.push("_".to_string());
            }
            for label in labels {
                let pattern = self.case_label(*label, &selector_type);
                pending.push(pattern);
            }
            if !*arrow && body.is_empty() {
                continue;
            }
            let pattern = if pending.iter().any(|p| p == "_") {
                "_".to_string()
            } else {
                pending.join(" | ")
            };
            pending.clear();
            let arm = self.case_body(*case, body, *arrow, *is_expr);
            arms.push(format!("{pattern} => {arm}"));
        }
        if !pending.is_empty() {
            let pattern = if pending.iter().any(|p| p == "_") {
                "_".to_string()
            } else {
                pending.join(" | ")
            };
            arms.push(format!("{pattern} => {{}}"));
        }
        if !has_default {
            if *is_expr {
                arms.push("_ => unreachable!(),".to_string());
            } else {
                arms.push("_ => {}".to_string());
            }
        }
        format!("match {selector_text} {}", braced(&arms.join("\n"), self.indent()))
    }

    fn case_label(&mut self, label: NodeId, selector_type: &ResolvedType) -> String {
        if let (NodeKind::Name { name }, Some(id)) = (self.kind(label), selector_type.declared_id()) {
            let is_enum = self
                .ctx
                .index
                .type_info(id)
                .is_some_and(|info| info.kind == TypeKind::Enum);
            if is_enum {
                let variant = self
                    .ctx
                    .registry
                    .name_of(&format!("{id}.{name}"))
                    .map(str::to_string)
                    .unwrap_or_else(|| to_pascal_case(name));
                return format!("{}::{variant}", self.type_path(selector_type));
            }
        }
        self.expr(label)
    }

    fn case_body(&mut self, case: NodeId, body: &[NodeId], arrow: bool, is_expr: bool) -> String {
        let mut stmts = body.to_vec();
        if let Some(last) = stmts.last() {
            if matches!(self.kind(*last), NodeKind::Break { label: None }) {
                stmts.pop();
            }
        }
        if arrow && stmts.len() == 1 {
            let single = stmts[0];
            match self.kind(single) {
                NodeKind::ExprStmt { expr } if is_expr => return format!("{},", self.expr(*expr)),
                NodeKind::ExprStmt { expr } => return format!("{},", self.effect(single, *expr)),
                NodeKind::Block { .. } => return self.body(single),
                _ => {}
            }
        }
        let lines = self.statements(case, &stmts);
        braced(&lines.join("\n"), self.indent())
    }

    fn ctor_call(&mut self, node: NodeId, is_super: bool, args: &[NodeId]) -> String {
        let callee = self.ctx.index.resolve_callee(self.site(node));
        let ctor = callee
            .as_ref()
            .and_then(|c| self.ctx.registry.name_of(&c.id).map(str::to_string))
            .unwrap_or_else(|| "new".to_string());
        let args_text = self.call_args(args);
        if is_super {
            let base = self
                .owner_of(node)
                .and_then(|owner| self.ctx.index.superclass_of(&owner))
                .map(|ty| self.type_path(&ty))
                .unwrap_or_else(|| "Base".to_string());
            let text = self.handle_throws(callee.as_ref(), format!("{base}::{ctor}({args_text})"));
            return format!("let base = {text};");
        }
        let text = self.handle_throws(callee.as_ref(), format!("Self::{ctor}({args_text})"));
        if let Some(frame) = self.routine.as_mut() {
            frame.delegating = true;
        }
        format!("let mut this = {text};")
    }
}

fn is_true(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Literal { kind: LiteralKind::Bool, text } if text == "true")
}

#[cfg(test)]
mod tests {
    use super::is_constant_name;

    #[test]
    fn constant_names() {
        assert!(is_constant_name("MAX"));
        assert!(is_constant_name("MAX_2"));
        assert!(is_constant_name("Max"));
        assert!(!is_constant_name("max"));
        assert!(!is_constant_name("_MAX"));
    }
}
