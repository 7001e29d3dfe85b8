// Expression emission
use std::sync::OnceLock;

use regex::Regex;

use crate::ast::{AssignOp, BinaryOp, LiteralKind, NodeId, NodeKind, TypeRef, UnaryOp, UpdateOp};
use crate::model::Receiver;
use crate::naming::{renamed_constant, value_name};
use crate::resolve::{last_segment, CalleeInfo, Resolve, ResolvedType};
use crate::scope::DeclKind;

use super::items::EnumGetter;
use super::Emitter;

fn unicode_escape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\u+([0-9a-fA-F]{4})").expect("constant pattern"))
}

/// Rewrite `\uXXXX` escapes into Rust's `\u{XXXX}`
fn rust_escapes(text: &str) -> String {
    unicode_escape().replace_all(text, r"\u{${1}}").into_owned()
}

/// Drop the long suffix; leading-zero octal becomes `0o`
pub(crate) fn integer_literal(text: &str) -> String {
    let digits = text.trim_end_matches(['l', 'L']);
    let octal = digits.len() > 1
        && digits.starts_with('0')
        && digits.chars().all(|c| c.is_ascii_digit() || c == '_');
    if octal {
        format!("0o{}", &digits[1..])
    } else {
        digits.to_string()
    }
}

/// Drop `f`/`d` suffixes and make sure the literal reads as floating
pub(crate) fn floating_literal(text: &str) -> String {
    let hex = text.starts_with("0x") || text.starts_with("0X");
    let mut out = if hex {
        text.to_string()
    } else {
        text.trim_end_matches(['f', 'F', 'd', 'D']).to_string()
    };
    if out.starts_with('.') {
        out.insert(0, '0');
    }
    if !hex && !out.contains(['.', 'e', 'E']) {
        out.push_str(".0");
    }
    out
}

/// Text block content as a one-line string literal with incidental indentation
/// removed; line breaks are escaped so re-indentation cannot alter the value
pub(crate) fn text_block(text: &str) -> String {
    let inner = text.trim_start_matches("\"\"\"").trim_end_matches("\"\"\"");
    let inner = match inner.find('\n') {
        Some(newline) => &inner[newline + 1..],
        None => inner,
    };
    let lines: Vec<&str> = inner.split('\n').collect();
    let closing_alone = lines.last().is_some_and(|l| l.trim().is_empty());
    let indent = lines
        .iter()
        .enumerate()
        .filter(|(i, l)| !l.trim().is_empty() || (closing_alone && *i == lines.len() - 1))
        .map(|(_, l)| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    let body = lines
        .iter()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()).trim_end())
        .collect::<Vec<_>>()
        .join("\\n");
    let body = body.replace("\\\"", "\"").replace('"', "\\\"");
    format!("\"{}\"", rust_escapes(&body))
}

/// Braces in literal text of a format string
fn format_escape(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// One operand of a flattened string concatenation
enum Part {
    Literal(String),
    Arg(String),
}

impl Emitter<'_, '_> {
    pub(crate) fn expr(&mut self, node: NodeId) -> String {
        let tree = self.tree;
        match tree.kind(node) {
            NodeKind::Literal { kind, text } => self.literal(node, *kind, text),
            NodeKind::Name { name } => self.name_expr(node, name),
            NodeKind::FieldAccess { target, name } => self.field_access(node, *target, name),
            NodeKind::ArrayAccess { array, index } => {
                format!("{}[{}]", self.postfix_operand(*array), self.index_expr(*index))
            }
            NodeKind::Call {
                receiver,
                name,
                args,
            } => self.call(node, *receiver, name, args),
            NodeKind::New { ty, args, body } => self.new_object(node, ty, args, body),
            NodeKind::NewArray { .. } => self.new_array(node),
            NodeKind::ArrayInit { elements } => self.array_init(elements),
            NodeKind::Assign { op, target, value } => {
                let assignment = self.assignment(*op, *target, *value);
                format!("{{ {assignment}; {} }}", self.expr(*target))
            }
            NodeKind::Binary { op, left, right } => self.binary(node, *op, *left, *right),
            NodeKind::Unary { op, operand } => {
                let text = self.prefix_operand(*operand);
                match op {
                    UnaryOp::Plus => text,
                    UnaryOp::Minus => format!("-{text}"),
                    UnaryOp::Not | UnaryOp::BitNot => format!("!{text}"),
                }
            }
            NodeKind::Update {
                op,
                prefix,
                operand,
            } => {
                let target = self.expr(*operand);
                let step = self.update_step(*op, *operand);
                if *prefix {
                    format!("{{ {target} {step}; {target} }}")
                } else {
                    format!("{{ let tmp = {target}; {target} {step}; tmp }}")
                }
            }
            NodeKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => format!(
                "if {} {{ {} }} else {{ {} }}",
                self.expr(*cond),
                self.expr(*then_expr),
                self.expr(*else_expr)
            ),
            NodeKind::Cast { ty, expr } => self.cast(node, ty, *expr),
            NodeKind::This => self.self_text().to_string(),
            NodeKind::Super => format!("{}.base", self.self_text()),
            NodeKind::Paren { expr } => format!("({})", self.expr(*expr)),
            NodeKind::Switch { is_expr: true, .. } => self.switch(node),
            NodeKind::InstanceOf { .. }
            | NodeKind::Lambda { .. }
            | NodeKind::MethodRef { .. }
            | NodeKind::ClassLiteral { .. }
            | NodeKind::Unsupported { .. } => self.unsupported(node),
            NodeKind::CompilationUnit { .. }
            | NodeKind::Import { .. }
            | NodeKind::TypeDecl(_)
            | NodeKind::Field { .. }
            | NodeKind::Declarator { .. }
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
            | NodeKind::Comment { .. } => self.unsupported(node),
        }
    }

    /// `self`, or the delegated-to instance inside a delegating constructor
    pub(crate) fn self_text(&self) -> &'static str {
        if self.delegating() {
            "this"
        } else {
            "self"
        }
    }

    fn literal(&self, node: NodeId, kind: LiteralKind, text: &str) -> String {
        match kind {
            LiteralKind::Int | LiteralKind::Long => {
                let mut out = integer_literal(text);
                let decimal = !out.starts_with("0x") && !out.starts_with("0X") && !out.starts_with("0b")
                    && !out.starts_with("0B") && !out.starts_with("0o");
                if decimal && self.scopes.types.floating_context(self.tree, node) {
                    out.push_str(".0");
                }
                out
            }
            LiteralKind::Float | LiteralKind::Double => floating_literal(text),
            LiteralKind::Char | LiteralKind::String => rust_escapes(text),
            LiteralKind::TextBlock => text_block(text),
            LiteralKind::Bool => text.to_string(),
            LiteralKind::Null => "None".to_string(),
        }
    }

    fn name_expr(&mut self, node: NodeId, name: &str) -> String {
        if let Some(decl) = self.scopes.find_declaration(self.tree, name, node).cloned() {
            return match decl.kind {
                DeclKind::Local | DeclKind::Param | DeclKind::Method { .. } => value_name(name),
                DeclKind::Field { is_static: false } => self.instance_field(decl.node, name),
                DeclKind::Field { is_static: true } | DeclKind::EnumConstant => {
                    self.static_member(decl.node, name)
                }
                DeclKind::Type => self.type_path(&decl.ty.resolved),
            };
        }
        if let Some(text) = self.inherited_field(node, name) {
            return text;
        }
        match self.receiver_type(node) {
            Some(ty) => self.type_path(&ty),
            None => format!("/* unresolved */ {name}"),
        }
    }

    /// Registered name of a declaration node, or `fallback`
    fn member_name(&self, decl_node: NodeId, fallback: &str) -> String {
        self.ctx
            .index
            .resolve_declaration(self.unit, decl_node)
            .and_then(|id| self.ctx.registry.name_of(&id).map(str::to_string))
            .unwrap_or_else(|| fallback.to_string())
    }

    fn instance_field(&self, decl_node: NodeId, name: &str) -> String {
        let field = self.member_name(decl_node, &value_name(name));
        let owning_enum = self
            .tree
            .enclosing_type(decl_node)
            .filter(|t| matches!(self.kind(*t), NodeKind::TypeDecl(d) if d.kind == crate::ast::TypeKind::Enum));
        if let Some(owner) = owning_enum {
            return match self.enum_getter(owner, name) {
                Some(EnumGetter::Custom) => format!("self.{field}_value()"),
                _ => format!("self.{field}()"),
            };
        }
        if self.in_factory() && !self.delegating() {
            return field;
        }
        format!("{}.{field}", self.self_text())
    }

    fn static_member(&self, decl_node: NodeId, name: &str) -> String {
        let member = self.member_name(decl_node, name);
        let owner = self
            .owner_of(decl_node)
            .map(|id| {
                self.ctx
                    .registry
                    .display_type(&id, self.module)
                    .unwrap_or_else(|| last_segment(&id).to_string())
            })
            .unwrap_or_else(|| "Self".to_string());
        format!("{owner}::{member}")
    }

    /// `self.base...` path from the type `from` to its superclass `to`
    fn base_path(&self, from: &str, to: &str) -> Option<String> {
        let mut current = from.to_string();
        let mut hops = 0;
        while current != to {
            let parent = self.ctx.index.superclass_of(&current)?;
            current = parent.declared_id()?.to_string();
            hops += 1;
            if hops > 32 {
                return None;
            }
        }
        if hops == 0 {
            return None;
        }
        if self.in_factory() && !self.delegating() {
            return Some(format!("base{}", ".base".repeat(hops - 1)));
        }
        Some(format!("{}{}", self.self_text(), ".base".repeat(hops)))
    }

    /// Field not declared in the enclosing type but found in a supertype
    fn inherited_field(&self, node: NodeId, name: &str) -> Option<String> {
        let owner = self.owner_of(node)?;
        let (info, field) = self.ctx.index.find_field(&owner, name)?;
        if info.id == owner {
            return None;
        }
        let member = self
            .ctx
            .registry
            .name_of(&field.id)
            .map(str::to_string)
            .unwrap_or_else(|| value_name(name));
        if field.is_static {
            let ty = self
                .ctx
                .registry
                .display_type(&info.id, self.module)
                .unwrap_or_else(|| info.name.clone());
            return Some(format!("{ty}::{member}"));
        }
        let path = self.base_path(&owner, &info.id)?;
        Some(format!("{path}.{member}"))
    }

    /// Type named by a receiver that is not a variable: `Math` in `Math.max(a, b)`
    pub(crate) fn receiver_type(&self, node: NodeId) -> Option<ResolvedType> {
        let NodeKind::Name { name } = self.kind(node) else {
            return None;
        };
        let variable = self
            .scopes
            .find_declaration(self.tree, name, node)
            .is_some_and(|d| d.kind != DeclKind::Type);
        if variable {
            return None;
        }
        if self
            .owner_of(node)
            .is_some_and(|owner| self.ctx.index.find_field(&owner, name).is_some())
        {
            return None;
        }
        let resolved = self.resolve_at(node, &TypeRef::named(name.clone()));
        if !resolved.is_unknown() {
            return Some(resolved);
        }
        name.starts_with(|c: char| c.is_ascii_uppercase())
            .then(|| ResolvedType::library(name))
    }

    fn field_access(&mut self, node: NodeId, target: NodeId, name: &str) -> String {
        let target = self.tree.unparen(target);
        match self.kind(target) {
            NodeKind::This => {
                if let Some(owner) = self.owner_of(node) {
                    if let Some((info, field)) = self.ctx.index.find_field(&owner, name) {
                        if info.id != owner {
                            if let Some(text) = self.inherited_field(node, name) {
                                return text;
                            }
                        } else if field.is_static {
                            return self.static_member(field.node, name);
                        } else {
                            return self.instance_field(field.node, name);
                        }
                    }
                }
                let field = value_name(name);
                if self.in_factory() && !self.delegating() {
                    field
                } else {
                    format!("{}.{field}", self.self_text())
                }
            }
            NodeKind::Super => format!("{}.base.{}", self.self_text(), value_name(name)),
            _ => {
                if let Some(ty) = self.receiver_type(target) {
                    return self.static_field_path(&ty, name);
                }
                let target_type = self.ctx.index.resolve_expression_type(self.site(target));
                if name == "length" && target_type.array_depth() > 0 {
                    return format!("{}.len()", self.postfix_operand(target));
                }
                let member = target_type
                    .declared_id()
                    .and_then(|id| self.ctx.index.find_field(id, name))
                    .and_then(|(_, f)| self.ctx.registry.name_of(&f.id).map(str::to_string))
                    .unwrap_or_else(|| value_name(name));
                format!("{}.{member}", self.postfix_operand(target))
            }
        }
    }

    /// `Type::CONST`, mapping boxed types and well-known constants
    fn static_field_path(&self, ty: &ResolvedType, name: &str) -> String {
        let member = match ty {
            ResolvedType::Declared { id, .. } => self
                .ctx
                .index
                .find_field(id, name)
                .and_then(|(_, f)| self.ctx.registry.name_of(&f.id).map(str::to_string)),
            _ => None,
        }
        .or_else(|| renamed_constant(name).map(str::to_string))
        .unwrap_or_else(|| name.to_string());
        format!("{}::{member}", self.type_path(ty))
    }

    fn index_expr(&mut self, index: NodeId) -> String {
        match self.kind(self.tree.unparen(index)) {
            NodeKind::Literal {
                kind: LiteralKind::Int,
                text,
            } => integer_literal(text),
            _ => format!("({}) as usize", self.expr(index)),
        }
    }

    /// Operand of `.`, `[]` or `?`: wrapped unless it is atomic
    fn postfix_operand(&mut self, node: NodeId) -> String {
        let text = self.expr(node);
        match self.kind(node) {
            NodeKind::Binary { .. }
            | NodeKind::Unary { .. }
            | NodeKind::Cast { .. }
            | NodeKind::Conditional { .. }
            | NodeKind::Assign { .. }
            | NodeKind::Update { .. } => format!("({text})"),
            _ => text,
        }
    }

    /// Operand of a prefix operator
    fn prefix_operand(&mut self, node: NodeId) -> String {
        let text = self.expr(node);
        match self.kind(node) {
            NodeKind::Binary { .. }
            | NodeKind::Cast { .. }
            | NodeKind::Conditional { .. }
            | NodeKind::Assign { .. } => format!("({text})"),
            _ => text,
        }
    }

    /// `+= 1`, or `+= 1.0` for a floating operand
    pub(crate) fn update_step(&self, op: UpdateOp, operand: NodeId) -> String {
        let one = if self.scopes.types.is_floating(operand) {
            "1.0"
        } else {
            "1"
        };
        format!("{} {one}", op.compound_symbol())
    }

    /// Assignment without the trailing semicolon
    pub(crate) fn assignment(&mut self, op: AssignOp, target: NodeId, value: NodeId) -> String {
        let target_text = self.expr(target);
        let text_target = self.scopes.types.is_text(target);
        match op {
            AssignOp::Assign => {
                let value_text = self.owned_value(value, text_target);
                format!("{target_text} = {value_text}")
            }
            AssignOp::Compound(BinaryOp::UShr) => {
                format!("{target_text} >>= {} /* >>>= */", self.expr(value))
            }
            AssignOp::Compound(BinaryOp::Add) if text_target => {
                let value_text = self.expr(value);
                let literal = matches!(
                    self.kind(self.tree.unparen(value)),
                    NodeKind::Literal {
                        kind: LiteralKind::String,
                        ..
                    }
                );
                if literal {
                    format!("{target_text} += {value_text}")
                } else if self.scopes.types.is_text(value) {
                    format!("{target_text} += &{value_text}")
                } else {
                    format!("{target_text} += &{value_text}.to_string()")
                }
            }
            AssignOp::Compound(op) => {
                format!("{target_text} {}= {}", op.rust_symbol(), self.expr(value))
            }
        }
    }

    /// Value bound to an owned `String` slot: string literals get `.to_string()`
    pub(crate) fn owned_value(&mut self, value: NodeId, text_slot: bool) -> String {
        let text = self.expr(value);
        let literal = matches!(
            self.kind(self.tree.unparen(value)),
            NodeKind::Literal {
                kind: LiteralKind::String | LiteralKind::TextBlock,
                ..
            }
        );
        if text_slot && literal {
            format!("{text}.to_string()")
        } else {
            text
        }
    }

    fn binary(&mut self, node: NodeId, op: BinaryOp, left: NodeId, right: NodeId) -> String {
        if op == BinaryOp::Add && self.scopes.types.is_text(node) {
            return self.concat(node);
        }
        let precedence = op.rust_precedence();
        let comparison = op.is_comparison();
        let left_text = self.binary_operand(left, precedence, comparison, false);
        let right_text = self.binary_operand(right, precedence, comparison, true);
        if op == BinaryOp::UShr {
            return format!("{left_text} >> {right_text} /* >>> */");
        }
        format!("{left_text} {} {right_text}", op.rust_symbol())
    }

    fn binary_operand(&mut self, node: NodeId, parent: u8, parent_comparison: bool, right: bool) -> String {
        let text = self.expr(node);
        let wrap = match self.kind(node) {
            NodeKind::Binary { op, .. } => {
                if *op == BinaryOp::Add && self.scopes.types.is_text(node) {
                    false
                } else {
                    let own = op.rust_precedence();
                    own < parent || (right && own == parent) || (parent_comparison && op.is_comparison())
                }
            }
            NodeKind::Cast { .. }
            | NodeKind::Conditional { .. }
            | NodeKind::Assign { .. }
            | NodeKind::Switch { .. } => true,
            _ => false,
        };
        if wrap {
            format!("({text})")
        } else {
            text
        }
    }

    fn concat_parts(&mut self, node: NodeId, parts: &mut Vec<Part>) {
        match self.kind(node) {
            NodeKind::Binary {
                op: BinaryOp::Add,
                left,
                right,
            } if self.scopes.types.is_text(node) => {
                let (left, right) = (*left, *right);
                self.concat_parts(left, parts);
                self.concat_parts(right, parts);
            }
            NodeKind::Literal {
                kind: LiteralKind::String,
                text,
            } => {
                let inner = text
                    .strip_prefix('"')
                    .and_then(|t| t.strip_suffix('"'))
                    .unwrap_or(text);
                parts.push(Part::Literal(rust_escapes(inner)));
            }
            _ => parts.push(Part::Arg(self.expr(node))),
        }
    }

    /// Format string and arguments of a string concatenation chain
    fn format_parts(&mut self, node: NodeId) -> (String, Vec<String>) {
        let mut parts = Vec::new();
        self.concat_parts(node, &mut parts);
        let mut template = String::new();
        let mut args = Vec::new();
        for part in parts {
            match part {
                Part::Literal(text) => template.push_str(&format_escape(&text)),
                Part::Arg(text) => {
                    template.push_str("{}");
                    args.push(text);
                }
            }
        }
        (template, args)
    }

    fn concat(&mut self, node: NodeId) -> String {
        let (template, args) = self.format_parts(node);
        format_call("format!", &template, &args)
    }

    fn cast(&mut self, node: NodeId, ty: &TypeRef, expr: NodeId) -> String {
        let resolved = self.resolve_at(node, ty);
        let operand = self.postfix_operand(expr);
        if resolved.is_primitive() {
            format!("{operand} as {}", self.rust_type(&resolved))
        } else {
            format!("{operand} /* as {ty} */")
        }
    }

    /// `System.out.println(...)` and friends as print macros
    fn print_call(&mut self, receiver: Option<NodeId>, name: &str, args: &[NodeId]) -> Option<String> {
        let receiver = self.tree.unparen(receiver?);
        let NodeKind::FieldAccess { target, name: stream } = self.kind(receiver) else {
            return None;
        };
        let system = matches!(self.kind(*target), NodeKind::Name { name } if name == "System");
        let mac = match (system, stream.as_str(), name) {
            (true, "out", "println") => "println!",
            (true, "out", "print") => "print!",
            (true, "err", "println") => "eprintln!",
            (true, "err", "print") => "eprint!",
            _ => return None,
        };
        let Some(arg) = args.first() else {
            return Some(format!("{mac}()"));
        };
        let arg = *arg;
        let (template, values) = match self.kind(arg) {
            NodeKind::Binary { .. } if self.scopes.types.is_text(arg) => self.format_parts(arg),
            NodeKind::Literal {
                kind: LiteralKind::String,
                ..
            } => self.format_parts(arg),
            _ => ("{}".to_string(), vec![self.expr(arg)]),
        };
        Some(format_call(mac, &template, &values))
    }

    /// Arguments, borrowing non-primitive variables and call results
    pub(crate) fn call_args(&mut self, args: &[NodeId]) -> String {
        let mut out = Vec::new();
        for arg in args {
            let text = self.expr(*arg);
            let borrow = match self.kind(*arg) {
                NodeKind::Name { name } => self
                    .scopes
                    .find_declaration(self.tree, name, *arg)
                    .is_some_and(|d| {
                        matches!(d.kind, DeclKind::Local | DeclKind::Param | DeclKind::Field { is_static: false })
                            && !d.ty.is_primitive_scalar()
                            && !matches!(d.ty.resolved, ResolvedType::TypeVar(_))
                    }),
                NodeKind::Call { .. } => !self
                    .ctx
                    .index
                    .resolve_expression_type(self.site(*arg))
                    .is_primitive(),
                _ => false,
            };
            if borrow {
                out.push(format!("&{text}"));
            } else {
                out.push(text);
            }
        }
        out.join(", ")
    }

    fn call(&mut self, node: NodeId, receiver: Option<NodeId>, name: &str, args: &[NodeId]) -> String {
        if let Some(text) = self.print_call(receiver, name, args) {
            return text;
        }
        let callee = self.ctx.index.resolve_callee(self.site(node));
        let method = callee
            .as_ref()
            .and_then(|c| self.ctx.registry.name_of(&c.id).map(str::to_string))
            .unwrap_or_else(|| value_name(name));
        let args_text = self.call_args(args);
        let receiver = receiver.map(|r| self.tree.unparen(r));
        // instance methods that never touch their receiver are associated functions
        let associated = callee.as_ref().is_some_and(|c| {
            c.is_static || self.ctx.receivers.receiver_of(&c.id) == Some(Receiver::None)
        });
        let text = match receiver {
            None => match &callee {
                Some(c) if associated => {
                    format!("{}::{method}({args_text})", self.owner_path(&c.owner))
                }
                Some(_) => format!("{}.{method}({args_text})", self.self_text()),
                None => format!("/* unresolved */ {method}({args_text})"),
            },
            Some(r) => match self.kind(r) {
                NodeKind::This if associated => match &callee {
                    Some(c) => format!("{}::{method}({args_text})", self.owner_path(&c.owner)),
                    None => format!("{}.{method}({args_text})", self.self_text()),
                },
                NodeKind::This => format!("{}.{method}({args_text})", self.self_text()),
                NodeKind::Super => format!("{}.base.{method}({args_text})", self.self_text()),
                _ => match self.receiver_type(r) {
                    Some(ty) => format!("{}::{method}({args_text})", self.type_path(&ty)),
                    None => format!("{}.{method}({args_text})", self.postfix_operand(r)),
                },
            },
        };
        self.handle_throws(callee.as_ref(), text)
    }

    fn owner_path(&self, owner: &str) -> String {
        self.ctx
            .registry
            .display_type(owner, self.module)
            .unwrap_or_else(|| last_segment(owner).to_string())
    }

    /// Route a throwing call to the enclosing catch clause, or propagate it with `?`
    pub(crate) fn handle_throws(&self, callee: Option<&CalleeInfo>, text: String) -> String {
        let Some(callee) = callee else {
            return text;
        };
        if !self.ctx.throws.throws(&callee.id) {
            return text;
        }
        let thrown = self.ctx.throws.thrown(&callee.id);
        if let Some((label, clause)) = self.catching_clause(&thrown) {
            return format!(
                "match {text} {{ Ok(v) => v, Err(_) => {{ try_result_{label} = {clause}; break 'try_{label}; }} }}"
            );
        }
        if self.routine_throws() {
            format!("{text}?")
        } else {
            text
        }
    }

    fn new_object(&mut self, node: NodeId, ty: &TypeRef, args: &[NodeId], body: &[NodeId]) -> String {
        if !body.is_empty() {
            return self.unsupported(node);
        }
        let callee = self.ctx.index.resolve_callee(self.site(node));
        let resolved = self.resolve_at(node, ty);
        let ctor = callee
            .as_ref()
            .and_then(|c| self.ctx.registry.name_of(&c.id).map(str::to_string))
            .unwrap_or_else(|| "new".to_string());
        let args_text = self.call_args(args);
        let text = format!("{}::{ctor}({args_text})", self.type_path(&resolved));
        self.handle_throws(callee.as_ref(), text)
    }
}

/// `mac!("template", args...)`
fn format_call(mac: &str, template: &str, args: &[String]) -> String {
    if args.is_empty() {
        format!("{mac}(\"{template}\")")
    } else {
        format!("{mac}(\"{template}\", {})", args.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literals() {
        assert_eq!(integer_literal("42L"), "42");
        assert_eq!(integer_literal("017"), "0o17");
        assert_eq!(integer_literal("0"), "0");
        assert_eq!(integer_literal("0xFF"), "0xFF");
    }

    #[test]
    fn floating_literals() {
        assert_eq!(floating_literal("1.5f"), "1.5");
        assert_eq!(floating_literal("2d"), "2.0");
        assert_eq!(floating_literal(".5"), "0.5");
        assert_eq!(floating_literal("1e10"), "1e10");
    }

    #[test]
    fn text_blocks_lose_incidental_indentation() {
        let text = "\"\"\"\n    Hello\n      \"World\"\n    \"\"\"";
        assert_eq!(text_block(text), "\"Hello\\n  \\\"World\\\"\\n\"");
    }

    #[test]
    fn unicode_escapes_are_braced() {
        assert_eq!(rust_escapes("'\\u0041'"), "'\\u{0041}'");
    }
}
