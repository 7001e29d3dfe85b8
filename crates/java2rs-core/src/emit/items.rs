// Filling item skeletons: resolved types, initializers, signatures and bodies
use std::collections::{HashMap, HashSet};

use crate::ast::{AssignOp, JavaVisibility, LiteralKind, NodeId, NodeKind, TypeParam};
use crate::model::render::braced;
use crate::model::{Field, GenericParam, Generics, Item, ItemKind, Method, Param, Receiver, Visibility};
use crate::naming::value_name;
use crate::resolve::{Resolve, ResolvedType};
use crate::scope::DeclKind;

use super::{Emitter, RoutineFrame};

/// Field uses of a constructor body, by registered field name
#[derive(Default)]
struct FactoryUses {
    /// Top-level `this.f = e` statements per field
    top_level: HashMap<String, usize>,
    /// Assigned anywhere else
    assigned: HashSet<String>,
    read: HashSet<String>,
}

/// An enum's own zero-parameter method named after one of its instance fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnumGetter {
    /// Body is `return field;`; the generated accessor replaces it
    Plain,
    /// Any other body; the generated accessor is named `<field>_value`
    Custom,
}

impl Emitter<'_, '_> {
    pub(crate) fn fill_item(&mut self, item: &mut Item) {
        let Some(node) = item.node else {
            return;
        };
        let NodeKind::TypeDecl(decl) = self.kind(node) else {
            return;
        };
        item.generics = self.generics(node, &decl.type_params);
        match item.kind {
            ItemKind::Class | ItemKind::Record | ItemKind::Enum => {
                item.base = self
                    .ctx
                    .index
                    .superclass_of(&item.id)
                    .map(|ty| self.rust_type(&ty));
                item.traits = self
                    .ctx
                    .index
                    .transitive_interfaces(&item.id)
                    .iter()
                    .map(|ty| self.rust_type(ty))
                    .collect();
            }
            ItemKind::Trait => {
                item.supertraits = decl
                    .implements
                    .iter()
                    .map(|ty| self.written_type(node, ty))
                    .collect();
            }
        }

        for field in &mut item.fields {
            self.fill_field(field);
        }

        let mut methods = std::mem::take(&mut item.methods);
        if item.kind == ItemKind::Enum {
            methods.retain(|m| !m.is_constructor);
        }
        for method in &mut methods {
            self.fill_method(item, method);
        }
        if item.kind == ItemKind::Enum {
            let mut accessors = self.enum_accessors(item);
            for accessor in &mut accessors {
                let getter = methods
                    .iter()
                    .position(|m| !m.is_static && m.params.is_empty() && m.name == accessor.name);
                if let Some(position) = getter {
                    let getter = methods.remove(position);
                    accessor.visibility = getter.visibility;
                    accessor.docs = getter.docs;
                }
            }
            accessors.append(&mut methods);
            methods = accessors;
            item.fields.retain(|f| f.is_static);
        }
        if item.kind == ItemKind::Class && self.ctx.config.forward_inherited_methods {
            let shims = self.inherited_shims(item, &methods);
            methods.extend(shims);
        }
        item.methods = methods;
    }

    fn generics(&self, node: NodeId, params: &[TypeParam]) -> Generics {
        Generics {
            params: params
                .iter()
                .map(|p| GenericParam {
                    name: p.name.clone(),
                    bounds: p.bounds.iter().map(|b| self.written_type(node, b)).collect(),
                })
                .collect(),
        }
    }

    fn fill_field(&mut self, field: &mut Field) {
        let Some(node) = field.node else {
            return;
        };
        match self.kind(node) {
            NodeKind::Declarator { dims, init, .. } => {
                let Some(NodeKind::Field { ty, .. }) = self.tree.parent(node).map(|p| self.kind(p)) else {
                    return;
                };
                let resolved = self.resolve_at(node, &ty.clone().with_extra_dims(*dims));
                let string_literal = init.is_some_and(|i| {
                    matches!(self.kind(i), NodeKind::Literal { kind: LiteralKind::String, .. })
                });
                let extents = init.and_then(|i| self.literal_extents(i));
                field.ty = match extents {
                    _ if field.is_static && resolved.is_string() && string_literal => "&'static str".to_string(),
                    Some(extents) => self.fixed_array_type(resolved.element(), &extents),
                    None => self.rust_type(&resolved),
                };
                field.init = match init {
                    Some(init) if field.is_static => Some(self.expr(*init)),
                    Some(init) => Some(self.owned_value(*init, resolved.is_string())),
                    None if field.is_static => Some(self.default_value(&resolved)),
                    None => None,
                };
            }
            NodeKind::Param { ty, .. } => {
                field.ty = self.written_type(node, ty);
            }
            _ => {}
        }
    }

    fn params(&self, params: &[NodeId]) -> Vec<Param> {
        params
            .iter()
            .filter_map(|p| match self.kind(*p) {
                NodeKind::Param {
                    ty, name, varargs, ..
                } => {
                    let written = if *varargs {
                        ty.clone().with_extra_dims(1)
                    } else {
                        ty.clone()
                    };
                    let resolved = self.resolve_at(*p, &written);
                    let mut rust_name = value_name(name);
                    if self.scopes.is_changed(self.tree, name, *p) {
                        rust_name = format!("mut {rust_name}");
                    }
                    Some(Param {
                        name: rust_name,
                        ty: self.param_type(&resolved),
                    })
                }
                _ => None,
            })
            .collect()
    }

    fn thrown_types(&self, id: &str) -> Vec<String> {
        self.ctx
            .throws
            .thrown_types(id)
            .into_iter()
            .map(|ty| self.rust_type(ty))
            .collect()
    }

    fn fill_method(&mut self, item: &Item, method: &mut Method) {
        let Some(node) = method.node else {
            if method.is_constructor {
                self.canonical_constructor(item, method);
            }
            return;
        };
        match self.kind(node) {
            NodeKind::Constructor(_) => self.fill_constructor(item, method, node),
            NodeKind::Method(decl) => {
                method.generics = self.generics(node, &decl.type_params);
                method.params = self.params(&decl.params);
                let ret = self.resolve_at(node, &decl.return_type);
                method.return_type = (ret != ResolvedType::Void).then(|| self.rust_type(&ret));
                method.thrown = self.thrown_types(&method.id);
                method.is_static = decl.modifiers.is_static;
                method.receiver = if method.is_static {
                    Receiver::None
                } else {
                    self.ctx
                        .receivers
                        .receiver_of(&method.id)
                        .unwrap_or(Receiver::Ref)
                };
                method.body = match decl.body {
                    Some(body) => Some(self.routine_body(node, body, ret, &method.id)),
                    None if item.kind == ItemKind::Trait => None,
                    None => Some(braced("unimplemented!()", self.indent())),
                };
            }
            // implicit record accessor
            NodeKind::Param { ty, .. } => {
                let resolved = self.resolve_at(node, ty);
                method.receiver = Receiver::Ref;
                if resolved.is_primitive() {
                    method.return_type = Some(self.rust_type(&resolved));
                    method.body = Some(braced(&format!("self.{}", method.name), self.indent()));
                } else {
                    method.return_type = Some(format!("&{}", self.rust_type(&resolved)));
                    method.body = Some(braced(&format!("&self.{}", method.name), self.indent()));
                }
            }
            _ => {}
        }
    }

    fn enter_routine(&mut self, node: NodeId, body: NodeId, id: &str, return_type: ResolvedType, factory: bool) {
        let throwing = self.ctx.throws.throws(id);
        if throwing {
            self.scopes.mark_throwing(id);
        }
        self.scopes.current_routine = Some(node);
        self.scopes.in_factory = factory;
        self.routine = Some(RoutineFrame {
            throwing: self.scopes.is_throwing(id),
            return_type,
            delegating: false,
            let_fields: HashSet::new(),
            body: Some(body),
        });
    }

    fn leave_routine(&mut self) {
        self.routine = None;
        self.scopes.current_routine = None;
        self.scopes.in_factory = false;
    }

    fn routine_body(&mut self, node: NodeId, body: NodeId, ret: ResolvedType, id: &str) -> String {
        let NodeKind::Block { stmts } = self.kind(body) else {
            return self.unsupported(body);
        };
        let void = ret == ResolvedType::Void;
        self.enter_routine(node, body, id, ret, false);
        let mut lines = self.statements(body, stmts);
        let exits = stmts
            .last()
            .is_some_and(|s| matches!(self.kind(*s), NodeKind::Return { .. } | NodeKind::Throw { .. }));
        if self.routine_throws() && void && !exits {
            lines.push("Ok(())".to_string());
        }
        self.leave_routine();
        braced(&lines.join("\n"), self.indent())
    }

    /// Registered name of an instance field of the enclosing type written as `f` or `this.f`
    pub(crate) fn assigned_field(&self, target: NodeId) -> Option<String> {
        let target = self.tree.unparen(target);
        match self.kind(target) {
            NodeKind::FieldAccess { target: object, name } => {
                if !matches!(self.kind(self.tree.unparen(*object)), NodeKind::This) {
                    return None;
                }
                let owner = self.owner_of(target)?;
                let (info, field) = self.ctx.index.find_field(&owner, name)?;
                if info.id != owner || field.is_static {
                    return None;
                }
                self.ctx.registry.name_of(&field.id).map(str::to_string)
            }
            NodeKind::Name { name } => {
                let decl = self.scopes.find_declaration(self.tree, name, target)?;
                if decl.kind != (DeclKind::Field { is_static: false }) {
                    return None;
                }
                if self.tree.enclosing_type(decl.node) != self.tree.enclosing_type(target) {
                    return None;
                }
                let id = self.ctx.index.resolve_declaration(self.unit, decl.node)?;
                self.ctx.registry.name_of(&id).map(str::to_string)
            }
            _ => None,
        }
    }

    fn collect_field_uses(&self, node: NodeId, uses: &mut FactoryUses) {
        match self.kind(node) {
            NodeKind::Lambda { .. } | NodeKind::TypeDecl(_) => return,
            NodeKind::Assign { target, .. } | NodeKind::Update { operand: target, .. } => {
                if let Some(field) = self.assigned_field(*target) {
                    uses.assigned.insert(field);
                }
            }
            NodeKind::Name { .. } | NodeKind::FieldAccess { .. } => {
                if let Some(field) = self.assigned_field(node) {
                    uses.read.insert(field);
                }
            }
            _ => {}
        }
        for child in self.tree.children(node) {
            self.collect_field_uses(*child, uses);
        }
    }

    fn factory_uses(&self, stmts: &[NodeId]) -> FactoryUses {
        let mut uses = FactoryUses::default();
        for stmt in stmts {
            if let NodeKind::ExprStmt { expr } = self.kind(*stmt) {
                if let NodeKind::Assign {
                    op: AssignOp::Assign,
                    target,
                    value,
                } = self.kind(self.tree.unparen(*expr))
                {
                    if let Some(field) = self.assigned_field(*target) {
                        *uses.top_level.entry(field).or_default() += 1;
                        self.collect_field_uses(*value, &mut uses);
                        continue;
                    }
                }
            }
            self.collect_field_uses(*stmt, &mut uses);
        }
        uses
    }

    /// Constructor as a factory function returning `Self`
    fn fill_constructor(&mut self, item: &Item, method: &mut Method, node: NodeId) {
        let NodeKind::Constructor(decl) = self.kind(node) else {
            return;
        };
        method.params = self.params(&decl.params);
        method.return_type = Some("Self".to_string());
        method.thrown = self.thrown_types(&method.id);
        method.receiver = Receiver::None;
        let NodeKind::Block { stmts } = self.kind(decl.body) else {
            return;
        };
        let self_type = self.ctx.index.resolve_declaration(self.unit, item.node.unwrap_or(node));
        let return_type = match self_type {
            Some(id) => ResolvedType::Declared { id, args: Vec::new() },
            None => ResolvedType::Unknown(item.name.clone()),
        };
        self.enter_routine(node, decl.body, &method.id, return_type, true);

        let first = stmts.first().map(|s| self.kind(*s));
        let delegates = matches!(first, Some(NodeKind::CtorCall { is_super: false, .. }));
        let calls_super = matches!(first, Some(NodeKind::CtorCall { is_super: true, .. }));

        let mut lines = Vec::new();
        let mut bound: HashSet<String> = HashSet::new();
        if !delegates {
            let uses = self.factory_uses(stmts);
            let let_fields: HashSet<String> = uses
                .top_level
                .iter()
                .filter(|(f, n)| **n == 1 && !uses.assigned.contains(*f))
                .map(|(f, _)| f.clone())
                .collect();
            for field in item.instance_fields() {
                if let_fields.contains(&field.name) {
                    bound.insert(field.name.clone());
                    continue;
                }
                let assigned = uses.assigned.contains(&field.name) || uses.top_level.contains_key(&field.name);
                if !assigned && !uses.read.contains(&field.name) {
                    continue;
                }
                let init = field.init.clone().unwrap_or_else(|| "Default::default()".to_string());
                let binding = if assigned { "let mut" } else { "let" };
                lines.push(format!("{binding} {}: {} = {init};", field.name, field.ty));
                bound.insert(field.name.clone());
            }
            if let Some(frame) = self.routine.as_mut() {
                frame.let_fields = let_fields;
            }
        }

        lines.extend(self.statements(decl.body, stmts));
        let tail = if self.delegating() {
            "this".to_string()
        } else {
            self.self_literal(item, &bound, calls_super)
        };
        if self.routine_throws() {
            lines.push(format!("Ok({tail})"));
        } else {
            lines.push(tail);
        }
        self.leave_routine();
        method.body = Some(braced(&lines.join("\n"), self.indent()));
    }

    /// `Self { base, f, g: init, h: Default::default() }`
    fn self_literal(&self, item: &Item, bound: &HashSet<String>, calls_super: bool) -> String {
        let mut members = Vec::new();
        if let Some(base) = self.ctx.index.superclass_of(&item.id) {
            if calls_super {
                members.push("base".to_string());
            } else {
                members.push(format!("base: {}::new()", self.type_path(&base)));
            }
        }
        for field in item.instance_fields() {
            if bound.contains(&field.name) {
                members.push(field.name.clone());
            } else if let Some(init) = &field.init {
                members.push(format!("{}: {init}", field.name));
            } else {
                members.push(format!("{}: Default::default()", field.name));
            }
        }
        if members.is_empty() {
            "Self".to_string()
        } else {
            format!("Self {{ {} }}", members.join(", "))
        }
    }

    /// Implicit canonical constructor of a record
    fn canonical_constructor(&self, item: &Item, method: &mut Method) {
        let mut members = Vec::new();
        for field in item.instance_fields() {
            let by_value = field.node.is_some_and(|node| match self.kind(node) {
                NodeKind::Param { ty, .. } => self.resolve_at(node, ty).is_primitive(),
                _ => false,
            });
            if by_value {
                method.params.push(Param {
                    name: field.name.clone(),
                    ty: field.ty.clone(),
                });
                members.push(field.name.clone());
            } else {
                method.params.push(Param {
                    name: field.name.clone(),
                    ty: format!("&{}", field.ty),
                });
                members.push(format!("{0}: {0}.clone()", field.name));
            }
        }
        method.return_type = Some("Self".to_string());
        let literal = if members.is_empty() {
            "Self".to_string()
        } else {
            format!("Self {{ {} }}", members.join(", "))
        };
        method.body = Some(braced(&literal, self.indent()));
    }

    /// Per-field accessors of an enum, one match arm per constant
    /// How the method `field()` declared in the enum `enum_node` relates to the field
    pub(crate) fn enum_getter(&self, enum_node: NodeId, field: &str) -> Option<EnumGetter> {
        let NodeKind::TypeDecl(decl) = self.kind(enum_node) else {
            return None;
        };
        let method = decl.members.iter().find_map(|m| match self.kind(*m) {
            NodeKind::Method(method) if method.name == field && method.params.is_empty() => Some(method),
            _ => None,
        })?;
        let returned = method.body.and_then(|body| match self.kind(body) {
            NodeKind::Block { stmts } if stmts.len() == 1 => match self.kind(stmts[0]) {
                NodeKind::Return { value } => *value,
                _ => None,
            },
            _ => None,
        });
        let plain = returned.is_some_and(|value| match self.kind(self.tree.unparen(value)) {
            NodeKind::Name { name } => name == field,
            NodeKind::FieldAccess { target, name } => {
                name == field && matches!(self.kind(self.tree.unparen(*target)), NodeKind::This)
            }
            _ => false,
        });
        Some(if plain { EnumGetter::Plain } else { EnumGetter::Custom })
    }

    fn enum_accessors(&mut self, item: &Item) -> Vec<Method> {
        let Some(node) = item.node else {
            return Vec::new();
        };
        let NodeKind::TypeDecl(decl) = self.kind(node) else {
            return Vec::new();
        };
        // constructor parameter lists with the field each parameter initializes
        let mut constructors: Vec<(usize, HashMap<String, usize>)> = Vec::new();
        for member in &decl.members {
            let NodeKind::Constructor(ctor) = self.kind(*member) else {
                continue;
            };
            let param_names: Vec<&str> = ctor
                .params
                .iter()
                .filter_map(|p| match self.kind(*p) {
                    NodeKind::Param { name, .. } => Some(name.as_str()),
                    _ => None,
                })
                .collect();
            let mut fed = HashMap::new();
            if let NodeKind::Block { stmts } = self.kind(ctor.body) {
                for stmt in stmts {
                    let NodeKind::ExprStmt { expr } = self.kind(*stmt) else {
                        continue;
                    };
                    let NodeKind::Assign { target, value, .. } = self.kind(*expr) else {
                        continue;
                    };
                    let (Some(field), NodeKind::Name { name }) =
                        (self.assigned_field(*target), self.kind(self.tree.unparen(*value)))
                    else {
                        continue;
                    };
                    if let Some(position) = param_names.iter().position(|p| p == name) {
                        fed.insert(field, position);
                    }
                }
            }
            constructors.push((param_names.len(), fed));
        }

        let mut accessors = Vec::new();
        for field in item.instance_fields() {
            let mut arms = Vec::new();
            let mut all_literals = true;
            for constant in &decl.constants {
                let NodeKind::EnumConstant { name, args, .. } = self.kind(*constant) else {
                    continue;
                };
                let variant = self
                    .ctx
                    .index
                    .resolve_declaration(self.unit, *constant)
                    .and_then(|id| self.ctx.registry.name_of(&id).map(str::to_string))
                    .unwrap_or_else(|| name.clone());
                let position = constructors
                    .iter()
                    .find(|(arity, _)| *arity == args.len())
                    .and_then(|(_, fed)| fed.get(&field.name).copied());
                let value = match position.and_then(|p| args.get(p)) {
                    Some(arg) => {
                        all_literals &= matches!(
                            self.kind(*arg),
                            NodeKind::Literal { kind: LiteralKind::String, .. }
                        );
                        self.expr(*arg)
                    }
                    None => {
                        all_literals = false;
                        field.init.clone().unwrap_or_else(|| "Default::default()".to_string())
                    }
                };
                arms.push(format!("{}::{variant} => {value},", item.name));
            }
            let return_type = if field.ty == "String" && all_literals && !arms.is_empty() {
                "&'static str".to_string()
            } else {
                field.ty.clone()
            };
            let java_name = match field.node.map(|n| self.kind(n)) {
                Some(NodeKind::Declarator { name, .. }) => name.as_str(),
                _ => field.name.as_str(),
            };
            let name = match self.enum_getter(node, java_name) {
                Some(EnumGetter::Custom) => format!("{}_value", field.name),
                _ => field.name.clone(),
            };
            let mut accessor = Method::new(format!("{}#{}", item.id, field.name), name);
            accessor.visibility = field.visibility;
            accessor.receiver = Receiver::Ref;
            accessor.return_type = Some(return_type);
            let matched = format!("match self {}", braced(&arms.join("\n"), self.indent()));
            accessor.body = Some(braced(&matched, self.indent()));
            accessors.push(accessor);
        }
        accessors
    }

    /// Forwarding methods for instance methods inherited from superclasses
    fn inherited_shims(&self, item: &Item, own: &[Method]) -> Vec<Method> {
        let index = self.ctx.index;
        let mut taken: HashSet<String> = own.iter().map(|m| m.name.clone()).collect();
        let mut signatures: HashSet<(String, usize)> = index
            .type_info(&item.id)
            .map(|info| info.methods.iter().map(|m| (m.name.clone(), m.params.len())).collect())
            .unwrap_or_default();
        let mut shims = Vec::new();
        let mut current = item.id.clone();
        let mut hops = 0;
        while let Some(ResolvedType::Declared { id: base_id, .. }) = index.superclass_of(&current) {
            hops += 1;
            if hops > 32 {
                break;
            }
            let Some(info) = index.type_info(&base_id) else {
                break;
            };
            for inherited in &info.methods {
                if inherited.is_static()
                    || inherited.implicit
                    || inherited.modifiers.visibility == JavaVisibility::Private
                {
                    continue;
                }
                if !signatures.insert((inherited.name.clone(), inherited.params.len())) {
                    continue;
                }
                let name = self
                    .ctx
                    .registry
                    .name_of(&inherited.id)
                    .map(str::to_string)
                    .unwrap_or_else(|| value_name(&inherited.name));
                if !taken.insert(name.clone()) {
                    continue;
                }
                let count = inherited.params.len();
                let params: Vec<Param> = inherited
                    .params
                    .iter()
                    .zip(&inherited.param_names)
                    .enumerate()
                    .map(|(i, (ty, param))| {
                        let ty = if inherited.varargs && i + 1 == count {
                            ty.clone().with_extra_dims(1)
                        } else {
                            ty.clone()
                        };
                        let resolved = index.resolve_in_type(&base_id, &inherited.type_params, &ty);
                        Param {
                            name: value_name(param),
                            ty: self.param_type(&resolved),
                        }
                    })
                    .collect();
                let ret = index.resolve_in_type(&base_id, &inherited.type_params, &inherited.return_type);
                let args: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
                let base_receiver = self.ctx.receivers.receiver_of(&inherited.id);
                let (receiver, call) = match base_receiver {
                    Some(Receiver::None) => (
                        Receiver::None,
                        format!("{}::{name}({})", self.rust_type(&ResolvedType::Declared { id: base_id.clone(), args: Vec::new() }), args.join(", ")),
                    ),
                    other => (
                        other.unwrap_or(Receiver::Ref).max(Receiver::Ref),
                        format!("self{}.{name}({})", ".base".repeat(hops), args.join(", ")),
                    ),
                };

                let mut shim = Method::new(format!("{}#{}", item.id, inherited.id), name);
                shim.visibility = Visibility::from_java(inherited.modifiers.visibility);
                shim.generics = Generics {
                    params: inherited
                        .type_params
                        .iter()
                        .map(|n| GenericParam {
                            name: n.clone(),
                            bounds: Vec::new(),
                        })
                        .collect(),
                };
                shim.receiver = receiver;
                shim.params = params;
                shim.return_type = (ret != ResolvedType::Void).then(|| self.rust_type(&ret));
                shim.thrown = self.thrown_types(&inherited.id);
                shim.body = Some(braced(&call, self.indent()));
                shims.push(shim);
            }
            current = base_id;
        }
        shims
    }
}
