use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use super::{last_segment, CalleeInfo, Resolve, ResolvedType, Site, UnitId, JAVA_OBJECT};
use crate::ast::{
    BinaryOp, LiteralKind, Modifiers, NodeId, NodeKind, PrimitiveType, SyntaxTree, TypeKind,
    TypeRef, UnaryOp,
};

/// Where simple names are looked up among nested types of the enclosing types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nesting {
    /// Only types declared inside the enclosing types
    Declared,
    /// Also types inherited from their supertypes
    Inherited,
}

/// `java.lang` types visible without an import
const JAVA_LANG: &[&str] = &[
    "ArithmeticException",
    "ArrayIndexOutOfBoundsException",
    "Boolean",
    "Byte",
    "Character",
    "CharSequence",
    "Class",
    "ClassCastException",
    "CloneNotSupportedException",
    "Comparable",
    "Deprecated",
    "Double",
    "Enum",
    "Error",
    "Exception",
    "Float",
    "FunctionalInterface",
    "IllegalArgumentException",
    "IllegalStateException",
    "IndexOutOfBoundsException",
    "Integer",
    "InterruptedException",
    "Iterable",
    "Long",
    "Math",
    "NullPointerException",
    "Number",
    "NumberFormatException",
    "Object",
    "Override",
    "Record",
    "Runnable",
    "RuntimeException",
    "Short",
    "String",
    "StringBuilder",
    "SuppressWarnings",
    "System",
    "Thread",
    "Throwable",
    "UnsupportedOperationException",
    "Void",
];

#[derive(Debug, Clone, Default)]
struct UnitScope {
    package: Option<String>,
    single_imports: HashMap<String, String>,
    wildcard_imports: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub id: String,
    pub name: String,
    /// Declarator node (or enum constant / record component)
    pub node: NodeId,
    pub ty: TypeRef,
    pub is_static: bool,
    pub is_final: bool,
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub id: String,
    pub name: String,
    pub node: NodeId,
    pub params: Vec<TypeRef>,
    pub param_names: Vec<String>,
    pub varargs: bool,
    pub type_params: Vec<String>,
    pub modifiers: Modifiers,
    pub throws: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub has_body: bool,
    /// Generated rather than written (record accessors)
    pub implicit: bool,
}

impl MethodInfo {
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }
}

#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub id: String,
    pub name: String,
    pub kind: TypeKind,
    pub unit: UnitId,
    pub node: NodeId,
    pub outer: Option<String>,
    pub modifiers: Modifiers,
    pub type_params: Vec<String>,
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub methods: Vec<MethodInfo>,
    pub constructors: Vec<MethodInfo>,
    pub fields: Vec<FieldInfo>,
    pub constants: Vec<String>,
    pub nested: Vec<String>,
}

/// Project-wide symbol index over all parsed units of a run
#[derive(Debug, Default)]
pub struct ProjectIndex {
    units: IndexMap<UnitId, UnitScope>,
    types: IndexMap<String, TypeInfo>,
    declarations: HashMap<(UnitId, NodeId), String>,
}

fn signature_id(owner: &str, name: &str, params: &[TypeRef]) -> String {
    let params = params.iter().map(|p| p.to_string()).collect::<Vec<_>>();
    format!("{owner}.{name}({})", params.join(","))
}

impl ProjectIndex {
    pub fn build<'a>(units: impl IntoIterator<Item = (UnitId, &'a SyntaxTree)>) -> Self {
        let mut index = Self::default();
        for (unit, tree) in units {
            index.add_unit(unit, tree);
        }
        debug!(
            "indexed {} type(s) across {} unit(s)",
            index.types.len(),
            index.units.len()
        );
        index
    }

    fn add_unit(&mut self, unit: UnitId, tree: &SyntaxTree) {
        let mut scope = UnitScope::default();
        if let NodeKind::CompilationUnit {
            package,
            imports,
            types,
        } = tree.kind(tree.root())
        {
            scope.package = package.clone();
            for import in imports {
                if let NodeKind::Import {
                    path,
                    is_static: false,
                    wildcard,
                } = tree.kind(*import)
                {
                    if *wildcard {
                        scope.wildcard_imports.push(path.clone());
                    } else {
                        scope
                            .single_imports
                            .insert(last_segment(path).to_string(), path.clone());
                    }
                }
            }
            let package = package.clone();
            for ty in types {
                self.add_type(unit, tree, *ty, None, package.as_deref());
            }
        }
        self.units.insert(unit, scope);
    }

    fn add_type(
        &mut self,
        unit: UnitId,
        tree: &SyntaxTree,
        node: NodeId,
        outer: Option<&str>,
        package: Option<&str>,
    ) {
        let NodeKind::TypeDecl(decl) = tree.kind(node) else {
            return;
        };
        let id = match (outer, package) {
            (Some(outer), _) => format!("{outer}.{}", decl.name),
            (None, Some(package)) => format!("{package}.{}", decl.name),
            (None, None) => decl.name.clone(),
        };
        let is_interface = decl.kind == TypeKind::Interface;
        let mut info = TypeInfo {
            id: id.clone(),
            name: decl.name.clone(),
            kind: decl.kind,
            unit,
            node,
            outer: outer.map(str::to_string),
            modifiers: decl.modifiers.clone(),
            type_params: decl.type_params.iter().map(|p| p.name.clone()).collect(),
            superclass: decl.extends.clone(),
            interfaces: decl.implements.clone(),
            methods: Vec::new(),
            constructors: Vec::new(),
            fields: Vec::new(),
            constants: Vec::new(),
            nested: Vec::new(),
        };
        self.declarations.insert((unit, node), id.clone());

        for component in &decl.components {
            if let NodeKind::Param { ty, name, .. } = tree.kind(*component) {
                let field_id = format!("{id}.{name}");
                self.declarations.insert((unit, *component), field_id.clone());
                info.fields.push(FieldInfo {
                    id: field_id,
                    name: name.clone(),
                    node: *component,
                    ty: ty.clone(),
                    is_static: false,
                    is_final: true,
                });
                info.methods.push(MethodInfo {
                    id: signature_id(&id, name, &[]),
                    name: name.clone(),
                    node: *component,
                    params: Vec::new(),
                    param_names: Vec::new(),
                    varargs: false,
                    type_params: Vec::new(),
                    modifiers: Modifiers {
                        visibility: crate::ast::JavaVisibility::Public,
                        ..Modifiers::default()
                    },
                    throws: Vec::new(),
                    return_type: ty.clone(),
                    has_body: true,
                    implicit: true,
                });
            }
        }

        for constant in &decl.constants {
            if let NodeKind::EnumConstant { name, .. } = tree.kind(*constant) {
                let field_id = format!("{id}.{name}");
                self.declarations.insert((unit, *constant), field_id.clone());
                info.constants.push(name.clone());
                info.fields.push(FieldInfo {
                    id: field_id,
                    name: name.clone(),
                    node: *constant,
                    ty: TypeRef::named(decl.name.clone()),
                    is_static: true,
                    is_final: true,
                });
            }
        }

        let mut nested = Vec::new();
        for member in &decl.members {
            match tree.kind(*member) {
                NodeKind::Field {
                    modifiers,
                    ty,
                    declarators,
                } => {
                    for declarator in declarators {
                        if let NodeKind::Declarator { name, dims, .. } = tree.kind(*declarator) {
                            let field_id = format!("{id}.{name}");
                            self.declarations.insert((unit, *declarator), field_id.clone());
                            info.fields.push(FieldInfo {
                                id: field_id,
                                name: name.clone(),
                                node: *declarator,
                                ty: ty.clone().with_extra_dims(*dims),
                                is_static: modifiers.is_static || is_interface,
                                is_final: modifiers.is_final || is_interface,
                            });
                        }
                    }
                }
                NodeKind::Method(method) => {
                    let (params, param_names, varargs) = param_signature(tree, &method.params);
                    let method_id = signature_id(&id, &method.name, &params);
                    self.declarations.insert((unit, *member), method_id.clone());
                    let mut modifiers = method.modifiers.clone();
                    if is_interface {
                        if modifiers.visibility != crate::ast::JavaVisibility::Private {
                            modifiers.visibility = crate::ast::JavaVisibility::Public;
                        }
                        if method.body.is_none() && !modifiers.is_static {
                            modifiers.is_abstract = true;
                        }
                    }
                    info.methods.push(MethodInfo {
                        id: method_id,
                        name: method.name.clone(),
                        node: *member,
                        params,
                        param_names,
                        varargs,
                        type_params: method.type_params.iter().map(|p| p.name.clone()).collect(),
                        modifiers,
                        throws: method.throws.clone(),
                        return_type: method.return_type.clone(),
                        has_body: method.body.is_some(),
                        implicit: false,
                    });
                }
                NodeKind::Constructor(ctor) => {
                    let (params, param_names, varargs) = param_signature(tree, &ctor.params);
                    let ctor_id = signature_id(&id, "<init>", &params);
                    self.declarations.insert((unit, *member), ctor_id.clone());
                    info.constructors.push(MethodInfo {
                        id: ctor_id,
                        name: "<init>".to_string(),
                        node: *member,
                        params,
                        param_names,
                        varargs,
                        type_params: Vec::new(),
                        modifiers: ctor.modifiers.clone(),
                        throws: ctor.throws.clone(),
                        return_type: TypeRef::Void,
                        has_body: true,
                        implicit: false,
                    });
                }
                NodeKind::TypeDecl(inner) => {
                    nested.push(format!("{id}.{}", inner.name));
                    self.add_type(unit, tree, *member, Some(&id), package);
                }
                _ => {}
            }
        }
        info.nested = nested;
        self.types.insert(id, info);
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.values()
    }

    pub fn contains_type(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// Package of a unit
    pub fn package_of(&self, unit: UnitId) -> Option<&str> {
        self.units.get(&unit).and_then(|u| u.package.as_deref())
    }

    /// Identifier of the type declaration enclosing `site`
    fn owner_at(&self, site: Site<'_>) -> Option<String> {
        let ty = site.tree.enclosing_type(site.node)?;
        self.declarations.get(&(site.unit, ty)).cloned()
    }

    /// Type variables visible at `site`
    fn type_vars_at(&self, site: Site<'_>) -> Vec<String> {
        let mut vars = Vec::new();
        for node in std::iter::once(site.node).chain(site.tree.ancestors(site.node)) {
            match site.tree.kind(node) {
                NodeKind::TypeDecl(decl) => {
                    vars.extend(decl.type_params.iter().map(|p| p.name.clone()))
                }
                NodeKind::Method(method) => {
                    vars.extend(method.type_params.iter().map(|p| p.name.clone()))
                }
                _ => {}
            }
        }
        vars
    }

    /// Type variables visible inside a declared type and one of its routines
    fn type_vars_in(&self, type_id: &str, routine_vars: &[String]) -> Vec<String> {
        let mut vars = routine_vars.to_vec();
        let mut current = self.types.get(type_id);
        while let Some(info) = current {
            vars.extend(info.type_params.iter().cloned());
            current = info.outer.as_deref().and_then(|o| self.types.get(o));
        }
        vars
    }

    fn enclosing_chain(&self, owner: Option<&str>) -> Vec<&TypeInfo> {
        let mut chain = Vec::new();
        let mut current = owner.and_then(|o| self.types.get(o));
        while let Some(info) = current {
            chain.push(info);
            current = info.outer.as_deref().and_then(|o| self.types.get(o));
        }
        chain
    }

    /// Resolve a simple or dotted type name written inside `unit`
    fn resolve_name(
        &self,
        unit: UnitId,
        owner: Option<&str>,
        type_vars: &[String],
        name: &str,
        nesting: Nesting,
    ) -> ResolvedType {
        if let Some((first, rest)) = name.split_once('.') {
            if self.types.contains_key(name) {
                return self.declared(name);
            }
            if let ResolvedType::Declared { id, .. } =
                self.resolve_name(unit, owner, type_vars, first, nesting)
            {
                let nested = format!("{id}.{rest}");
                if self.types.contains_key(&nested) {
                    return self.declared(&nested);
                }
            }
            if first.starts_with(|c: char| c.is_ascii_lowercase()) {
                return ResolvedType::library(name);
            }
            return ResolvedType::Unknown(name.to_string());
        }

        if type_vars.iter().any(|v| v == name) {
            return ResolvedType::TypeVar(name.to_string());
        }

        for info in self.enclosing_chain(owner) {
            if info.name == name {
                return self.declared(&info.id);
            }
            let nested = match nesting {
                Nesting::Inherited => self.find_nested(&info.id, name, &mut HashSet::new()),
                Nesting::Declared => Some(format!("{}.{name}", info.id))
                    .filter(|candidate| self.types.contains_key(candidate)),
            };
            if let Some(found) = nested {
                return self.declared(&found);
            }
        }

        let scope = self.units.get(&unit);
        if let Some(qualified) = scope.and_then(|s| s.single_imports.get(name)) {
            if self.types.contains_key(qualified) {
                return self.declared(qualified);
            }
            return ResolvedType::library(qualified);
        }

        let package = scope.and_then(|s| s.package.as_deref());
        let same_package = match package {
            Some(package) => format!("{package}.{name}"),
            None => name.to_string(),
        };
        if self.types.contains_key(&same_package) {
            return self.declared(&same_package);
        }

        if let Some(scope) = scope {
            for wildcard in &scope.wildcard_imports {
                let candidate = format!("{wildcard}.{name}");
                if self.types.contains_key(&candidate) {
                    return self.declared(&candidate);
                }
            }
        }

        if JAVA_LANG.contains(&name) {
            return ResolvedType::library(&format!("java.lang.{name}"));
        }
        ResolvedType::Unknown(name.to_string())
    }

    fn declared(&self, id: &str) -> ResolvedType {
        ResolvedType::Declared {
            id: id.to_string(),
            args: Vec::new(),
        }
    }

    /// Nested type `name` declared in `type_id` or inherited from its supertypes
    fn find_nested(&self, type_id: &str, name: &str, seen: &mut HashSet<String>) -> Option<String> {
        if !seen.insert(type_id.to_string()) {
            return None;
        }
        let candidate = format!("{type_id}.{name}");
        if self.types.contains_key(&candidate) {
            return Some(candidate);
        }
        for parent in self.direct_supertypes(type_id) {
            if let Some(found) = self.find_nested(&parent, name, seen) {
                return Some(found);
            }
        }
        None
    }

    fn resolve_ref(
        &self,
        unit: UnitId,
        owner: Option<&str>,
        type_vars: &[String],
        ty: &TypeRef,
        nesting: Nesting,
    ) -> ResolvedType {
        match ty {
            TypeRef::Primitive(p) => ResolvedType::Primitive(*p),
            TypeRef::Void => ResolvedType::Void,
            TypeRef::Array { element, dims } => ResolvedType::Array {
                element: Box::new(self.resolve_ref(unit, owner, type_vars, element, nesting)),
                dims: *dims,
            },
            TypeRef::Named { name, args } => {
                let args = args
                    .iter()
                    .map(|a| self.resolve_ref(unit, owner, type_vars, a, nesting))
                    .collect();
                match self.resolve_name(unit, owner, type_vars, name, nesting) {
                    ResolvedType::Declared { id, .. } => ResolvedType::Declared { id, args },
                    ResolvedType::Library { name, .. } => ResolvedType::Library { name, args },
                    other => other,
                }
            }
            TypeRef::Wildcard { bound, .. } => match bound {
                Some(bound) => self.resolve_ref(unit, owner, type_vars, bound, nesting),
                None => ResolvedType::library(JAVA_OBJECT),
            },
            TypeRef::Inferred => ResolvedType::Unknown("var".to_string()),
            TypeRef::Unknown(text) => ResolvedType::Unknown(text.clone()),
        }
    }

    /// Resolve a type written inside a declared type (and optionally one of its routines)
    pub fn resolve_in_type(&self, type_id: &str, routine_vars: &[String], ty: &TypeRef) -> ResolvedType {
        match self.types.get(type_id) {
            Some(info) => {
                let vars = self.type_vars_in(type_id, routine_vars);
                self.resolve_ref(info.unit, Some(type_id), &vars, ty, Nesting::Inherited)
            }
            None => ResolvedType::Unknown(ty.to_string()),
        }
    }

    /// Resolve a written supertype of `type_id`; nested names are not searched
    /// through supertypes, which are what is being computed
    fn resolve_supertype(&self, type_id: &str, ty: &TypeRef) -> ResolvedType {
        match self.types.get(type_id) {
            Some(info) => {
                let vars = self.type_vars_in(type_id, &[]);
                self.resolve_ref(info.unit, Some(type_id), &vars, ty, Nesting::Declared)
            }
            None => ResolvedType::Unknown(ty.to_string()),
        }
    }

    /// Declared superclass and interfaces of a type
    pub fn direct_supertypes(&self, type_id: &str) -> Vec<String> {
        let Some(info) = self.types.get(type_id) else {
            return Vec::new();
        };
        info.superclass
            .iter()
            .chain(info.interfaces.iter())
            .filter_map(|t| match self.resolve_supertype(type_id, t) {
                ResolvedType::Declared { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn superclass_of(&self, type_id: &str) -> Option<ResolvedType> {
        let info = self.types.get(type_id)?;
        let superclass = info.superclass.as_ref()?;
        Some(self.resolve_in_type(type_id, &[], superclass))
    }

    /// Every interface implemented by a type, directly or through supertypes
    pub fn transitive_interfaces(&self, type_id: &str) -> Vec<ResolvedType> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        self.collect_interfaces(type_id, &mut found, &mut seen);
        found
    }

    fn collect_interfaces(
        &self,
        type_id: &str,
        found: &mut Vec<ResolvedType>,
        seen: &mut HashSet<String>,
    ) {
        if !seen.insert(type_id.to_string()) {
            return;
        }
        let Some(info) = self.types.get(type_id) else {
            return;
        };
        for iface in &info.interfaces {
            let resolved = self.resolve_in_type(type_id, &[], iface);
            let key = resolved.key();
            if !found.iter().any(|f: &ResolvedType| f.key() == key) {
                found.push(resolved.clone());
            }
            if let ResolvedType::Declared { id, .. } = &resolved {
                self.collect_interfaces(id, found, seen);
            }
        }
        if let Some(ResolvedType::Declared { id, .. }) = self.superclass_of(type_id) {
            self.collect_interfaces(&id, found, seen);
        }
    }

    /// Field named `name` visible in `type_id`, searching supertypes
    pub fn find_field(&self, type_id: &str, name: &str) -> Option<(&TypeInfo, &FieldInfo)> {
        self.find_field_inner(type_id, name, &mut HashSet::new())
    }

    fn find_field_inner(
        &self,
        type_id: &str,
        name: &str,
        seen: &mut HashSet<String>,
    ) -> Option<(&TypeInfo, &FieldInfo)> {
        if !seen.insert(type_id.to_string()) {
            return None;
        }
        let info = self.types.get(type_id)?;
        if let Some(field) = info.fields.iter().find(|f| f.name == name) {
            return Some((info, field));
        }
        for parent in self.direct_supertypes(type_id) {
            if let Some(found) = self.find_field_inner(&parent, name, seen) {
                return Some(found);
            }
        }
        None
    }

    /// Methods named `name` visible in `type_id`, own declarations first
    pub fn find_methods(&self, type_id: &str, name: &str) -> Vec<(&TypeInfo, &MethodInfo)> {
        let mut found = Vec::new();
        self.collect_methods(type_id, name, &mut found, &mut HashSet::new());
        found
    }

    fn collect_methods<'a>(
        &'a self,
        type_id: &str,
        name: &str,
        found: &mut Vec<(&'a TypeInfo, &'a MethodInfo)>,
        seen: &mut HashSet<String>,
    ) {
        if !seen.insert(type_id.to_string()) {
            return;
        }
        let Some(info) = self.types.get(type_id) else {
            return;
        };
        for method in info.methods.iter().filter(|m| m.name == name) {
            let overridden = found
                .iter()
                .any(|(_, existing)| existing.params == method.params);
            if !overridden {
                found.push((info, method));
            }
        }
        for parent in self.direct_supertypes(type_id) {
            self.collect_methods(&parent, name, found, seen);
        }
    }

    /// Type of a variable visible at `site`: locals, parameters, then fields outward
    fn lookup_variable(&self, site: Site<'_>, name: &str) -> Option<ResolvedType> {
        let tree = site.tree;
        let mut child = site.node;
        for ancestor in tree.ancestors(site.node) {
            let before = tree.range(child).start_byte;
            // a `var` declaration is not visible inside its own initializer
            let declared_before = |ids: &[NodeId]| -> Option<NodeId> {
                ids.iter()
                    .filter(|s| tree.range(**s).start_byte <= before)
                    .filter(|s| **s != child || !is_inferred_local(tree, **s))
                    .find_map(|s| declarator_named(tree, *s, name))
            };
            let found = match tree.kind(ancestor) {
                NodeKind::Block { stmts } => declared_before(stmts),
                NodeKind::SwitchCase { body, .. } => declared_before(body),
                NodeKind::For { init, .. } => declared_before(init),
                NodeKind::Try { resources, .. } => declared_before(resources),
                NodeKind::ForEach { ty, name: var, .. } if var == name => {
                    return Some(self.resolve_type(site.at(ancestor), ty));
                }
                NodeKind::Catch { types, name: var, .. } if var == name => {
                    return Some(match types.first() {
                        Some(ty) => self.resolve_type(site.at(ancestor), ty),
                        None => ResolvedType::Unknown(name.to_string()),
                    });
                }
                NodeKind::Lambda { params, .. } if params.iter().any(|p| p == name) => {
                    return Some(ResolvedType::Unknown(name.to_string()));
                }
                NodeKind::Method(method) => param_named(tree, &method.params, name),
                NodeKind::Constructor(ctor) => param_named(tree, &ctor.params, name),
                NodeKind::TypeDecl(_) => {
                    let type_id = self.declarations.get(&(site.unit, ancestor))?;
                    if let Some((owner, field)) = self.find_field(type_id, name) {
                        return Some(self.resolve_in_type(&owner.id, &[], &field.ty));
                    }
                    None
                }
                _ => None,
            };
            if let Some(decl) = found {
                return Some(self.declared_variable_type(site.at(decl)));
            }
            child = ancestor;
        }
        None
    }

    /// Type of a declarator or parameter node, inferring `var` from its initializer
    fn declared_variable_type(&self, site: Site<'_>) -> ResolvedType {
        let tree = site.tree;
        match tree.kind(site.node) {
            NodeKind::Param { ty, .. } => self.resolve_type(site, ty),
            NodeKind::Declarator { dims, init, .. } => {
                let declared = tree.parent(site.node).and_then(|p| match tree.kind(p) {
                    NodeKind::LocalVar { ty, .. } | NodeKind::Field { ty, .. } => Some(ty.clone()),
                    _ => None,
                });
                match declared {
                    Some(TypeRef::Inferred) | None => match init {
                        Some(init) => self.resolve_expression_type(site.at(*init)),
                        None => ResolvedType::Unknown(String::new()),
                    },
                    Some(ty) => self.resolve_type(site, &ty.with_extra_dims(*dims)),
                }
            }
            _ => ResolvedType::Unknown(String::new()),
        }
    }

    fn receiver_type_id(&self, site: Site<'_>, receiver: NodeId) -> Option<(String, bool)> {
        let tree = site.tree;
        let receiver = tree.unparen(receiver);
        match tree.kind(receiver) {
            NodeKind::This => self.owner_at(site).map(|o| (o, false)),
            NodeKind::Super => {
                let owner = self.owner_at(site)?;
                match self.superclass_of(&owner)? {
                    ResolvedType::Declared { id, .. } => Some((id, false)),
                    _ => None,
                }
            }
            NodeKind::Name { name } if self.lookup_variable(site.at(receiver), name).is_none() => {
                let owner = self.owner_at(site);
                let vars = self.type_vars_at(site);
                match self.resolve_name(site.unit, owner.as_deref(), &vars, name, Nesting::Inherited) {
                    ResolvedType::Declared { id, .. } => Some((id, true)),
                    _ => None,
                }
            }
            _ => match self.resolve_expression_type(site.at(receiver)) {
                ResolvedType::Declared { id, .. } => Some((id, false)),
                _ => None,
            },
        }
    }

    fn pick_overload<'a>(
        &self,
        site: Site<'_>,
        candidates: Vec<(&'a TypeInfo, &'a MethodInfo)>,
        args: &[NodeId],
    ) -> Option<(&'a TypeInfo, &'a MethodInfo)> {
        let applicable: Vec<_> = candidates
            .into_iter()
            .filter(|(_, m)| {
                m.params.len() == args.len()
                    || (m.varargs && args.len() + 1 >= m.params.len())
            })
            .collect();
        if applicable.len() <= 1 {
            return applicable.into_iter().next();
        }
        let arg_types: Vec<ResolvedType> = args
            .iter()
            .map(|a| self.resolve_expression_type(site.at(*a)))
            .collect();
        let mut best = None;
        let mut best_score = i32::MIN;
        for (owner, method) in applicable {
            let score: i32 = method
                .params
                .iter()
                .zip(&arg_types)
                .map(|(param, arg)| {
                    let param = self.resolve_in_type(&owner.id, &method.type_params, param);
                    match_score(&param, arg)
                })
                .sum();
            if score > best_score {
                best_score = score;
                best = Some((owner, method));
            }
        }
        best
    }

    fn callee_info(&self, owner: &TypeInfo, method: &MethodInfo) -> CalleeInfo {
        let resolve = |t: &TypeRef| self.resolve_in_type(&owner.id, &method.type_params, t);
        CalleeInfo {
            id: method.id.clone(),
            owner: owner.id.clone(),
            name: method.name.clone(),
            is_static: method.is_static(),
            is_constructor: method.name == "<init>",
            params: method.params.iter().map(resolve).collect(),
            return_type: resolve(&method.return_type),
            declared_thrown: method.throws.iter().map(resolve).collect(),
        }
    }

    fn constructors_of(&self, type_id: &str) -> Vec<(&TypeInfo, &MethodInfo)> {
        match self.types.get(type_id) {
            Some(info) => info.constructors.iter().map(|c| (info, c)).collect(),
            None => Vec::new(),
        }
    }
}

fn param_signature(tree: &SyntaxTree, params: &[NodeId]) -> (Vec<TypeRef>, Vec<String>, bool) {
    let mut types = Vec::new();
    let mut names = Vec::new();
    let mut varargs = false;
    for param in params {
        if let NodeKind::Param {
            ty,
            name,
            varargs: spread,
            ..
        } = tree.kind(*param)
        {
            types.push(ty.clone());
            names.push(name.clone());
            varargs |= *spread;
        }
    }
    (types, names, varargs)
}

fn declarator_named(tree: &SyntaxTree, stmt: NodeId, name: &str) -> Option<NodeId> {
    match tree.kind(stmt) {
        NodeKind::LocalVar { declarators, .. } => declarators.iter().copied().find(|d| {
            matches!(tree.kind(*d), NodeKind::Declarator { name: n, .. } if n == name)
        }),
        _ => None,
    }
}

fn is_inferred_local(tree: &SyntaxTree, stmt: NodeId) -> bool {
    matches!(tree.kind(stmt), NodeKind::LocalVar { ty: TypeRef::Inferred, .. })
}

fn param_named(tree: &SyntaxTree, params: &[NodeId], name: &str) -> Option<NodeId> {
    params
        .iter()
        .copied()
        .find(|p| matches!(tree.kind(*p), NodeKind::Param { name: n, .. } if n == name))
}

fn numeric_rank(p: PrimitiveType) -> Option<u8> {
    match p {
        PrimitiveType::Byte => Some(1),
        PrimitiveType::Short | PrimitiveType::Char => Some(2),
        PrimitiveType::Int => Some(3),
        PrimitiveType::Long => Some(4),
        PrimitiveType::Float => Some(5),
        PrimitiveType::Double => Some(6),
        PrimitiveType::Boolean => None,
    }
}

fn match_score(param: &ResolvedType, arg: &ResolvedType) -> i32 {
    match (param.as_primitive(), arg.as_primitive()) {
        (Some(p), Some(a)) if p == a => return 3,
        (Some(p), Some(a)) => {
            return match (numeric_rank(p), numeric_rank(a)) {
                (Some(pr), Some(ar)) if pr > ar => 1,
                _ => -5,
            }
        }
        _ => {}
    }
    match (param, arg) {
        (_, ResolvedType::Unknown(_)) => 0,
        (ResolvedType::TypeVar(_), _) => 1,
        (ResolvedType::Library { name, .. }, _) if name == JAVA_OBJECT => 1,
        (p, a) if p.key() == a.key() && p.array_depth() == a.array_depth() => 3,
        (ResolvedType::Declared { .. }, ResolvedType::Declared { .. }) => 0,
        _ => -5,
    }
}

/// Binary numeric promotion
fn promote(left: &ResolvedType, right: &ResolvedType) -> ResolvedType {
    match (left.as_primitive(), right.as_primitive()) {
        (Some(l), Some(r)) => {
            let rank = |p| numeric_rank(p).unwrap_or(0);
            let wider = if rank(l) >= rank(r) { l } else { r };
            ResolvedType::Primitive(if rank(wider) < 3 {
                PrimitiveType::Int
            } else {
                wider
            })
        }
        (Some(l), None) => ResolvedType::Primitive(l),
        (None, Some(r)) => ResolvedType::Primitive(r),
        (None, None) => ResolvedType::Unknown(String::new()),
    }
}

impl Resolve for ProjectIndex {
    fn resolve_type(&self, site: Site<'_>, ty: &TypeRef) -> ResolvedType {
        let owner = self.owner_at(site);
        let vars = self.type_vars_at(site);
        self.resolve_ref(site.unit, owner.as_deref(), &vars, ty, Nesting::Inherited)
    }

    fn resolve_callee(&self, site: Site<'_>) -> Option<CalleeInfo> {
        let tree = site.tree;
        let chosen = match tree.kind(site.node) {
            NodeKind::Call {
                receiver,
                name,
                args,
            } => {
                let candidates = match receiver {
                    None => {
                        let owner = self.owner_at(site);
                        self.enclosing_chain(owner.as_deref())
                            .into_iter()
                            .map(|info| self.find_methods(&info.id, name))
                            .find(|found| !found.is_empty())
                            .unwrap_or_default()
                    }
                    Some(receiver) => match self.receiver_type_id(site, *receiver) {
                        Some((type_id, _)) => self.find_methods(&type_id, name),
                        None => Vec::new(),
                    },
                };
                self.pick_overload(site, candidates, args)
            }
            NodeKind::New { ty, args, .. } => match self.resolve_type(site, ty) {
                ResolvedType::Declared { id, .. } => {
                    self.pick_overload(site, self.constructors_of(&id), args)
                }
                _ => None,
            },
            NodeKind::CtorCall { is_super, args } => {
                let owner = self.owner_at(site)?;
                let target = if *is_super {
                    match self.superclass_of(&owner)? {
                        ResolvedType::Declared { id, .. } => id,
                        _ => return None,
                    }
                } else {
                    owner
                };
                self.pick_overload(site, self.constructors_of(&target), args)
            }
            _ => None,
        };
        chosen.map(|(owner, method)| self.callee_info(owner, method))
    }

    fn resolve_declaration(&self, unit: UnitId, node: NodeId) -> Option<String> {
        self.declarations.get(&(unit, node)).cloned()
    }

    fn resolve_expression_type(&self, site: Site<'_>) -> ResolvedType {
        let tree = site.tree;
        match tree.kind(site.node) {
            NodeKind::Literal { kind, .. } => match kind {
                LiteralKind::Int => ResolvedType::Primitive(PrimitiveType::Int),
                LiteralKind::Long => ResolvedType::Primitive(PrimitiveType::Long),
                LiteralKind::Float => ResolvedType::Primitive(PrimitiveType::Float),
                LiteralKind::Double => ResolvedType::Primitive(PrimitiveType::Double),
                LiteralKind::Char => ResolvedType::Primitive(PrimitiveType::Char),
                LiteralKind::Bool => ResolvedType::Primitive(PrimitiveType::Boolean),
                LiteralKind::String | LiteralKind::TextBlock => ResolvedType::string(),
                LiteralKind::Null => ResolvedType::Unknown("null".to_string()),
            },
            NodeKind::Name { name } => self
                .lookup_variable(site, name)
                .unwrap_or_else(|| ResolvedType::Unknown(name.clone())),
            NodeKind::This => match self.owner_at(site) {
                Some(owner) => self.declared(&owner),
                None => ResolvedType::Unknown("this".to_string()),
            },
            NodeKind::FieldAccess { target, name } => {
                let target_type = self.resolve_expression_type(site.at(*target));
                if name == "length" && target_type.array_depth() > 0 {
                    return ResolvedType::Primitive(PrimitiveType::Int);
                }
                let type_id = match target_type {
                    ResolvedType::Declared { id, .. } => Some(id),
                    _ => self.receiver_type_id(site, *target).map(|(id, _)| id),
                };
                type_id
                    .and_then(|id| {
                        self.find_field(&id, name)
                            .map(|(owner, field)| self.resolve_in_type(&owner.id, &[], &field.ty))
                    })
                    .unwrap_or_else(|| ResolvedType::Unknown(name.clone()))
            }
            NodeKind::ArrayAccess { array, .. } => {
                self.resolve_expression_type(site.at(*array)).index_once()
            }
            NodeKind::Call { name, .. } => match self.resolve_callee(site) {
                Some(callee) => callee.return_type,
                None => ResolvedType::Unknown(name.clone()),
            },
            NodeKind::New { ty, .. } => self.resolve_type(site, ty),
            NodeKind::NewArray {
                element,
                dims,
                extra_dims,
                init,
            } => {
                let depth = dims.len() + extra_dims;
                let depth = if depth == 0 && init.is_some() { 1 } else { depth };
                ResolvedType::Array {
                    element: Box::new(self.resolve_type(site, element)),
                    dims: depth,
                }
            }
            NodeKind::Cast { ty, .. } => self.resolve_type(site, ty),
            NodeKind::Paren { expr } => self.resolve_expression_type(site.at(*expr)),
            NodeKind::Conditional {
                then_expr,
                else_expr,
                ..
            } => match self.resolve_expression_type(site.at(*then_expr)) {
                ResolvedType::Unknown(_) => self.resolve_expression_type(site.at(*else_expr)),
                known => known,
            },
            NodeKind::Assign { target, .. } => self.resolve_expression_type(site.at(*target)),
            NodeKind::Binary { op, left, right } => {
                if op.is_comparison() || op.is_logical() {
                    return ResolvedType::Primitive(PrimitiveType::Boolean);
                }
                let l = self.resolve_expression_type(site.at(*left));
                let r = self.resolve_expression_type(site.at(*right));
                if *op == BinaryOp::Add && (l.is_string() || r.is_string()) {
                    return ResolvedType::string();
                }
                if op.is_shift() {
                    return promote(&l, &ResolvedType::Primitive(PrimitiveType::Int));
                }
                if op.is_bitwise()
                    && (l.as_primitive() == Some(PrimitiveType::Boolean)
                        || r.as_primitive() == Some(PrimitiveType::Boolean))
                {
                    return ResolvedType::Primitive(PrimitiveType::Boolean);
                }
                promote(&l, &r)
            }
            NodeKind::Unary { op, operand } => match op {
                UnaryOp::Not => ResolvedType::Primitive(PrimitiveType::Boolean),
                _ => promote(
                    &self.resolve_expression_type(site.at(*operand)),
                    &ResolvedType::Primitive(PrimitiveType::Int),
                ),
            },
            NodeKind::Update { operand, .. } => self.resolve_expression_type(site.at(*operand)),
            NodeKind::InstanceOf { .. } => ResolvedType::Primitive(PrimitiveType::Boolean),
            NodeKind::ClassLiteral { .. } => ResolvedType::library("java.lang.Class"),
            other => ResolvedType::Unknown(other.label().to_string()),
        }
    }

    fn type_info(&self, id: &str) -> Option<&TypeInfo> {
        self.types.get(id)
    }
}
