// Declare phase: item skeletons and registry names for one unit
use std::collections::HashMap;

use tracing::debug;

use super::{Field, Item, ItemKind, Method, Module, Receiver, Variant, Visibility};
use crate::ast::{NodeId, NodeKind, SyntaxTree, TypeKind};
use crate::emit::comments::leading_comments;
use crate::naming::registry::overload_name;
use crate::naming::{
    escape_keyword, snake_if_necessary, to_pascal_case, to_screaming_snake_case, value_name,
    NameRegistry, RegistryError,
};
use crate::resolve::{Resolve, UnitId};

/// Create the module skeleton of a unit and register every declared name.
///
/// Runs once per unit, before any unit is analyzed, so cross-unit references
/// find their names regardless of declaration order.
pub fn declare_unit(
    unit: UnitId,
    tree: &SyntaxTree,
    resolver: &dyn Resolve,
    registry: &mut NameRegistry,
    module_path: &str,
) -> Result<Module, RegistryError> {
    let mut module = Module::new(module_path);
    let mut declarer = Declarer {
        unit,
        tree,
        resolver,
        registry,
        module_path,
        items: Vec::new(),
    };
    if let NodeKind::CompilationUnit {
        package,
        imports,
        types,
    } = tree.kind(tree.root())
    {
        module.package = package.clone();
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
                module.imports.push(text);
            }
        }
        for ty in types {
            declarer.declare_type(*ty, "")?;
        }
    }
    module.items = declarer.items;
    debug!("{unit}: declared {} item(s) in {module_path}", module.items.len());
    Ok(module)
}

struct Declarer<'a> {
    unit: UnitId,
    tree: &'a SyntaxTree,
    resolver: &'a dyn Resolve,
    registry: &'a mut NameRegistry,
    module_path: &'a str,
    items: Vec<Item>,
}

fn item_kind(kind: TypeKind) -> ItemKind {
    match kind {
        TypeKind::Class => ItemKind::Class,
        TypeKind::Interface => ItemKind::Trait,
        TypeKind::Enum => ItemKind::Enum,
        TypeKind::Record => ItemKind::Record,
    }
}

impl Declarer<'_> {
    fn id_of(&self, node: NodeId) -> Option<String> {
        self.resolver.resolve_declaration(self.unit, node)
    }

    fn declare_type(&mut self, node: NodeId, outer: &str) -> Result<(), RegistryError> {
        let tree = self.tree;
        let NodeKind::TypeDecl(decl) = tree.kind(node) else {
            return Ok(());
        };
        let Some(id) = self.id_of(node) else {
            return Ok(());
        };
        let name = format!("{outer}{}", decl.name);
        self.registry.register_in(&id, &name, self.module_path)?;

        let kind = item_kind(decl.kind);
        let in_trait = kind == ItemKind::Trait;
        let mut item = Item::new(id.clone(), self.unit, kind, name.clone());
        item.node = Some(node);
        item.visibility = Visibility::from_java(decl.modifiers.visibility);
        item.docs = leading_comments(tree, node);

        for constant in &decl.constants {
            if let NodeKind::EnumConstant { name: constant_name, body, .. } = tree.kind(*constant) {
                let variant = to_pascal_case(constant_name);
                if let Some(constant_id) = self.id_of(*constant) {
                    self.registry.register(&constant_id, &variant)?;
                }
                item.variants.push(Variant {
                    name: variant,
                    node: Some(*constant),
                    note: (!body.is_empty()).then(|| "constant body not translated".to_string()),
                    docs: leading_comments(tree, *constant),
                });
            }
        }

        for component in &decl.components {
            let NodeKind::Param { name: component_name, .. } = tree.kind(*component) else {
                continue;
            };
            let Some(field_id) = self.id_of(*component) else {
                continue;
            };
            let field_name = value_name(component_name);
            self.registry.register(&field_id, &field_name)?;
            let mut field = Field::new(field_id, field_name.clone());
            field.node = Some(*component);
            field.visibility = Visibility::Public;
            item.fields.push(field);

            let explicit = decl.members.iter().any(|m| {
                matches!(tree.kind(*m), NodeKind::Method(method) if method.name == *component_name && method.params.is_empty())
            });
            if !explicit {
                let accessor_id = format!("{id}.{component_name}()");
                self.registry.register(&accessor_id, &field_name)?;
                let mut accessor = Method::new(accessor_id, field_name);
                accessor.node = Some(*component);
                accessor.visibility = Visibility::Public;
                accessor.receiver = Receiver::Ref;
                item.methods.push(accessor);
            }
        }

        let mut overloads: HashMap<String, usize> = HashMap::new();
        let mut nested = Vec::new();
        for member in &decl.members {
            match tree.kind(*member) {
                NodeKind::Field {
                    modifiers,
                    declarators,
                    ..
                } => {
                    let is_static = modifiers.is_static || in_trait;
                    for declarator in declarators {
                        let NodeKind::Declarator { name: field_name, .. } = tree.kind(*declarator) else {
                            continue;
                        };
                        let Some(field_id) = self.id_of(*declarator) else {
                            continue;
                        };
                        let rust_name = if is_static {
                            to_screaming_snake_case(field_name)
                        } else {
                            value_name(field_name)
                        };
                        self.registry.register(&field_id, &rust_name)?;
                        let mut field = Field::new(field_id, rust_name);
                        field.node = Some(*declarator);
                        field.is_static = is_static;
                        field.visibility = Visibility::from_java(modifiers.visibility);
                        field.docs = leading_comments(tree, *member);
                        item.fields.push(field);
                    }
                }
                NodeKind::Method(method) => {
                    let Some(method_id) = self.id_of(*member) else {
                        continue;
                    };
                    let ordinal = overloads.entry(method.name.clone()).or_insert(0);
                    let rust_name =
                        escape_keyword(&overload_name(&snake_if_necessary(&method.name), *ordinal));
                    *ordinal += 1;
                    self.registry.register(&method_id, &rust_name)?;
                    let mut entry = Method::new(method_id, rust_name);
                    entry.node = Some(*member);
                    entry.is_static = method.modifiers.is_static;
                    entry.visibility = if in_trait {
                        Visibility::Private
                    } else {
                        Visibility::from_java(method.modifiers.visibility)
                    };
                    entry.docs = leading_comments(tree, *member);
                    item.methods.push(entry);
                }
                NodeKind::Constructor(_) => {
                    let Some(ctor_id) = self.id_of(*member) else {
                        continue;
                    };
                    let ordinal = overloads.entry("<init>".to_string()).or_insert(0);
                    let rust_name = overload_name("new", *ordinal);
                    *ordinal += 1;
                    self.registry.register(&ctor_id, &rust_name)?;
                    let mut entry = Method::new(ctor_id, rust_name);
                    entry.node = Some(*member);
                    entry.is_static = true;
                    entry.is_constructor = true;
                    entry.visibility = Visibility::Public;
                    entry.docs = leading_comments(tree, *member);
                    item.methods.push(entry);
                }
                NodeKind::TypeDecl(_) => nested.push(*member),
                _ => {}
            }
        }

        // records without a canonical constructor get one
        if kind == ItemKind::Record {
            let arity = decl.components.len();
            let has_canonical = decl.members.iter().any(|m| {
                matches!(tree.kind(*m), NodeKind::Constructor(ctor) if ctor.params.len() == arity)
            });
            if !has_canonical && !overloads.contains_key("<init>") {
                let mut ctor = Method::new(format!("{id}.<init>"), "new");
                ctor.is_static = true;
                ctor.is_constructor = true;
                ctor.visibility = Visibility::Public;
                item.methods.insert(0, ctor);
            }
        }

        self.items.push(item);
        for inner in nested {
            self.declare_type(inner, &name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::{JavaParser, Parser};
    use crate::resolve::ProjectIndex;

    fn declare(source: &str) -> (Module, NameRegistry) {
        let tree = JavaParser::new().unwrap().parse(source).unwrap();
        let index = ProjectIndex::build([(UnitId(0), &tree)]);
        let mut registry = NameRegistry::new();
        let module = declare_unit(UnitId(0), &tree, &index, &mut registry, "crate").unwrap();
        (module, registry)
    }

    #[test]
    fn overloads_and_constructors_get_suffixes() {
        let (module, registry) = declare(
            "class A { A() {} A(int x) {} void run() {} void run(int n) {} int getValue() { return 0; } }",
        );
        let names: Vec<&str> = module.items[0].methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["new", "new_1", "run", "run_1", "get_value"]);
        assert_eq!(registry.name_of("A.run(int)"), Some("run_1"));
        assert_eq!(registry.name_of("A.<init>(int)"), Some("new_1"));
    }

    #[test]
    fn nested_types_are_flattened() {
        let (module, registry) = declare("package p; public class Outer { static class Inner {} }");
        let names: Vec<&str> = module.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Outer", "OuterInner"]);
        assert_eq!(registry.module_of("p.Outer.Inner"), Some("crate"));
        assert_eq!(module.items[0].visibility, Visibility::Public);
        assert_eq!(module.package.as_deref(), Some("p"));
    }

    #[test]
    fn fields_and_constants_are_named() {
        let (module, _) = declare(
            "class A { static final int maxSize = 3; private String userName; }\ninterface I { int LIMIT = 1; }",
        );
        let fields: Vec<(&str, bool)> = module.items[0]
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.is_static))
            .collect();
        assert_eq!(fields, vec![("MAX_SIZE", true), ("user_name", false)]);
        assert!(module.items[1].fields[0].is_static);
        assert_eq!(module.items[1].kind, ItemKind::Trait);
    }

    #[test]
    fn enum_constants_become_variants() {
        let (module, registry) = declare("enum Color { RED, DARK_BLUE }");
        let variants: Vec<&str> = module.items[0].variants.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(variants, vec!["Red", "DarkBlue"]);
        assert_eq!(registry.name_of("Color.DARK_BLUE"), Some("DarkBlue"));
    }

    #[test]
    fn records_get_accessors_and_canonical_constructor() {
        let (module, registry) = declare("record Point(int x, int y) {}");
        let item = &module.items[0];
        let methods: Vec<&str> = item.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["new", "x", "y"]);
        assert!(item.fields.iter().all(|f| f.visibility == Visibility::Public));
        assert_eq!(registry.name_of("Point.x()"), Some("x"));
    }

    #[test]
    fn duplicate_type_is_a_registry_error() {
        let tree = JavaParser::new().unwrap().parse("class A {}").unwrap();
        let index = ProjectIndex::build([(UnitId(0), &tree)]);
        let mut registry = NameRegistry::new();
        declare_unit(UnitId(0), &tree, &index, &mut registry, "crate::a").unwrap();
        let err = declare_unit(UnitId(0), &tree, &index, &mut registry, "crate::b").unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
    }

    #[test]
    fn doc_comments_attach_to_items() {
        let (module, _) = declare("/** A widget. */\nclass W {\n  // counter\n  int n;\n}");
        assert_eq!(module.items[0].docs, vec!["/// A widget."]);
        assert_eq!(module.items[0].fields[0].docs, vec!["// counter"]);
    }
}
