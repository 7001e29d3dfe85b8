//! Target item model.
//!
//! An in-memory mirror of the Rust program being generated. Skeletons are
//! created while units are declared ([`declare`]); the emitter later fills in
//! every resolved type, initializer and body text exactly once; [`render`]
//! turns the finished model into source text.

use serde::Serialize;

use crate::ast::{JavaVisibility, NodeId};
use crate::resolve::UnitId;

pub mod declare;
pub mod render;

#[cfg(test)]
mod render_tests;

pub use declare::declare_unit;
pub use render::ToRust;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    /// Public and protected members are exported; package-private and private are not
    pub fn from_java(visibility: JavaVisibility) -> Self {
        match visibility {
            JavaVisibility::Public | JavaVisibility::Protected => Visibility::Public,
            JavaVisibility::Package | JavaVisibility::Private => Visibility::Private,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Visibility::Public => "pub ",
            Visibility::Private => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenericParam {
    pub name: String,
    /// Rendered trait bounds
    pub bounds: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Generics {
    pub params: Vec<GenericParam>,
}

impl Generics {
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// `<B, C, E>`: the parameter list of a type header
    pub fn names(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }
        let names: Vec<&str> = self.params.iter().map(|p| p.name.as_str()).collect();
        format!("<{}>", names.join(", "))
    }

    /// `<B, C: D, E>`: the parameter list of an impl or fn header
    pub fn bounded(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                if p.bounds.is_empty() {
                    p.name.clone()
                } else {
                    format!("{}: {}", p.name, p.bounds.join(" + "))
                }
            })
            .collect();
        format!("<{}>", params.join(", "))
    }
}

/// How a method takes its receiver, ordered by strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub enum Receiver {
    #[default]
    None,
    Ref,
    Mut,
}

impl Receiver {
    pub fn as_param(self) -> Option<&'static str> {
        match self {
            Receiver::None => None,
            Receiver::Ref => Some("&self"),
            Receiver::Mut => Some("&mut self"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    /// Symbol identifier, e.g. `pkg.A.m(int)`
    pub id: String,
    pub node: Option<NodeId>,
    pub name: String,
    pub visibility: Visibility,
    pub generics: Generics,
    pub receiver: Receiver,
    pub params: Vec<Param>,
    /// `None` for void
    pub return_type: Option<String>,
    /// Rendered thrown types
    pub thrown: Vec<String>,
    /// Block text; `None` renders a signature ending in `;`
    pub body: Option<String>,
    pub is_static: bool,
    pub is_constructor: bool,
    pub docs: Vec<String>,
}

impl Method {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node: None,
            name: name.into(),
            visibility: Visibility::Private,
            generics: Generics::default(),
            receiver: Receiver::None,
            params: Vec::new(),
            return_type: None,
            thrown: Vec::new(),
            body: None,
            is_static: false,
            is_constructor: false,
            docs: Vec::new(),
        }
    }

    /// Error type of the `Result` return: the single thrown type, or a boxed error
    pub fn error_type(&self) -> Option<String> {
        match self.thrown.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            _ => Some("Box<dyn std::error::Error>".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub id: String,
    pub node: Option<NodeId>,
    pub name: String,
    pub visibility: Visibility,
    pub ty: String,
    pub init: Option<String>,
    pub is_static: bool,
    pub docs: Vec<String>,
}

impl Field {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node: None,
            name: name.into(),
            visibility: Visibility::Private,
            ty: String::new(),
            init: None,
            is_static: false,
            docs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub name: String,
    pub node: Option<NodeId>,
    /// Trailing marker text, e.g. for an untranslated constant body
    pub note: Option<String>,
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemKind {
    Class,
    Enum,
    Record,
    Trait,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    /// Symbol identifier of the source type
    pub id: String,
    #[serde(skip)]
    pub unit: UnitId,
    pub node: Option<NodeId>,
    pub kind: ItemKind,
    pub name: String,
    pub visibility: Visibility,
    pub generics: Generics,
    /// Embedded superclass type, rendered as the `base` field
    pub base: Option<String>,
    /// Implemented traits, one empty conformance block each
    pub traits: Vec<String>,
    /// Supertraits of a trait item
    pub supertraits: Vec<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub variants: Vec<Variant>,
    pub docs: Vec<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, unit: UnitId, kind: ItemKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            unit,
            node: None,
            kind,
            name: name.into(),
            visibility: Visibility::Private,
            generics: Generics::default(),
            base: None,
            traits: Vec::new(),
            supertraits: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            variants: Vec::new(),
            docs: Vec::new(),
        }
    }

    pub fn instance_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_static)
    }

    pub fn static_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_static)
    }

    pub fn method_mut(&mut self, id: &str) -> Option<&mut Method> {
        self.methods.iter_mut().find(|m| m.id == id)
    }

    pub fn field_mut(&mut self, id: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.id == id)
    }
}

/// One generated Rust module, the counterpart of a compilation unit
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Module {
    /// Path such as `crate::shapes::circle`
    pub path: String,
    pub visibility: Visibility,
    /// Source package, echoed as a header comment
    pub package: Option<String>,
    /// Source imports, echoed as header comments
    pub imports: Vec<String>,
    /// Child module names declared with `pub mod`
    pub submodules: Vec<String>,
    pub items: Vec<Item>,
    /// Comment lines preceding the first item
    pub docs: Vec<String>,
}

impl Module {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            visibility: Visibility::Public,
            ..Self::default()
        }
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn item_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }
}
