//! Symbol and type resolution.
//!
//! The analysis passes only talk to the [`Resolve`] trait: resolving a written
//! type, the routine invoked by a call site, the stable identifier of a
//! declaration, and the static type of an expression. [`ProjectIndex`] is the
//! implementation built from every parsed unit of a run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{NodeId, PrimitiveType, SyntaxTree, TypeRef};

pub mod index;

#[cfg(test)]
mod tests;

pub use index::{FieldInfo, MethodInfo, ProjectIndex, TypeInfo};

/// Index of a compilation unit within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub usize);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit {}", self.0)
    }
}

/// A node of a specific unit, the context every query is asked from
#[derive(Clone, Copy)]
pub struct Site<'t> {
    pub unit: UnitId,
    pub tree: &'t SyntaxTree,
    pub node: NodeId,
}

impl<'t> Site<'t> {
    pub fn new(unit: UnitId, tree: &'t SyntaxTree, node: NodeId) -> Self {
        Self { unit, tree, node }
    }

    /// Same unit, another node
    pub fn at(&self, node: NodeId) -> Self {
        Self { node, ..*self }
    }
}

pub const JAVA_STRING: &str = "java.lang.String";
pub const JAVA_OBJECT: &str = "java.lang.Object";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedType {
    Primitive(PrimitiveType),
    Void,
    /// A type declared in one of the run's units, by qualified identifier
    Declared { id: String, args: Vec<ResolvedType> },
    /// A type known only by its qualified name (JDK or third-party)
    Library { name: String, args: Vec<ResolvedType> },
    TypeVar(String),
    Array { element: Box<ResolvedType>, dims: usize },
    Unknown(String),
}

impl ResolvedType {
    pub fn library(name: &str) -> Self {
        ResolvedType::Library {
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::library(JAVA_STRING)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, ResolvedType::Primitive(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, ResolvedType::Library { name, .. } if name == JAVA_STRING)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ResolvedType::Unknown(_))
    }

    pub fn array_depth(&self) -> usize {
        match self {
            ResolvedType::Array { dims, .. } => *dims,
            _ => 0,
        }
    }

    /// Innermost element type of an array, or the type itself
    pub fn element(&self) -> &ResolvedType {
        match self {
            ResolvedType::Array { element, .. } => element,
            other => other,
        }
    }

    /// Type of one indexing step into an array
    pub fn index_once(&self) -> ResolvedType {
        match self {
            ResolvedType::Array { element, dims } if *dims > 1 => ResolvedType::Array {
                element: element.clone(),
                dims: dims - 1,
            },
            ResolvedType::Array { element, .. } => (**element).clone(),
            _ => ResolvedType::Unknown(String::new()),
        }
    }

    /// Primitive carried by this type, unboxing wrapper classes
    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            ResolvedType::Primitive(p) => Some(*p),
            ResolvedType::Library { name, .. } if name.starts_with("java.lang.") => {
                PrimitiveType::from_boxed_name(name)
            }
            _ => None,
        }
    }

    /// Declared identifier, if the type lives in the run's sources
    pub fn declared_id(&self) -> Option<&str> {
        match self {
            ResolvedType::Declared { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Last segment of the type's name
    pub fn simple_name(&self) -> String {
        match self {
            ResolvedType::Primitive(p) => p.java_name().to_string(),
            ResolvedType::Void => "void".to_string(),
            ResolvedType::Declared { id, .. } => last_segment(id).to_string(),
            ResolvedType::Library { name, .. } => last_segment(name).to_string(),
            ResolvedType::TypeVar(name) | ResolvedType::Unknown(name) => {
                last_segment(name).to_string()
            }
            ResolvedType::Array { element, dims } => {
                format!("{}{}", element.simple_name(), "[]".repeat(*dims))
            }
        }
    }

    /// Stable key used in thrown-type sets
    pub fn key(&self) -> String {
        match self {
            ResolvedType::Declared { id, .. } => id.clone(),
            ResolvedType::Library { name, .. } => name.clone(),
            other => other.simple_name(),
        }
    }
}

pub fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Routine bound to a call site
#[derive(Debug, Clone, PartialEq)]
pub struct CalleeInfo {
    /// Qualified signature, e.g. `pkg.A.m(int,String)`
    pub id: String,
    /// Declaring type
    pub owner: String,
    pub name: String,
    pub is_static: bool,
    pub is_constructor: bool,
    pub params: Vec<ResolvedType>,
    pub return_type: ResolvedType,
    pub declared_thrown: Vec<ResolvedType>,
}

/// Front-end queries consumed by the analysis passes
pub trait Resolve {
    /// Resolve a written type in the scope of `site`
    fn resolve_type(&self, site: Site<'_>, ty: &TypeRef) -> ResolvedType;

    /// Routine invoked by a call, object creation or constructor invocation
    fn resolve_callee(&self, site: Site<'_>) -> Option<CalleeInfo>;

    /// Stable identifier of a type, method, constructor, field or enum constant
    fn resolve_declaration(&self, unit: UnitId, node: NodeId) -> Option<String>;

    /// Static type of an expression
    fn resolve_expression_type(&self, site: Site<'_>) -> ResolvedType;

    /// Indexed information about a declared type
    fn type_info(&self, id: &str) -> Option<&TypeInfo>;
}
