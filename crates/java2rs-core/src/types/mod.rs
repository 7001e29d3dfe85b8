// Inferred value types and the per-unit node -> type table
use serde::{Deserialize, Serialize};

use crate::ast::{NodeId, NodeKind, PrimitiveType, SyntaxTree};
use crate::resolve::ResolvedType;

pub mod infer;

#[cfg(test)]
mod tests;

pub use infer::infer_types;

/// Coarse value category driving emission decisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    Char,
    Integral,
    Floating,
    Text,
    /// Any other reference type, by resolved key
    Reference(String),
}

impl ValueType {
    pub fn from_primitive(p: PrimitiveType) -> Self {
        match p {
            PrimitiveType::Boolean => ValueType::Boolean,
            PrimitiveType::Char => ValueType::Char,
            PrimitiveType::Float | PrimitiveType::Double => ValueType::Floating,
            PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Int | PrimitiveType::Long => {
                ValueType::Integral
            }
        }
    }

    /// Category of a resolved type; `None` when nothing is known
    pub fn from_resolved(ty: &ResolvedType) -> Option<Self> {
        if ty.is_string() {
            return Some(ValueType::Text);
        }
        if let Some(p) = ty.as_primitive() {
            return Some(Self::from_primitive(p));
        }
        match ty {
            ResolvedType::Void | ResolvedType::Unknown(_) => None,
            other => Some(ValueType::Reference(other.key())),
        }
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, ValueType::Floating)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ValueType::Text)
    }

    /// Integral or char, the operands promoted to integers in arithmetic
    pub fn is_integral(&self) -> bool {
        matches!(self, ValueType::Integral | ValueType::Char)
    }
}

/// Array nesting depth plus the resolved type of a declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescription {
    pub depth: usize,
    /// Category of the element type
    pub value: Option<ValueType>,
    pub resolved: ResolvedType,
}

impl TypeDescription {
    pub fn of(resolved: ResolvedType) -> Self {
        Self {
            depth: resolved.array_depth(),
            value: ValueType::from_resolved(resolved.element()),
            resolved,
        }
    }

    pub fn unknown() -> Self {
        Self::of(ResolvedType::Unknown(String::new()))
    }

    /// Primitive scalar, passed and bound by value
    pub fn is_primitive_scalar(&self) -> bool {
        self.depth == 0 && self.resolved.is_primitive()
    }
}

/// Node-indexed inferred types of one unit
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    entries: Vec<Option<ValueType>>,
}

impl TypeTable {
    pub fn new(node_count: usize) -> Self {
        Self {
            entries: vec![None; node_count],
        }
    }

    pub fn get(&self, node: NodeId) -> Option<&ValueType> {
        self.entries.get(node.index()).and_then(Option::as_ref)
    }

    /// Record a type; an existing entry only changes from integral to floating
    pub fn put(&mut self, node: NodeId, ty: ValueType) {
        let index = node.index();
        if index >= self.entries.len() {
            self.entries.resize(index + 1, None);
        }
        let replace = match &self.entries[index] {
            None => true,
            Some(existing) => existing.is_integral() && ty.is_floating(),
        };
        if replace {
            self.entries[index] = Some(ty);
        }
    }

    pub fn is_floating(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(ValueType::is_floating)
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(ValueType::is_text)
    }

    /// Whether an integer literal at `node` sits in a floating context: the
    /// node itself, an ancestor or a sibling carries a floating type. The walk
    /// stops at declarators (checked), and at calls, array creation or access,
    /// and statements (not checked).
    pub fn floating_context(&self, tree: &SyntaxTree, node: NodeId) -> bool {
        if self.is_floating(node) {
            return true;
        }
        let mut current = node;
        while let Some(parent) = tree.parent(current) {
            let kind = tree.kind(parent);
            match kind {
                NodeKind::Declarator { .. } => return self.is_floating(parent),
                NodeKind::Call { .. }
                | NodeKind::New { .. }
                | NodeKind::NewArray { .. }
                | NodeKind::ArrayAccess { .. } => return false,
                _ if kind.is_statement() => return false,
                _ => {}
            }
            if self.is_floating(parent) {
                return true;
            }
            let sibling_floating = tree
                .children(parent)
                .iter()
                .any(|s| *s != current && self.is_floating(*s));
            if sibling_floating {
                return true;
            }
            current = parent;
        }
        false
    }
}
