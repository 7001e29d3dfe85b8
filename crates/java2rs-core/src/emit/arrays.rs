// Array creation: fixed-size arrays for literal extents, vectors otherwise
use crate::ast::{LiteralKind, NodeId, NodeKind};
use crate::resolve::ResolvedType;

use super::expr::integer_literal;
use super::Emitter;

impl Emitter<'_, '_> {
    /// Extents of `new T[2][3]` when every dimension is an integer literal
    pub(crate) fn literal_extents(&self, node: NodeId) -> Option<Vec<String>> {
        let NodeKind::NewArray {
            dims,
            extra_dims: 0,
            init: None,
            ..
        } = self.kind(self.tree.unparen(node))
        else {
            return None;
        };
        if dims.is_empty() {
            return None;
        }
        dims.iter()
            .map(|d| match self.kind(*d) {
                NodeKind::Literal {
                    kind: LiteralKind::Int,
                    text,
                } => Some(integer_literal(text)),
                _ => None,
            })
            .collect()
    }

    /// `[[T; 3]; 2]` for the extents of a fixed-size creation
    pub(crate) fn fixed_array_type(&self, element: &ResolvedType, extents: &[String]) -> String {
        extents
            .iter()
            .rev()
            .fold(self.rust_type(element), |inner, extent| format!("[{inner}; {extent}]"))
    }

    pub(crate) fn new_array(&mut self, node: NodeId) -> String {
        let NodeKind::NewArray {
            element,
            dims,
            extra_dims,
            init,
        } = self.kind(node)
        else {
            return self.unsupported(node);
        };
        if let Some(init) = init {
            return self.expr(*init);
        }
        let element = self.resolve_at(node, element);
        let default = self.default_value(&element);
        if let Some(extents) = self.literal_extents(node) {
            return extents
                .iter()
                .rev()
                .fold(default, |inner, extent| format!("[{inner}; {extent}]"));
        }
        let mut value = if *extra_dims > 0 {
            "Vec::new()".to_string()
        } else {
            default
        };
        for dim in dims.iter().rev() {
            value = format!("vec![{value}; {}]", self.extent(*dim));
        }
        value
    }

    fn extent(&mut self, dim: NodeId) -> String {
        match self.kind(dim) {
            NodeKind::Literal {
                kind: LiteralKind::Int,
                text,
            } => integer_literal(text),
            _ => format!("({}) as usize", self.expr(dim)),
        }
    }

    pub(crate) fn array_init(&mut self, elements: &[NodeId]) -> String {
        let items: Vec<String> = elements.iter().map(|e| self.expr(*e)).collect();
        format!("vec![{}]", items.join(", "))
    }
}
