//! Emission engine.
//!
//! Renders method bodies, initializers and declarations of one unit into
//! Rust text, filling the unit's [`Module`] skeleton. Emission assumes the
//! scope model, the type table and the name registry are complete; it reads
//! them and never mutates another unit's state.
//!
//! Unknown constructs never abort a unit: they become inline
//! `/* unsupported ... */` markers, and unresolvable names are echoed behind
//! a `/* unresolved */` marker.

use std::collections::HashSet;

use tracing::debug;

use crate::ast::{NodeId, NodeKind, SyntaxTree};
use crate::exceptions::ThrowAnalysis;
use crate::model::Module;
use crate::naming::NameRegistry;
use crate::resolve::{ProjectIndex, Resolve, ResolvedType, Site, UnitId};
use crate::scope::ScopeTracker;
use crate::TranspileConfig;

pub mod arrays;
pub mod comments;
pub mod expr;
pub mod items;
pub mod receiver;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;

pub use receiver::ReceiverAnalysis;

/// Run-wide, read-only inputs shared by every unit's emitter
#[derive(Clone, Copy)]
pub struct EmitContext<'a> {
    pub index: &'a ProjectIndex,
    pub registry: &'a NameRegistry,
    pub throws: &'a ThrowAnalysis,
    pub receivers: &'a ReceiverAnalysis,
    pub config: &'a TranspileConfig,
}

/// Routine whose body is being emitted
#[derive(Debug, Clone)]
struct RoutineFrame {
    throwing: bool,
    return_type: ResolvedType,
    /// Constructor delegating to another constructor through `this(...)`
    delegating: bool,
    /// Fields bound by a single top-level `this.f = e` in a factory body
    let_fields: HashSet<String>,
    body: Option<NodeId>,
}

/// An enclosing try statement and the resolved keys of its catch clauses
#[derive(Debug, Clone)]
struct TryFrame {
    label: usize,
    clauses: Vec<Vec<String>>,
}

/// Exception types every catch clause of these names handles
const CATCH_ALL: &[&str] = &["Exception", "Throwable", "RuntimeException"];

pub struct Emitter<'a, 's> {
    ctx: EmitContext<'a>,
    unit: UnitId,
    tree: &'a SyntaxTree,
    module: &'a str,
    scopes: &'s mut ScopeTracker,
    routine: Option<RoutineFrame>,
    tries: Vec<TryFrame>,
}

/// Fill every item of a unit's module with emitted text
pub fn emit_module(
    ctx: EmitContext<'_>,
    unit: UnitId,
    tree: &SyntaxTree,
    scopes: &mut ScopeTracker,
    module: &mut Module,
) {
    let path = module.path.clone();
    let mut emitter = Emitter {
        ctx,
        unit,
        tree,
        module: &path,
        scopes,
        routine: None,
        tries: Vec::new(),
    };
    for item in &mut module.items {
        emitter.fill_item(item);
    }
    debug!("{unit}: emitted {} item(s)", module.items.len());
}

impl<'a> Emitter<'a, '_> {
    /// Node kind borrowed from the tree rather than from the emitter
    fn kind(&self, node: NodeId) -> &'a NodeKind {
        self.tree.kind(node)
    }

    fn site(&self, node: NodeId) -> Site<'a> {
        Site::new(self.unit, self.tree, node)
    }

    fn indent(&self) -> &'a str {
        &self.ctx.config.indent
    }

    /// Identifier of the type declaration enclosing `node`
    fn owner_of(&self, node: NodeId) -> Option<String> {
        let ty = self.tree.enclosing_type(node)?;
        self.ctx.index.resolve_declaration(self.unit, ty)
    }

    fn in_factory(&self) -> bool {
        self.scopes.in_factory
    }

    fn delegating(&self) -> bool {
        self.routine.as_ref().is_some_and(|r| r.delegating)
    }

    fn routine_throws(&self) -> bool {
        self.routine.as_ref().is_some_and(|r| r.throwing)
    }

    /// Inline marker for a construct without a translation rule
    fn unsupported(&self, node: NodeId) -> String {
        let text = self
            .tree
            .text(node)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .replace("*/", "* /");
        format!("/* unsupported {}: {text} */", self.kind(node).label())
    }

    /// Whether the type `key` is `clause` or one of its declared subtypes
    fn is_caught_by(&self, key: &str, clause: &str) -> bool {
        let clause_name = crate::resolve::last_segment(clause);
        if CATCH_ALL.contains(&clause_name) {
            return true;
        }
        let mut current = Some(key.to_string());
        let mut steps = 0;
        while let Some(ty) = current {
            if ty == clause || crate::resolve::last_segment(&ty) == clause_name {
                return true;
            }
            steps += 1;
            if steps > 32 {
                break;
            }
            current = self
                .ctx
                .index
                .superclass_of(&ty)
                .map(|s| s.key())
                .filter(|s| !s.is_empty());
        }
        false
    }

    /// Innermost try label and 1-based clause number catching one of `thrown`
    fn catching_clause(&self, thrown: &[&str]) -> Option<(usize, usize)> {
        for frame in self.tries.iter().rev() {
            for (k, clause) in frame.clauses.iter().enumerate() {
                let caught = thrown
                    .iter()
                    .any(|t| clause.iter().any(|c| self.is_caught_by(t, c)));
                if caught {
                    return Some((frame.label, k + 1));
                }
            }
        }
        None
    }

    /// Statement kinds a `for`/`while` label can be attached to
    fn is_loop(&self, node: NodeId) -> bool {
        matches!(
            self.kind(node),
            NodeKind::While { .. }
                | NodeKind::DoWhile { .. }
                | NodeKind::For { .. }
                | NodeKind::ForEach { .. }
        )
    }
}
