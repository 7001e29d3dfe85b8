//! Scope model.
//!
//! One [`ScopeTracker`] per compilation unit records the lexical block tree
//! together with the declarations, usages and mutations of every name. The
//! emitter queries it to pick `let` vs `let mut`, to self-qualify members and
//! to resolve shadowed names.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use thiserror::Error;

use crate::ast::{NodeId, SourceRange, SyntaxTree};
use crate::diagnostics::Diagnostic;
use crate::types::{TypeDescription, TypeTable};

pub mod collect;

#[cfg(test)]
mod tests;

pub use collect::build_scopes;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScopeError {
    #[error("Block for {node} (line {line}) escapes its enclosing block for {parent}")]
    Containment {
        node: NodeId,
        parent: NodeId,
        line: usize,
    },

    #[error("'{name}' is already declared in this block (line {line})")]
    Redeclared { name: String, line: usize },

    #[error("No open block")]
    NoOpenBlock,
}

/// Handle of a block inside its tracker
pub type BlockId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Local,
    Param,
    Field { is_static: bool },
    Method { is_static: bool },
    Type,
    EnumConstant,
}

impl DeclKind {
    /// Member of a type rather than a local binding
    pub fn is_member(self) -> bool {
        matches!(
            self,
            DeclKind::Field { .. } | DeclKind::Method { .. } | DeclKind::EnumConstant
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub node: NodeId,
    pub kind: DeclKind,
    pub ty: TypeDescription,
    /// Start byte of the declaring node
    pub position: usize,
}

/// A lexical scope bound to one source range
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub node: NodeId,
    pub range: SourceRange,
    pub parent: Option<BlockId>,
    pub children: Vec<BlockId>,
    declarations: IndexMap<String, Declaration>,
    usages: IndexMap<String, Vec<NodeId>>,
    changes: IndexMap<String, Vec<NodeId>>,
}

impl Block {
    fn new(id: BlockId, node: NodeId, range: SourceRange, parent: Option<BlockId>) -> Self {
        Self {
            id,
            node,
            range,
            parent,
            children: Vec::new(),
            declarations: IndexMap::new(),
            usages: IndexMap::new(),
            changes: IndexMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.range.size()
    }

    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.values()
    }

    pub fn usages(&self, name: &str) -> &[NodeId] {
        self.usages.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn changes(&self, name: &str) -> &[NodeId] {
        self.changes.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Per-unit scope state
#[derive(Debug, Default)]
pub struct ScopeTracker {
    stack: Vec<BlockId>,
    blocks: Vec<Block>,
    throwing_routines: BTreeSet<String>,
    imports: Vec<String>,
    pub types: TypeTable,
    /// Routine whose body is being emitted
    pub current_routine: Option<NodeId>,
    /// Inside a constructor body rendered as a factory function
    pub in_factory: bool,
    try_count: usize,
    diagnostics: Vec<Diagnostic>,
}

impl ScopeTracker {
    pub fn new(node_count: usize) -> Self {
        Self {
            types: TypeTable::new(node_count),
            ..Self::default()
        }
    }

    /// Open a block for `node`; it must nest inside the current block
    pub fn push_block(&mut self, tree: &SyntaxTree, node: NodeId) -> Result<BlockId, ScopeError> {
        let range = tree.range(node);
        let parent = self.stack.last().copied();
        if let Some(parent) = parent {
            let enclosing = &self.blocks[parent - 1];
            if !enclosing.range.contains(&range) {
                return Err(ScopeError::Containment {
                    node,
                    parent: enclosing.node,
                    line: range.start.line,
                });
            }
        }
        let id = self.blocks.len() + 1;
        self.blocks.push(Block::new(id, node, range, parent));
        if let Some(parent) = parent {
            self.blocks[parent - 1].children.push(id);
        }
        self.stack.push(id);
        Ok(id)
    }

    /// Close the current block; closing the outermost one runs the structural check
    pub fn pop_block(&mut self) -> Result<(), ScopeError> {
        self.stack.pop().ok_or(ScopeError::NoOpenBlock)?;
        if self.stack.is_empty() {
            for problem in self.check_structure() {
                self.diagnostics.push(Diagnostic::advisory(problem));
            }
        }
        Ok(())
    }

    fn current(&self) -> Result<BlockId, ScopeError> {
        self.stack.last().copied().ok_or(ScopeError::NoOpenBlock)
    }

    /// Whether the innermost open block already binds `name`
    pub fn declared_in_current(&self, name: &str) -> bool {
        self.current()
            .ok()
            .and_then(|id| self.block(id))
            .is_some_and(|b| b.declaration(name).is_some())
    }

    /// Bind `name` in the innermost open block
    pub fn add_declaration(
        &mut self,
        tree: &SyntaxTree,
        name: &str,
        ty: TypeDescription,
        node: NodeId,
        kind: DeclKind,
    ) -> Result<(), ScopeError> {
        let block = self.current()?;
        let range = tree.range(node);
        let declarations = &mut self.blocks[block - 1].declarations;
        if declarations.contains_key(name) {
            return Err(ScopeError::Redeclared {
                name: name.to_string(),
                line: range.start.line,
            });
        }
        declarations.insert(
            name.to_string(),
            Declaration {
                name: name.to_string(),
                node,
                kind,
                ty,
                position: range.start_byte,
            },
        );
        Ok(())
    }

    pub fn add_usage(&mut self, name: &str, node: NodeId) -> Result<(), ScopeError> {
        let block = self.current()?;
        self.blocks[block - 1]
            .usages
            .entry(name.to_string())
            .or_default()
            .push(node);
        Ok(())
    }

    pub fn add_change(&mut self, name: &str, node: NodeId) -> Result<(), ScopeError> {
        let block = self.current()?;
        self.blocks[block - 1]
            .changes
            .entry(name.to_string())
            .or_default()
            .push(node);
        Ok(())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        id.checked_sub(1).and_then(|i| self.blocks.get(i))
    }

    pub fn root(&self) -> Option<&Block> {
        self.blocks.first()
    }

    /// Innermost block whose range spans `range`, descending from the root
    pub fn innermost_block(&self, range: &SourceRange) -> Option<&Block> {
        let mut current = self.root().filter(|root| root.range.contains(range))?;
        'descend: loop {
            for child in &current.children {
                let child = &self.blocks[child - 1];
                if child.range.contains(range) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Declaration `name` refers to at `reference`, honoring shadowing
    pub fn find_declaration(
        &self,
        tree: &SyntaxTree,
        name: &str,
        reference: NodeId,
    ) -> Option<&Declaration> {
        let range = tree.range(reference);
        let mut block = self.innermost_block(&range);
        while let Some(current) = block {
            if let Some(decl) = current.declaration(name) {
                let visible = match decl.kind {
                    DeclKind::Local => decl.position <= range.start_byte,
                    _ => true,
                };
                if visible {
                    return Some(decl);
                }
            }
            block = current.parent.and_then(|p| self.block(p));
        }
        None
    }

    /// Whether `name` is assigned in the block containing `reference`, or in a
    /// descendant block that does not declare its own `name`
    pub fn is_changed(&self, tree: &SyntaxTree, name: &str, reference: NodeId) -> bool {
        match self.innermost_block(&tree.range(reference)) {
            Some(block) => self.changed_below(block, name),
            None => false,
        }
    }

    fn changed_below(&self, block: &Block, name: &str) -> bool {
        if !block.changes(name).is_empty() {
            return true;
        }
        block.children.iter().any(|child| {
            let child = &self.blocks[child - 1];
            child.declaration(name).is_none() && self.changed_below(child, name)
        })
    }

    /// Structural integrity problems: overlapping siblings, several or
    /// non-dominant roots, blocks left open
    pub fn check_structure(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let roots: Vec<&Block> = self.blocks.iter().filter(|b| b.parent.is_none()).collect();
        if roots.len() != 1 {
            problems.push(format!("expected one root block, found {}", roots.len()));
        }
        if let Some(root) = roots.first() {
            if let Some(larger) = self.blocks.iter().find(|b| b.size() > root.size()) {
                problems.push(format!(
                    "block at line {} is larger than the root block",
                    larger.range.start.line
                ));
            }
        }
        for block in &self.blocks {
            for (i, a) in block.children.iter().enumerate() {
                for b in &block.children[i + 1..] {
                    let (a, b) = (&self.blocks[a - 1], &self.blocks[b - 1]);
                    if a.range.overlaps(&b.range) {
                        problems.push(format!(
                            "blocks at lines {} and {} overlap",
                            a.range.start.line, b.range.start.line
                        ));
                    }
                }
            }
        }
        if !self.stack.is_empty() {
            problems.push(format!("{} block(s) left open", self.stack.len()));
        }
        problems
    }

    pub fn mark_throwing(&mut self, routine: &str) {
        self.throwing_routines.insert(routine.to_string());
    }

    pub fn is_throwing(&self, routine: &str) -> bool {
        self.throwing_routines.contains(routine)
    }

    pub fn add_import(&mut self, path: &str) {
        self.imports.push(path.to_string());
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Allocate the next try label number for this unit
    pub fn next_try(&mut self) -> usize {
        self.try_count += 1;
        self.try_count
    }

    pub fn advise(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
