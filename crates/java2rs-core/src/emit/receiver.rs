// Receiver kind of instance methods: none, shared or exclusive
//
// Each method body is scanned for reads and writes of instance state; calls
// on the same instance link methods together, and a fixed point over those
// links lifts a caller to the strongest receiver among its callees.
use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{NodeId, NodeKind, SyntaxTree};
use crate::model::Receiver;
use crate::resolve::{ProjectIndex, Resolve, Site, UnitId};
use crate::scope::{DeclKind, ScopeTracker};

#[derive(Debug, Default)]
pub struct ReceiverAnalysis {
    direct: IndexMap<String, Receiver>,
    /// Same-instance callees per method; `None` marks an unresolved call
    calls: HashMap<String, BTreeSet<Option<String>>>,
    solved: HashMap<String, Receiver>,
}

struct Scan<'t> {
    unit: UnitId,
    tree: &'t SyntaxTree,
    index: &'t ProjectIndex,
    scopes: &'t ScopeTracker,
    owner: Option<String>,
    level: Receiver,
    callees: BTreeSet<Option<String>>,
}

impl Scan<'_> {
    fn is_instance_field(&self, node: NodeId, name: &str) -> bool {
        match self.scopes.find_declaration(self.tree, name, node) {
            Some(decl) => decl.kind == DeclKind::Field { is_static: false },
            None => self
                .owner
                .as_deref()
                .and_then(|owner| self.index.find_field(owner, name))
                .is_some_and(|(_, field)| !field.is_static),
        }
    }

    /// Whether an expression designates state reachable from `this`
    fn is_instance_state(&self, node: NodeId) -> bool {
        let node = self.tree.unparen(node);
        match self.tree.kind(node) {
            NodeKind::Name { name } => self.is_instance_field(node, name),
            NodeKind::FieldAccess { target, .. } => {
                matches!(self.tree.kind(self.tree.unparen(*target)), NodeKind::This | NodeKind::Super)
                    || self.is_instance_state(*target)
            }
            NodeKind::ArrayAccess { array, .. } => self.is_instance_state(*array),
            _ => false,
        }
    }

    fn raise(&mut self, level: Receiver) {
        self.level = self.level.max(level);
    }

    fn scan(&mut self, node: NodeId) {
        let tree = self.tree;
        match tree.kind(node) {
            NodeKind::Lambda { .. } | NodeKind::TypeDecl(_) => return,
            NodeKind::New { args, body, .. } if !body.is_empty() => {
                for arg in args {
                    self.scan(*arg);
                }
                return;
            }
            NodeKind::Assign { target, .. } | NodeKind::Update { operand: target, .. } => {
                if self.is_instance_state(*target) {
                    self.raise(Receiver::Mut);
                }
            }
            NodeKind::Name { name } => {
                if self.is_instance_field(node, name) {
                    self.raise(Receiver::Ref);
                }
            }
            NodeKind::This | NodeKind::Super => self.raise(Receiver::Ref),
            NodeKind::Call { receiver, .. } => {
                let same_instance = match receiver.map(|r| tree.unparen(r)) {
                    None => true,
                    Some(r) => {
                        matches!(tree.kind(r), NodeKind::This | NodeKind::Super) || self.is_instance_state(r)
                    }
                };
                if same_instance {
                    match self.index.resolve_callee(Site::new(self.unit, tree, node)) {
                        Some(callee) if callee.is_static || callee.is_constructor => {}
                        Some(callee) => {
                            self.callees.insert(Some(callee.id));
                        }
                        None => {
                            self.callees.insert(None);
                        }
                    }
                }
            }
            _ => {}
        }
        for child in tree.children(node) {
            self.scan(*child);
        }
    }
}

impl ReceiverAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every instance method of a unit
    pub fn collect_unit(&mut self, unit: UnitId, tree: &SyntaxTree, index: &ProjectIndex, scopes: &ScopeTracker) {
        for node in tree.ids() {
            let NodeKind::Method(method) = tree.kind(node) else {
                continue;
            };
            if method.modifiers.is_static {
                continue;
            }
            let Some(id) = index.resolve_declaration(unit, node) else {
                continue;
            };
            let Some(body) = method.body else {
                self.direct.insert(id, Receiver::Ref);
                continue;
            };
            let mut scan = Scan {
                unit,
                tree,
                index,
                scopes,
                owner: tree
                    .enclosing_type(node)
                    .and_then(|t| index.resolve_declaration(unit, t)),
                level: Receiver::None,
                callees: BTreeSet::new(),
            };
            scan.scan(body);
            self.direct.insert(id.clone(), scan.level);
            self.calls.insert(id, scan.callees);
        }
    }

    /// Lift every method to the strongest receiver among its same-instance callees
    pub fn solve(&mut self) {
        let mut solved: HashMap<String, Receiver> =
            self.direct.iter().map(|(id, r)| (id.clone(), *r)).collect();
        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut changed = false;
            for (id, callees) in &self.calls {
                let current = solved.get(id).copied().unwrap_or(Receiver::None);
                let lifted = callees.iter().fold(current, |level, callee| {
                    let callee_level = match callee {
                        Some(callee) => solved.get(callee).copied().unwrap_or(Receiver::Ref),
                        None => Receiver::Ref,
                    };
                    level.max(callee_level)
                });
                if lifted != current {
                    solved.insert(id.clone(), lifted);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        debug!("receivers solved for {} method(s) in {rounds} round(s)", solved.len());
        self.solved = solved;
    }

    /// Receiver of an instance method; `None` for unknown or static routines
    pub fn receiver_of(&self, id: &str) -> Option<Receiver> {
        self.solved
            .get(id)
            .or_else(|| self.direct.get(id))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::{JavaParser, Parser};
    use crate::scope::build_scopes;

    fn analyze(source: &str) -> ReceiverAnalysis {
        let tree = JavaParser::new().unwrap().parse(source).unwrap();
        let index = ProjectIndex::build([(UnitId(0), &tree)]);
        let scopes = build_scopes(UnitId(0), &tree, &index).unwrap();
        let mut analysis = ReceiverAnalysis::new();
        analysis.collect_unit(UnitId(0), &tree, &index, &scopes);
        analysis.solve();
        analysis
    }

    #[test]
    fn direct_reads_and_writes() {
        let analysis = analyze(
            "class C { int n; int get() { return n; } void set(int v) { this.n = v; } int twice(int x) { return x * 2; } }",
        );
        assert_eq!(analysis.receiver_of("C.get()"), Some(Receiver::Ref));
        assert_eq!(analysis.receiver_of("C.set(int)"), Some(Receiver::Mut));
        assert_eq!(analysis.receiver_of("C.twice(int)"), Some(Receiver::None));
    }

    #[test]
    fn callers_inherit_callee_receivers() {
        let analysis = analyze(
            "class C { int n; void bump() { n++; } void outer() { middle(); } void middle() { bump(); } }",
        );
        assert_eq!(analysis.receiver_of("C.outer()"), Some(Receiver::Mut));
        assert_eq!(analysis.receiver_of("C.middle()"), Some(Receiver::Mut));
    }

    #[test]
    fn unresolved_same_instance_call_needs_shared_receiver() {
        let analysis = analyze("class C extends Lib { void run() { helper(); } }");
        assert_eq!(analysis.receiver_of("C.run()"), Some(Receiver::Ref));
    }

    #[test]
    fn static_methods_are_not_tracked() {
        let analysis = analyze("class C { static int f() { return 1; } }");
        assert_eq!(analysis.receiver_of("C.f()"), None);
    }
}
