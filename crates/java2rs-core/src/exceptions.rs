// Exception propagation: transitive thrown-type sets per routine
use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{NodeId, NodeKind, SyntaxTree};
use crate::resolve::{Resolve, ResolvedType, Site, UnitId};

#[derive(Debug, Default)]
struct RoutineThrows {
    thrown: BTreeSet<String>,
    callees: BTreeSet<String>,
}

/// Thrown types of every routine of a run, closed over the call graph.
///
/// Types are keyed by their resolved key; a type that cannot be determined is
/// dropped rather than reported.
#[derive(Debug, Default)]
pub struct ThrowAnalysis {
    routines: IndexMap<String, RoutineThrows>,
    types: HashMap<String, ResolvedType>,
    rounds: usize,
}

impl ThrowAnalysis {
    pub fn analyze<'t>(
        units: impl IntoIterator<Item = (UnitId, &'t SyntaxTree)>,
        resolver: &dyn Resolve,
    ) -> Self {
        let mut analysis = Self::default();
        for (unit, tree) in units {
            analysis.collect_unit(unit, tree, resolver);
        }
        analysis.propagate();
        debug!(
            "exception sets for {} routine(s) stable after {} round(s)",
            analysis.routines.len(),
            analysis.rounds
        );
        analysis
    }

    fn record_type(&mut self, routine: &str, ty: ResolvedType) {
        if ty.is_unknown() || matches!(ty, ResolvedType::Void | ResolvedType::Primitive(_)) {
            return;
        }
        let key = ty.key();
        self.types.entry(key.clone()).or_insert(ty);
        self.routines
            .entry(routine.to_string())
            .or_default()
            .thrown
            .insert(key);
    }

    fn collect_unit(&mut self, unit: UnitId, tree: &SyntaxTree, resolver: &dyn Resolve) {
        for node in tree.ids() {
            let site = Site::new(unit, tree, node);
            match tree.kind(node) {
                NodeKind::Method(method) => {
                    if let Some(id) = resolver.resolve_declaration(unit, node) {
                        self.routines.entry(id.clone()).or_default();
                        for ty in &method.throws {
                            self.record_type(&id, resolver.resolve_type(site, ty));
                        }
                    }
                }
                NodeKind::Constructor(ctor) => {
                    if let Some(id) = resolver.resolve_declaration(unit, node) {
                        self.routines.entry(id.clone()).or_default();
                        for ty in &ctor.throws {
                            self.record_type(&id, resolver.resolve_type(site, ty));
                        }
                    }
                }
                NodeKind::Throw { expr } => {
                    if let Some(routine) = routine_of(unit, tree, node, resolver) {
                        self.record_type(&routine, resolver.resolve_expression_type(site.at(*expr)));
                    }
                }
                NodeKind::Call { .. } | NodeKind::New { .. } | NodeKind::CtorCall { .. } => {
                    let Some(routine) = routine_of(unit, tree, node, resolver) else {
                        continue;
                    };
                    let Some(callee) = resolver.resolve_callee(site) else {
                        continue;
                    };
                    for ty in callee.declared_thrown {
                        self.record_type(&routine, ty);
                    }
                    self.routines
                        .entry(routine)
                        .or_default()
                        .callees
                        .insert(callee.id);
                }
                _ => {}
            }
        }
    }

    /// Union callee sets into callers until nothing changes
    fn propagate(&mut self) {
        loop {
            self.rounds += 1;
            let mut changed = false;
            for index in 0..self.routines.len() {
                let additions: BTreeSet<String> = {
                    let (_, routine) = match self.routines.get_index(index) {
                        Some(entry) => entry,
                        None => continue,
                    };
                    routine
                        .callees
                        .iter()
                        .filter_map(|c| self.routines.get(c))
                        .flat_map(|c| c.thrown.iter())
                        .filter(|t| !routine.thrown.contains(*t))
                        .cloned()
                        .collect()
                };
                if additions.is_empty() {
                    continue;
                }
                if let Some((_, routine)) = self.routines.get_index_mut(index) {
                    routine.thrown.extend(additions);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Keys of the types a routine may throw, sorted
    pub fn thrown(&self, routine: &str) -> Vec<&str> {
        self.routines
            .get(routine)
            .map(|r| r.thrown.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn thrown_types(&self, routine: &str) -> Vec<&ResolvedType> {
        self.thrown(routine)
            .into_iter()
            .filter_map(|key| self.types.get(key))
            .collect()
    }

    pub fn throws(&self, routine: &str) -> bool {
        self.routines
            .get(routine)
            .is_some_and(|r| !r.thrown.is_empty())
    }

    /// Routines with a non-empty thrown set
    pub fn throwing_routines(&self) -> impl Iterator<Item = &str> {
        self.routines
            .iter()
            .filter(|(_, r)| !r.thrown.is_empty())
            .map(|(id, _)| id.as_str())
    }
}

/// Identifier of the routine whose body contains `node`; lambda bodies belong to none
fn routine_of(unit: UnitId, tree: &SyntaxTree, node: NodeId, resolver: &dyn Resolve) -> Option<String> {
    for ancestor in tree.ancestors(node) {
        match tree.kind(ancestor) {
            NodeKind::Lambda { .. } | NodeKind::TypeDecl(_) | NodeKind::Field { .. } => return None,
            NodeKind::Method(_) | NodeKind::Constructor(_) => {
                return resolver.resolve_declaration(unit, ancestor)
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::{JavaParser, Parser};
    use crate::resolve::ProjectIndex;

    fn analyze(sources: &[&str]) -> ThrowAnalysis {
        let trees: Vec<SyntaxTree> = sources
            .iter()
            .map(|s| JavaParser::new().unwrap().parse(s).unwrap())
            .collect();
        let units: Vec<(UnitId, &SyntaxTree)> =
            trees.iter().enumerate().map(|(i, t)| (UnitId(i), t)).collect();
        let index = ProjectIndex::build(units.iter().copied());
        ThrowAnalysis::analyze(units, &index)
    }

    #[test]
    fn declared_and_thrown_types_are_collected() {
        let analysis = analyze(&[
            "class E extends Exception {}\n\
             class A { void a() throws java.io.IOException {} void b() { throw new E(); } void c() {} }",
        ]);
        assert_eq!(analysis.thrown("A.a()"), vec!["java.io.IOException"]);
        assert_eq!(analysis.thrown("A.b()"), vec!["E"]);
        assert!(!analysis.throws("A.c()"));
    }

    #[test]
    fn sets_propagate_transitively_across_units() {
        let analysis = analyze(&[
            "package p; public class Low { public static void fail() throws Exception {} }",
            "package p; class Mid { void step() { Low.fail(); } }",
            "package p; class Top { void run(Mid m) { m.step(); } void idle() {} }",
        ]);
        assert_eq!(analysis.thrown("p.Mid.step()"), vec!["java.lang.Exception"]);
        assert_eq!(analysis.thrown("p.Top.run(Mid)"), vec!["java.lang.Exception"]);
        assert!(!analysis.throws("p.Top.idle()"));
    }

    #[test]
    fn recursion_reaches_a_fixed_point() {
        let analysis = analyze(&[
            "class A { void ping(int n) { pong(n); } void pong(int n) { if (n > 0) ping(n - 1); else throw new IllegalStateException(); } }",
        ]);
        assert_eq!(
            analysis.thrown("A.ping(int)"),
            vec!["java.lang.IllegalStateException"]
        );
        assert_eq!(analysis.throwing_routines().count(), 2);
    }

    #[test]
    fn undeterminable_types_are_dropped() {
        let analysis = analyze(&["class A { void m(Object o) { throw mystery(); } }"]);
        assert!(!analysis.throws("A.m(Object)"));
    }

    #[test]
    fn constructors_carry_thrown_sets() {
        let analysis = analyze(&[
            "class A { A() throws Exception {} static A make() throws Exception { return new A(); } }",
        ]);
        assert_eq!(analysis.thrown("A.<init>()"), vec!["java.lang.Exception"]);
        assert_eq!(
            analysis.thrown_types("A.make()"),
            vec![&ResolvedType::library("java.lang.Exception")]
        );
    }
}
