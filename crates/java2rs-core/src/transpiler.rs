//! Two-phase translation pipeline over a set of compilation units.
//!
//! Units are parsed as they are added. [`Transpiler::declare`] then indexes
//! every parsed unit and registers all emitted names, so that the later
//! phases see the complete registry regardless of unit order.
//! [`Transpiler::propagate_exceptions`] computes thrown sets over the whole
//! call graph and [`Transpiler::analyze`] builds each unit's scope model and
//! type table before filling its item model. [`Transpiler::render`] produces
//! exactly one [`UnitOutcome`] per unit.
//!
//! A failure inside one unit, including a panic, is caught at the unit
//! boundary and never affects its siblings.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ast::SyntaxTree;
use crate::diagnostics::Diagnostic;
use crate::emit::{emit_module, EmitContext, ReceiverAnalysis};
use crate::exceptions::ThrowAnalysis;
use crate::model::declare::declare_unit;
use crate::model::render::ToRust;
use crate::model::Module;
use crate::naming::{escape_keyword, to_snake_case, NameRegistry};
use crate::parser::{JavaParser, ParseError, Parser};
use crate::resolve::{ProjectIndex, UnitId};
use crate::scope::{build_scopes, ScopeTracker};
use crate::types::infer_types;
use crate::{Result, TranspileConfig, TranspileError};

/// Classification of one unit's result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Success,
    ParseFailure,
    InternalFault,
}

/// Rendered text of one unit plus its classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitOutcome {
    pub path: String,
    pub module_path: String,
    pub status: UnitStatus,
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl UnitOutcome {
    pub fn is_success(&self) -> bool {
        self.status == UnitStatus::Success
    }
}

#[derive(Debug)]
enum Failure {
    Parse(ParseError),
    Internal(String),
}

impl Failure {
    fn status(&self) -> UnitStatus {
        match self {
            Failure::Parse(_) => UnitStatus::ParseFailure,
            Failure::Internal(_) => UnitStatus::InternalFault,
        }
    }

    fn message(&self) -> String {
        match self {
            Failure::Parse(err) => err.to_string(),
            Failure::Internal(message) => message.clone(),
        }
    }
}

struct Unit {
    path: String,
    module_path: String,
    tree: Option<SyntaxTree>,
    module: Option<Module>,
    scopes: Option<ScopeTracker>,
    failure: Option<Failure>,
    diagnostics: Vec<Diagnostic>,
}

impl Unit {
    fn fail(&mut self, failure: Failure) {
        warn!("{}: {}", self.path, failure.message());
        self.failure = Some(failure);
        self.module = None;
        self.scopes = None;
    }

    fn is_healthy(&self) -> bool {
        self.failure.is_none() && self.tree.is_some()
    }
}

/// Module path of a source file placed at the crate root: `crate::snake_stem`
pub fn module_path_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    if stem.is_empty() {
        "crate".to_string()
    } else {
        format!("crate::{}", escape_keyword(&to_snake_case(&stem)))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        format!("internal fault: {text}")
    } else if let Some(text) = payload.downcast_ref::<String>() {
        format!("internal fault: {text}")
    } else {
        "internal fault".to_string()
    }
}

/// Translation pipeline owning units, index, registry and analyses of one run
pub struct Transpiler {
    config: TranspileConfig,
    parser: JavaParser,
    units: Vec<Unit>,
    index: ProjectIndex,
    registry: NameRegistry,
    throws: ThrowAnalysis,
    receivers: ReceiverAnalysis,
}

impl Transpiler {
    pub fn new(config: TranspileConfig) -> Result<Self> {
        Ok(Self {
            config,
            parser: JavaParser::new()?,
            units: Vec::new(),
            index: ProjectIndex::default(),
            registry: NameRegistry::new(),
            throws: ThrowAnalysis::default(),
            receivers: ReceiverAnalysis::new(),
        })
    }

    pub fn config(&self) -> &TranspileConfig {
        &self.config
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Parse and store a unit at the crate root
    pub fn add_unit(&mut self, path: impl Into<String>, text: &str) -> UnitId {
        let path = path.into();
        let module_path = module_path_for(Path::new(&path));
        self.add_unit_in(path, module_path, text)
    }

    /// Parse and store a unit under an explicit module path; parse failures are kept
    pub fn add_unit_in(&mut self, path: impl Into<String>, module_path: impl Into<String>, text: &str) -> UnitId {
        let id = UnitId(self.units.len());
        let mut unit = Unit {
            path: path.into(),
            module_path: module_path.into(),
            tree: None,
            module: None,
            scopes: None,
            failure: None,
            diagnostics: Vec::new(),
        };
        match self.parser.parse(text) {
            Ok(tree) => {
                debug!("{id}: parsed {} ({} node(s))", unit.path, tree.len());
                unit.tree = Some(tree);
            }
            Err(err) => unit.fail(Failure::Parse(err)),
        }
        self.units.push(unit);
        id
    }

    fn trees(&self) -> impl Iterator<Item = (UnitId, &SyntaxTree)> {
        self.units
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.is_healthy())
            .filter_map(|(i, unit)| unit.tree.as_ref().map(|tree| (UnitId(i), tree)))
    }

    /// Index all parsed units and register every declared name
    pub fn declare(&mut self) {
        self.index = ProjectIndex::build(self.trees());
        debug!("declare: indexed {} type(s)", self.index.types().count());
        let Self {
            units,
            index,
            registry,
            ..
        } = self;
        for (i, unit) in units.iter_mut().enumerate() {
            if !unit.is_healthy() {
                continue;
            }
            let Some(tree) = unit.tree.as_ref() else {
                continue;
            };
            let module_path = unit.module_path.clone();
            let declared = catch_unwind(AssertUnwindSafe(|| {
                declare_unit(UnitId(i), tree, &*index, registry, &module_path)
            }));
            match declared {
                Ok(Ok(module)) => unit.module = Some(module),
                Ok(Err(err)) => unit.fail(Failure::Internal(TranspileError::from(err).to_string())),
                Err(payload) => unit.fail(Failure::Internal(panic_message(payload))),
            }
        }
    }

    /// Thrown sets of every routine, to a fixed point over all units
    pub fn propagate_exceptions(&mut self) {
        let throws = ThrowAnalysis::analyze(self.trees(), &self.index);
        debug!(
            "exceptions: {} throwing routine(s)",
            throws.throwing_routines().count()
        );
        self.throws = throws;
    }

    /// Scope model, type table and emitted text of every declared unit
    pub fn analyze(&mut self) {
        let Self {
            config,
            units,
            index,
            registry,
            throws,
            receivers,
            ..
        } = self;

        for (i, unit) in units.iter_mut().enumerate() {
            if !unit.is_healthy() || unit.module.is_none() {
                continue;
            }
            let Some(tree) = unit.tree.as_ref() else {
                continue;
            };
            let id = UnitId(i);
            let built = catch_unwind(AssertUnwindSafe(|| {
                let mut scopes = build_scopes(id, tree, &*index)?;
                infer_types(id, tree, &*index, &mut scopes);
                Ok::<_, TranspileError>(scopes)
            }));
            match built {
                Ok(Ok(scopes)) => unit.scopes = Some(scopes),
                Ok(Err(err)) => unit.fail(Failure::Internal(err.to_string())),
                Err(payload) => unit.fail(Failure::Internal(panic_message(payload))),
            }
        }

        let mut analysis = ReceiverAnalysis::new();
        for (i, unit) in units.iter().enumerate() {
            if let (Some(tree), Some(scopes), None) = (&unit.tree, &unit.scopes, &unit.failure) {
                analysis.collect_unit(UnitId(i), tree, index, scopes);
            }
        }
        analysis.solve();
        *receivers = analysis;

        let ctx = EmitContext {
            index: &*index,
            registry: &*registry,
            throws: &*throws,
            receivers: &*receivers,
            config: &*config,
        };
        for (i, unit) in units.iter_mut().enumerate() {
            let (Some(tree), Some(scopes), Some(module), None) =
                (&unit.tree, &mut unit.scopes, &mut unit.module, &unit.failure)
            else {
                continue;
            };
            for routine in throws.throwing_routines() {
                scopes.mark_throwing(routine);
            }
            let emitted = catch_unwind(AssertUnwindSafe(|| {
                emit_module(ctx, UnitId(i), tree, scopes, module);
            }));
            match emitted {
                Ok(()) => unit.diagnostics.extend(scopes.take_diagnostics()),
                Err(payload) => unit.fail(Failure::Internal(panic_message(payload))),
            }
        }
    }

    /// One outcome per unit, in the order units were added
    pub fn render(&self) -> Vec<UnitOutcome> {
        self.units.iter().map(|unit| self.render_unit(unit)).collect()
    }

    fn render_unit(&self, unit: &Unit) -> UnitOutcome {
        if let Some(failure) = &unit.failure {
            let message = failure.message();
            return UnitOutcome {
                path: unit.path.clone(),
                module_path: unit.module_path.clone(),
                status: failure.status(),
                text: format!("/*\nFIXME: {message}\n*/\n"),
                diagnostics: vec![Diagnostic::error(message)],
            };
        }
        let mut text = unit
            .module
            .as_ref()
            .map(|module| module.to_rust(&self.config.indent))
            .unwrap_or_default();
        if self.config.include_diagnostics {
            for diagnostic in &unit.diagnostics {
                text.push_str(&format!("// warning: {diagnostic}\n"));
            }
        }
        UnitOutcome {
            path: unit.path.clone(),
            module_path: unit.module_path.clone(),
            status: UnitStatus::Success,
            text,
            diagnostics: unit.diagnostics.clone(),
        }
    }

    /// Declare, propagate, analyze and render every unit added so far
    pub fn run(&mut self) -> Vec<UnitOutcome> {
        self.declare();
        self.propagate_exceptions();
        self.analyze();
        let outcomes = self.render();
        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            "transpiled {} unit(s), {} failed",
            outcomes.len(),
            failed
        );
        outcomes
    }
}

/// Translate a single compilation unit with the default configuration
pub fn transpile_source(text: &str) -> Result<String> {
    transpile_source_with(text, TranspileConfig::default())
}

pub fn transpile_source_with(text: &str, config: TranspileConfig) -> Result<String> {
    let mut transpiler = Transpiler::new(config)?;
    transpiler.add_unit_in("<input>", "crate", text);
    transpiler.declare();
    transpiler.propagate_exceptions();
    transpiler.analyze();
    if let Some(failure) = transpiler.units.first().and_then(|u| u.failure.as_ref()) {
        return Err(match failure {
            Failure::Parse(err) => TranspileError::Parse(err.clone()),
            Failure::Internal(message) => TranspileError::Internal(message.clone()),
        });
    }
    let outcome = transpiler
        .render()
        .pop()
        .ok_or_else(|| TranspileError::Internal("no unit produced".to_string()))?;
    Ok(outcome.text)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_failures_are_wrapped_per_unit() {
        let mut transpiler = Transpiler::new(TranspileConfig::default()).unwrap();
        transpiler.add_unit("Good.java", "class Good { int i; }");
        transpiler.add_unit("Bad.java", "class Bad { int }");
        let outcomes = transpiler.run();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].status, UnitStatus::Success);
        assert_eq!(outcomes[0].module_path, "crate::good");
        assert_eq!(outcomes[1].status, UnitStatus::ParseFailure);
        assert!(outcomes[1].text.starts_with("/*\nFIXME: "));
        assert!(outcomes[1].text.ends_with("\n*/\n"));
    }

    #[test]
    fn cross_unit_types_use_module_paths() {
        let mut transpiler = Transpiler::new(TranspileConfig::default()).unwrap();
        transpiler.add_unit("Shape.java", "class Shape { }");
        transpiler.add_unit("Holder.java", "class Holder { Shape shape; }");
        let outcomes = transpiler.run();
        assert!(outcomes[1].text.contains("shape: crate::shape::Shape,"), "{}", outcomes[1].text);
    }

    #[test]
    fn transpile_source_reports_parse_errors() {
        let err = transpile_source("class {").unwrap_err();
        assert!(matches!(err, TranspileError::Parse(_)));
    }

    #[test]
    fn output_is_stable_across_runs() {
        let source = "class A { int n; int next() { n += 1; return n; } }";
        assert_eq!(transpile_source(source).unwrap(), transpile_source(source).unwrap());
    }

    #[test]
    fn advisories_are_reported_once() {
        let mut transpiler = Transpiler::new(TranspileConfig::default()).unwrap();
        transpiler.add_unit("A.java", "class A { void m() { int a = 1; int a = 2; } }");
        let outcomes = transpiler.run();
        assert_eq!(outcomes[0].diagnostics.len(), 1);
        assert_eq!(outcomes[0].text.matches("// warning: ").count(), 1);
    }

    #[test]
    fn cyclic_supertypes_do_not_stop_the_run() {
        let mut transpiler = Transpiler::new(TranspileConfig::default()).unwrap();
        transpiler.add_unit("A.java", "class A extends B { int a; int get() { return a; } }");
        transpiler.add_unit("B.java", "class B extends A { }");
        transpiler.add_unit("C.java", "class C { }");
        let outcomes = transpiler.run();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(UnitOutcome::is_success));
        assert!(outcomes[1].text.contains("base: crate::a::A,"), "{}", outcomes[1].text);
        assert_eq!(outcomes[2].text, "struct C;\n\nimpl C {}\n");
    }

    #[test]
    fn module_paths_follow_file_stems() {
        assert_eq!(module_path_for(Path::new("src/HttpServer.java")), "crate::http_server");
        assert_eq!(module_path_for(Path::new("Type.java")), "crate::r#type");
    }
}
