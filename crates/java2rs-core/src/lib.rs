//! # java2rs Core
//!
//! Translation pipeline turning Java compilation units into Rust source text:
//! - Arena syntax tree and tree-sitter based Java front-end
//! - Project-wide symbol index answering type, callee and declaration queries
//! - Scope model tracking declarations, usages and mutations per lexical block
//! - Type inference over expression trees
//! - Transitive exception propagation
//! - Target item model (modules, structs, traits, enums) and its renderer
//! - Emission engine for method bodies and initializers
//!
//! The [`Transpiler`] drives the two-phase declare/analyze lifecycle over a set
//! of units; the [`driver`] module maps directories of `.java` files onto it.

//#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod diagnostics;
pub mod driver;
pub mod emit;
pub mod exceptions;
pub mod model;
pub mod naming;
pub mod parser;
pub mod resolve;
pub mod scope;
pub mod transpiler;
pub mod types;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use ast::{NodeId, NodeKind, SyntaxTree};
pub use diagnostics::{Diagnostic, Severity};
pub use driver::{FileDriver, TransformationSummary};
pub use naming::{to_snake_case, NameRegistry, RegistryError};
pub use parser::{create_parser, JavaParser, ParseError, Parser};
pub use resolve::{ProjectIndex, Resolve, ResolvedType};
pub use scope::{Block, ScopeError, ScopeTracker};
pub use transpiler::{transpile_source, Transpiler, UnitOutcome, UnitStatus};
pub use types::{TypeDescription, ValueType};

/// java2rs version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for java2rs core components
pub fn init_tracing() {
    init_tracing_with("java2rs_core=info");
}

/// Initialize tracing with an explicit default directive, e.g. `java2rs_core=debug`
pub fn init_tracing_with(directive: &str) {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = directive.parse() {
        filter = filter.add_directive(directive);
    }
    // A subscriber may already be installed by an embedding application.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Translation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspileConfig {
    /// One indentation level in emitted code
    pub indent: String,
    /// Re-emit source comments in place
    pub emit_comments: bool,
    /// Generate forwarding methods for inherited base-class methods
    pub forward_inherited_methods: bool,
    /// Append advisory diagnostics as `// warning:` lines to unit output
    pub include_diagnostics: bool,
    /// File extensions picked up by the directory driver
    pub source_extensions: Vec<String>,
}

impl Default for TranspileConfig {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            emit_comments: true,
            forward_inherited_methods: true,
            include_diagnostics: true,
            source_extensions: vec!["java".to_string()],
        }
    }
}

impl TranspileConfig {
    /// Load a configuration from JSON text; missing keys keep their defaults
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| TranspileError::Config(e.to_string()))
    }
}

/// Error types for java2rs core operations
#[derive(thiserror::Error, Debug)]
pub enum TranspileError {
    /// Front-end parse failure
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Scope model containment violation
    #[error("Scope error: {0}")]
    Scope(#[from] ScopeError),

    /// Duplicate name registration
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// IO failure while reading or writing units
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected failure inside one unit
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for java2rs core operations
pub type Result<T> = std::result::Result<T, TranspileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_survive_partial_json() {
        let config = TranspileConfig::from_json(r#"{ "indent": "\t" }"#).unwrap();
        assert_eq!(config.indent, "\t");
        assert!(config.emit_comments);
        assert_eq!(config.source_extensions, vec!["java".to_string()]);
    }

    #[test]
    fn config_rejects_malformed_json() {
        let err = TranspileConfig::from_json("{ indent").unwrap_err();
        assert!(matches!(err, TranspileError::Config(_)));
    }
}
