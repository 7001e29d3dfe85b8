// Parser module - converts Java source into the arena syntax tree
use std::{fmt, path::Path};

use serde::Serialize;
use thiserror::Error;

use crate::ast::{Position, SyntaxTree};

pub mod java;

#[cfg(test)]
mod tests;

pub use java::JavaParser;

/// One ERROR or MISSING node reported by the grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxProblem {
    pub position: Position,
    pub message: String,
}

impl fmt::Display for SyntaxProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {}: {}",
            self.position.line, self.position.column, self.message
        )
    }
}

fn describe_problems(problems: &[SyntaxProblem]) -> String {
    problems
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Failed to load Java grammar: {0}")]
    Language(String),

    #[error("Parser produced no syntax tree")]
    NoTree,

    #[error("{}", describe_problems(.problems))]
    Syntax { problems: Vec<SyntaxProblem> },

    #[error("Unknown parser type: {0}")]
    UnknownLanguage(String),
}

/// Trait for source front-ends producing a [`SyntaxTree`]
pub trait Parser: Send {
    /// Parse one compilation unit
    fn parse(&mut self, source: &str) -> Result<SyntaxTree, ParseError>;

    /// Parse a file from disk
    fn parse_file(&mut self, path: &Path) -> anyhow::Result<SyntaxTree> {
        let source = std::fs::read_to_string(path)?;
        Ok(self.parse(&source)?)
    }

    /// Get parser name for debugging
    fn name(&self) -> &'static str;
}

/// Create a parser for a source language
pub fn create_parser(language: &str) -> Result<Box<dyn Parser>, ParseError> {
    match language {
        "java" => Ok(Box::new(JavaParser::new()?)),
        other => Err(ParseError::UnknownLanguage(other.to_string())),
    }
}
