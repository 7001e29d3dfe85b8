// Per-unit diagnostics collected by the analysis passes
use std::fmt;

use serde::Serialize;

use crate::ast::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Structural oddity; output is still produced as usual
    Advisory,
    /// A construct was translated approximately and needs review
    Warning,
    /// The unit could not be translated
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Diagnostic {
    pub fn advisory(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Advisory,
            message: message.into(),
            position: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            position: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            position: None,
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{position}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position() {
        let d = Diagnostic::warning("postfix update").at(Position { line: 3, column: 9 });
        assert_eq!(d.to_string(), "3:9: postfix update");
        assert_eq!(Diagnostic::advisory("overlap").to_string(), "overlap");
    }

    #[test]
    fn serializes_lowercase_severity() {
        let json = serde_json::to_string(&Diagnostic::error("boom")).unwrap();
        assert_eq!(json, r#"{"severity":"error","message":"boom"}"#);
    }
}
