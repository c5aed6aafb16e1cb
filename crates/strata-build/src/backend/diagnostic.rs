//! Compiler diagnostics
//!
//! The orchestrator treats diagnostics as opaque and only ever reports the
//! first one. Syntactic diagnostics always precede semantic ones.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Phase a diagnostic was produced in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Syntactic,
    Semantic,
}

/// A compiler error with its source location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Error code (e.g., "S2307")
    pub code: String,
    /// Main diagnostic message
    pub message: String,
    pub category: DiagnosticCategory,
    /// File path
    pub file: PathBuf,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    /// Length of the highlighted span
    pub length: usize,
    /// Source line text
    pub snippet: String,
}

impl Diagnostic {
    /// Create a syntactic diagnostic
    pub fn syntactic(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticCategory::Syntactic, code, message)
    }

    /// Create a semantic diagnostic
    pub fn semantic(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticCategory::Semantic, code, message)
    }

    fn new(category: DiagnosticCategory, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category,
            file: PathBuf::new(),
            line: 1,
            column: 1,
            length: 0,
            snippet: String::new(),
        }
    }

    /// Set the file path
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = file.into();
        self
    }

    /// Set the line, column and span length
    pub fn at(mut self, line: usize, column: usize, length: usize) -> Self {
        self.line = line;
        self.column = column;
        self.length = length;
        self
    }

    /// Set the snippet (source line)
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{} - error {}: {}",
            self.file.display(),
            self.line,
            self.column,
            self.code,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::semantic("S2307", "Cannot find module './x'")
            .with_file("/p/src/a.st")
            .at(3, 21, 5);
        assert_eq!(
            diagnostic.to_string(),
            "/p/src/a.st:3:21 - error S2307: Cannot find module './x'"
        );
    }

    #[test]
    fn test_syntactic_sorts_first() {
        assert!(DiagnosticCategory::Syntactic < DiagnosticCategory::Semantic);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let diagnostic = Diagnostic::syntactic("S1001", "Malformed import").with_snippet("import {");
        let json = serde_json::to_string(&diagnostic).unwrap();
        assert!(json.contains("\"syntactic\""));
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, diagnostic);
    }
}
