//! Compiler diagnostics as reported by a [`CompilerBackend`](crate::CompilerBackend)

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One message emitted by the external compiler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(file: impl Into<PathBuf>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: 0,
            column: 0,
            code: code.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(file: impl Into<PathBuf>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(file, code, message)
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}:{}] {}: {}",
            self.file.display(),
            self.line,
            self.column,
            self.code,
            self.message
        )
    }
}

/// Render a compound compile failure, one diagnostic per line.
pub(crate) fn format_diagnostics(diags: &[Diagnostic]) -> String {
    let mut out = format!("compilation failed with {} error(s)", diags.len());
    for diag in diags {
        out.push('\n');
        out.push_str(&diag.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_compiler_listing() {
        let diag = Diagnostic::error("main.cs.norm", "CS1002", "; expected").at(12, 7);
        assert_eq!(diag.to_string(), "main.cs.norm [12:7] CS1002: ; expected");
    }

    #[test]
    fn test_compound_listing() {
        let diags = vec![
            Diagnostic::error("a.cs", "CS0103", "name 'x' does not exist").at(1, 1),
            Diagnostic::error("b.cs", "CS0006", "metadata file 'missing.dll' could not be found"),
        ];
        let text = format_diagnostics(&diags);
        assert!(text.starts_with("compilation failed with 2 error(s)"));
        assert_eq!(text.lines().count(), 3);
        assert!(!Diagnostic::warning("a.cs", "CS0168", "unused").is_fatal());
    }
}
