//! Error types for script resolution, compilation and execution

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::diagnostic::{format_diagnostics, Diagnostic};
use crate::toolchain::ToolchainError;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// A malformed or unsatisfiable directive, attributed to a file and a
/// 1-based header line.
#[derive(Debug, Error)]
#[error("{}({}): {}", .file.display(), .line, .message)]
pub struct DirectiveError {
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
    #[source]
    pub cause: Option<Box<EngineError>>,
}

impl DirectiveError {
    pub fn new(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the error that made this directive fail.
    pub fn with_cause(mut self, cause: EngineError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Walk the chain of nested directive errors down to the first
    /// directive that failed on its own.
    pub fn innermost(&self) -> &DirectiveError {
        match self.cause.as_deref() {
            Some(EngineError::Directive(inner)) => inner.innermost(),
            _ => self,
        }
    }
}

/// Every failure the engine reports to its caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A script path argument was empty
    #[error("empty file name")]
    EmptyPath,

    /// A script path does not exist
    #[error("file '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Directive(#[from] DirectiveError),

    /// Normalization was requested for a file without a usable mode
    #[error("invalid script mode for '{}'", .0.display())]
    InvalidMode(PathBuf),

    /// The external compiler reported at least one fatal diagnostic
    #[error("{}", format_diagnostics(.0))]
    CompileFailed(Vec<Diagnostic>),

    /// The script's own entry point raised an exception
    #[error("uncaught script exception in {}: {message}", .file.display())]
    ScriptFault { file: PathBuf, message: String },

    /// A loaded module has no runnable entry point
    #[error("no suitable entry point signature found in '{}'", .file.display())]
    BadFormat { file: PathBuf },

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
}

impl EngineError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        EngineError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Fatal diagnostics of a failed compilation, if that is what this is.
    pub fn diagnostics(&self) -> Option<&[Diagnostic]> {
        match self {
            EngineError::CompileFailed(diags) => Some(diags),
            _ => None,
        }
    }

    pub fn is_script_fault(&self) -> bool {
        matches!(self, EngineError::ScriptFault { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_directive_error_display() {
        let err = DirectiveError::new("/s/main.cs", 3, "invalid include or reference line. Missing quotes?");
        assert_eq!(
            err.to_string(),
            "/s/main.cs(3): invalid include or reference line. Missing quotes?"
        );
    }

    #[test]
    fn test_cause_chain_is_exposed_as_source() {
        let inner = DirectiveError::new("/s/b.cs", 2, "boom");
        let outer = DirectiveError::new("/s/a.cs", 1, "error processing //#include statement")
            .with_cause(inner.into());

        let source = outer.source().expect("cause should be the source");
        assert_eq!(source.to_string(), "/s/b.cs(2): boom");
        assert_eq!(outer.innermost().file, PathBuf::from("/s/b.cs"));
    }
}
