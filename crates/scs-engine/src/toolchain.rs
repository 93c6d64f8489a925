//! Boundary traits for the external compiler and module loader
//!
//! The engine never compiles or loads code itself. A [`CompilerBackend`]
//! turns source files plus references into a module on disk, and a
//! [`ModuleLoader`] loads such a module, describes its exported types and
//! invokes methods on them.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::diagnostic::Diagnostic;

/// Infrastructure failures of an external collaborator
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to load module '{}': {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    #[error("{tool}: {message}")]
    Protocol { tool: String, message: String },
}

/// One compiler invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Source files, the normalized entry script first
    pub sources: Vec<PathBuf>,
    /// Library names and precompiled module paths, each listed once
    pub references: Vec<String>,
    /// Where the module must be written
    pub output: PathBuf,
    pub optimize: bool,
}

pub trait CompilerBackend {
    /// Compile the request, returning every diagnostic the compiler emitted.
    ///
    /// Fatal diagnostics are returned as data too; the engine decides what
    /// is fatal. `Err` is reserved for failing to run the compiler at all.
    fn compile(&self, request: &CompileRequest) -> Result<Vec<Diagnostic>, ToolchainError>;
}

/// A type reference as reported by a module's metadata
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TypeRef {
    Void,
    Int32,
    StringArray,
    Other(String),
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        match name.as_str() {
            "System.Void" | "void" => TypeRef::Void,
            "System.Int32" | "int" => TypeRef::Int32,
            "System.String[]" | "string[]" => TypeRef::StringArray,
            _ => TypeRef::Other(name),
        }
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::from(name.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub parameters: Vec<TypeRef>,
    pub return_type: TypeRef,
}

/// An exported type of a loaded module
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypeInfo {
    pub name: String,
    #[serde(default)]
    pub is_class: bool,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
}

/// Result of invoking a method inside a loaded module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// The method returned; `Some` when it returned an integer
    Returned(Option<i32>),
    /// The method raised an exception or took the host down with it
    Faulted(String),
}

pub trait LoadedModule {
    /// Whether the module defines a type with this exact full name
    fn has_type(&self, name: &str) -> bool;

    fn exported_types(&self) -> Result<Vec<TypeInfo>, ToolchainError>;

    /// Invoke a static method. `args` is `None` for parameterless methods.
    fn invoke(
        &self,
        type_name: &str,
        method: &str,
        args: Option<&[String]>,
    ) -> Result<Invocation, ToolchainError>;
}

pub trait ModuleLoader {
    type Module: LoadedModule;

    fn load(&self, path: &Path) -> Result<Self::Module, ToolchainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_names() {
        assert_eq!(TypeRef::from("System.Int32"), TypeRef::Int32);
        assert_eq!(TypeRef::from("string[]"), TypeRef::StringArray);
        assert_eq!(
            TypeRef::from("System.Object"),
            TypeRef::Other("System.Object".into())
        );
    }
}
