//! Script Engine Library
//!
//! Directive-driven dependency resolution and source normalization for
//! single-file C# scripts. Provides the header scanner, the directive
//! parser, the dependency resolver, script type classification, mode
//! normalization and the compile/run drivers that hand the result to an
//! external compiler and module loader.

pub mod classify;
pub mod config;
pub mod dependency;
pub mod diagnostic;
pub mod directive;
pub mod engine;
pub mod entry;
pub mod error;
pub mod header;
pub mod mode;
pub mod normalize;
pub mod resolver;
pub mod toolchain;

pub use classify::{classify, LoaderProbe, ModuleProbe, ScriptType, DEFAULT_MARKER_TYPE};
pub use config::EngineConfig;
pub use dependency::{Dependency, DependencyKind, Resolution};
pub use diagnostic::{Diagnostic, Severity};
pub use directive::{Directive, DirectiveParser, Step};
pub use engine::Engine;
pub use entry::{find_entry_point, EntryPoint};
pub use error::{DirectiveError, EngineError, Result};
pub use mode::ScriptMode;
pub use normalize::{IdentifierSource, RandomIdentifiers, SequentialIdentifiers};
pub use resolver::DependencyResolver;
pub use toolchain::{
    CompileRequest, CompilerBackend, Invocation, LoadedModule, MethodInfo, ModuleLoader,
    ToolchainError, TypeInfo, TypeRef,
};
