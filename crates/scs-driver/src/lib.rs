//! Script Driver Library
//!
//! Concrete collaborators for the script engine: a C# compiler run as an
//! external process, a reflection host process that loads and invokes
//! compiled modules, configuration file discovery and diagnostics
//! rendering for the `scs` command.

pub mod config;
pub mod csc;
pub mod host;
pub mod report;

pub use config::{Config, ConfigError};
pub use csc::ProcessCompiler;
pub use host::{HostLoader, HostModule};
