//! Script type classification
//!
//! A path is classified by trying to load it as a compiled module: a
//! loadable module exposing the marker type is a script binary, a loadable
//! module without it is invalid, and anything that does not load is
//! treated as source text.

use std::path::Path;

use tracing::trace;

use crate::error::Result;
use crate::header::check_exists;
use crate::toolchain::{LoadedModule, ModuleLoader};

/// Type name a precompiled module must define to be runnable as a script
pub const DEFAULT_MARKER_TYPE: &str = "ScriptMain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    ScriptFile,
    ScriptBinary,
    Invalid,
}

/// The two capabilities classification needs from a module layer
pub trait ModuleProbe {
    type Handle;

    fn try_load_module(&self, path: &Path) -> Option<Self::Handle>;

    fn has_marker_symbol(&self, module: &Self::Handle, marker: &str) -> bool;
}

/// Probe backed by a full [`ModuleLoader`]
pub struct LoaderProbe<'a, L>(pub &'a L);

impl<L: ModuleLoader> ModuleProbe for LoaderProbe<'_, L> {
    type Handle = L::Module;

    fn try_load_module(&self, path: &Path) -> Option<Self::Handle> {
        match self.0.load(path) {
            Ok(module) => Some(module),
            Err(err) => {
                trace!(path = %path.display(), %err, "not loadable as a module");
                None
            }
        }
    }

    fn has_marker_symbol(&self, module: &Self::Handle, marker: &str) -> bool {
        module.has_type(marker)
    }
}

/// Classify `path` as source, script binary or invalid module.
pub fn classify<P: ModuleProbe + ?Sized>(probe: &P, path: &Path, marker: &str) -> Result<ScriptType> {
    check_exists(path)?;

    let script_type = match probe.try_load_module(path) {
        Some(module) if probe.has_marker_symbol(&module, marker) => ScriptType::ScriptBinary,
        Some(_) => ScriptType::Invalid,
        None => ScriptType::ScriptFile,
    };
    trace!(path = %path.display(), ?script_type, "classified");
    Ok(script_type)
}
