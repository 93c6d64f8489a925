//! Compile and run drivers
//!
//! [`Engine`] ties resolution and normalization to the external compiler
//! and module loader: `compile` produces a module from a script, `run`
//! compiles a script (or takes a precompiled module as is), finds its entry
//! point and invokes it.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::{debug, debug_span};

use crate::classify::{classify, LoaderProbe, ScriptType};
use crate::config::EngineConfig;
use crate::dependency::Resolution;
use crate::diagnostic::Diagnostic;
use crate::entry::find_entry_point;
use crate::error::{EngineError, Result};
use crate::header::canonical;
use crate::mode::{script_mode, ScriptMode};
use crate::normalize::{normalize_file, IdentifierSource, RandomIdentifiers};
use crate::resolver::DependencyResolver;
use crate::toolchain::{CompileRequest, CompilerBackend, Invocation, LoadedModule, ModuleLoader};

pub struct Engine<C, L> {
    config: EngineConfig,
    compiler: C,
    loader: L,
    ids: Box<dyn IdentifierSource>,
}

impl<C: CompilerBackend, L: ModuleLoader> Engine<C, L> {
    pub fn new(config: EngineConfig, compiler: C, loader: L) -> Self {
        Self {
            config,
            compiler,
            loader,
            ids: Box::new(RandomIdentifiers),
        }
    }

    /// Replace the source of generated class names
    pub fn with_identifiers(mut self, ids: impl IdentifierSource + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn probe(&self) -> LoaderProbe<'_, L> {
        LoaderProbe(&self.loader)
    }

    pub fn classify(&self, path: &Path) -> Result<ScriptType> {
        classify(&self.probe(), path, &self.config.marker_type)
    }

    pub fn script_mode(&self, path: &Path) -> Result<ScriptMode> {
        script_mode(&self.probe(), path, &self.config.marker_type)
    }

    pub fn resolve(&self, script: &Path) -> Result<Resolution> {
        let probe = self.probe();
        DependencyResolver::new(&probe, &self.config.reference_dir, &self.config.marker_type)
            .resolve(script)
    }

    /// Normalized text of the entry script
    pub fn normalize(&mut self, script: &Path) -> Result<String> {
        let mode = self.script_mode(script)?;
        normalize_file(script, mode, self.ids.as_mut())
    }

    /// Compile `script` and its dependencies into a module at `output`.
    ///
    /// Returns the non-fatal diagnostics. Any fatal diagnostic fails the
    /// whole compilation with every fatal diagnostic attached.
    pub fn compile(&mut self, script: &Path, output: &Path) -> Result<Vec<Diagnostic>> {
        let span = debug_span!("compile", script = %script.display());
        let _enter = span.enter();

        let script = canonical(script)?;
        let resolution = self.resolve(&script)?;
        let normalized = self.normalize(&script)?;

        let norm_path = normalized_path(&script);
        let norm_guard = TempPath::from_path(&norm_path);
        fs::write(&norm_path, normalized).map_err(|e| EngineError::io(&norm_path, e))?;

        let request = self.request(&script, &norm_path, &resolution, output);
        debug!(
            sources = request.sources.len(),
            references = request.references.len(),
            output = %output.display(),
            "invoking compiler"
        );
        let diagnostics = self.compiler.compile(&request);
        drop(norm_guard);

        let (errors, warnings): (Vec<_>, Vec<_>) =
            diagnostics?.into_iter().partition(Diagnostic::is_fatal);
        if !errors.is_empty() {
            return Err(EngineError::CompileFailed(errors));
        }
        Ok(warnings)
    }

    fn request(
        &self,
        script: &Path,
        normalized: &Path,
        resolution: &Resolution,
        output: &Path,
    ) -> CompileRequest {
        let mut sources = vec![normalized.to_path_buf()];
        // an include cycle back to the entry script records it as a dependency
        sources.extend(resolution.sources().into_iter().filter(|p| p != script));

        let mut references = self.config.default_references.clone();
        for reference in resolution.references() {
            if !references.contains(&reference) {
                references.push(reference);
            }
        }

        CompileRequest {
            sources,
            references,
            output: output.to_path_buf(),
            optimize: self.config.optimize,
        }
    }

    /// Run a script or precompiled script module with `args`, returning its
    /// result code.
    pub fn run(&mut self, script: &Path, args: &[String]) -> Result<i32> {
        let span = debug_span!("run", script = %script.display());
        let _enter = span.enter();

        let script = canonical(script)?;
        let (module_path, _compiled) = match self.classify(&script)? {
            ScriptType::ScriptFile => {
                let temp = tempfile::Builder::new()
                    .prefix("scs-")
                    .suffix(".dll")
                    .tempfile()
                    .map_err(|e| EngineError::io(&std::env::temp_dir(), e))?
                    .into_temp_path();
                let warnings = self.compile(&script, &temp)?;
                debug!(warnings = warnings.len(), "compiled for run");
                (temp.to_path_buf(), Some(temp))
            }
            ScriptType::ScriptBinary | ScriptType::Invalid => (script.clone(), None),
        };

        let module = self.loader.load(&module_path)?;
        let entry = find_entry_point(&module.exported_types()?)
            .ok_or_else(|| EngineError::BadFormat { file: script.clone() })?;
        debug!(type_name = %entry.type_name, method = %entry.method, "invoking entry point");

        let args = entry.takes_args.then_some(args);
        match module.invoke(&entry.type_name, &entry.method, args)? {
            Invocation::Returned(value) if entry.returns_int => Ok(value.unwrap_or_default()),
            Invocation::Returned(_) => Ok(0),
            Invocation::Faulted(message) => Err(EngineError::ScriptFault { file: script, message }),
        }
    }
}

/// Where the normalized entry script is written for compilation
pub fn normalized_path(script: &Path) -> PathBuf {
    let mut name = script.as_os_str().to_owned();
    name.push(".norm");
    PathBuf::from(name)
}
