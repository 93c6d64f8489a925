//! `scs.toml` configuration
//!
//! Lookup order: an explicit `--config` path, `$SCS_CONFIG`, then
//! `scs.toml` beside the executable. Without a file the built-in defaults
//! apply. `SCS_COMPILER`, `SCS_HOST` and `SCS_REFERENCE_DIR` override the
//! corresponding settings.

use std::fs;
use std::path::{Path, PathBuf};

use scs_engine::EngineConfig;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "scs.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// C# compiler executable
    pub program: String,
    /// Extra arguments placed before the generated ones
    pub args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "mcs".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Reflection host executable
    pub program: String,
    pub args: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            program: "scs-host".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub compiler: CompilerConfig,
    pub host: HostConfig,
}

impl Config {
    /// Parse config text; relative paths are taken relative to `base_dir`.
    pub fn from_toml(text: &str, base_dir: &Path) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(text)?;
        config.rebase(base_dir);
        Ok(config)
    }

    /// Locate and load the configuration for this process.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("SCS_CONFIG").map(PathBuf::from))
            .or_else(|| Some(exe_dir.join(CONFIG_FILE_NAME)).filter(|p| p.is_file()));

        let mut config = match path {
            Some(path) => {
                let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
                Config::from_toml(&text, &base).map_err(|source| ConfigError::Parse { path, source })?
            }
            None => {
                let mut config = Config::default();
                config.rebase(&exe_dir);
                config
            }
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn rebase(&mut self, base_dir: &Path) {
        if self.engine.reference_dir.is_relative() {
            self.engine.reference_dir = base_dir.join(&self.engine.reference_dir);
        }
    }

    /// Apply `SCS_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(program) = lookup("SCS_COMPILER") {
            self.compiler.program = program;
        }
        if let Some(program) = lookup("SCS_HOST") {
            self.host.program = program;
        }
        if let Some(dir) = lookup("SCS_REFERENCE_DIR") {
            self.engine.reference_dir = PathBuf::from(dir);
        }
    }
}
