//! Reflection host module loader
//!
//! Compiled script modules are loaded by a separate host process that can
//! reflect over and invoke them. Two commands are used:
//!
//! - `describe <module>` prints the module's exported types as JSON on
//!   stdout and exits nonzero when the file is not a loadable module.
//! - `invoke <module> <type> <method> --result <file> [--no-args] -- <args>`
//!   runs the method with inherited stdio and writes the outcome as JSON to
//!   the result file.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use scs_engine::{Invocation, LoadedModule, ModuleLoader, ToolchainError, TypeInfo};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Description {
    #[serde(default)]
    types: Vec<TypeInfo>,
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Outcome {
    Returned {
        #[serde(default)]
        value: Option<i32>,
    },
    Faulted {
        exception: String,
    },
}

impl From<Outcome> for Invocation {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Returned { value } => Invocation::Returned(value),
            Outcome::Faulted { exception } => Invocation::Faulted(exception),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HostLoader {
    program: String,
    args: Vec<String>,
}

impl HostLoader {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> ToolchainError {
        ToolchainError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl ModuleLoader for HostLoader {
    type Module = HostModule;

    fn load(&self, path: &Path) -> Result<HostModule, ToolchainError> {
        let output = self
            .command()
            .arg("describe")
            .arg(path)
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ToolchainError::Load {
                path: path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let types = parse_description(&output.stdout).map_err(|message| ToolchainError::Protocol {
            tool: self.program.clone(),
            message,
        })?;
        debug!(path = %path.display(), types = types.len(), "module loaded");

        Ok(HostModule {
            host: self.clone(),
            path: path.to_path_buf(),
            types,
        })
    }
}

/// A module described by the host; invocations go back through the host.
#[derive(Debug)]
pub struct HostModule {
    host: HostLoader,
    path: PathBuf,
    types: Vec<TypeInfo>,
}

impl LoadedModule for HostModule {
    fn has_type(&self, name: &str) -> bool {
        self.types.iter().any(|t| t.name == name)
    }

    fn exported_types(&self) -> Result<Vec<TypeInfo>, ToolchainError> {
        Ok(self.types.clone())
    }

    fn invoke(
        &self,
        type_name: &str,
        method: &str,
        args: Option<&[String]>,
    ) -> Result<Invocation, ToolchainError> {
        let result = tempfile::Builder::new()
            .prefix("scs-result-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| ToolchainError::Protocol {
                tool: self.host.program.clone(),
                message: format!("cannot create result file: {e}"),
            })?
            .into_temp_path();

        let mut cmd = self.host.command();
        cmd.arg("invoke")
            .arg(&self.path)
            .arg(type_name)
            .arg(method)
            .arg("--result")
            .arg(&*result);
        match args {
            Some(args) => {
                cmd.arg("--").args(args);
            }
            None => {
                cmd.arg("--no-args");
            }
        }

        let status = cmd.status().map_err(|e| self.host.spawn_error(e))?;
        let text = fs::read_to_string(&result).unwrap_or_default();
        settle(&text, status).map_err(|message| ToolchainError::Protocol {
            tool: self.host.program.clone(),
            message,
        })
    }
}

/// Outcome of one host invocation from its result file and exit status.
///
/// A host that fails without leaving a result died with the script, which
/// counts as a script fault rather than a broken host.
fn settle(text: &str, status: ExitStatus) -> Result<Invocation, String> {
    if text.trim().is_empty() && !status.success() {
        return Ok(Invocation::Faulted(format!(
            "script host terminated abnormally ({status})"
        )));
    }
    parse_outcome(text)
        .map(Invocation::from)
        .map_err(|message| format!("{message} (host exited with {status})"))
}

fn parse_description(stdout: &[u8]) -> Result<Vec<TypeInfo>, String> {
    serde_json::from_slice::<Description>(stdout)
        .map(|d| d.types)
        .map_err(|e| format!("invalid module description: {e}"))
}

fn parse_outcome(text: &str) -> Result<Outcome, String> {
    if text.trim().is_empty() {
        return Err("no invocation result".to_string());
    }
    serde_json::from_str(text).map_err(|e| format!("invalid invocation result: {e}"))
}
