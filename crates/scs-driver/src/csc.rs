//! External C# compiler backend
//!
//! Runs `mcs`/`csc` style compilers and turns their console listing into
//! [`Diagnostic`]s.

use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;
use scs_engine::{CompileRequest, CompilerBackend, Diagnostic, Severity, ToolchainError};
use tracing::debug;

/// Compiler run as a child process, one invocation per compilation
#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    program: String,
    args: Vec<String>,
}

impl ProcessCompiler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Command line for a request, without the program itself
    pub fn arguments(&self, request: &CompileRequest) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("-target:library".to_string());
        args.push(format!("-out:{}", request.output.display()));
        if request.optimize {
            args.push("-optimize+".to_string());
        } else {
            args.push("-debug".to_string());
        }
        args.extend(request.references.iter().map(|r| format!("-r:{r}")));
        args.extend(request.sources.iter().map(|s| s.display().to_string()));
        args
    }
}

impl CompilerBackend for ProcessCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<Vec<Diagnostic>, ToolchainError> {
        let args = self.arguments(request);
        debug!(program = %self.program, ?args, "running compiler");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| ToolchainError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut listing = String::from_utf8_lossy(&output.stdout).into_owned();
        listing.push_str(&String::from_utf8_lossy(&output.stderr));

        let mut diagnostics = parse_listing(&listing);
        if !output.status.success() && !diagnostics.iter().any(Diagnostic::is_fatal) {
            diagnostics.push(Diagnostic::error(
                &self.program,
                "SCS0001",
                format!("compiler exited with {}: {}", output.status, listing.trim()),
            ));
        }
        Ok(diagnostics)
    }
}

fn located_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?P<file>.+?)\((?P<line>\d+),(?P<col>\d+)\):\s*(?P<sev>error|warning)\s+(?P<code>\w+):\s*(?P<msg>.*)$",
        )
        .expect("valid diagnostic pattern")
    })
}

fn global_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<sev>error|warning)\s+(?P<code>\w+):\s*(?P<msg>.*)$")
            .expect("valid diagnostic pattern")
    })
}

fn severity(text: &str) -> Severity {
    if text == "error" {
        Severity::Error
    } else {
        Severity::Warning
    }
}

/// Parse a compiler console listing.
///
/// Recognizes `file(line,col): error CS0000: message` and location-less
/// `error CS0000: message` lines; everything else is ignored.
pub fn parse_listing(listing: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for line in listing.lines().map(str::trim) {
        if let Some(caps) = located_pattern().captures(line) {
            diagnostics.push(Diagnostic {
                file: PathBuf::from(&caps["file"]),
                line: caps["line"].parse().unwrap_or_default(),
                column: caps["col"].parse().unwrap_or_default(),
                code: caps["code"].to_string(),
                message: caps["msg"].to_string(),
                severity: severity(&caps["sev"]),
            });
        } else if let Some(caps) = global_pattern().captures(line) {
            diagnostics.push(Diagnostic {
                file: PathBuf::new(),
                line: 0,
                column: 0,
                code: caps["code"].to_string(),
                message: caps["msg"].to_string(),
                severity: severity(&caps["sev"]),
            });
        }
    }
    diagnostics
}
