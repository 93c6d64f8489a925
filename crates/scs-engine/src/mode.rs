//! Script modes and their detection from the `//#mode` directive

use std::fmt;
use std::path::Path;

use crate::classify::{classify, ModuleProbe, ScriptType};
use crate::directive::{split_command, DIRECTIVE_MODE};
use crate::error::{DirectiveError, Result};
use crate::header::read_header;

/// How much of a script is already a complete compilation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptMode {
    /// Not applicable: missing file or not a source file
    None,
    /// The body is the content of `Main(string[] args)`
    #[default]
    Single,
    /// The body is the content of a class that provides its own `Main`
    Simple,
    /// The file is a complete unit with its own class and `Main`
    Complex,
}

impl ScriptMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "single" => Some(ScriptMode::Single),
            "simple" => Some(ScriptMode::Simple),
            "complex" => Some(ScriptMode::Complex),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScriptMode::None => "none",
            ScriptMode::Single => "single",
            ScriptMode::Simple => "simple",
            ScriptMode::Complex => "complex",
        };
        f.write_str(name)
    }
}

/// Mode declared in a source file's header; `Single` when absent.
///
/// The first `//#mode` line of the header wins. Its value must be one of
/// the literal mode names.
pub fn read_mode(path: &Path) -> Result<ScriptMode> {
    for (index, line) in read_header(path)?.iter().enumerate() {
        let Some((command, argument)) = split_command(line) else {
            continue;
        };
        if command != DIRECTIVE_MODE {
            continue;
        }
        let value = argument.split_whitespace().next().unwrap_or_default();
        return ScriptMode::from_name(value).ok_or_else(|| {
            DirectiveError::new(path, index + 1, format!("invalid mode line: {line}")).into()
        });
    }
    Ok(ScriptMode::default())
}

/// Mode of any path: `None` unless it classifies as a source file.
pub fn script_mode<P: ModuleProbe + ?Sized>(probe: &P, path: &Path, marker: &str) -> Result<ScriptMode> {
    match classify(probe, path, marker) {
        Ok(ScriptType::ScriptFile) => read_mode(path),
        Ok(_) | Err(_) => Ok(ScriptMode::None),
    }
}
