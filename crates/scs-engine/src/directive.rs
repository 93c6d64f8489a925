//! Directive parsing over script header lines
//!
//! A header line containing a space is read as `<command> <argument>`. The
//! recognized commands are [`DIRECTIVE_MODE`], [`DIRECTIVE_REF`],
//! [`DIRECTIVE_INCLUDE`] and [`DIRECTIVE_VERSION`]. Arguments are delimited
//! by double quotes (relative to the including file) or angle brackets
//! (relative to the engine reference directory).

use std::path::{Path, PathBuf};

use crate::error::DirectiveError;

/// Script mode directive
pub const DIRECTIVE_MODE: &str = "//#mode";
/// Library reference directive
pub const DIRECTIVE_REF: &str = "//#ref";
/// Script include directive
pub const DIRECTIVE_INCLUDE: &str = "//#include";
/// Reserved version directive
pub const DIRECTIVE_VERSION: &str = "//#version";

/// A recognized directive with its argument already interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `//#mode` with a delimited argument; it carries no dependency
    Mode(String),
    /// `//#ref`: opaque reference name for the compiler, delimiters stripped
    Ref(String),
    /// `//#include`: absolute path of the included unit
    Include(PathBuf),
}

/// Outcome of interpreting one header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Directive(Directive),
    /// Blank line, plain comment or `using` declaration
    Skip,
    /// Directive scanning for this file is over
    End,
}

/// Delimited directive argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Argument<'a> {
    Quoted(&'a str),
    Bracketed(&'a str),
}

impl<'a> Argument<'a> {
    fn parse(raw: &'a str) -> Option<Self> {
        if raw.len() < 2 {
            return None;
        }
        if let Some(inner) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            Some(Argument::Quoted(inner))
        } else if let Some(inner) = raw.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            Some(Argument::Bracketed(inner))
        } else {
            None
        }
    }

    fn inner(self) -> &'a str {
        match self {
            Argument::Quoted(s) | Argument::Bracketed(s) => s,
        }
    }
}

/// Split a header line into its lower-cased command and trimmed argument.
pub fn split_command(line: &str) -> Option<(String, &str)> {
    let (command, argument) = line.split_once(' ')?;
    Some((command.trim().to_lowercase(), argument.trim()))
}

/// Interpret one header line.
///
/// `base_dir` is the directory of the file being scanned and
/// `reference_dir` the base for bracketed arguments. Errors are plain
/// messages; the caller attributes them to a file and line.
pub fn parse_line(line: &str, base_dir: &Path, reference_dir: &Path) -> Result<Step, String> {
    let Some((command, raw)) = split_command(line) else {
        return Ok(Step::Skip);
    };

    if command == DIRECTIVE_VERSION {
        return Err(format!(
            "{DIRECTIVE_VERSION} is not supported by this engine version. \
             The engine is outdated if the documentation states that this directive is available"
        ));
    }

    let Some(argument) = Argument::parse(raw) else {
        if command == DIRECTIVE_REF || command == DIRECTIVE_INCLUDE {
            return Err("invalid include or reference line. Missing quotes?".to_string());
        }
        return Ok(Step::Skip);
    };

    let directive = match command.as_str() {
        DIRECTIVE_MODE => Directive::Mode(argument.inner().to_string()),
        DIRECTIVE_REF => Directive::Ref(argument.inner().to_string()),
        DIRECTIVE_INCLUDE => {
            let base = match argument {
                Argument::Quoted(_) => base_dir,
                Argument::Bracketed(_) => reference_dir,
            };
            Directive::Include(full_path(&base.join(argument.inner())))
        }
        _ => return Ok(Step::End),
    };
    Ok(Step::Directive(directive))
}

/// Canonical path when the target exists, plain absolute path otherwise so
/// that the classifier can report it as missing.
fn full_path(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Iterator over the directives of one file's header.
///
/// Yields `(line, directive)` pairs with 1-based header line numbers and
/// stops for good after [`Step::End`] or the first error.
pub struct DirectiveParser {
    file: PathBuf,
    base_dir: PathBuf,
    reference_dir: PathBuf,
    lines: std::vec::IntoIter<String>,
    line: usize,
    finished: bool,
}

impl DirectiveParser {
    pub fn new(file: PathBuf, header: Vec<String>, reference_dir: PathBuf) -> Self {
        let base_dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            file,
            base_dir,
            reference_dir,
            lines: header.into_iter(),
            line: 0,
            finished: false,
        }
    }

    /// The file whose header is being parsed
    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl Iterator for DirectiveParser {
    type Item = Result<(usize, Directive), DirectiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let line = self.lines.next()?;
            self.line += 1;
            match parse_line(&line, &self.base_dir, &self.reference_dir) {
                Ok(Step::Skip) => continue,
                Ok(Step::End) => self.finished = true,
                Ok(Step::Directive(directive)) => return Some(Ok((self.line, directive))),
                Err(message) => {
                    self.finished = true;
                    return Some(Err(DirectiveError::new(&self.file, self.line, message)));
                }
            }
        }
        None
    }
}
