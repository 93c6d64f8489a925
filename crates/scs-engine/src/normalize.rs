//! Mode normalization: turning a script body into a compilable unit
//!
//! Only the entry script is normalized. `simple` bodies are wrapped in a
//! generated class, `single` bodies additionally in a generated
//! `Main(string[] args)` returning `int`, and `complex` files pass through
//! untouched.

use std::path::Path;

use crate::error::{EngineError, Result};
use crate::header::{read_source, scan_header};
use crate::mode::ScriptMode;

/// Length of generated class names
pub const IDENTIFIER_LEN: usize = 10;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Source of names for generated container classes
pub trait IdentifierSource {
    /// A fresh identifier of [`IDENTIFIER_LEN`] ASCII letters
    fn next_identifier(&mut self) -> String;
}

/// Identifiers drawn from OS randomness
#[derive(Debug, Default)]
pub struct RandomIdentifiers;

impl IdentifierSource for RandomIdentifiers {
    fn next_identifier(&mut self) -> String {
        let mut bytes = [0u8; IDENTIFIER_LEN];
        if getrandom::fill(&mut bytes).is_err() {
            // fall back to something unique within this process
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or_default();
            return encode_letters(nanos as u64);
        }
        bytes
            .iter()
            .map(|b| CHARSET[*b as usize % CHARSET.len()] as char)
            .collect()
    }
}

/// Reproducible identifiers: a counter spelled in letters
#[derive(Debug, Default)]
pub struct SequentialIdentifiers {
    next: u64,
}

impl SequentialIdentifiers {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }
}

impl IdentifierSource for SequentialIdentifiers {
    fn next_identifier(&mut self) -> String {
        let id = encode_letters(self.next);
        self.next += 1;
        id
    }
}

fn encode_letters(mut value: u64) -> String {
    let base = CHARSET.len() as u64;
    let mut out = [CHARSET[0]; IDENTIFIER_LEN];
    for slot in out.iter_mut().rev() {
        *slot = CHARSET[(value % base) as usize];
        value /= base;
    }
    out.iter().map(|b| *b as char).collect()
}

/// Normalize script text according to `mode`.
///
/// The wrapper opening is prepended to the first body line and the closing
/// braces appended to the last line. A header-only script gets an empty
/// body line so it still wraps into a valid unit.
pub fn normalize_source(
    text: &str,
    mode: ScriptMode,
    ids: &mut dyn IdentifierSource,
) -> Option<String> {
    let (open, close) = match mode {
        ScriptMode::Complex => return Some(text.to_string()),
        ScriptMode::Simple => (
            format!("public static class {}{{", ids.next_identifier()),
            "}",
        ),
        ScriptMode::Single => (
            format!(
                "public static class {}{{public static int Main(string[] args){{",
                ids.next_identifier()
            ),
            "}}",
        ),
        ScriptMode::None => return None,
    };

    let body_start = scan_header(text).len();
    let mut lines: Vec<String> = text.lines().map(String::from).collect();
    if body_start >= lines.len() {
        lines.push(String::new());
    }

    lines[body_start] = format!("{open}\n{}", lines[body_start]);
    if let Some(last) = lines.last_mut() {
        last.push('\n');
        last.push_str(close);
    }
    Some(lines.join("\n"))
}

/// Read and normalize the entry script at `path`.
pub fn normalize_file(path: &Path, mode: ScriptMode, ids: &mut dyn IdentifierSource) -> Result<String> {
    let text = read_source(path)?;
    normalize_source(&text, mode, ids).ok_or_else(|| EngineError::InvalidMode(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> SequentialIdentifiers {
        SequentialIdentifiers::default()
    }

    #[test]
    fn test_complex_is_identity() {
        let text = "//#mode complex\nusing System;\npublic static class A { public static void Main() {} }\n";
        assert_eq!(normalize_source(text, ScriptMode::Complex, &mut ids()).unwrap(), text);
    }

    #[test]
    fn test_single_wraps_body_in_main() {
        let text = "//#mode single\nusing System;\nreturn 0;";
        let out = normalize_source(text, ScriptMode::Single, &mut ids()).unwrap();
        assert_eq!(
            out,
            "//#mode single\nusing System;\n\
             public static class AAAAAAAAAA{public static int Main(string[] args){\n\
             return 0;\n}}"
        );
    }

    #[test]
    fn test_simple_wraps_body_in_class() {
        let text = "//#mode simple\nstatic void Main() {\n}";
        let out = normalize_source(text, ScriptMode::Simple, &mut ids()).unwrap();
        assert_eq!(
            out,
            "//#mode simple\npublic static class AAAAAAAAAA{\nstatic void Main() {\n}\n}"
        );
    }

    #[test]
    fn test_header_only_script() {
        let out = normalize_source("// nothing\n", ScriptMode::Single, &mut ids()).unwrap();
        assert_eq!(
            out,
            "// nothing\npublic static class AAAAAAAAAA{public static int Main(string[] args){\n\n}}"
        );
    }

    #[test]
    fn test_none_is_rejected() {
        assert!(normalize_source("return 0;", ScriptMode::None, &mut ids()).is_none());
    }

    #[test]
    fn test_identifiers() {
        let mut seq = SequentialIdentifiers::starting_at(1);
        assert_eq!(seq.next_identifier(), "AAAAAAAAAB");
        assert_eq!(seq.next_identifier(), "AAAAAAAAAC");

        let mut random = RandomIdentifiers;
        let a = random.next_identifier();
        assert_eq!(a.len(), IDENTIFIER_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphabetic()));
    }
}
