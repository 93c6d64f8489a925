//! Script header scanning
//!
//! The header is the leading run of blank lines, `//` comments and `using`
//! declarations. Directives are only recognized there; the first other
//! line starts the script body.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{EngineError, Result};

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Whether an already trimmed line may appear in a script header
pub fn is_header_line(line: &str) -> bool {
    line.is_empty() || line.starts_with("//") || line.starts_with("using ")
}

/// Return the trimmed header lines of a script's text.
///
/// The result is always a prefix of `text.lines()`, so its length is also
/// the index of the first body line.
pub fn scan_header(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .take_while(|line| is_header_line(line))
        .collect()
}

/// Read a script from disk, reporting empty and missing paths distinctly.
///
/// A leading byte order mark is dropped. Bytes that are not valid UTF-8
/// are replaced rather than rejected.
pub fn read_source(path: &Path) -> Result<String> {
    check_exists(path)?;
    let bytes = fs::read(path).map_err(|e| EngineError::io(path, e))?;
    Ok(decode_source(path, bytes))
}

fn decode_source(path: &Path, bytes: Vec<u8>) -> String {
    let mut text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), "source is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    if text.starts_with(BYTE_ORDER_MARK) {
        text.replace_range(..BYTE_ORDER_MARK.len_utf8(), "");
    }
    text
}

/// Read the header lines of a script file
pub fn read_header(path: &Path) -> Result<Vec<String>> {
    let source = read_source(path)?;
    Ok(scan_header(&source).into_iter().map(String::from).collect())
}

pub(crate) fn check_exists(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(EngineError::EmptyPath);
    }
    if !path.is_file() {
        return Err(EngineError::NotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Absolute, canonical form of an existing script path
pub(crate) fn canonical(path: &Path) -> Result<PathBuf> {
    check_exists(path)?;
    path.canonicalize().map_err(|e| EngineError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_stops_at_first_body_line() {
        let text = "//#mode single\n\n  using System;  \nConsole.WriteLine(1);\n//#ref \"late.dll\"\n";
        let header = scan_header(text);
        assert_eq!(header, vec!["//#mode single", "", "using System;"]);
    }

    #[test]
    fn test_header_is_prefix_of_lines() {
        let text = "// a\r\n// b\r\nint x = 0;\r\n// c\r\n";
        let header = scan_header(text);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(header.len(), 2);
        for (h, l) in header.iter().zip(lines.iter()) {
            assert_eq!(*h, l.trim());
        }
    }

    #[test]
    fn test_using_requires_trailing_space() {
        assert!(is_header_line("using System;"));
        assert!(!is_header_line("usingSystem;"));
        assert!(!is_header_line("/* block */"));
    }

    #[test]
    fn test_whole_file_can_be_header() {
        assert_eq!(scan_header("// only\n\n").len(), 2);
        assert!(scan_header("").is_empty());
    }

    #[test]
    fn test_byte_order_mark_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.cs");
        fs::write(&path, "\u{FEFF}//#mode complex\n//#ref \"a.dll\"\nclass Lib {}\n").unwrap();

        let source = read_source(&path).unwrap();
        assert!(source.starts_with("//#mode complex"));
        assert_eq!(read_header(&path).unwrap(), vec!["//#mode complex", "//#ref \"a.dll\""]);
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.cs");
        // Windows-1252 "é" inside a comment
        fs::write(&path, b"// caf\xe9\n//#ref \"a.dll\"\nreturn 0;\n").unwrap();

        let header = read_header(&path).unwrap();
        assert_eq!(header, vec!["// caf\u{FFFD}", "//#ref \"a.dll\""]);
    }

    #[test]
    fn test_read_header_errors() {
        assert!(matches!(read_header(Path::new("")), Err(EngineError::EmptyPath)));
        assert!(matches!(
            read_header(Path::new("/definitely/not/here.cs")),
            Err(EngineError::NotFound(_))
        ));
    }
}
