//! Console presentation of engine failures

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use scs_engine::{Diagnostic, DirectiveError, EngineError};

/// Char range of a 1-based line, without its line terminator
fn line_span(source: &str, line: usize) -> Range<usize> {
    let mut offset = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        let content = text.trim_end_matches(['\r', '\n']);
        let len = content.chars().count();
        if index + 1 == line {
            return offset..offset + len;
        }
        offset += text.chars().count();
    }
    offset..offset
}

/// Directive errors from the outermost include down to the one that failed
fn directive_chain(err: &DirectiveError) -> (Vec<&DirectiveError>, Option<&EngineError>) {
    let mut chain = vec![err];
    let mut current = err;
    loop {
        match current.cause.as_deref() {
            Some(EngineError::Directive(inner)) => {
                chain.push(inner);
                current = inner;
            }
            other => return (chain, other),
        }
    }
}

/// Write an annotated report for a directive error and its causes.
pub fn write_directive_error(err: &DirectiveError, color: bool, out: &mut dyn Write) -> io::Result<()> {
    let (chain, root) = directive_chain(err);
    let last = chain.len() - 1;

    for (index, directive) in chain.into_iter().enumerate() {
        let filename = directive.file.display().to_string();
        let Ok(source) = fs::read_to_string(&directive.file) else {
            writeln!(out, "error: {directive}")?;
            continue;
        };

        let span = (filename.as_str(), line_span(&source, directive.line));
        let mut report = Report::build(ReportKind::Error, span.clone())
            .with_config(Config::default().with_color(color))
            .with_code("D0001")
            .with_message("Directive error")
            .with_label(
                Label::new(span)
                    .with_message(&directive.message)
                    .with_color(Color::Red),
            );
        if index == last {
            if let Some(root) = root {
                report = report.with_note(format!("caused by: {root}"));
            }
        }
        report
            .finish()
            .write((filename.as_str(), Source::from(source.as_str())), &mut *out)?;
    }
    Ok(())
}

pub fn write_compile_failure(diags: &[Diagnostic], out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "Got {} error(s)", diags.len())?;
    for diag in diags {
        writeln!(out, "{diag}")?;
    }
    Ok(())
}

pub fn write_warnings(diags: &[Diagnostic], out: &mut dyn Write) -> io::Result<()> {
    if diags.is_empty() {
        return Ok(());
    }
    writeln!(out, "Got {} warning(s)", diags.len())?;
    for diag in diags {
        writeln!(out, "{diag}")?;
    }
    Ok(())
}

/// Print any engine error to stderr the way the `scs` command presents it.
pub fn report_error(err: &EngineError) {
    let stderr = io::stderr();
    let color = stderr.is_terminal();
    let mut out = stderr.lock();
    let written = match err {
        EngineError::Directive(directive) => write_directive_error(directive, color, &mut out),
        EngineError::CompileFailed(diags) => write_compile_failure(diags, &mut out),
        EngineError::ScriptFault { file, message } => writeln!(
            out,
            "Uncaught script exception in {}\n{message}",
            file.display()
        ),
        other => writeln!(out, "error: {other}"),
    };
    if written.is_err() {
        eprintln!("error: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_span() {
        let source = "// one\r\n//#include x\nreturn 0;";
        assert_eq!(line_span(source, 1), 0..6);
        assert_eq!(line_span(source, 2), 8..20);
        assert_eq!(line_span(source, 3), 21..30);
        assert_eq!(line_span(source, 9), 30..30);
    }

    #[test]
    fn test_directive_report_mentions_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.cs");
        let lib = dir.path().join("lib.cs");
        fs::write(&main, "//#include \"lib.cs\"\nreturn 0;\n").unwrap();
        fs::write(&lib, "//#mode complex\n//#version \"2\"\n").unwrap();

        let err = DirectiveError::new(&main, 1, "error processing //#include statement")
            .with_cause(DirectiveError::new(&lib, 2, "//#version is not supported").into());

        let mut out = Vec::new();
        write_directive_error(&err, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("main.cs"));
        assert!(text.contains("lib.cs"));
        assert!(text.contains("//#version is not supported"));
    }

    #[test]
    fn test_compile_failure_listing() {
        let diags = vec![Diagnostic::error("a.cs", "CS0006", "missing").at(1, 2)];
        let mut out = Vec::new();
        write_compile_failure(&diags, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Got 1 error(s)\na.cs [1:2] CS0006: missing\n");
    }
}
