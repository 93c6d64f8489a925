//! Dependency resolution over `//#ref` and `//#include` directives
//!
//! The walk is depth-first: an included source file is recorded and fully
//! walked before the including file continues with its next directive.
//! Each distinct file is walked at most once, which is what keeps include
//! cycles from looping.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::classify::{classify, ModuleProbe, ScriptType};
use crate::dependency::{Dependency, Resolution};
use crate::directive::{Directive, DirectiveParser};
use crate::error::{DirectiveError, EngineError, Result};
use crate::header::{canonical, read_header};
use crate::mode::{read_mode, ScriptMode};

/// A file whose header is being walked
struct Frame {
    parser: DirectiveParser,
    /// Header line of the parent frame that included this file
    origin: usize,
}

impl Frame {
    fn open(file: PathBuf, origin: usize, reference_dir: &Path) -> Result<Self> {
        let header = read_header(&file)?;
        Ok(Self {
            parser: DirectiveParser::new(file, header, reference_dir.to_path_buf()),
            origin,
        })
    }

    fn file(&self) -> &Path {
        self.parser.file()
    }
}

/// Resolves the full dependency set of an entry script
pub struct DependencyResolver<'a, P: ?Sized> {
    probe: &'a P,
    reference_dir: &'a Path,
    marker: &'a str,
}

impl<'a, P: ModuleProbe + ?Sized> DependencyResolver<'a, P> {
    pub fn new(probe: &'a P, reference_dir: &'a Path, marker: &'a str) -> Self {
        Self {
            probe,
            reference_dir,
            marker,
        }
    }

    /// Resolve every dependency reachable from `source`.
    ///
    /// The entry script itself is not part of the result.
    pub fn resolve(&self, source: &Path) -> Result<Resolution> {
        let root = canonical(source)?;
        let mut resolution = Resolution::new();
        let mut stack = vec![Frame::open(root, 0, self.reference_dir)?];

        while let Some(frame) = stack.last_mut() {
            let Some(item) = frame.parser.next() else {
                stack.pop();
                continue;
            };
            let step = item
                .map_err(EngineError::from)
                .and_then(|(line, directive)| self.apply(&mut resolution, frame.file(), line, directive));
            match step {
                Ok(Some(child)) => stack.push(child),
                Ok(None) => {}
                Err(err) => return Err(unwind(&stack, err)),
            }
        }

        debug!(source = %source.display(), count = resolution.len(), "dependencies resolved");
        Ok(resolution)
    }

    /// Record one directive; returns the frame to walk next for a newly
    /// included source file.
    fn apply(
        &self,
        resolution: &mut Resolution,
        file: &Path,
        line: usize,
        directive: Directive,
    ) -> Result<Option<Frame>> {
        match directive {
            Directive::Mode(_) => Ok(None),
            Directive::Ref(name) => {
                if resolution.insert(Dependency::Library(name.clone())) {
                    debug!(%name, "library reference");
                }
                Ok(None)
            }
            Directive::Include(target) => self.include(resolution, file, line, target),
        }
    }

    fn include(
        &self,
        resolution: &mut Resolution,
        file: &Path,
        line: usize,
        target: PathBuf,
    ) -> Result<Option<Frame>> {
        let wrap = |err: EngineError| -> EngineError { include_failed(file, line, err) };

        match classify(self.probe, &target, self.marker).map_err(wrap)? {
            ScriptType::ScriptBinary => {
                if resolution.insert(Dependency::ScriptBinary(target.clone())) {
                    debug!(path = %target.display(), "script binary");
                }
                Ok(None)
            }
            ScriptType::ScriptFile => {
                if read_mode(&target).map_err(wrap)? != ScriptMode::Complex {
                    return Err(DirectiveError::new(
                        file,
                        line,
                        format!(
                            "files used in //#include must use complex mode. \
                             Use '//#mode complex' in {} to fix this",
                            target.display()
                        ),
                    )
                    .into());
                }
                if !resolution.insert(Dependency::ScriptFile(target.clone())) {
                    return Ok(None);
                }
                debug!(path = %target.display(), "script file");
                Frame::open(target, line, self.reference_dir)
                    .map(Some)
                    .map_err(wrap)
            }
            ScriptType::Invalid => Err(DirectiveError::new(
                file,
                line,
                format!(
                    "error processing //#include statement: the referenced file '{}' is not a valid script binary",
                    target.display()
                ),
            )
            .into()),
        }
    }
}

fn include_failed(file: &Path, line: usize, cause: EngineError) -> EngineError {
    DirectiveError::new(file, line, "error processing //#include statement")
        .with_cause(cause)
        .into()
}

/// Attribute an error raised in the innermost frame to every include line
/// that led to it, outermost file last.
fn unwind(stack: &[Frame], mut err: EngineError) -> EngineError {
    for pair in stack.windows(2).rev() {
        let (parent, child) = (&pair[0], &pair[1]);
        err = include_failed(parent.file(), child.origin, err);
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::DEFAULT_MARKER_TYPE;
    use std::fs;
    use tempfile::TempDir;

    /// Nothing loads as a module, so every existing file is source.
    struct SourceOnly;

    impl ModuleProbe for SourceOnly {
        type Handle = ();

        fn try_load_module(&self, _path: &Path) -> Option<()> {
            None
        }

        fn has_marker_symbol(&self, _module: &(), _marker: &str) -> bool {
            false
        }
    }

    fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path.canonicalize().unwrap()
    }

    fn resolve(dir: &TempDir, entry: &Path) -> Result<Resolution> {
        DependencyResolver::new(&SourceOnly, dir.path(), DEFAULT_MARKER_TYPE).resolve(entry)
    }

    #[test]
    fn test_refs_and_includes_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let lib = write(&dir, "lib.cs", "//#mode complex\n//#ref \"System.Xml.dll\"\nclass Lib {}\n");
        let main = write(
            &dir,
            "main.cs",
            "//#ref \"System.Data.dll\"\n//#include \"lib.cs\"\n//#ref \"System.Web.dll\"\nreturn 0;\n",
        );

        let res = resolve(&dir, &main).unwrap();
        let deps: Vec<_> = res.iter().cloned().collect();
        assert_eq!(
            deps,
            vec![
                Dependency::Library("System.Data.dll".into()),
                Dependency::ScriptFile(lib),
                Dependency::Library("System.Xml.dll".into()),
                Dependency::Library("System.Web.dll".into()),
            ]
        );
    }

    #[test]
    fn test_byte_order_mark_keeps_directives() {
        let dir = tempfile::tempdir().unwrap();
        let lib = write(&dir, "lib.cs", "\u{FEFF}//#mode complex\npublic static class Lib {}\n");
        let main = write(
            &dir,
            "main.cs",
            "\u{FEFF}//#ref \"System.Xml.dll\"\n//#include \"lib.cs\"\nreturn 0;\n",
        );

        assert_eq!(read_mode(&lib).unwrap(), ScriptMode::Complex);
        let deps: Vec<_> = resolve(&dir, &main).unwrap().iter().cloned().collect();
        assert_eq!(
            deps,
            vec![
                Dependency::Library("System.Xml.dll".into()),
                Dependency::ScriptFile(lib),
            ]
        );
    }

    #[test]
    fn test_include_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.cs", "//#mode complex\n//#include \"b.cs\"\nclass A {}\n");
        let b = write(&dir, "b.cs", "//#mode complex\n//#include \"a.cs\"\nclass B {}\n");

        let res = resolve(&dir, &a).unwrap();
        let deps: Vec<_> = res.iter().cloned().collect();
        assert_eq!(deps, vec![Dependency::ScriptFile(b), Dependency::ScriptFile(a)]);
    }

    #[test]
    fn test_diamond_is_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "base.cs", "//#mode complex\n//#ref \"Shared.dll\"\nclass Base {}\n");
        write(&dir, "left.cs", "//#mode complex\n//#include \"base.cs\"\n//#ref \"Shared.dll\"\nclass L {}\n");
        write(&dir, "right.cs", "//#mode complex\n//#include \"base.cs\"\nclass R {}\n");
        let main = write(&dir, "main.cs", "//#include \"left.cs\"\n//#include \"right.cs\"\nreturn 0;\n");

        let res = resolve(&dir, &main).unwrap();
        assert_eq!(res.len(), 4);
        let mut keys: Vec<_> = res.iter().map(Dependency::key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_non_complex_include_fails_naming_file() {
        let dir = tempfile::tempdir().unwrap();
        let lib = write(&dir, "lib.cs", "//#mode simple\nstatic void Main() {}\n");
        let main = write(&dir, "main.cs", "// entry\n//#include \"lib.cs\"\nreturn 0;\n");

        match resolve(&dir, &main).unwrap_err() {
            EngineError::Directive(err) => {
                assert_eq!(err.file, main);
                assert_eq!(err.line, 2);
                assert!(err.message.contains(&lib.display().to_string()));
                assert!(err.message.contains("complex"));
            }
            other => panic!("expected directive error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_include_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(&dir, "main.cs", "//#include \"nope.cs\"\nreturn 0;\n");

        match resolve(&dir, &main).unwrap_err() {
            EngineError::Directive(err) => {
                assert_eq!(err.line, 1);
                assert!(matches!(err.cause.as_deref(), Some(EngineError::NotFound(_))));
            }
            other => panic!("expected directive error, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_error_is_attributed_through_every_include() {
        let dir = tempfile::tempdir().unwrap();
        let lib = write(&dir, "lib.cs", "//#mode complex\n\n//#version \"2\"\nclass Lib {}\n");
        let main = write(&dir, "main.cs", "//#include \"lib.cs\"\nreturn 0;\n");

        match resolve(&dir, &main).unwrap_err() {
            EngineError::Directive(err) => {
                assert_eq!(err.file, main);
                assert_eq!(err.line, 1);
                let inner = err.innermost();
                assert_eq!(inner.file, lib);
                assert_eq!(inner.line, 3);
                assert!(inner.message.contains("not supported"));
            }
            other => panic!("expected directive error, got {other:?}"),
        }
    }

    #[test]
    fn test_version_in_entry_header_fails() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(&dir, "main.cs", "//#ref \"a.dll\"\n//#version 1\nreturn 0;\n");
        let err = resolve(&dir, &main).unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_directives_after_body_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(
            &dir,
            "main.cs",
            "//#ref \"a.dll\"\nreturn 0;\n//#include \"nope.cs\"\n//#version 1\n//#ref bad\n",
        );
        let res = resolve(&dir, &main).unwrap();
        assert_eq!(res.len(), 1);
    }

    #[test]
    fn test_bracketed_include_uses_reference_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let tools = write(&dir, "tools.cs", "//#mode complex\nclass Tools {}\n");
        let main = write(&dir, "sub/main.cs", "//#include <tools.cs>\nreturn 0;\n");

        let res = resolve(&dir, &main).unwrap();
        assert_eq!(res.sources(), vec![tools]);
    }
}
