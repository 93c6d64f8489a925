//! Resolved dependencies of a script

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// External library reference, passed to the compiler by name
    Library,
    /// Source file compiled together with the entry script
    ScriptFile,
    /// Precompiled script module, passed to the compiler as a reference
    ScriptBinary,
}

/// A single unit needed to build or run a script
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    Library(String),
    ScriptFile(PathBuf),
    ScriptBinary(PathBuf),
}

impl Dependency {
    pub fn kind(&self) -> DependencyKind {
        match self {
            Dependency::Library(_) => DependencyKind::Library,
            Dependency::ScriptFile(_) => DependencyKind::ScriptFile,
            Dependency::ScriptBinary(_) => DependencyKind::ScriptBinary,
        }
    }

    /// Raw library name or canonical file path; the deduplication key
    pub fn key(&self) -> String {
        match self {
            Dependency::Library(name) => name.clone(),
            Dependency::ScriptFile(path) | Dependency::ScriptBinary(path) => {
                path.to_string_lossy().into_owned()
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Dependency::Library(_) => None,
            Dependency::ScriptFile(path) | Dependency::ScriptBinary(path) => Some(path),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Library(name) => write!(f, "library {name}"),
            Dependency::ScriptFile(path) => write!(f, "script  {}", path.display()),
            Dependency::ScriptBinary(path) => write!(f, "binary  {}", path.display()),
        }
    }
}

/// Ordered, deduplicated result of one dependency resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    deps: IndexMap<String, Dependency>,
}

impl Resolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dependency unless one with the same key is already present.
    /// Returns whether it was inserted.
    pub fn insert(&mut self, dep: Dependency) -> bool {
        let key = dep.key();
        if self.deps.contains_key(&key) {
            return false;
        }
        self.deps.insert(key, dep);
        true
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.deps.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.deps.values()
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Source files to compile alongside the entry script
    pub fn sources(&self) -> Vec<PathBuf> {
        self.iter()
            .filter_map(|dep| match dep {
                Dependency::ScriptFile(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Compiler references: library names and precompiled module paths
    pub fn references(&self) -> Vec<String> {
        self.iter()
            .filter(|dep| dep.kind() != DependencyKind::ScriptFile)
            .map(Dependency::key)
            .collect()
    }
}

impl<'a> IntoIterator for &'a Resolution {
    type Item = &'a Dependency;
    type IntoIter = indexmap::map::Values<'a, String, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.deps.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_deduplicates_by_key() {
        let mut res = Resolution::new();
        assert!(res.insert(Dependency::Library("System.Xml.dll".into())));
        assert!(res.insert(Dependency::ScriptFile("/s/lib.cs".into())));
        assert!(!res.insert(Dependency::Library("System.Xml.dll".into())));
        assert!(!res.insert(Dependency::ScriptBinary("/s/lib.cs".into())));
        assert_eq!(res.len(), 2);
    }

    #[test]
    fn test_views_preserve_order() {
        let mut res = Resolution::new();
        res.insert(Dependency::ScriptBinary("/s/tools.dll".into()));
        res.insert(Dependency::ScriptFile("/s/b.cs".into()));
        res.insert(Dependency::Library("System.Data.dll".into()));
        res.insert(Dependency::ScriptFile("/s/a.cs".into()));

        assert_eq!(res.sources(), vec![PathBuf::from("/s/b.cs"), PathBuf::from("/s/a.cs")]);
        assert_eq!(res.references(), vec!["/s/tools.dll".to_string(), "System.Data.dll".to_string()]);
    }
}
