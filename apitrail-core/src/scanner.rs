//! Source trees and Python file discovery.
//!
//! A [`SourceTree`] is whatever holds one version's sources: an unpacked
//! archive on disk ([`DirectoryTree`], walked with the `ignore` crate) or a
//! map of in-memory files ([`MemoryTree`]).

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;
use tracing::debug;

use crate::error::Result;

/// Path components skipped during discovery unless configured otherwise.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "tests",
    "test",
    "docs",
    "doc",
    "examples",
    "benchmarks",
    "build",
    "__pycache__",
    ".git",
    ".tox",
    "venv",
    ".venv",
    "setup.py",
    "conftest.py",
];

/// The files of one package version.
///
/// Paths are relative to the tree root and `/`-separated.
pub trait SourceTree: Send + Sync {
    /// Name used as the module path when a file maps to the empty path.
    fn root_name(&self) -> &str;

    /// Every file in the tree.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Contents of one file as UTF-8.
    fn read_file(&self, path: &str) -> Result<String>;
}

impl<T: SourceTree + ?Sized> SourceTree for Arc<T> {
    fn root_name(&self) -> &str {
        (**self).root_name()
    }

    fn list_files(&self) -> Result<Vec<String>> {
        (**self).list_files()
    }

    fn read_file(&self, path: &str) -> Result<String> {
        (**self).read_file(path)
    }
}

/// A source tree backed by a local directory.
#[derive(Clone, Debug)]
pub struct DirectoryTree {
    root: PathBuf,
    name: String,
}

impl DirectoryTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("package")
            .to_string();
        Self { root, name }
    }

    /// Override the root name (defaults to the directory name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceTree for DirectoryTree {
    fn root_name(&self) -> &str {
        &self.name
    }

    fn list_files(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Path does not exist: {}", self.root.display()),
            )
            .into());
        }

        // Hidden entries are skipped; VCS ignore files are not consulted.
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false)
            .follow_links(false)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().map_or(false, |ft| ft.is_file()) {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                files.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
        Ok(files)
    }

    fn read_file(&self, path: &str) -> Result<String> {
        let bytes = fs::read(self.root.join(path))?;
        String::from_utf8(bytes).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "file is not valid UTF-8").into()
        })
    }
}

/// A source tree held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryTree {
    name: String,
    files: BTreeMap<String, String>,
}

impl MemoryTree {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: BTreeMap::new(),
        }
    }

    /// Add a file.
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceTree for MemoryTree {
    fn root_name(&self) -> &str {
        &self.name
    }

    fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read_file(&self, path: &str) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("No such file: {}", path)).into()
        })
    }
}

/// Python files of a tree, excluded components filtered out, sorted.
///
/// A path is excluded when any of its components (directory or file name)
/// equals an entry of `exclude`.
pub fn discover_python_files(tree: &dyn SourceTree, exclude: &[String]) -> Result<Vec<String>> {
    let excluded: HashSet<&str> = exclude.iter().map(String::as_str).collect();

    let mut files: Vec<String> = tree
        .list_files()?
        .into_iter()
        .filter(|path| path.ends_with(".py"))
        .filter(|path| !path.split('/').any(|c| excluded.contains(c)))
        .collect();
    files.sort();

    debug!(root = tree.root_name(), count = files.len(), "Discovered Python files");
    Ok(files)
}

/// Dotted module path of a file.
///
/// `.py` is stripped, a leading `src/` dropped and `__init__.py` maps to its
/// package. A non-empty `base` is prefixed. An empty result falls back to
/// `root_name`.
pub fn module_path_for(path: &str, base: &str, root_name: &str) -> String {
    let mut parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    if parts.len() > 1 && parts[0] == "src" {
        parts.remove(0);
    }
    if let Some(last) = parts.pop() {
        let stem = last.strip_suffix(".py").unwrap_or(last);
        if stem != "__init__" {
            parts.push(stem);
        }
    }

    let relative = parts.join(".");
    match (base.is_empty(), relative.is_empty()) {
        (false, false) => format!("{}.{}", base, relative),
        (false, true) => base.to_string(),
        (true, false) => relative,
        (true, true) => root_name.to_string(),
    }
}
