//! Source extraction.
//!
//! Walks one version's [`SourceTree`] and turns every discovered Python file
//! into [`ApiElement`]s. Files are parsed in parallel with rayon, one
//! tree-sitter parser per file. A file that cannot be read or parsed is
//! skipped and reported as a [`Diagnostic`].

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::scanner::{discover_python_files, module_path_for, SourceTree};
use crate::types::ApiElement;

pub use crate::config::ExtractOptions;

pub mod deprecation;
pub mod python;
pub mod signature;

mod helpers;

/// A file skipped during extraction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Path of the file within its source tree.
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Elements and diagnostics of one source tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Ordered by file path, then source position.
    pub elements: Vec<ApiElement>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Extract the API elements of a source tree.
///
/// `module_path` is prefixed to every derived module path; pass `""` to use
/// paths relative to the tree root. Fails only when the tree itself cannot be
/// listed.
pub fn extract(
    tree: &dyn SourceTree,
    module_path: &str,
    options: &ExtractOptions,
) -> Result<Extraction> {
    let files = discover_python_files(tree, &options.exclude)?;

    let parsed: Vec<(&String, std::result::Result<Vec<ApiElement>, String>)> = files
        .par_iter()
        .map(|path| {
            let module = module_path_for(path, module_path, tree.root_name());
            let result = match tree.read_file(path) {
                Ok(source) => python::parse(&source, &module),
                Err(e) => Err(e.to_string()),
            };
            (path, result)
        })
        .collect();

    let mut extraction = Extraction::default();
    for (path, result) in parsed {
        match result {
            Ok(elements) => extraction.elements.extend(elements),
            Err(message) => {
                warn!(path = %path, error = %message, "Skipping file");
                extraction.diagnostics.push(Diagnostic::new(path.as_str(), message));
            }
        }
    }
    extraction.elements = apply_filters(extraction.elements, options);

    debug!(
        root = tree.root_name(),
        files = files.len(),
        elements = extraction.elements.len(),
        skipped = extraction.diagnostics.len(),
        "Extraction complete"
    );
    Ok(extraction)
}

/// Extract a single in-memory module.
pub fn extract_source(
    source: &str,
    module_path: &str,
    options: &ExtractOptions,
) -> std::result::Result<Vec<ApiElement>, String> {
    python::parse(source, module_path).map(|elements| apply_filters(elements, options))
}

/// Drop private and/or deprecated elements as configured.
pub fn apply_filters(elements: Vec<ApiElement>, options: &ExtractOptions) -> Vec<ApiElement> {
    if options.include_private && options.include_deprecated {
        return elements;
    }
    elements
        .into_iter()
        .filter(|e| options.include_private || !e.is_private())
        .filter(|e| options.include_deprecated || !e.is_deprecated())
        .collect()
}
