//! apitrail core - API extraction and diff engine for Python packages.
//!
//! This crate tracks how the public surface of a Python package changes
//! across its released versions. Each version's source tree is parsed with
//! tree-sitter into a flat collection of [`ApiElement`]s, adjacent
//! collections are diffed into classified [`ApiChange`]s, and the changes
//! fold into per-API lifecycles and a corpus summary.
//!
//! # Features
//!
//! - **Parallel extraction**: files and versions are parsed concurrently with Rayon
//! - **Stable identity**: elements are keyed by full name plus signature
//! - **Compatibility checks**: signature changes that only add defaulted
//!   parameters are flagged backwards compatible
//! - **Lifecycles**: introduced, removed, deprecated and modified versions per API
//! - **JSON persistence**: results round-trip byte for byte
//!
//! # Usage
//!
//! ```
//! use apitrail_core::{Analyzer, MemoryTree, StaticProvider, VersionInfo};
//!
//! let provider = StaticProvider::new()
//!     .with_version(
//!         "pkg",
//!         VersionInfo::new("1.0", Some("2024-01-01")),
//!         MemoryTree::new("pkg").with_file("pkg/__init__.py", "def f(x):\n    pass\n"),
//!     )
//!     .with_version(
//!         "pkg",
//!         VersionInfo::new("1.1", Some("2024-03-01")),
//!         MemoryTree::new("pkg").with_file("pkg/__init__.py", "def f(x, y=1):\n    pass\n"),
//!     );
//!
//! let result = Analyzer::new(provider).analyze_package("pkg", None, None, None)?;
//! assert_eq!(result.changes.len(), 1);
//! assert!(!result.has_breaking_changes());
//! # Ok::<(), apitrail_core::EvolError>(())
//! ```

pub mod analyzer;
pub mod config;
pub mod differ;
pub mod error;
pub mod exporter;
pub mod lifecycle;
pub mod parser;
pub mod result;
pub mod scanner;
pub mod types;

pub use analyzer::{AnalysisRequest, Analyzer, StaticProvider, VersionProvider};
pub use config::{AnalyzerConfig, ExtractOptions};
pub use differ::{diff, identity, ApiChange, ChangeType};
pub use error::{EvolError, Result};
pub use lifecycle::{ApiLifecycle, CorpusSummary};
pub use parser::{extract, Diagnostic, Extraction};
pub use result::{AnalysisResult, AnalysisType};
pub use scanner::{DirectoryTree, MemoryTree, SourceTree};
pub use types::{ApiElement, ApiKind, ElementDetail, VersionInfo};
