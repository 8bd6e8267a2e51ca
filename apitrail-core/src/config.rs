//! Analyzer configuration loading from `.apitrail.toml`.
//!
//! Configuration is optional. Every section and every key falls back to a
//! default when absent.
//!
//! # Example Configuration
//!
//! ```toml
//! [extract]
//! include_private = false
//! include_deprecated = true
//! exclude = ["vendor", "_compat"]
//!
//! [analysis]
//! include_yanked = false
//! max_versions = 10
//! num_threads = 4
//! calculate_changes = true
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{EvolError, Result};
use crate::scanner::DEFAULT_EXCLUDES;

/// Name of the configuration file looked up in a directory.
pub const CONFIG_FILE_NAME: &str = ".apitrail.toml";

/// Options for extracting one version's elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Keep `_single_underscore` elements.
    pub include_private: bool,
    /// Keep elements marked deprecated.
    pub include_deprecated: bool,
    /// Path components (directory or file names) to skip.
    pub exclude: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            include_private: true,
            include_deprecated: true,
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Root configuration structure loaded from `.apitrail.toml`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub extract: ExtractConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// `[extract]` section.
#[derive(Clone, Debug, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_true")]
    pub include_private: bool,

    #[serde(default = "default_true")]
    pub include_deprecated: bool,

    /// Extra path components to skip, on top of the built-in list.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Whether the built-in exclusion list applies.
    ///
    /// Default: `true`
    #[serde(default = "default_true")]
    pub default_excludes: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            include_private: true,
            include_deprecated: true,
            exclude: Vec::new(),
            default_excludes: true,
        }
    }
}

/// `[analysis]` section.
#[derive(Clone, Debug, Deserialize)]
pub struct AnalysisConfig {
    /// Analyze versions the registry has withdrawn.
    #[serde(default)]
    pub include_yanked: bool,

    /// Keep only the latest N versions of a range.
    #[serde(default)]
    pub max_versions: Option<usize>,

    /// Size of a dedicated worker pool. The global rayon pool is used when unset.
    #[serde(default)]
    pub num_threads: Option<usize>,

    #[serde(default = "default_true")]
    pub calculate_changes: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include_yanked: false,
            max_versions: None,
            num_threads: None,
            calculate_changes: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl AnalyzerConfig {
    /// Load `.apitrail.toml` from `dir`.
    ///
    /// A missing file yields defaults. An unreadable or malformed file is an
    /// error.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_file(&path)
    }

    /// Load configuration from an explicit file path.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| EvolError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Like [`AnalyzerConfig::load`], but logs failures and falls back to defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        match Self::load(dir) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load {}: {}", CONFIG_FILE_NAME, e);
                Self::default()
            }
        }
    }

    /// Extraction options, with the built-in exclusions merged in.
    pub fn extract_options(&self) -> ExtractOptions {
        let mut exclude = self.extract.exclude.clone();
        if self.extract.default_excludes {
            for default in DEFAULT_EXCLUDES {
                if !exclude.iter().any(|p| p == default) {
                    exclude.push(default.to_string());
                }
            }
        }
        ExtractOptions {
            include_private: self.extract.include_private,
            include_deprecated: self.extract.include_deprecated,
            exclude,
        }
    }
}
