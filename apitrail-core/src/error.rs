//! Error types for apitrail-core.

use thiserror::Error;

/// Result type alias for apitrail-core operations.
pub type Result<T> = std::result::Result<T, EvolError>;

/// Errors that can occur while analyzing a package.
///
/// Per-file parse failures are not errors: they are recorded as
/// [`crate::parser::Diagnostic`]s and extraction carries on.
#[derive(Error, Debug)]
pub enum EvolError {
    /// A requested version is not known to the version provider.
    #[error("Version {version} not found for package {package}")]
    VersionNotFound {
        /// Package that was queried.
        package: String,
        /// Version that could not be found.
        version: String,
    },

    /// An explicit version list was supplied but it was empty.
    #[error("At least one version must be requested for package {package}")]
    NoVersionsRequested {
        /// Package that was queried.
        package: String,
    },

    /// Request parameters that cannot be combined.
    #[error("Conflicting parameters: {0}")]
    ConflictingParameters(String),

    /// The provider could not supply a source tree for a version.
    #[error("Source for version {version} unavailable: {reason}")]
    SourceUnavailable {
        /// Version whose source was requested.
        version: String,
        /// Description of the failure.
        reason: String,
    },

    /// Diffing a version pair failed. Distinct from a diff with zero changes.
    #[error("Diff {from} -> {to} failed: {reason}")]
    Diff {
        /// Older version of the pair.
        from: String,
        /// Newer version of the pair.
        to: String,
        /// Description of the failure.
        reason: String,
    },

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error reading source files or configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error for persisted results.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for EvolError {
    fn from(err: toml::de::Error) -> Self {
        EvolError::Config(err.to_string())
    }
}
