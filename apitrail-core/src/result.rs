//! The outcome of one analysis run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::differ::changes::{ApiChange, ChangeType};
use crate::lifecycle::{self, ApiLifecycle, CorpusSummary};
use crate::parser::Diagnostic;
use crate::types::{ApiElement, ApiKind, VersionInfo};

/// How the analyzed versions were selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    SpecificVersions,
    VersionRange,
    CompareOnly,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::SpecificVersions => "specific_versions",
            AnalysisType::VersionRange => "version_range",
            AnalysisType::CompareOnly => "compare_only",
        }
    }
}

/// Settings the run was performed with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub include_private: bool,
    pub include_deprecated: bool,
    pub include_yanked: bool,
    pub max_versions: Option<usize>,
}

/// Bookkeeping about the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub analysis_type: AnalysisType,
    pub calculate_changes: bool,
    pub requested_versions: Vec<String>,
    pub successful_versions: Vec<String>,
    /// Version → reason its source could not be extracted.
    #[serde(default)]
    pub failed_versions: BTreeMap<String, String>,
    /// Versions skipped because the run was cancelled.
    #[serde(default)]
    pub cancelled_versions: Vec<String>,
    /// Version → files skipped during extraction.
    #[serde(default)]
    pub diagnostics: BTreeMap<String, Vec<Diagnostic>>,
    pub settings: AnalysisSettings,
}

/// Result of analyzing a package across versions.
///
/// `versions` lists the successfully extracted versions only and
/// `api_elements` follows its order. Failed and cancelled versions appear in
/// the metadata alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub package_name: String,
    pub versions: Vec<VersionInfo>,
    pub api_elements: IndexMap<String, Vec<ApiElement>>,
    pub changes: Vec<ApiChange>,
    pub analysis_date: DateTime<Utc>,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// Changes restricted to the given change types and/or element kinds.
    /// `None` means no restriction.
    pub fn changes_filtered(
        &self,
        change_types: Option<&[ChangeType]>,
        kinds: Option<&[ApiKind]>,
    ) -> Vec<&ApiChange> {
        self.changes
            .iter()
            .filter(|c| change_types.map_or(true, |types| types.contains(&c.change_type())))
            .filter(|c| kinds.map_or(true, |kinds| kinds.contains(&c.element().kind())))
            .collect()
    }

    /// Elements of one version; empty if the version was not analyzed.
    pub fn version_apis(&self, version: &str) -> &[ApiElement] {
        self.api_elements
            .get(version)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Lifecycle of an API by full name or simple name.
    pub fn lifecycle(&self, api_name: &str) -> ApiLifecycle {
        lifecycle::lifecycle_of(api_name, &self.versions, &self.api_elements, &self.changes)
    }

    /// Lifecycle of every API, keyed by full name.
    pub fn lifecycles(&self) -> BTreeMap<String, ApiLifecycle> {
        lifecycle::build_lifecycles(&self.versions, &self.api_elements, &self.changes)
    }

    pub fn summary(&self) -> CorpusSummary {
        lifecycle::summarize(
            &self.package_name,
            &self.versions,
            &self.api_elements,
            &self.changes,
        )
    }

    /// Whether any change breaks existing callers.
    pub fn has_breaking_changes(&self) -> bool {
        self.changes.iter().any(|c| !c.is_backwards_compatible())
    }

    pub fn breaking_changes(&self) -> Vec<&ApiChange> {
        self.changes
            .iter()
            .filter(|c| !c.is_backwards_compatible())
            .collect()
    }
}
