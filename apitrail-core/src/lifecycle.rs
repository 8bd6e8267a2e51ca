//! Per-API history and corpus summary across an ordered version sequence.
//!
//! Both views are an explicit fold over the ordered `(version, collection)`
//! sequence and the adjacent-pair change list. Nothing shared is mutated.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::differ::changes::{ApiChange, ChangeType};
use crate::differ::identity::identity;
use crate::types::{ApiElement, ApiKind, VersionInfo};

/// One signature modification of an API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    pub version: String,
    pub old_signature: Option<String>,
    pub new_signature: Option<String>,
    pub description: Option<String>,
}

/// One change touching an API, in sequence order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub version: String,
    pub change_type: ChangeType,
    pub description: Option<String>,
}

/// History of one API across the analyzed versions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiLifecycle {
    pub name: String,
    /// First version that added the API. Absent when it already exists in
    /// the first analyzed version.
    pub introduced_in: Option<String>,
    /// Version at which the latest removal takes effect.
    pub removed_in: Option<String>,
    pub deprecated_in: Option<String>,
    pub modifications: Vec<Modification>,
    pub versions_present: Vec<String>,
    pub events: Vec<LifecycleEvent>,
}

impl ApiLifecycle {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether the API exists in the last analyzed version.
    pub fn is_present_at_end(&self, versions: &[VersionInfo]) -> bool {
        versions
            .last()
            .map_or(false, |v| self.versions_present.iter().any(|p| p == v.version()))
    }

    fn record(&mut self, change: &ApiChange, versions: &[VersionInfo]) {
        let version = effective_version(change, versions)
            .unwrap_or_default()
            .to_string();

        match change.change_type() {
            ChangeType::Added => {
                if self.introduced_in.is_none() {
                    self.introduced_in = Some(version.clone());
                }
            }
            ChangeType::Removed => self.removed_in = Some(version.clone()),
            ChangeType::Modified => self.modifications.push(Modification {
                version: version.clone(),
                old_signature: change.old_signature().map(str::to_string),
                new_signature: change.new_signature().map(str::to_string),
                description: change.description().map(str::to_string),
            }),
            ChangeType::Deprecated => {
                if self.deprecated_in.is_none() {
                    self.deprecated_in = Some(version.clone());
                }
            }
        }

        self.events.push(LifecycleEvent {
            version,
            change_type: change.change_type(),
            description: change.description().map(str::to_string),
        });
    }

    fn finish(mut self, present_in_first: bool) -> Self {
        if present_in_first {
            self.introduced_in = None;
        }
        self
    }
}

/// Version at which a change takes effect. A removal lands on the successor
/// of its `from_version`.
fn effective_version<'a>(change: &'a ApiChange, versions: &'a [VersionInfo]) -> Option<&'a str> {
    match change.change_type() {
        ChangeType::Removed => change
            .from_version()
            .and_then(|from| successor(versions, from))
            .or_else(|| change.version()),
        _ => change.version(),
    }
}

/// The version after `version` in sequence order.
fn successor<'a>(versions: &'a [VersionInfo], version: &str) -> Option<&'a str> {
    let pos = versions.iter().position(|v| v.version() == version)?;
    versions.get(pos + 1).map(|v| v.version())
}

/// Lifecycle of every API, keyed by full name.
pub fn build_lifecycles(
    versions: &[VersionInfo],
    collections: &IndexMap<String, Vec<ApiElement>>,
    changes: &[ApiChange],
) -> BTreeMap<String, ApiLifecycle> {
    let mut lifecycles: BTreeMap<String, ApiLifecycle> = BTreeMap::new();

    for version in versions {
        let Some(elements) = collections.get(version.version()) else {
            continue;
        };
        let mut seen = HashSet::new();
        for element in elements {
            let name = element.full_name();
            if seen.insert(name.clone()) {
                lifecycles
                    .entry(name.clone())
                    .or_insert_with(|| ApiLifecycle::new(name))
                    .versions_present
                    .push(version.version().to_string());
            }
        }
    }

    for change in changes {
        let name = change.api_name();
        lifecycles
            .entry(name.clone())
            .or_insert_with(|| ApiLifecycle::new(name))
            .record(change, versions);
    }

    let first = versions.first().map(|v| v.version().to_string());
    lifecycles
        .into_iter()
        .map(|(name, lifecycle)| {
            let present_in_first = first
                .as_deref()
                .map_or(false, |f| lifecycle.versions_present.first().map(String::as_str) == Some(f));
            (name, lifecycle.finish(present_in_first))
        })
        .collect()
}

/// Lifecycle of the API(s) named `api_name`, matched by full name or
/// simple name.
pub fn lifecycle_of(
    api_name: &str,
    versions: &[VersionInfo],
    collections: &IndexMap<String, Vec<ApiElement>>,
    changes: &[ApiChange],
) -> ApiLifecycle {
    let matches = |e: &ApiElement| e.name() == api_name || e.full_name() == api_name;

    let mut lifecycle = ApiLifecycle::new(api_name);
    for version in versions {
        let present = collections
            .get(version.version())
            .map_or(false, |elements| elements.iter().any(matches));
        if present {
            lifecycle
                .versions_present
                .push(version.version().to_string());
        }
    }
    for change in changes.iter().filter(|c| matches(c.element())) {
        lifecycle.record(change, versions);
    }

    let present_in_first = match (versions.first(), lifecycle.versions_present.first()) {
        (Some(first), Some(present)) => first.version() == present,
        _ => false,
    };
    lifecycle.finish(present_in_first)
}

/// First and last analyzed version, in the given order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    pub first: String,
    pub last: String,
}

/// Per-version row of the corpus summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub version: String,
    pub release_date: Option<NaiveDateTime>,
    pub api_count: usize,
    /// Changes taking effect at this version. Removals count at the successor
    /// of their `from_version`.
    pub changes_count: usize,
}

/// Counts over a whole analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub package_name: String,
    pub total_versions: usize,
    pub total_changes: usize,
    /// Every change type, zero included.
    pub change_types: IndexMap<ChangeType, usize>,
    /// Every kind, zero included, over the identity-deduplicated union of
    /// all collections.
    pub api_types: IndexMap<ApiKind, usize>,
    pub unique_apis: usize,
    pub version_range: Option<VersionRange>,
    pub versions: Vec<VersionSummary>,
}

/// Summarize an analysis.
pub fn summarize(
    package_name: &str,
    versions: &[VersionInfo],
    collections: &IndexMap<String, Vec<ApiElement>>,
    changes: &[ApiChange],
) -> CorpusSummary {
    let mut change_types: IndexMap<ChangeType, usize> =
        ChangeType::ALL.iter().map(|t| (*t, 0)).collect();
    for change in changes {
        *change_types.entry(change.change_type()).or_default() += 1;
    }

    let mut api_types: IndexMap<ApiKind, usize> = ApiKind::ALL.iter().map(|k| (*k, 0)).collect();
    let mut seen = HashSet::new();
    for element in collections.values().flatten() {
        if seen.insert(identity(element)) {
            *api_types.entry(element.kind()).or_default() += 1;
        }
    }

    let version_range = match (versions.first(), versions.last()) {
        (Some(first), Some(last)) => Some(VersionRange {
            first: first.version().to_string(),
            last: last.version().to_string(),
        }),
        _ => None,
    };

    let rows = versions
        .iter()
        .map(|v| VersionSummary {
            version: v.version().to_string(),
            release_date: v.release_date(),
            api_count: collections.get(v.version()).map_or(0, Vec::len),
            changes_count: changes
                .iter()
                .filter(|c| effective_version(c, versions) == Some(v.version()))
                .count(),
        })
        .collect();

    CorpusSummary {
        package_name: package_name.to_string(),
        total_versions: versions.len(),
        total_changes: changes.len(),
        change_types,
        api_types,
        unique_apis: seen.len(),
        version_range,
        versions: rows,
    }
}
