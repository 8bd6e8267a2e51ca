//! Analysis requests: validation and version selection.

use std::collections::HashSet;

use crate::error::{EvolError, Result};
use crate::result::AnalysisType;
use crate::types::VersionInfo;

/// What to analyze.
///
/// Three mutually exclusive modes: an explicit version list, an inclusive
/// range (optionally capped to the latest N versions), or a comparison of
/// exactly two versions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub package: String,
    pub versions: Option<Vec<String>>,
    pub from_version: Option<String>,
    pub to_version: Option<String>,
    pub max_versions: Option<usize>,
    pub compare_only: bool,
    pub calculate_changes: bool,
}

impl AnalysisRequest {
    /// Range request over every available version.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            versions: None,
            from_version: None,
            to_version: None,
            max_versions: None,
            compare_only: false,
            calculate_changes: true,
        }
    }

    /// Analyze exactly these versions, in this order.
    pub fn with_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions = Some(versions.into_iter().map(Into::into).collect());
        self
    }

    pub fn from_version(mut self, version: impl Into<String>) -> Self {
        self.from_version = Some(version.into());
        self
    }

    pub fn to_version(mut self, version: impl Into<String>) -> Self {
        self.to_version = Some(version.into());
        self
    }

    pub fn with_max_versions(mut self, max: usize) -> Self {
        self.max_versions = Some(max);
        self
    }

    /// Compare `from_version` and `to_version` only, skipping everything between.
    pub fn compare_only(mut self) -> Self {
        self.compare_only = true;
        self
    }

    pub fn with_calculate_changes(mut self, calculate: bool) -> Self {
        self.calculate_changes = calculate;
        self
    }

    /// Check the parameter combination before any work is done.
    pub fn validate(&self) -> Result<AnalysisType> {
        if let Some(versions) = &self.versions {
            if self.from_version.is_some() || self.to_version.is_some() || self.compare_only {
                return Err(EvolError::ConflictingParameters(
                    "an explicit version list cannot be combined with from/to bounds or compare-only"
                        .to_string(),
                ));
            }
            if versions.is_empty() {
                return Err(EvolError::NoVersionsRequested {
                    package: self.package.clone(),
                });
            }
            let mut seen = HashSet::new();
            if let Some(repeated) = versions.iter().find(|v| !seen.insert(v.as_str())) {
                return Err(EvolError::ConflictingParameters(format!(
                    "version {} is requested more than once",
                    repeated
                )));
            }
            return Ok(AnalysisType::SpecificVersions);
        }

        if self.compare_only {
            if self.from_version.is_none() || self.to_version.is_none() {
                return Err(EvolError::ConflictingParameters(
                    "compare-only requires both from_version and to_version".to_string(),
                ));
            }
            if self.from_version == self.to_version {
                return Err(EvolError::ConflictingParameters(
                    "compare-only requires two different versions".to_string(),
                ));
            }
            return Ok(AnalysisType::CompareOnly);
        }

        Ok(AnalysisType::VersionRange)
    }

    /// Versions the request asks for, picked from `available` (provider order).
    ///
    /// `default_max` applies to range requests that set no cap themselves.
    pub fn select(
        &self,
        available: &[VersionInfo],
        default_max: Option<usize>,
    ) -> Result<Vec<VersionInfo>> {
        match self.validate()? {
            AnalysisType::SpecificVersions => {
                let requested = self.versions.as_deref().unwrap_or_default();
                requested.iter().map(|v| self.find(available, v).cloned()).collect()
            }
            AnalysisType::CompareOnly => {
                let from = self.bound(available, self.from_version.as_deref())?;
                let to = self.bound(available, self.to_version.as_deref())?;
                match (from, to) {
                    (Some(from), Some(to)) => {
                        Ok(vec![available[from].clone(), available[to].clone()])
                    }
                    _ => Err(EvolError::ConflictingParameters(
                        "compare-only requires both from_version and to_version".to_string(),
                    )),
                }
            }
            AnalysisType::VersionRange => {
                let from = self.bound(available, self.from_version.as_deref())?;
                let to = self.bound(available, self.to_version.as_deref())?;
                if let (Some(from), Some(to)) = (from, to) {
                    if from > to {
                        return Err(EvolError::ConflictingParameters(format!(
                            "from_version {} comes after to_version {}",
                            self.from_version.as_deref().unwrap_or_default(),
                            self.to_version.as_deref().unwrap_or_default()
                        )));
                    }
                }
                let start = from.unwrap_or(0);
                let end = to.map_or(available.len(), |to| to + 1);

                let mut range = &available[start..end];
                if let Some(max) = self.max_versions.or(default_max) {
                    range = &range[range.len().saturating_sub(max)..];
                }
                Ok(range.to_vec())
            }
        }
    }

    fn find<'a>(&self, available: &'a [VersionInfo], version: &str) -> Result<&'a VersionInfo> {
        available
            .iter()
            .find(|v| v.version() == version)
            .ok_or_else(|| self.not_found(version))
    }

    fn bound(&self, available: &[VersionInfo], version: Option<&str>) -> Result<Option<usize>> {
        match version {
            Some(v) => available
                .iter()
                .position(|info| info.version() == v)
                .map(Some)
                .ok_or_else(|| self.not_found(v)),
            None => Ok(None),
        }
    }

    fn not_found(&self, version: &str) -> EvolError {
        EvolError::VersionNotFound {
            package: self.package.clone(),
            version: version.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available() -> Vec<VersionInfo> {
        ["1.0", "1.1", "1.2", "2.0", "2.1"]
            .iter()
            .map(|v| VersionInfo::new(*v, None))
            .collect()
    }

    fn names(versions: &[VersionInfo]) -> Vec<&str> {
        versions.iter().map(|v| v.version()).collect()
    }

    #[test]
    fn test_validate_conflicts() {
        let request = AnalysisRequest::new("pkg")
            .with_versions(["1.0"])
            .from_version("1.0");
        assert!(matches!(
            request.validate(),
            Err(EvolError::ConflictingParameters(_))
        ));

        let request = AnalysisRequest::new("pkg").with_versions(["1.0"]).compare_only();
        assert!(matches!(
            request.validate(),
            Err(EvolError::ConflictingParameters(_))
        ));

        let request = AnalysisRequest::new("pkg").from_version("1.0").compare_only();
        assert!(matches!(
            request.validate(),
            Err(EvolError::ConflictingParameters(_))
        ));
    }

    #[test]
    fn test_validate_empty_list() {
        let request = AnalysisRequest::new("pkg").with_versions(Vec::<String>::new());
        assert!(matches!(
            request.validate(),
            Err(EvolError::NoVersionsRequested { .. })
        ));
    }

    #[test]
    fn test_select_specific_keeps_request_order() {
        let request = AnalysisRequest::new("pkg").with_versions(["2.0", "1.0"]);
        let selected = request.select(&available(), None).unwrap();
        assert_eq!(names(&selected), vec!["2.0", "1.0"]);
        assert_eq!(request.validate().unwrap(), AnalysisType::SpecificVersions);
    }

    #[test]
    fn test_select_specific_unknown_version() {
        let request = AnalysisRequest::new("pkg").with_versions(["1.0", "9.9"]);
        let err = request.select(&available(), None).unwrap_err();
        assert!(matches!(err, EvolError::VersionNotFound { version, .. } if version == "9.9"));
    }

    #[test]
    fn test_select_range() {
        let request = AnalysisRequest::new("pkg").from_version("1.1").to_version("2.0");
        let selected = request.select(&available(), None).unwrap();
        assert_eq!(names(&selected), vec!["1.1", "1.2", "2.0"]);

        let all = AnalysisRequest::new("pkg").select(&available(), None).unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_select_range_max_versions_keeps_latest() {
        let request = AnalysisRequest::new("pkg").with_max_versions(2);
        let selected = request.select(&available(), Some(4)).unwrap();
        assert_eq!(names(&selected), vec!["2.0", "2.1"]);

        let selected = AnalysisRequest::new("pkg").select(&available(), Some(3)).unwrap();
        assert_eq!(names(&selected), vec!["1.2", "2.0", "2.1"]);
    }

    #[test]
    fn test_select_range_bad_bounds() {
        let request = AnalysisRequest::new("pkg").from_version("0.1");
        assert!(matches!(
            request.select(&available(), None),
            Err(EvolError::VersionNotFound { .. })
        ));

        let request = AnalysisRequest::new("pkg").from_version("2.0").to_version("1.0");
        assert!(matches!(
            request.select(&available(), None),
            Err(EvolError::ConflictingParameters(_))
        ));

        let request = AnalysisRequest::new("pkg").from_version("1.1").to_version("1.0");
        assert!(matches!(
            request.select(&available(), None),
            Err(EvolError::ConflictingParameters(_))
        ));

        let request = AnalysisRequest::new("pkg").from_version("1.1").to_version("1.1");
        assert_eq!(names(&request.select(&available(), None).unwrap()), vec!["1.1"]);
    }

    #[test]
    fn test_validate_repeated_version() {
        let request = AnalysisRequest::new("pkg").with_versions(["1.0", "1.1", "1.0"]);
        assert!(matches!(
            request.validate(),
            Err(EvolError::ConflictingParameters(_))
        ));

        let request = AnalysisRequest::new("pkg")
            .from_version("1.0")
            .to_version("1.0")
            .compare_only();
        assert!(matches!(
            request.validate(),
            Err(EvolError::ConflictingParameters(_))
        ));
    }

    #[test]
    fn test_select_compare_only() {
        let request = AnalysisRequest::new("pkg")
            .from_version("2.1")
            .to_version("1.0")
            .compare_only();
        let selected = request.select(&available(), None).unwrap();
        assert_eq!(names(&selected), vec!["2.1", "1.0"]);
    }
}
