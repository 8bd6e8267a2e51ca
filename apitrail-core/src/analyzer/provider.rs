//! Where versions and their sources come from.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{EvolError, Result};
use crate::scanner::SourceTree;
use crate::types::VersionInfo;

/// Supplies the release list of a package and the source tree of each release.
///
/// Implementations must be safe to call from several worker threads at once.
pub trait VersionProvider: Send + Sync {
    /// Known releases in registry order. Yanked releases are left out unless
    /// `include_yanked` is set.
    fn versions(&self, package: &str, include_yanked: bool) -> Result<Vec<VersionInfo>>;

    /// The sources of one release.
    fn source_tree(&self, package: &str, version: &VersionInfo) -> Result<Box<dyn SourceTree>>;
}

enum Source {
    Tree(Arc<dyn SourceTree>),
    Unavailable(String),
}

struct Release {
    info: VersionInfo,
    source: Source,
}

/// A provider backed by trees registered up front.
#[derive(Default)]
pub struct StaticProvider {
    packages: HashMap<String, Vec<Release>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a release with its sources. Registration order is registry order.
    pub fn with_version(
        mut self,
        package: &str,
        info: VersionInfo,
        tree: impl SourceTree + 'static,
    ) -> Self {
        self.push(package, info, Source::Tree(Arc::new(tree)));
        self
    }

    /// Register a release whose sources cannot be fetched.
    pub fn with_unavailable(mut self, package: &str, info: VersionInfo, reason: &str) -> Self {
        self.push(package, info, Source::Unavailable(reason.to_string()));
        self
    }

    fn push(&mut self, package: &str, info: VersionInfo, source: Source) {
        self.packages
            .entry(package.to_string())
            .or_default()
            .push(Release { info, source });
    }
}

impl VersionProvider for StaticProvider {
    fn versions(&self, package: &str, include_yanked: bool) -> Result<Vec<VersionInfo>> {
        let Some(releases) = self.packages.get(package) else {
            debug!(package, "Unknown package, no versions");
            return Ok(Vec::new());
        };
        Ok(releases
            .iter()
            .filter(|r| include_yanked || !r.info.is_yanked())
            .map(|r| r.info.clone())
            .collect())
    }

    fn source_tree(&self, package: &str, version: &VersionInfo) -> Result<Box<dyn SourceTree>> {
        let release = self
            .packages
            .get(package)
            .and_then(|releases| releases.iter().find(|r| r.info.version() == version.version()))
            .ok_or_else(|| EvolError::VersionNotFound {
                package: package.to_string(),
                version: version.version().to_string(),
            })?;

        match &release.source {
            Source::Tree(tree) => Ok(Box::new(Arc::clone(tree))),
            Source::Unavailable(reason) => Err(EvolError::SourceUnavailable {
                version: version.version().to_string(),
                reason: reason.clone(),
            }),
        }
    }
}
