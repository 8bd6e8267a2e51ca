//! Package analysis across versions.
//!
//! The analyzer validates a request, selects versions from a
//! [`VersionProvider`], extracts every selected version in parallel, diffs
//! adjacent successful versions in parallel and assembles an
//! [`AnalysisResult`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{AnalyzerConfig, ExtractOptions};
use crate::differ::{diff, ApiChange};
use crate::error::{EvolError, Result};
use crate::parser::{self, Extraction};
use crate::result::{AnalysisMetadata, AnalysisResult, AnalysisSettings};
use crate::types::{ApiElement, VersionInfo};

pub mod provider;
pub mod request;

pub use provider::{StaticProvider, VersionProvider};
pub use request::AnalysisRequest;

/// Outcome of extracting one version.
enum VersionOutcome {
    Extracted(Extraction),
    Failed(String),
}

/// Analyzes packages served by a [`VersionProvider`].
pub struct Analyzer {
    provider: Arc<dyn VersionProvider>,
    options: ExtractOptions,
    include_yanked: bool,
    max_versions: Option<usize>,
    num_threads: Option<usize>,
    calculate_changes: bool,
    cancelled: Arc<AtomicBool>,
}

impl Analyzer {
    /// Analyzer with default settings.
    pub fn new(provider: impl VersionProvider + 'static) -> Self {
        Self::from_config(provider, &AnalyzerConfig::default())
    }

    pub fn from_config(provider: impl VersionProvider + 'static, config: &AnalyzerConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            options: config.extract_options(),
            include_yanked: config.analysis.include_yanked,
            max_versions: config.analysis.max_versions,
            num_threads: config.analysis.num_threads,
            calculate_changes: config.analysis.calculate_changes,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn include_yanked(mut self, include: bool) -> Self {
        self.include_yanked = include;
        self
    }

    /// Run on a dedicated pool of `n` threads instead of the global rayon pool.
    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Share an externally owned cancellation flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = flag;
        self
    }

    /// Flag that, once set, stops new per-version work.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Analyze an inclusive range of versions, optionally capped to the latest N.
    pub fn analyze_package(
        &self,
        package: &str,
        from_version: Option<&str>,
        to_version: Option<&str>,
        max_versions: Option<usize>,
    ) -> Result<AnalysisResult> {
        let mut request =
            AnalysisRequest::new(package).with_calculate_changes(self.calculate_changes);
        request.from_version = from_version.map(str::to_string);
        request.to_version = to_version.map(str::to_string);
        request.max_versions = max_versions;
        self.analyze(&request)
    }

    /// Analyze exactly these versions, in this order.
    pub fn analyze_versions(&self, package: &str, versions: &[&str]) -> Result<AnalysisResult> {
        let request = AnalysisRequest::new(package)
            .with_versions(versions.iter().copied())
            .with_calculate_changes(self.calculate_changes);
        self.analyze(&request)
    }

    /// Compare two versions directly, ignoring everything between them.
    pub fn compare_versions(
        &self,
        package: &str,
        from_version: &str,
        to_version: &str,
    ) -> Result<AnalysisResult> {
        let request = AnalysisRequest::new(package)
            .from_version(from_version)
            .to_version(to_version)
            .compare_only()
            .with_calculate_changes(true);
        self.analyze(&request)
    }

    /// Run a request.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let analysis_type = request.validate()?;
        let available = self
            .provider
            .versions(&request.package, self.include_yanked)?;
        let selected = request.select(&available, self.max_versions)?;

        info!(
            package = %request.package,
            mode = analysis_type.as_str(),
            versions = selected.len(),
            "Starting analysis"
        );

        let pool = match self.num_threads {
            Some(n) if n > 0 => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!(error = %e, "Could not build thread pool, using the global pool");
                    None
                }
            },
            _ => None,
        };

        let run = || self.run(request, &selected);
        let (api_elements, changes, bookkeeping) = match pool {
            Some(pool) => pool.install(run)?,
            None => run()?,
        };

        let versions: Vec<VersionInfo> = selected
            .into_iter()
            .filter(|v| api_elements.contains_key(v.version()))
            .collect();

        info!(
            package = %request.package,
            analyzed = versions.len(),
            failed = bookkeeping.failed.len(),
            cancelled = bookkeeping.cancelled.len(),
            changes = changes.len(),
            "Analysis complete"
        );

        Ok(AnalysisResult {
            package_name: request.package.clone(),
            versions,
            api_elements,
            changes,
            analysis_date: Utc::now(),
            metadata: AnalysisMetadata {
                analysis_type,
                calculate_changes: request.calculate_changes,
                requested_versions: bookkeeping.requested,
                successful_versions: bookkeeping.successful,
                failed_versions: bookkeeping.failed,
                cancelled_versions: bookkeeping.cancelled,
                diagnostics: bookkeeping.diagnostics,
                settings: AnalysisSettings {
                    include_private: self.options.include_private,
                    include_deprecated: self.options.include_deprecated,
                    include_yanked: self.include_yanked,
                    max_versions: request.max_versions.or(self.max_versions),
                },
            },
        })
    }

    fn run(
        &self,
        request: &AnalysisRequest,
        selected: &[VersionInfo],
    ) -> Result<(IndexMap<String, Vec<ApiElement>>, Vec<ApiChange>, Bookkeeping)> {
        let cells: IndexMap<String, OnceCell<VersionOutcome>> = selected
            .iter()
            .map(|v| (v.version().to_string(), OnceCell::new()))
            .collect();

        selected.par_iter().for_each(|info| {
            if self.cancelled.load(Ordering::Relaxed) {
                return;
            }
            let outcome = self.extract_version(&request.package, info);
            let stored = cells
                .get(info.version())
                .map_or(false, |cell| cell.set(outcome).is_ok());
            if !stored {
                warn!(
                    version = info.version(),
                    "Version extracted twice, keeping the first result"
                );
            }
        });

        let mut bookkeeping = Bookkeeping {
            requested: selected.iter().map(|v| v.version().to_string()).collect(),
            ..Bookkeeping::default()
        };
        let mut api_elements = IndexMap::new();
        for (version, cell) in cells {
            match cell.into_inner() {
                Some(VersionOutcome::Extracted(extraction)) => {
                    if !extraction.diagnostics.is_empty() {
                        bookkeeping
                            .diagnostics
                            .insert(version.clone(), extraction.diagnostics);
                    }
                    bookkeeping.successful.push(version.clone());
                    api_elements.insert(version, extraction.elements);
                }
                Some(VersionOutcome::Failed(reason)) => {
                    bookkeeping.failed.insert(version, reason);
                }
                None => bookkeeping.cancelled.push(version),
            }
        }

        let changes = if request.calculate_changes {
            compute_changes(&bookkeeping.successful, &api_elements)?
        } else {
            Vec::new()
        };

        Ok((api_elements, changes, bookkeeping))
    }

    fn extract_version(&self, package: &str, info: &VersionInfo) -> VersionOutcome {
        debug!(package, version = info.version(), "Extracting version");

        let extracted = self
            .provider
            .source_tree(package, info)
            .and_then(|tree| parser::extract(tree.as_ref(), "", &self.options));

        match extracted {
            Ok(extraction) => {
                debug!(
                    version = info.version(),
                    elements = extraction.elements.len(),
                    "Version extracted"
                );
                VersionOutcome::Extracted(extraction)
            }
            Err(e) => {
                warn!(version = info.version(), error = %e, "Version failed, continuing");
                VersionOutcome::Failed(e.to_string())
            }
        }
    }
}

#[derive(Default)]
struct Bookkeeping {
    requested: Vec<String>,
    successful: Vec<String>,
    failed: BTreeMap<String, String>,
    cancelled: Vec<String>,
    diagnostics: BTreeMap<String, Vec<parser::Diagnostic>>,
}

/// Diff each adjacent pair of `sequence` in parallel, concatenated in order.
pub fn compute_changes(
    sequence: &[String],
    collections: &IndexMap<String, Vec<ApiElement>>,
) -> Result<Vec<ApiChange>> {
    let per_pair: Vec<Vec<ApiChange>> = sequence
        .par_windows(2)
        .map(|pair| {
            let (from, to) = (&pair[0], &pair[1]);
            let missing = |version: &str| EvolError::Diff {
                from: from.clone(),
                to: to.clone(),
                reason: format!("no element collection for version {}", version),
            };
            let old = collections.get(from).ok_or_else(|| missing(from))?;
            let new = collections.get(to).ok_or_else(|| missing(to))?;
            Ok(diff(old, new, from, to))
        })
        .collect::<Result<_>>()?;

    Ok(per_pair.into_iter().flatten().collect())
}
