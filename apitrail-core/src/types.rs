//! Data models for extracted API elements and package versions.
//!
//! An [`ApiElement`] describes one definable item of a package's public
//! surface. A [`VersionInfo`] describes one release of the package. Both are
//! built once and read-only afterwards: identity fields are private and only
//! exposed through accessors.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

/// Kind of API element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKind {
    Function,
    Class,
    Method,
    Property,
    Constant,
    Module,
}

impl ApiKind {
    /// Every kind, in declaration order.
    pub const ALL: [ApiKind; 6] = [
        ApiKind::Function,
        ApiKind::Class,
        ApiKind::Method,
        ApiKind::Property,
        ApiKind::Constant,
        ApiKind::Module,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKind::Function => "function",
            ApiKind::Class => "class",
            ApiKind::Method => "method",
            ApiKind::Property => "property",
            ApiKind::Constant => "constant",
            ApiKind::Module => "module",
        }
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific details of an element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementDetail {
    #[default]
    None,
    /// Functions and methods.
    Callable {
        is_async: bool,
        is_static: bool,
        is_classmethod: bool,
        is_property: bool,
    },
    /// Classes. Bases are recorded as written, never resolved.
    Class { bases: Vec<String> },
    /// Module-level constants, with the raw literal text of the value.
    Constant { value: String },
}

/// Element metadata: structured per-kind details plus a free-form side table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementMetadata {
    #[serde(default)]
    pub detail: ElementDetail,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// One definable item of a package's API surface.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ApiElement {
    name: String,
    kind: ApiKind,
    module_path: String,
    #[serde(default)]
    signature: Option<String>,
    #[serde(default)]
    docstring: Option<String>,
    #[serde(default)]
    line_number: Option<u32>,
    #[serde(default)]
    type_hints: BTreeMap<String, String>,
    #[serde(default)]
    decorators: Vec<String>,
    #[serde(default)]
    is_private: bool,
    #[serde(default)]
    is_deprecated: bool,
    #[serde(default)]
    metadata: ElementMetadata,
}

/// True for `_name` but not for `__name` or `__dunder__`.
fn is_private_name(name: &str) -> bool {
    name.starts_with('_') && !name.starts_with("__")
}

impl ApiElement {
    /// Create an element. Privacy is derived from `name` here and never again.
    pub fn new(name: impl Into<String>, kind: ApiKind, module_path: impl Into<String>) -> Self {
        let name = name.into();
        let is_private = is_private_name(&name);
        Self {
            name,
            kind,
            module_path: module_path.into(),
            signature: None,
            docstring: None,
            line_number: None,
            type_hints: BTreeMap::new(),
            decorators: Vec::new(),
            is_private,
            is_deprecated: false,
            metadata: ElementMetadata::default(),
        }
    }

    /// Set the canonical signature text.
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Set the docstring.
    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    pub fn with_line_number(mut self, line: u32) -> Self {
        self.line_number = Some(line);
        self
    }

    /// Add one type hint (parameter name, `"return"`, or `"type"` for constants).
    pub fn with_type_hint(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.type_hints.insert(key.into(), value.into());
        self
    }

    pub fn with_type_hints(mut self, hints: BTreeMap<String, String>) -> Self {
        self.type_hints = hints;
        self
    }

    /// Set decorators in source order.
    pub fn with_decorators(mut self, decorators: Vec<String>) -> Self {
        self.decorators = decorators;
        self
    }

    pub fn with_detail(mut self, detail: ElementDetail) -> Self {
        self.metadata.detail = detail;
        self
    }

    /// Add an entry to the free-form metadata side table.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.extra.insert(key.into(), value.into());
        self
    }

    /// Mark as deprecated.
    pub fn mark_deprecated(mut self) -> Self {
        self.is_deprecated = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ApiKind {
        self.kind
    }

    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// Fully qualified name: `module_path.name`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.module_path, self.name)
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn docstring(&self) -> Option<&str> {
        self.docstring.as_deref()
    }

    pub fn line_number(&self) -> Option<u32> {
        self.line_number
    }

    pub fn type_hints(&self) -> &BTreeMap<String, String> {
        &self.type_hints
    }

    pub fn decorators(&self) -> &[String] {
        &self.decorators
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }

    pub fn is_deprecated(&self) -> bool {
        self.is_deprecated
    }

    pub fn metadata(&self) -> &ElementMetadata {
        &self.metadata
    }

    /// Base class names for a class element, empty otherwise.
    pub fn bases(&self) -> &[String] {
        match &self.metadata.detail {
            ElementDetail::Class { bases } => bases,
            _ => &[],
        }
    }
}

// Hand-written so the derived `full_name` is part of the persisted form.
// Deserialization ignores it.
impl Serialize for ApiElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ApiElement", 12)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("module_path", &self.module_path)?;
        state.serialize_field("signature", &self.signature)?;
        state.serialize_field("docstring", &self.docstring)?;
        state.serialize_field("line_number", &self.line_number)?;
        state.serialize_field("type_hints", &self.type_hints)?;
        state.serialize_field("decorators", &self.decorators)?;
        state.serialize_field("is_private", &self.is_private)?;
        state.serialize_field("is_deprecated", &self.is_deprecated)?;
        state.serialize_field("metadata", &self.metadata)?;
        state.serialize_field("full_name", &self.full_name())?;
        state.end()
    }
}

/// Normalize a registry date string.
///
/// Accepts ISO-8601 (with or without offset and fractional seconds),
/// `YYYY-MM-DD` and `YYYY-MM-DD HH:MM:SS`. Anything else yields `None`.
pub fn normalize_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok()
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(normalize_date))
}

/// One release of a package.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    version: String,
    #[serde(default, deserialize_with = "deserialize_date")]
    release_date: Option<NaiveDateTime>,
    #[serde(default)]
    python_requires: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    wheel_url: Option<String>,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    yanked: bool,
    #[serde(default)]
    yanked_reason: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl VersionInfo {
    /// Create a version, normalizing the release date once.
    ///
    /// An unparsable date is logged and recorded as absent.
    pub fn new(version: impl Into<String>, release_date: Option<&str>) -> Self {
        let version = version.into();
        let release_date = release_date.and_then(|raw| {
            let parsed = normalize_date(raw);
            if parsed.is_none() {
                warn!(version = %version, date = raw, "Could not parse release date, leaving it unset");
            }
            parsed
        });
        Self::from_datetime(version, release_date)
    }

    /// Create a version from an already parsed release date.
    pub fn from_datetime(version: impl Into<String>, release_date: Option<NaiveDateTime>) -> Self {
        Self {
            version: version.into(),
            release_date,
            python_requires: None,
            dependencies: Vec::new(),
            wheel_url: None,
            source_url: None,
            yanked: false,
            yanked_reason: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_python_requires(mut self, specifier: impl Into<String>) -> Self {
        self.python_requires = Some(specifier.into());
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_wheel_url(mut self, url: impl Into<String>) -> Self {
        self.wheel_url = Some(url.into());
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Mark the release as withdrawn by the registry.
    pub fn mark_yanked(mut self, reason: Option<String>) -> Self {
        self.yanked = true;
        self.yanked_reason = reason;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn release_date(&self) -> Option<NaiveDateTime> {
        self.release_date
    }

    pub fn python_requires(&self) -> Option<&str> {
        self.python_requires.as_deref()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn wheel_url(&self) -> Option<&str> {
        self.wheel_url.as_deref()
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn is_yanked(&self) -> bool {
        self.yanked
    }

    pub fn yanked_reason(&self) -> Option<&str> {
        self.yanked_reason.as_deref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }
}
