//! Change types produced by the diff engine.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::types::ApiElement;

/// Type of change detected. Declaration order is the report sort order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Deprecated,
}

impl ChangeType {
    pub const ALL: [ChangeType; 4] = [
        ChangeType::Added,
        ChangeType::Removed,
        ChangeType::Modified,
        ChangeType::Deprecated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
            ChangeType::Modified => "modified",
            ChangeType::Deprecated => "deprecated",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single difference between two versions of a package.
///
/// For `Modified` the element is the new one. Added changes only carry a
/// `to_version`, removed changes only a `from_version`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ApiChange {
    element: ApiElement,
    change_type: ChangeType,
    #[serde(default)]
    from_version: Option<String>,
    #[serde(default)]
    to_version: Option<String>,
    #[serde(default)]
    old_signature: Option<String>,
    #[serde(default)]
    new_signature: Option<String>,
    #[serde(default)]
    description: Option<String>,
    is_backwards_compatible: bool,
}

impl ApiChange {
    /// Element appeared in `to_version`.
    pub fn added(element: ApiElement, to_version: &str) -> Self {
        Self {
            element,
            change_type: ChangeType::Added,
            from_version: None,
            to_version: Some(to_version.to_string()),
            old_signature: None,
            new_signature: None,
            description: None,
            is_backwards_compatible: true,
        }
    }

    /// Element existed in `from_version` and is gone afterwards.
    pub fn removed(element: ApiElement, from_version: &str) -> Self {
        Self {
            element,
            change_type: ChangeType::Removed,
            from_version: Some(from_version.to_string()),
            to_version: None,
            old_signature: None,
            new_signature: None,
            description: None,
            is_backwards_compatible: false,
        }
    }

    /// Element changed between the two versions. `element` is the new one.
    ///
    /// Compatibility defaults to `false`; the comparator upgrades it.
    pub fn modified(element: ApiElement, from_version: &str, to_version: &str) -> Self {
        Self {
            element,
            change_type: ChangeType::Modified,
            from_version: Some(from_version.to_string()),
            to_version: Some(to_version.to_string()),
            old_signature: None,
            new_signature: None,
            description: None,
            is_backwards_compatible: false,
        }
    }

    /// Element became deprecated in `to_version`.
    pub fn deprecated(element: ApiElement, from_version: &str, to_version: &str) -> Self {
        Self {
            element,
            change_type: ChangeType::Deprecated,
            from_version: Some(from_version.to_string()),
            to_version: Some(to_version.to_string()),
            old_signature: None,
            new_signature: None,
            description: None,
            is_backwards_compatible: true,
        }
    }

    /// Set signatures.
    pub fn with_signatures(mut self, old: Option<String>, new: Option<String>) -> Self {
        self.old_signature = old;
        self.new_signature = new;
        self
    }

    /// Set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_compatibility(mut self, compatible: bool) -> Self {
        self.is_backwards_compatible = compatible;
        self
    }

    pub fn element(&self) -> &ApiElement {
        &self.element
    }

    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    pub fn from_version(&self) -> Option<&str> {
        self.from_version.as_deref()
    }

    pub fn to_version(&self) -> Option<&str> {
        self.to_version.as_deref()
    }

    pub fn old_signature(&self) -> Option<&str> {
        self.old_signature.as_deref()
    }

    pub fn new_signature(&self) -> Option<&str> {
        self.new_signature.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_backwards_compatible(&self) -> bool {
        self.is_backwards_compatible
    }

    /// Fully qualified name of the affected element.
    pub fn api_name(&self) -> String {
        self.element.full_name()
    }

    /// The version this change is reported under: `to_version`, else `from_version`.
    pub fn version(&self) -> Option<&str> {
        self.to_version().or(self.from_version())
    }
}

// `api_name` and `version` are written for readers of the persisted form and
// ignored when reading it back.
impl Serialize for ApiChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ApiChange", 10)?;
        state.serialize_field("element", &self.element)?;
        state.serialize_field("change_type", &self.change_type)?;
        state.serialize_field("from_version", &self.from_version)?;
        state.serialize_field("to_version", &self.to_version)?;
        state.serialize_field("old_signature", &self.old_signature)?;
        state.serialize_field("new_signature", &self.new_signature)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("is_backwards_compatible", &self.is_backwards_compatible)?;
        state.serialize_field("api_name", &self.api_name())?;
        state.serialize_field("version", &self.version())?;
        state.end()
    }
}
