//! Deprecation markers.
//!
//! Vocabulary of decorator names that mark an API as deprecated, plus the
//! docstring and naming conventions checked after decorators.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Decorator names (lower-case) treated as deprecation markers.
///
/// Matched against the full dotted decorator name and its last segment, so
/// `deprecated`, `typing_extensions.deprecated` and `deprecation.deprecated`
/// all hit the same entry.
pub static DEPRECATION_DECORATORS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "deprecated",
        "deprecate",
        "deprecation",
        "deprecated_function",
        "deprecated_method",
        "deprecated_class",
        "deprecated_alias",
        "deprecated_argument",
        "deprecated_arguments",
        "deprecated_parameter",
        "deprecated_params",
        "deprecated_api",
        "deprecated_property",
        "pending_deprecation",
        "deprecated.sphinx.deprecated",
        "deprecated.classic.deprecated",
        "warnings.deprecated",
    ]
    .into_iter()
    .collect()
});

static SPHINX_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*\.\.\s+deprecated::").unwrap());
static DEPRECATED_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bDEPRECATED\b").unwrap());

/// What marked an element as deprecated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeprecationMarker {
    /// A decorator from the vocabulary, as written.
    Decorator(String),
    /// A Sphinx directive or `DEPRECATED` token in the docstring.
    Docstring,
    /// The element name itself contains `deprecated`.
    Name,
}

/// Whether a decorator name is a deprecation marker (case-insensitive).
pub fn is_deprecation_decorator(decorator: &str) -> bool {
    let lower = decorator.to_lowercase();
    if DEPRECATION_DECORATORS.contains(lower.as_str()) {
        return true;
    }
    lower
        .rsplit('.')
        .next()
        .map_or(false, |last| DEPRECATION_DECORATORS.contains(last))
}

/// Whether a docstring announces deprecation.
pub fn docstring_marks_deprecated(docstring: &str) -> bool {
    SPHINX_DIRECTIVE.is_match(docstring) || DEPRECATED_TOKEN.is_match(docstring)
}

/// Detect deprecation: decorators first, then the docstring, then the name.
pub fn detect(
    name: &str,
    decorators: &[String],
    docstring: Option<&str>,
) -> Option<DeprecationMarker> {
    if let Some(dec) = decorators.iter().find(|d| is_deprecation_decorator(d)) {
        return Some(DeprecationMarker::Decorator(dec.clone()));
    }
    if docstring.map_or(false, docstring_marks_deprecated) {
        return Some(DeprecationMarker::Docstring);
    }
    if name.to_lowercase().contains("deprecated") {
        return Some(DeprecationMarker::Name);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decorator_matching() {
        assert!(is_deprecation_decorator("deprecated"));
        assert!(is_deprecation_decorator("Deprecated"));
        assert!(is_deprecation_decorator("typing_extensions.deprecated"));
        assert!(is_deprecation_decorator("deprecated.sphinx.deprecated"));
        assert!(!is_deprecation_decorator("property"));
        assert!(!is_deprecation_decorator("deprecated.sphinx.versionadded"));
    }

    #[test]
    fn test_docstring_markers() {
        assert!(docstring_marks_deprecated(
            "New function.\n\n.. deprecated:: 1.5\n    Use other."
        ));
        assert!(docstring_marks_deprecated("DEPRECATED: use g instead."));
        assert!(!docstring_marks_deprecated("This is not deprecated yet."));
    }

    #[test]
    fn test_detection_order() {
        let decorators = vec!["staticmethod".to_string(), "deprecated".to_string()];
        assert_eq!(
            detect("old_deprecated", &decorators, Some("DEPRECATED")),
            Some(DeprecationMarker::Decorator("deprecated".to_string()))
        );
        assert_eq!(
            detect("f", &[], Some(".. deprecated:: 2.0")),
            Some(DeprecationMarker::Docstring)
        );
        assert_eq!(
            detect("use_Deprecated_path", &[], None),
            Some(DeprecationMarker::Name)
        );
        assert_eq!(detect("f", &[], Some("Does things.")), None);
    }
}
