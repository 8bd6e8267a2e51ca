//! Stable comparison key for API elements.

use indexmap::IndexMap;

use crate::types::ApiElement;

/// Identity of an element: `full_name:signature`, or `full_name:kind` when
/// the element has no (non-blank) signature. Never fails.
pub fn identity(element: &ApiElement) -> String {
    match element.signature().map(str::trim) {
        Some(sig) if !sig.is_empty() => format!("{}:{}", element.full_name(), sig),
        _ => format!("{}:{}", element.full_name(), element.kind()),
    }
}

/// Index a collection by identity. Duplicates collapse, first occurrence wins.
///
/// Insertion order follows the collection, which keeps downstream iteration
/// deterministic.
pub fn index_by_identity(elements: &[ApiElement]) -> IndexMap<String, &ApiElement> {
    let mut index = IndexMap::with_capacity(elements.len());
    for element in elements {
        index.entry(identity(element)).or_insert(element);
    }
    index
}
