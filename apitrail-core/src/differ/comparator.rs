//! Comparator for two element collections of the same package.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::differ::changes::{ApiChange, ChangeType};
use crate::differ::compat::is_compatible_signature_change;
use crate::differ::identity::{identity, index_by_identity};
use crate::types::{ApiElement, ApiKind};

/// Diff two collections.
///
/// Elements are matched by identity. An unmatched old/new pair sharing full
/// name and kind, unique on both sides, is reported as one `Modified` change
/// instead of a removal plus an addition. The result is ordered by change
/// type, then identity.
pub fn diff(
    old: &[ApiElement],
    new: &[ApiElement],
    from_version: &str,
    to_version: &str,
) -> Vec<ApiChange> {
    let old_index = index_by_identity(old);
    let new_index = index_by_identity(new);

    let mut changes: Vec<(ChangeType, String, ApiChange)> = Vec::new();
    let mut push = |id: String, change: ApiChange| {
        changes.push((change.change_type(), id, change));
    };

    // Identities present on both sides
    for (id, old_el) in &old_index {
        let Some(new_el) = new_index.get(id) else {
            continue;
        };
        if let Some(change) = diff_matched(old_el, new_el, from_version, to_version) {
            push(id.clone(), change);
        }
        if !old_el.is_deprecated() && new_el.is_deprecated() {
            push(id.clone(), deprecated(new_el, from_version, to_version));
        }
    }

    let removed: Vec<(&String, &ApiElement)> = old_index
        .iter()
        .filter(|(id, _)| !new_index.contains_key(*id))
        .map(|(id, el)| (id, *el))
        .collect();
    let added: Vec<(&String, &ApiElement)> = new_index
        .iter()
        .filter(|(id, _)| !old_index.contains_key(*id))
        .map(|(id, el)| (id, *el))
        .collect();

    let old_unmatched = group_by_name_and_kind(&removed);
    let new_unmatched = group_by_name_and_kind(&added);

    let mut reconciled: HashMap<(String, ApiKind), (&ApiElement, &ApiElement)> = HashMap::new();
    for (key, olds) in &old_unmatched {
        if let Some(news) = new_unmatched.get(key) {
            if olds.len() == 1 && news.len() == 1 {
                reconciled.insert(key.clone(), (olds[0], news[0]));
            }
        }
    }

    for (id, el) in removed {
        if !reconciled.contains_key(&(el.full_name(), el.kind())) {
            let description = format!("{} removed", el.kind());
            push(
                id.clone(),
                ApiChange::removed(el.clone(), from_version).with_description(description),
            );
        }
    }
    for (id, el) in added {
        match reconciled.get(&(el.full_name(), el.kind())) {
            Some((old_el, _)) => {
                push(id.clone(), signature_change(old_el, el, from_version, to_version));
                if !old_el.is_deprecated() && el.is_deprecated() {
                    push(id.clone(), deprecated(el, from_version, to_version));
                }
            }
            None => {
                let description = format!("{} added", el.kind());
                push(
                    id.clone(),
                    ApiChange::added(el.clone(), to_version).with_description(description),
                );
            }
        }
    }

    changes.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
    changes.into_iter().map(|(_, _, change)| change).collect()
}

/// Unmatched elements grouped by `(full_name, kind)`, in collection order.
fn group_by_name_and_kind<'a>(
    elements: &[(&String, &'a ApiElement)],
) -> IndexMap<(String, ApiKind), Vec<&'a ApiElement>> {
    let mut groups: IndexMap<(String, ApiKind), Vec<&ApiElement>> = IndexMap::new();
    for (_, el) in elements {
        groups.entry((el.full_name(), el.kind())).or_default().push(*el);
    }
    groups
}

/// Compare two elements with the same identity.
///
/// Only signature-less elements can differ here: the signature is part of
/// the identity for everything else.
fn diff_matched(
    old: &ApiElement,
    new: &ApiElement,
    from_version: &str,
    to_version: &str,
) -> Option<ApiChange> {
    if has_signature(old) || has_signature(new) {
        return None;
    }

    let mut details = Vec::new();
    match (old.docstring().is_some(), new.docstring().is_some()) {
        (false, true) => details.push("docstring added"),
        (true, false) => details.push("docstring removed"),
        _ => {}
    }
    if old.type_hints() != new.type_hints() {
        details.push("type hints changed");
    }
    if details.is_empty() {
        return None;
    }

    Some(
        ApiChange::modified(new.clone(), from_version, to_version)
            .with_description(details.join("; ")),
    )
}

fn has_signature(element: &ApiElement) -> bool {
    element.signature().map_or(false, |s| !s.trim().is_empty())
}

/// Modified change for a reconciled pair whose signatures differ.
fn signature_change(
    old: &ApiElement,
    new: &ApiElement,
    from_version: &str,
    to_version: &str,
) -> ApiChange {
    let old_sig = old.signature().map(str::to_string);
    let new_sig = new.signature().map(str::to_string);
    let compatible = match (&old_sig, &new_sig) {
        (Some(o), Some(n)) => is_compatible_signature_change(o, n),
        _ => false,
    };
    ApiChange::modified(new.clone(), from_version, to_version)
        .with_signatures(old_sig, new_sig)
        .with_description("signature changed")
        .with_compatibility(compatible)
}

fn deprecated(element: &ApiElement, from_version: &str, to_version: &str) -> ApiChange {
    ApiChange::deprecated(element.clone(), from_version, to_version)
        .with_description("marked deprecated")
}

/// Identity of the element a change is about.
pub fn change_identity(change: &ApiChange) -> String {
    identity(change.element())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ElementDetail;

    fn make_function(name: &str, signature: &str) -> ApiElement {
        ApiElement::new(name, ApiKind::Function, "pkg").with_signature(signature)
    }

    fn make_class(name: &str) -> ApiElement {
        ApiElement::new(name, ApiKind::Class, "pkg").with_detail(ElementDetail::Class {
            bases: Vec::new(),
        })
    }

    #[test]
    fn test_removed() {
        let old = vec![make_function("f", "(x) -> None")];
        let changes = diff(&old, &[], "v1", "v2");

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type(), ChangeType::Removed);
        assert_eq!(changes[0].from_version(), Some("v1"));
        assert_eq!(changes[0].to_version(), None);
        assert!(!changes[0].is_backwards_compatible());
    }

    #[test]
    fn test_added() {
        let new = vec![make_function("f", "(x) -> None")];
        let changes = diff(&[], &new, "v1", "v2");

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type(), ChangeType::Added);
        assert_eq!(changes[0].to_version(), Some("v2"));
        assert_eq!(changes[0].from_version(), None);
        assert!(changes[0].is_backwards_compatible());
    }

    #[test]
    fn test_signature_change_is_one_modification() {
        let old = vec![make_function("f", "(x) -> None")];
        let new = vec![make_function("f", "(x, y=1) -> None")];
        let changes = diff(&old, &new, "v1", "v2");

        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.change_type(), ChangeType::Modified);
        assert_eq!(change.old_signature(), Some("(x) -> None"));
        assert_eq!(change.new_signature(), Some("(x, y=1) -> None"));
        assert_eq!(change.description(), Some("signature changed"));
        assert!(change.is_backwards_compatible());
    }

    #[test]
    fn test_breaking_signature_change() {
        let old = vec![make_function("f", "(x, y) -> None")];
        let new = vec![make_function("f", "(x) -> None")];
        let changes = diff(&old, &new, "v1", "v2");

        assert_eq!(changes.len(), 1);
        assert!(!changes[0].is_backwards_compatible());
    }

    #[test]
    fn test_ambiguous_overloads_not_reconciled() {
        let old = vec![
            make_function("f", "(x) -> None"),
            make_function("f", "(x: int) -> None"),
        ];
        let new = vec![make_function("f", "(x: str) -> None")];
        let changes = diff(&old, &new, "v1", "v2");

        let types: Vec<_> = changes.iter().map(|c| c.change_type()).collect();
        assert_eq!(
            types,
            vec![ChangeType::Added, ChangeType::Removed, ChangeType::Removed]
        );
    }

    #[test]
    fn test_newly_deprecated() {
        let old = vec![make_function("f", "(x) -> None")];
        let new = vec![make_function("f", "(x) -> None").mark_deprecated()];
        let changes = diff(&old, &new, "v1", "v2");

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type(), ChangeType::Deprecated);
        assert!(changes[0].is_backwards_compatible());
    }

    #[test]
    fn test_deprecated_with_signature_change() {
        let old = vec![make_function("f", "(x) -> None")];
        let new = vec![make_function("f", "(x, y) -> None").mark_deprecated()];
        let changes = diff(&old, &new, "v1", "v2");

        let types: Vec<_> = changes.iter().map(|c| c.change_type()).collect();
        assert_eq!(types, vec![ChangeType::Modified, ChangeType::Deprecated]);
    }

    #[test]
    fn test_added_deprecated_is_only_added() {
        let new = vec![make_function("f", "() -> None").mark_deprecated()];
        let changes = diff(&[], &new, "v1", "v2");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type(), ChangeType::Added);
    }

    #[test]
    fn test_signatureless_docstring_change() {
        let old = vec![make_class("Client")];
        let new = vec![make_class("Client").with_docstring("HTTP client.")];
        let changes = diff(&old, &new, "v1", "v2");

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type(), ChangeType::Modified);
        assert_eq!(changes[0].description(), Some("docstring added"));
        assert!(!changes[0].is_backwards_compatible());
    }

    #[test]
    fn test_constant_type_hint_change() {
        let old = vec![ApiElement::new("X", ApiKind::Constant, "pkg")];
        let new = vec![ApiElement::new("X", ApiKind::Constant, "pkg").with_type_hint("type", "int")];
        let changes = diff(&old, &new, "v1", "v2");

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].description(), Some("type hints changed"));
        assert!(!changes[0].is_backwards_compatible());

        let old = vec![ApiElement::new("X", ApiKind::Constant, "pkg").with_type_hint("type", "int")];
        let new = vec![ApiElement::new("X", ApiKind::Constant, "pkg").with_type_hint("type", "str")];
        let changes = diff(&old, &new, "v1", "v2");

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type(), ChangeType::Modified);
        assert!(!changes[0].is_backwards_compatible());
    }

    #[test]
    fn test_docstring_change_with_signature_is_ignored() {
        let old = vec![make_function("f", "(x) -> None")];
        let new = vec![make_function("f", "(x) -> None").with_docstring("Docs.")];
        assert!(diff(&old, &new, "v1", "v2").is_empty());
    }

    #[test]
    fn test_self_diff_is_empty() {
        let elements = vec![
            make_function("f", "(x) -> None"),
            make_class("C"),
            make_function("g", "() -> <unknown>").mark_deprecated(),
        ];
        assert!(diff(&elements, &elements, "v1", "v1").is_empty());
    }

    #[test]
    fn test_order_is_type_then_identity() {
        let old = vec![
            make_function("b", "() -> None"),
            make_function("a", "() -> None"),
            make_function("m", "() -> None"),
        ];
        let new = vec![
            make_function("z", "() -> None"),
            make_function("c", "() -> None"),
            make_function("m", "() -> None").mark_deprecated(),
        ];
        let changes = diff(&old, &new, "v1", "v2");
        let summary: Vec<_> = changes
            .iter()
            .map(|c| (c.change_type(), c.element().name().to_string()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ChangeType::Added, "c".to_string()),
                (ChangeType::Added, "z".to_string()),
                (ChangeType::Removed, "a".to_string()),
                (ChangeType::Removed, "b".to_string()),
                (ChangeType::Deprecated, "m".to_string()),
            ]
        );
        assert_eq!(change_identity(&changes[0]), "pkg.c:() -> None");
    }
}
