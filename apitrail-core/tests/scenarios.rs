//! End-to-end change scenarios, through the diff engine and the analyzer.

use apitrail_core::{
    diff, Analyzer, ApiElement, ApiKind, ChangeType, MemoryTree, StaticProvider, VersionInfo,
};

fn make_function(signature: &str) -> ApiElement {
    ApiElement::new("f", ApiKind::Function, "pkg").with_signature(signature)
}

fn make_tree(source: &str) -> MemoryTree {
    MemoryTree::new("pkg").with_file("pkg/__init__.py", source)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("apitrail_core=debug")
        .try_init();
}

#[test]
fn test_removed_function() {
    let old = vec![make_function("(x) -> None")];
    let changes = diff(&old, &[], "1.0", "2.0");

    assert_eq!(changes.len(), 1);
    let change = &changes[0];
    assert_eq!(change.change_type(), ChangeType::Removed);
    assert_eq!(change.api_name(), "pkg.f");
    assert_eq!(change.from_version(), Some("1.0"));
    assert_eq!(change.to_version(), None);
    assert!(!change.is_backwards_compatible());
}

#[test]
fn test_added_function() {
    let new = vec![make_function("(x) -> None")];
    let changes = diff(&[], &new, "1.0", "2.0");

    assert_eq!(changes.len(), 1);
    let change = &changes[0];
    assert_eq!(change.change_type(), ChangeType::Added);
    assert_eq!(change.from_version(), None);
    assert_eq!(change.to_version(), Some("2.0"));
    assert!(change.is_backwards_compatible());
}

#[test]
fn test_defaulted_parameter_is_compatible_modification() {
    let old = vec![make_function("(x) -> None")];
    let new = vec![make_function("(x, y=1) -> None")];
    let changes = diff(&old, &new, "1.0", "1.1");

    assert_eq!(changes.len(), 1);
    let change = &changes[0];
    assert_eq!(change.change_type(), ChangeType::Modified);
    assert_eq!(change.old_signature(), Some("(x) -> None"));
    assert_eq!(change.new_signature(), Some("(x, y=1) -> None"));
    assert!(change.is_backwards_compatible());
}

#[test]
fn test_required_parameter_is_breaking() {
    let old = vec![make_function("(x) -> None")];
    let new = vec![make_function("(x, y) -> None")];
    let changes = diff(&old, &new, "1.0", "1.1");

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].change_type(), ChangeType::Modified);
    assert!(!changes[0].is_backwards_compatible());
}

#[test]
fn test_newly_deprecated() {
    let old = vec![make_function("(x) -> None")];
    let new = vec![make_function("(x) -> None").mark_deprecated()];
    let changes = diff(&old, &new, "1.0", "1.1");

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].change_type(), ChangeType::Deprecated);
    assert_eq!(changes[0].from_version(), Some("1.0"));
    assert_eq!(changes[0].to_version(), Some("1.1"));
    assert!(changes[0].is_backwards_compatible());
}

#[test]
fn test_reappearance_through_analyzer() {
    init_tracing();
    let provider = StaticProvider::new()
        .with_version(
            "pkg",
            VersionInfo::new("1.0", Some("2023-01-01")),
            make_tree("def f(x):\n    pass\n\ndef g():\n    pass\n"),
        )
        .with_version(
            "pkg",
            VersionInfo::new("2.0", Some("2023-02-01")),
            make_tree("def g():\n    pass\n"),
        )
        .with_version(
            "pkg",
            VersionInfo::new("3.0", Some("2023-03-01")),
            make_tree("def f(x):\n    pass\n\ndef g():\n    pass\n"),
        );

    let result = Analyzer::new(provider)
        .analyze_package("pkg", None, None, None)
        .unwrap();

    let lifecycle = result.lifecycle("f");
    assert_eq!(lifecycle.introduced_in, None);
    assert_eq!(lifecycle.removed_in.as_deref(), Some("2.0"));
    assert_eq!(lifecycle.versions_present, vec!["1.0", "3.0"]);

    let events: Vec<_> = lifecycle
        .events
        .iter()
        .map(|e| (e.change_type, e.version.as_str()))
        .collect();
    assert_eq!(
        events,
        vec![(ChangeType::Removed, "2.0"), (ChangeType::Added, "3.0")]
    );
    assert!(lifecycle.is_present_at_end(&result.versions));

    let untouched = result.lifecycle("pkg.g");
    assert!(untouched.events.is_empty());
    assert_eq!(untouched.versions_present.len(), 3);
}

#[test]
fn test_extracted_signatures_drive_compatibility() {
    let provider = StaticProvider::new()
        .with_version(
            "pkg",
            VersionInfo::new("1.0", None),
            make_tree(
                "class Client:\n    def get(self, url: str) -> bytes:\n        pass\n\n    def close(self):\n        pass\n",
            ),
        )
        .with_version(
            "pkg",
            VersionInfo::new("1.1", None),
            make_tree(
                "class Client:\n    def get(self, url: str, *, timeout: float = 5.0) -> bytes:\n        pass\n\n    def close(self, force):\n        pass\n",
            ),
        );

    let result = Analyzer::new(provider)
        .compare_versions("pkg", "1.0", "1.1")
        .unwrap();

    let modified = result.changes_filtered(Some(&[ChangeType::Modified]), Some(&[ApiKind::Method]));
    assert_eq!(modified.len(), 2);

    let by_name = |name: &str| {
        modified
            .iter()
            .find(|c| c.api_name() == name)
            .map(|c| c.is_backwards_compatible())
    };
    assert_eq!(by_name("pkg.Client.get"), Some(true));
    assert_eq!(by_name("pkg.Client.close"), Some(false));
    assert!(result.has_breaking_changes());
}

#[test]
fn test_summary_counts() {
    let provider = StaticProvider::new()
        .with_version("pkg", VersionInfo::new("1.0", None), make_tree("A = 1\n"))
        .with_version(
            "pkg",
            VersionInfo::new("2.0", None),
            make_tree("A = 1\nB = 2\n\ndef f():\n    pass\n"),
        );

    let result = Analyzer::new(provider)
        .analyze_package("pkg", None, None, None)
        .unwrap();
    let summary = result.summary();

    assert_eq!(summary.total_versions, 2);
    assert_eq!(summary.total_changes, 2);
    assert_eq!(summary.change_types[&ChangeType::Added], 2);
    assert_eq!(summary.change_types[&ChangeType::Removed], 0);
    assert_eq!(summary.api_types[&ApiKind::Constant], 2);
    assert_eq!(summary.api_types[&ApiKind::Function], 1);
    assert_eq!(summary.unique_apis, 3);
    assert_eq!(summary.versions[1].changes_count, 2);
}
