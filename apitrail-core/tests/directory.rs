//! Analysis of unpacked source trees on disk.

use std::fs;
use std::path::Path;

use apitrail_core::{
    Analyzer, AnalyzerConfig, ApiKind, ChangeType, DirectoryTree, StaticProvider, VersionInfo,
};
use tempfile::TempDir;

fn write(root: &Path, path: &str, contents: &str) {
    let path = root.join(path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn create_version(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, contents) in files {
        write(dir.path(), path, contents);
    }
    dir
}

#[test]
fn test_directory_versions_end_to_end() {
    let v1 = create_version(&[
        ("src/mylib/__init__.py", "VERSION = \"1.0\"\n"),
        (
            "src/mylib/client.py",
            "class Client:\n    \"\"\"HTTP client.\"\"\"\n\n    def get(self, url):\n        pass\n\n    def _retry(self):\n        pass\n",
        ),
        ("src/mylib/vendor/six.py", "def moves():\n    pass\n"),
        ("tests/test_client.py", "def test_get():\n    pass\n"),
    ]);
    let v2 = create_version(&[
        ("src/mylib/__init__.py", "VERSION = \"2.0\"\n"),
        (
            "src/mylib/client.py",
            "import warnings\n\nclass Client:\n    \"\"\"HTTP client.\"\"\"\n\n    def get(self, url, timeout=None):\n        pass\n\n    @deprecated(\"use get\")\n    def fetch(self, url):\n        pass\n",
        ),
        ("src/mylib/broken.py", "def oops(:\n"),
    ]);

    let config = AnalyzerConfig::from_toml(
        "[extract]\ninclude_private = false\nexclude = [\"vendor\"]\n",
    )
    .unwrap();

    let provider = StaticProvider::new()
        .with_version(
            "mylib",
            VersionInfo::new("1.0", Some("2024-01-01")),
            DirectoryTree::new(v1.path()).with_name("mylib"),
        )
        .with_version(
            "mylib",
            VersionInfo::new("2.0", Some("2024-02-01 09:30:00")),
            DirectoryTree::new(v2.path()).with_name("mylib"),
        );

    let result = Analyzer::from_config(provider, &config)
        .analyze_package("mylib", None, None, None)
        .unwrap();

    let v1_names: Vec<String> = result
        .version_apis("1.0")
        .iter()
        .map(|e| e.full_name())
        .collect();
    assert_eq!(
        v1_names,
        vec!["mylib.VERSION", "mylib.client.Client", "mylib.client.Client.get"]
    );

    assert_eq!(
        result.metadata.diagnostics["2.0"][0].path,
        "src/mylib/broken.py"
    );
    assert!(!result.metadata.settings.include_private);

    let changes: Vec<(ChangeType, String)> = result
        .changes
        .iter()
        .map(|c| (c.change_type(), c.api_name()))
        .collect();
    assert_eq!(
        changes,
        vec![
            (ChangeType::Added, "mylib.client.Client.fetch".to_string()),
            (ChangeType::Modified, "mylib.client.Client.get".to_string()),
        ]
    );

    let fetch = result
        .version_apis("2.0")
        .iter()
        .find(|e| e.name() == "fetch")
        .unwrap();
    assert_eq!(fetch.kind(), ApiKind::Method);
    assert!(fetch.is_deprecated());
    assert!(result.versions[1].release_date().is_some());
}
