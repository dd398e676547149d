//! [`TestTree`]: a temporary managed root for data manager scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

/// A temporary directory holding a managed root (`dm/`), a place for
/// install sources (`sources/`), a persisted configuration file
/// (`config.json`) and a host directory for remotes (`hosts/`).
///
/// # Example
///
/// ```rust,no_run
/// use dm_test_utils::TestTree;
///
/// let tree = TestTree::new();
/// let source = tree.source_file("scan.dat", "raw bytes");
/// tree.assert_not_exists("roadmap");
/// ```
pub struct TestTree {
    temp_dir: TempDir,
    root: PathBuf,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Create the temporary layout. Paths are canonical.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let base = dm_fs::canonical(temp_dir.path()).unwrap();
        let root = base.join("dm");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(base.join("sources")).unwrap();
        fs::create_dir_all(base.join("hosts")).unwrap();
        Self { temp_dir, root }
    }

    /// The temporary directory itself.
    pub fn base(&self) -> PathBuf {
        dm_fs::canonical(self.temp_dir.path()).unwrap()
    }

    /// The managed root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `rel` below the managed root.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Location for a persisted configuration document.
    pub fn config_path(&self) -> PathBuf {
        self.base().join("config.json")
    }

    /// Directory bare repositories of a local host live in.
    pub fn hosts(&self) -> PathBuf {
        self.base().join("hosts")
    }

    /// Write a file below `sources/` and return its path.
    pub fn source_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.base().join("sources").join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Write `files` (relative path, content) below `sources/<dir>` and
    /// return the directory.
    pub fn source_dir(&self, dir: &str, files: &[(&str, &str)]) -> PathBuf {
        let path = self.base().join("sources").join(dir);
        fs::create_dir_all(&path).unwrap();
        for (rel, content) in files {
            let file = path.join(rel);
            if let Some(parent) = file.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(file, content).unwrap();
        }
        path
    }

    /// Parse the JSON file at `rel` below the managed root.
    ///
    /// # Panics
    /// Panics if the file cannot be read or parsed.
    pub fn read_json(&self, rel: &str) -> Value {
        let path = self.path(rel);
        let text = fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()));
        serde_json::from_str(&text)
            .unwrap_or_else(|e| panic!("Invalid JSON in {}: {e}", path.display()))
    }

    /// Assert that `rel` (below the managed root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_exists(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            full_path.exists(),
            "Expected path to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `rel` (below the managed root) does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_not_exists(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            !full_path.exists(),
            "Expected path NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `rel` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, rel: &str, content: &str) {
        let full_path = self.path(rel);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            full_path.display(),
            content,
            file_content
        );
    }
}
