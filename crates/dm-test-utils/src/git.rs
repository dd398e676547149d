//! Inspection helpers for containers backed by real git.
//!
//! These read repository state directly through `git2` so tests can assert
//! on history without going through the engine under test.

use std::path::Path;

/// Commit messages reachable from HEAD, newest first.
///
/// Returns an empty list while the branch is unborn.
///
/// # Panics
/// Panics if `path` is not a git repository.
pub fn commit_messages(path: &Path) -> Vec<String> {
    let repo = git2::Repository::open(path)
        .unwrap_or_else(|e| panic!("commit_messages: cannot open {}: {e}", path.display()));
    let Ok(head) = repo.head() else {
        return Vec::new();
    };
    let Some(head_id) = head.target() else {
        return Vec::new();
    };

    let mut walk = repo.revwalk().expect("commit_messages: revwalk");
    walk.push(head_id).expect("commit_messages: push head");
    walk.filter_map(|oid| oid.ok())
        .filter_map(|oid| repo.find_commit(oid).ok())
        .map(|c| c.message().unwrap_or_default().trim_end().to_string())
        .collect()
}

/// Whether the tree at HEAD contains `key`.
///
/// # Panics
/// Panics if `path` is not a git repository.
pub fn head_contains(path: &Path, key: &str) -> bool {
    let repo = git2::Repository::open(path)
        .unwrap_or_else(|e| panic!("head_contains: cannot open {}: {e}", path.display()));
    let Ok(tree) = repo.head().and_then(|h| h.peel_to_tree()) else {
        return false;
    };
    tree.get_path(Path::new(key)).is_ok()
}

/// Names of the remotes configured on the repository at `path`.
///
/// # Panics
/// Panics if `path` is not a git repository.
pub fn remote_names(path: &Path) -> Vec<String> {
    let repo = git2::Repository::open(path)
        .unwrap_or_else(|e| panic!("remote_names: cannot open {}: {e}", path.display()));
    let remotes = repo.remotes().expect("remote_names: list remotes");
    remotes.iter().flatten().map(str::to_string).collect()
}

/// Whether the bare repository at `path` has a `main` branch.
pub fn bare_has_main(path: &Path) -> bool {
    git2::Repository::open_bare(path)
        .map(|repo| repo.find_reference("refs/heads/main").is_ok())
        .unwrap_or(false)
}
