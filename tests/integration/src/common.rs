//! Data managers over the real git engine and local hosts
#![allow(dead_code)]

use std::sync::Arc;

use dm_core::{ConfigLocation, ConfigOverrides, DataManager, MemorySink, RemoteSettings};
use dm_git::{GitEngine, Identity, host_for};
use dm_test_utils::TestTree;

pub const HOST_USER: &str = "alice";

/// Overrides for a manager rooted at `root` publishing to the tree's hosts.
pub fn overrides(tree: &TestTree, root: &std::path::Path) -> ConfigOverrides {
    ConfigOverrides {
        dm_root: Some(root.to_path_buf()),
        user_name: Some("Alice".to_string()),
        user_email: Some("alice@lab.org".to_string()),
        remote: RemoteSettings {
            url: Some(tree.hosts().to_string_lossy().into_owned()),
            repo: Some("lab".to_string()),
            user: Some(HOST_USER.to_string()),
        },
        ..Default::default()
    }
}

/// A manager over `root` with its own configuration document.
pub fn manager_at(tree: &TestTree, root: &std::path::Path, config_name: &str) -> (DataManager, Arc<MemorySink>) {
    let overrides = overrides(tree, root);
    let engine = GitEngine::new(Identity::new("Alice", "alice@lab.org"))
        .with_host(host_for(&tree.hosts().to_string_lossy(), HOST_USER).unwrap());
    let sink = Arc::new(MemorySink::new());
    let dm = DataManager::new(
        &overrides,
        ConfigLocation::at(tree.base().join(config_name)),
        Arc::new(engine),
        sink.clone(),
    )
    .unwrap();
    (dm, sink)
}

/// The manager of the tree's own root.
pub fn manager(tree: &TestTree) -> (DataManager, Arc<MemorySink>) {
    manager_at(tree, tree.root(), "config.json")
}
