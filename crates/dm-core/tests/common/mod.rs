//! Shared setup for dm-core tests
#![allow(dead_code)]

use std::sync::Arc;

use dm_core::{ConfigLocation, ConfigOverrides, DataManager, MemorySink};
use dm_test_utils::{FakeEngine, TestTree};

pub struct Harness {
    pub tree: TestTree,
    pub engine: Arc<FakeEngine>,
    pub sink: Arc<MemorySink>,
    pub dm: DataManager,
}

pub fn overrides(tree: &TestTree) -> ConfigOverrides {
    ConfigOverrides {
        dm_root: Some(tree.root().to_path_buf()),
        user_name: Some("Alice".to_string()),
        user_email: Some("alice@lab.org".to_string()),
        ..Default::default()
    }
}

pub fn harness_with(configure: impl FnOnce(&mut ConfigOverrides)) -> Harness {
    let tree = TestTree::new();
    let engine = Arc::new(FakeEngine::new());
    let sink = Arc::new(MemorySink::new());
    let mut overrides = overrides(&tree);
    configure(&mut overrides);
    let dm = DataManager::new(
        &overrides,
        ConfigLocation::at(tree.config_path()),
        engine.clone(),
        sink.clone(),
    )
    .unwrap();
    Harness {
        tree,
        engine,
        sink,
        dm,
    }
}

pub fn harness() -> Harness {
    harness_with(|_| {})
}
