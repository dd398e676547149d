//! End-to-end tree provisioning and installation over the git engine

mod common;

use std::fs;

use dm_core::{GetMode, InstallRequest, MergeMode, SaveMeta};
use dm_git::Removal;
use dm_test_utils::TestTree;
use dm_test_utils::git::{commit_messages, head_contains};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::manager;

#[test]
fn roadmap_tree_is_registered_level_by_level() {
    let tree = TestTree::new();
    let (dm, _) = manager(&tree);

    let experiment = dm
        .init_tree(Some("roadmap"), Some("2025"), Some("E1"), false)
        .unwrap()
        .unwrap();

    assert_eq!(experiment, tree.path("roadmap/2025/E1"));
    let engine = dm.engine();
    let chain = [
        tree.root().to_path_buf(),
        tree.path("roadmap"),
        tree.path("roadmap/2025"),
        tree.path("roadmap/2025/E1"),
    ];
    for pair in chain.windows(2) {
        assert!(engine.is_installed(&pair[1]), "{}", pair[1].display());
        assert!(engine.is_registered(&pair[0], &pair[1]).unwrap());
    }

    let payload = dm.load_meta(&experiment, None, GetMode::Payload).unwrap();
    assert_eq!(payload["name"], "E1");
    assert_eq!(payload["@type"], "Dataset");
    let id = payload["@id"].as_str().unwrap();
    assert!(id.starts_with("datalad:experiment:"), "{id}");

    let root_payload = dm.load_meta(tree.root(), None, GetMode::Payload).unwrap();
    assert_eq!(root_payload["name"], "Alice");
    assert!(commit_messages(&experiment)[0].starts_with("Metadata for"));
}

#[test]
fn init_tree_twice_adds_no_history() {
    let tree = TestTree::new();
    let (dm, _) = manager(&tree);
    dm.init_tree(Some("roadmap"), Some("2025"), Some("E1"), false)
        .unwrap();
    assert!(dm.status(None, true).unwrap().is_empty());
    let before: Vec<_> = ["", "roadmap", "roadmap/2025", "roadmap/2025/E1"]
        .iter()
        .map(|rel| commit_messages(&tree.root().join(rel)).len())
        .collect();

    dm.init_tree(Some("roadmap"), Some("2025"), Some("E1"), false)
        .unwrap();

    let after: Vec<_> = ["", "roadmap", "roadmap/2025", "roadmap/2025/E1"]
        .iter()
        .map(|rel| commit_messages(&tree.root().join(rel)).len())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn forced_tree_commits_from_the_root() {
    let tree = TestTree::new();
    let (dm, _) = manager(&tree);

    dm.init_tree(Some("roadmap"), Some("2025"), None, true)
        .unwrap();

    let campaign = tree.path("roadmap/2025");
    assert!(head_contains(&campaign, "metadata.json"));
    assert!(dm.status(None, true).unwrap().is_empty());
}

#[test]
fn sample_file_lands_in_raw_and_is_committed() {
    let tree = TestTree::new();
    let (dm, _) = manager(&tree);
    let source = tree.source_file("sample.dat", "counts");

    let mut request = InstallRequest::new(&source, "E1", "raw");
    request.project = Some("roadmap".to_string());
    request.campaign = Some("2025".to_string());
    request.metadata = Some(json!({"instrument": "NR"}).as_object().unwrap().clone());
    let installed = dm.install_into_tree(&request).unwrap();

    let experiment = tree.path("roadmap/2025/E1");
    assert_eq!(installed, experiment.join("raw/sample.dat"));
    tree.assert_file_contains("roadmap/2025/E1/raw/sample.dat", "counts");
    assert!(source.exists());
    assert!(head_contains(&experiment, "raw/sample.dat"));
    assert_eq!(commit_messages(&experiment)[0], "Installed raw/sample.dat");

    let payload = dm
        .load_meta(&experiment, Some(&installed), GetMode::Payload)
        .unwrap();
    assert_eq!(payload["@type"], "CreativeWork");
    assert_eq!(payload["name"], "sample.dat");
    assert_eq!(payload["instrument"], "NR");
    assert!(dm.status(Some(&experiment), false).unwrap().is_empty());
}

#[test]
fn moved_folder_lands_below_destination() {
    let tree = TestTree::new();
    let (dm, _) = manager(&tree);
    let source = tree.source_dir("run3", &[("a.txt", "a"), ("nested/b.txt", "b")]);

    let mut request = InstallRequest::new(&source, "E1", "analysis");
    request.project = Some("roadmap".to_string());
    request.campaign = Some("2025".to_string());
    request.dest_rel = Some("fits".into());
    request.rename = Some("run3-final".to_string());
    request.move_source = true;
    dm.install_into_tree(&request).unwrap();

    assert!(!source.exists());
    tree.assert_file_contains("roadmap/2025/E1/analysis/fits/run3-final/nested/b.txt", "b");
    let experiment = tree.path("roadmap/2025/E1");
    assert!(head_contains(&experiment, "analysis/fits/run3-final/a.txt"));
    let payload = dm
        .load_meta(&experiment, Some(&experiment.join("analysis/fits/run3-final")), GetMode::Payload)
        .unwrap();
    assert_eq!(payload["@type"], "Collection");
}

#[test]
fn merged_metadata_is_committed() {
    let tree = TestTree::new();
    let (dm, _) = manager(&tree);
    let experiment = dm
        .init_tree(Some("roadmap"), Some("2025"), Some("E1"), false)
        .unwrap()
        .unwrap();
    let payload = json!({"sample": "Si wafer"}).as_object().unwrap().clone();

    let key = dm
        .save_meta(&SaveMeta {
            payload: Some(&payload),
            mode: MergeMode::Merge,
            ..SaveMeta::new(&experiment)
        })
        .unwrap();

    assert_eq!(key, ".");
    assert_eq!(commit_messages(&experiment)[0], "Metadata for .");
    let merged = dm.load_meta(&experiment, None, GetMode::Payload).unwrap();
    assert_eq!(merged["name"], "E1");
    assert_eq!(merged["sample"], "Si wafer");
}

#[test]
fn safe_removal_of_installed_file() {
    let tree = TestTree::new();
    let (dm, _) = manager(&tree);
    let source = tree.source_file("sample.dat", "counts");
    let mut request = InstallRequest::new(&source, "E1", "raw");
    request.project = Some("roadmap".to_string());
    request.campaign = Some("2025".to_string());
    let installed = dm.install_into_tree(&request).unwrap();
    let experiment = tree.path("roadmap/2025/E1");

    dm.remove_from_tree(&experiment, Some(&installed), false, Removal::Safe)
        .unwrap();

    assert!(!installed.exists());
    assert!(!head_contains(&experiment, "raw/sample.dat"));
    fs::metadata(experiment.join("metadata.json")).unwrap();
}
