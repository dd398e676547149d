//! Publishing, cloning and synchronizing trees through local hosts

mod common;

use std::fs;
use std::path::Path;

use dm_core::{InstallRequest, PublishRequest};
use dm_test_utils::TestTree;
use dm_test_utils::git::{bare_has_main, remote_names};
use pretty_assertions::assert_eq;

use common::{HOST_USER, manager, manager_at};

fn hosted(tree: &TestTree, name: &str) -> std::path::PathBuf {
    tree.hosts().join(HOST_USER).join(format!("{name}.git"))
}

fn head_message(bare: &Path) -> String {
    let repo = git2::Repository::open_bare(bare).unwrap();
    let commit = repo
        .find_reference("refs/heads/main")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    commit.message().unwrap().trim_end().to_string()
}

fn install_sample(tree: &TestTree, dm: &dm_core::DataManager) {
    let source = tree.source_file("sample.dat", "counts");
    let mut request = InstallRequest::new(&source, "E1", "raw");
    request.project = Some("roadmap".to_string());
    request.campaign = Some("2025".to_string());
    dm.install_into_tree(&request).unwrap();
}

#[test]
fn publishing_names_one_repository_per_container() {
    let tree = TestTree::new();
    let (dm, _) = manager(&tree);
    dm.init_tree(Some("roadmap"), Some("2025"), None, false)
        .unwrap();

    dm.publish_sibling(&PublishRequest::default()).unwrap();

    for name in ["lab", "lab-roadmap", "lab-roadmap-2025"] {
        assert!(bare_has_main(&hosted(&tree, name)), "{name}");
    }
    assert!(remote_names(tree.root()).contains(&"gin".to_string()));
    assert!(remote_names(&tree.path("roadmap/2025")).contains(&"gin".to_string()));
}

#[test]
fn published_tree_clones_with_content() {
    let tree = TestTree::new();
    let (dm, _) = manager(&tree);
    install_sample(&tree, &dm);
    dm.publish_sibling(&PublishRequest::default()).unwrap();

    let mirror = tree.base().join("mirror");
    let cloned = dm.clone_from_remote(&mirror, None, None, None).unwrap();

    assert_eq!(cloned, mirror);
    let engine = dm.engine();
    for rel in ["roadmap", "roadmap/2025", "roadmap/2025/E1"] {
        assert!(engine.is_installed(&mirror.join(rel)), "{rel}");
    }
    assert_eq!(
        fs::read_to_string(mirror.join("roadmap/2025/E1/raw/sample.dat")).unwrap(),
        "counts"
    );
    assert_eq!(
        engine.id(&mirror.join("roadmap/2025/E1")).unwrap(),
        engine.id(&tree.path("roadmap/2025/E1")).unwrap()
    );
}

#[test]
fn lazy_publish_starts_at_published_ancestor() {
    let tree = TestTree::new();
    let (dm, _) = manager(&tree);
    dm.init_tree(Some("roadmap"), Some("2025"), None, false)
        .unwrap();
    dm.publish_sibling(&PublishRequest::default()).unwrap();
    let campaign = dm.create_child(&tree.path("roadmap"), "2026").unwrap();

    let published = dm
        .publish_lazy_to_remote(&PublishRequest {
            container: Some(campaign.clone()),
            ..PublishRequest::default()
        })
        .unwrap();

    assert_eq!(published, tree.path("roadmap"));
    assert!(bare_has_main(&hosted(&tree, "lab-roadmap-2026")));
    assert!(remote_names(&campaign).contains(&"gin".to_string()));
}

#[test]
fn push_falls_back_to_gin() {
    let tree = TestTree::new();
    let (dm, sink) = manager(&tree);
    dm.init_tree(None, None, None, false).unwrap();
    dm.publish_sibling(&PublishRequest {
        recursive: false,
        ..PublishRequest::default()
    })
    .unwrap();
    fs::write(tree.path("notes.txt"), "beam time").unwrap();

    dm.push_to_remotes(tree.root(), false, Some("Add notes"), Some("archive"))
        .unwrap();

    assert_eq!(head_message(&hosted(&tree, "lab")), "Add notes");
    let warnings = sink.messages(dm_core::LogLevel::Warn);
    assert!(warnings.iter().any(|w| w.contains("retrying on 'gin'")), "{warnings:?}");
}

#[test]
fn changes_pushed_from_a_clone_are_pulled_back() {
    let tree = TestTree::new();
    let (dm, _) = manager(&tree);
    install_sample(&tree, &dm);
    dm.publish_sibling(&PublishRequest::default()).unwrap();
    let mirror = tree.base().join("mirror");
    dm.clone_from_remote(&mirror, None, None, None).unwrap();

    let (mirror_dm, _) = manager_at(&tree, &mirror, "mirror.json");
    let mirror_experiment = mirror.join("roadmap/2025/E1");
    fs::write(mirror_experiment.join("raw/second.dat"), "more counts").unwrap();
    mirror_dm
        .push_to_remotes(&mirror_experiment, false, Some("Second scan"), None)
        .unwrap();

    let experiment = tree.path("roadmap/2025/E1");
    dm.pull_from_remotes(&experiment, false, Some("gin")).unwrap();

    tree.assert_file_contains("roadmap/2025/E1/raw/second.dat", "more counts");
}
