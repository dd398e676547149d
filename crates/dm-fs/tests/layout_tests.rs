use dm_fs::{EntryKind, NodeLevel, classify, classify_entry, find_container_and_relative};
use rstest::rstest;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn mark_container(dir: &Path) {
    fs::create_dir_all(dir.join(".datalad")).unwrap();
}

#[rstest]
#[case("", NodeLevel::Root)]
#[case("roadmap", NodeLevel::Project)]
#[case("roadmap/2025", NodeLevel::Campaign)]
#[case("roadmap/2025/E1", NodeLevel::Experiment)]
#[case("roadmap/2025/E1/raw", NodeLevel::Category)]
#[case("roadmap/2025/E1/raw/run_1/deep", NodeLevel::Category)]
fn test_classify_levels(#[case] rel: &str, #[case] expected: NodeLevel) {
    let root = Path::new("/tmp/dm");
    let path = if rel.is_empty() { root.to_path_buf() } else { root.join(rel) };
    assert_eq!(classify(&path, root).unwrap(), expected);
}

#[test]
fn test_classify_outside_root_fails() {
    assert!(classify(Path::new("/elsewhere/x"), Path::new("/tmp/dm")).is_err());
}

#[test]
fn test_level_child_saturates() {
    assert_eq!(NodeLevel::Root.child(), NodeLevel::Project);
    assert_eq!(NodeLevel::Experiment.child(), NodeLevel::Category);
    assert_eq!(NodeLevel::Category.child(), NodeLevel::Category);
    assert_eq!(NodeLevel::Campaign.to_string(), "campaign");
}

#[test]
fn test_find_container_for_file_in_category() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let experiment = root.join("p/c/e");
    mark_container(root);
    mark_container(&experiment);
    fs::create_dir_all(experiment.join("raw/run_1")).unwrap();
    fs::write(experiment.join("raw/run_1/a.dat"), "x").unwrap();

    let (container, key) =
        find_container_and_relative(&experiment.join("raw/run_1/a.dat"), root).unwrap();
    assert_eq!(container, experiment);
    assert_eq!(key, "raw/run_1/a.dat");
}

#[test]
fn test_find_container_for_container_root_is_self_key() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    mark_container(root);
    let project = root.join("roadmap");
    mark_container(&project);

    let (container, key) = find_container_and_relative(&project, root).unwrap();
    assert_eq!(container, project);
    assert_eq!(key, ".");

    let (container, key) = find_container_and_relative(root, root).unwrap();
    assert_eq!(container, root);
    assert_eq!(key, ".");
}

#[test]
fn test_find_container_skips_plain_directories() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    mark_container(root);
    fs::create_dir_all(root.join("plain/nested")).unwrap();

    let (container, key) = find_container_and_relative(&root.join("plain/nested"), root).unwrap();
    assert_eq!(container, root);
    assert_eq!(key, "plain/nested");
}

#[test]
fn test_find_container_missing_path() {
    let temp = TempDir::new().unwrap();
    mark_container(temp.path());
    assert!(find_container_and_relative(&temp.path().join("nope"), temp.path()).is_none());
}

#[test]
fn test_find_container_stops_at_root_parent() {
    let temp = TempDir::new().unwrap();
    // container above the managed root's parent must not be found
    mark_container(temp.path());
    let root = temp.path().join("outer/managed");
    fs::create_dir_all(root.join("data")).unwrap();

    assert!(find_container_and_relative(&root.join("data"), &root).is_none());
}

#[test]
fn test_find_container_accepts_git_marker() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join(".git")).unwrap();
    fs::create_dir(temp.path().join("sub")).unwrap();

    let (container, key) = find_container_and_relative(&temp.path().join("sub"), temp.path()).unwrap();
    assert_eq!(container, temp.path());
    assert_eq!(key, "sub");
}

#[test]
fn test_classify_entry_kinds() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    let dataset = root.join("ds");
    mark_container(&dataset);
    fs::create_dir(root.join("folder")).unwrap();
    fs::write(root.join("file.txt"), "x").unwrap();

    assert_eq!(classify_entry(&dataset), EntryKind::Dataset);
    assert_eq!(classify_entry(&root.join("folder")), EntryKind::Folder);
    assert_eq!(classify_entry(&root.join("file.txt")), EntryKind::FileLocal);
    assert_eq!(classify_entry(&root.join("missing")), EntryKind::Other);
}

#[cfg(unix)]
#[test]
fn test_classify_entry_links() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("target.dat"), "x").unwrap();
    std::os::unix::fs::symlink(root.join("target.dat"), root.join("present")).unwrap();
    std::os::unix::fs::symlink(root.join(".git/annex/objects/XX/key"), root.join("annexed")).unwrap();

    assert_eq!(classify_entry(&root.join("present")), EntryKind::FileLocal);
    assert_eq!(classify_entry(&root.join("annexed")), EntryKind::FileRemote);
}
