//! End-to-end tests of the `dm` binary over a scratch tree

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Scratch {
    _temp: TempDir,
    home: PathBuf,
    root: PathBuf,
    config: PathBuf,
}

impl Scratch {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let base = canonical(temp.path());
        let home = base.join("home");
        fs::create_dir_all(&home).unwrap();
        Self {
            root: base.join("dm"),
            config: base.join("config.json"),
            home,
            _temp: temp,
        }
    }

    fn dm(&self) -> Command {
        let mut cmd = Command::cargo_bin("dm").unwrap();
        cmd.env("HOME", &self.home)
            .env_remove("ROADMAP_DM_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config);
        cmd
    }

    fn setup(&self) {
        self.dm()
            .args(["setup", "--name", "Alice", "--email", "alice@lab.org", "--root"])
            .arg(&self.root)
            .assert()
            .success();
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap()
}

#[test]
fn commands_before_setup_fail() {
    let scratch = Scratch::new();

    scratch
        .dm()
        .arg("status")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("run setup first"));
}

#[test]
fn setup_persists_configuration_and_creates_root() {
    let scratch = Scratch::new();
    scratch.setup();

    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&scratch.config).unwrap()).unwrap();
    assert_eq!(document["user_name"], "Alice");
    assert_eq!(document["user_email"], "alice@lab.org");
    assert!(scratch.root.join(".datalad").is_dir());
    assert!(scratch.root.join("metadata.json").is_file());
}

#[test]
fn setup_rejects_bad_email() {
    let scratch = Scratch::new();

    scratch
        .dm()
        .args(["setup", "--name", "Alice", "--email", "alice", "--root"])
        .arg(&scratch.root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an email address"));
}

#[test]
fn init_tree_creates_levels() {
    let scratch = Scratch::new();
    scratch.setup();

    scratch
        .dm()
        .args(["init-tree", "roadmap", "2025", "E1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tree ready"));

    for rel in ["roadmap", "roadmap/2025", "roadmap/2025/E1"] {
        assert!(scratch.root.join(rel).join(".datalad").is_dir(), "{rel}");
    }
}

#[test]
fn install_copies_and_records_metadata() {
    let scratch = Scratch::new();
    scratch.setup();
    let source = scratch.home.join("sample.dat");
    fs::write(&source, "counts").unwrap();

    scratch
        .dm()
        .arg("install")
        .arg(&source)
        .args(["-e", "E1", "-c", "raw", "-p", "roadmap", "--campaign", "2025"])
        .args(["--meta", r#"{"instrument": "NR"}"#])
        .assert()
        .success();

    let installed = scratch.root.join("roadmap/2025/E1/raw/sample.dat");
    assert_eq!(fs::read_to_string(&installed).unwrap(), "counts");
    assert!(source.exists());

    scratch
        .dm()
        .args(["meta", "get", "--payload"])
        .arg(&installed)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"instrument\": \"NR\""))
        .stdout(predicate::str::contains("sample.dat"));
}

#[test]
fn install_rejects_unknown_category() {
    let scratch = Scratch::new();
    scratch.setup();
    let source = scratch.home.join("sample.dat");
    fs::write(&source, "counts").unwrap();

    scratch
        .dm()
        .arg("install")
        .arg(&source)
        .args(["-e", "E1", "-c", "bogus", "-p", "roadmap", "--campaign", "2025"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid category 'bogus'"));

    assert!(!scratch.root.join("roadmap").exists());
}

#[test]
fn classify_reports_level() {
    let scratch = Scratch::new();
    scratch.setup();
    scratch
        .dm()
        .args(["init-tree", "roadmap", "2025", "E1"])
        .assert()
        .success();

    scratch
        .dm()
        .arg("classify")
        .arg(scratch.root.join("roadmap/2025/E1"))
        .assert()
        .success()
        .stdout(predicate::str::contains("experiment"))
        .stdout(predicate::str::contains("dataset"));
}

#[test]
fn set_remote_validates_names() {
    let scratch = Scratch::new();
    scratch.setup();

    scratch
        .dm()
        .args(["config", "set-remote", "--repo", "bad name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid repository name"));

    scratch
        .dm()
        .args(["config", "set-remote", "--repo", "lab", "--user", "alice"])
        .assert()
        .success();

    scratch
        .dm()
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"GIN_repo\": \"lab\""))
        .stdout(predicate::str::contains("\"GIN_user\": \"alice\""));
}

#[test]
fn publish_without_repository_fails() {
    let scratch = Scratch::new();
    scratch.setup();

    scratch
        .dm()
        .arg("publish")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GIN_repo"));
}

#[test]
fn completions_are_generated() {
    let scratch = Scratch::new();

    scratch
        .dm()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dm"));
}
