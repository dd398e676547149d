use dm_git::naming::is_ssh_url;
use dm_git::{is_valid_repo_name, sibling_repo_name, ssh_to_https};
use rstest::rstest;

#[rstest]
#[case("git@gin.g-node.org:/alice/lab.git", "https://gin.g-node.org/alice/lab")]
#[case("git@gin.g-node.org:alice/lab", "https://gin.g-node.org/alice/lab")]
#[case("git@github.com:org/repo-roadmap.git", "https://github.com/org/repo-roadmap")]
fn test_ssh_to_https(#[case] ssh: &str, #[case] https: &str) {
    assert_eq!(ssh_to_https(ssh), https);
    assert!(is_ssh_url(ssh));
}

#[rstest]
#[case("https://gin.g-node.org/alice/lab")]
#[case("/srv/archive/lab.git")]
#[case("file:///srv/archive/lab.git")]
fn test_non_ssh_urls_unchanged(#[case] url: &str) {
    assert_eq!(ssh_to_https(url), url);
    assert!(!is_ssh_url(url));
}

#[rstest]
#[case("lab", ".", "lab")]
#[case("lab", "roadmap", "lab-roadmap")]
#[case("lab", "roadmap/2025/E1", "lab-roadmap-2025-E1")]
#[case("lab", "my project/run 1", "lab-my-project-run-1")]
fn test_sibling_repo_name(#[case] base: &str, #[case] key: &str, #[case] expected: &str) {
    assert_eq!(sibling_repo_name(base, key), expected);
}

#[test]
fn test_nested_names_compose() {
    // naming the grandchild from the child gives the same result as from the root
    let child = sibling_repo_name("lab", "roadmap");
    assert_eq!(
        sibling_repo_name(&child, "2025"),
        sibling_repo_name("lab", "roadmap/2025")
    );
}

#[rstest]
#[case("lab-roadmap_2025.v1", true)]
#[case("", false)]
#[case("has space", false)]
#[case("slash/name", false)]
fn test_repo_name_validation(#[case] name: &str, #[case] valid: bool) {
    assert_eq!(is_valid_repo_name(name), valid);
}
