use dm_fs::{NormalizedPath, SELF_KEY, key_segments, relative_key};
use rstest::rstest;
use std::path::Path;

#[test]
fn test_normalize_forward_slashes() {
    let path = NormalizedPath::new("foo/bar/baz");
    assert_eq!(path.as_str(), "foo/bar/baz");
}

#[test]
fn test_normalize_backslashes_to_forward() {
    let path = NormalizedPath::new("foo\\bar\\baz");
    assert_eq!(path.as_str(), "foo/bar/baz");
}

#[test]
fn test_normalize_collapses_duplicate_separators() {
    let path = NormalizedPath::new("/data//roadmap/./2025/");
    assert_eq!(path.as_str(), "/data/roadmap/2025");
}

#[test]
fn test_extension() {
    assert_eq!(NormalizedPath::new("foo/bar/metadata.json").extension(), Some("json"));
    assert_eq!(NormalizedPath::new("foo/.hidden").extension(), None);
    assert_eq!(NormalizedPath::new("foo/bar").extension(), None);
}

#[rstest]
#[case("/dm/roadmap", "/dm/roadmap", ".")]
#[case("/dm/roadmap", "/dm/roadmap/2025/E1", "2025/E1")]
#[case("/dm/E1", "/dm/E1/raw/sample.dat", "raw/sample.dat")]
#[case("/dm/E1", "raw/./run_1", "raw/run_1")]
#[case("/dm/E1", "", ".")]
fn test_relative_key(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
    let key = relative_key(Path::new(base), Path::new(path)).unwrap();
    assert_eq!(key, expected);
}

#[rstest]
#[case("/dm/E1", "/dm/E2/raw")]
#[case("/dm/E1", "../E2")]
#[case("/dm/E1", "raw/../../E2")]
fn test_relative_key_rejects_escapes(#[case] base: &str, #[case] path: &str) {
    assert!(relative_key(Path::new(base), Path::new(path)).is_err());
}

#[test]
fn test_self_key_has_no_segments() {
    assert!(key_segments(SELF_KEY).is_empty());
    assert_eq!(key_segments("roadmap/2025"), vec!["roadmap", "2025"]);
}
