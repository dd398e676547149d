//! Normalized path handling and relative-path keys

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Key used for a container's own record.
pub const SELF_KEY: &str = ".";

/// A path normalized to use forward slashes internally.
///
/// Redundant separators and `.` segments are removed so that two spellings
/// of the same location compare equal. Conversion to the platform-native
/// format only happens at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: clean(&path_str.replace('\\', "/")),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        let name = self.inner.trim_end_matches('/').rsplit('/').next()?;
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(&name[idx + 1..]),
            _ => None,
        }
    }
}

/// Collapse duplicate separators and drop `.` segments.
///
/// A leading `//` (network share) is kept. `..` segments are kept as-is,
/// this is a lexical cleanup only.
fn clean(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let is_network = path.starts_with("//") && !path.starts_with("///");
    let is_absolute = path.starts_with('/');

    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    let body = segments.join("/");
    if is_network {
        format!("//{}", body)
    } else if is_absolute {
        format!("/{}", body)
    } else if body.is_empty() {
        SELF_KEY.to_string()
    } else {
        body
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

/// Compute the POSIX relative-path key of `path` below `base`.
///
/// `path` may be absolute (it must then lie below `base`) or already relative
/// to `base`. The container itself maps to [`SELF_KEY`]. Keys never contain
/// `..`, `.` or empty segments.
pub fn relative_key(base: &Path, path: &Path) -> Result<String> {
    let relative = if path.is_absolute() {
        path.strip_prefix(base).map_err(|_| Error::OutsideBase {
            path: path.to_path_buf(),
            base: base.to_path_buf(),
        })?
    } else {
        path
    };

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::OutsideBase {
                    path: path.to_path_buf(),
                    base: base.to_path_buf(),
                });
            }
        }
    }

    if segments.is_empty() {
        Ok(SELF_KEY.to_string())
    } else {
        Ok(segments.join("/"))
    }
}

/// Split a relative-path key into its segments. The self key has none.
pub fn key_segments(key: &str) -> Vec<&str> {
    key.split('/')
        .filter(|s| !s.is_empty() && *s != SELF_KEY)
        .collect()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_user(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Expand `~`, make absolute and resolve symlinks.
///
/// The path must exist. Uses `dunce` so Windows paths stay free of the
/// verbatim `\\?\` prefix.
pub fn canonical(path: impl AsRef<Path>) -> Result<PathBuf> {
    let expanded = expand_user(path);
    dunce::canonicalize(&expanded).map_err(|e| Error::io(&expanded, e))
}
