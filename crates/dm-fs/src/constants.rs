//! Constants and enums for data tree filesystem markers.

use std::path::Path;

/// Well-known names inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmPath {
    /// The `.datalad` directory (container marker)
    DataladDir,
    /// The `.datalad/config` file holding the container id
    DataladConfig,
    /// The `.git` directory (version-control database)
    GitDir,
    /// The `.gitmodules` file (sub-container registrations)
    Gitmodules,
    /// The `metadata.json` document at the container root
    MetadataFile,
}

impl DmPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataladDir => ".datalad",
            Self::DataladConfig => ".datalad/config",
            Self::GitDir => ".git",
            Self::Gitmodules => ".gitmodules",
            Self::MetadataFile => "metadata.json",
        }
    }
}

impl AsRef<Path> for DmPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for DmPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for DmPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
