//! Repository hosts that siblings point at
//!
//! A host knows how to make a named remote repository exist and which URLs
//! reach it.

use std::path::{Path, PathBuf};

use git2::{Repository, RepositoryInitOptions};

use crate::naming::{is_valid_repo_name, ssh_to_https};
use crate::{DEFAULT_BRANCH, Error, Result};

/// URLs of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedRepository {
    pub ssh_url: String,
    pub https_url: String,
}

/// Somewhere remote repositories live.
pub trait RepositoryHost: Send + Sync {
    /// Make sure repository `name` exists and return its URLs.
    ///
    /// With `replace`, an existing repository is recreated empty.
    fn ensure_repository(&self, name: &str, private: bool, replace: bool) -> Result<HostedRepository>;
}

/// Bare repositories in a local directory.
///
/// Both URLs are the repository's filesystem path. Useful for offline
/// archives and tests.
#[derive(Debug, Clone)]
pub struct LocalHost {
    base: PathBuf,
}

impl LocalHost {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Directory holding the bare repositories.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Path of repository `name`.
    pub fn repository_path(&self, name: &str) -> PathBuf {
        self.base.join(format!("{name}.git"))
    }
}

impl RepositoryHost for LocalHost {
    fn ensure_repository(&self, name: &str, _private: bool, replace: bool) -> Result<HostedRepository> {
        if !is_valid_repo_name(name) {
            return Err(Error::InvalidUrl {
                url: name.to_string(),
            });
        }

        let path = self.repository_path(name);
        if replace && path.exists() {
            std::fs::remove_dir_all(&path).map_err(|e| Error::io(&path, e))?;
        }
        if !path.exists() {
            let mut opts = RepositoryInitOptions::new();
            opts.bare(true).initial_head(DEFAULT_BRANCH);
            Repository::init_opts(&path, &opts)?;
            tracing::debug!(path = %path.display(), "Created bare repository");
        }

        let url = path.to_string_lossy().into_owned();
        Ok(HostedRepository {
            ssh_url: url.clone(),
            https_url: url,
        })
    }
}

/// A hosting service reached by URL (e.g. a GIN instance).
///
/// Repositories are not created through an API: they must already exist on
/// the service. The host only formats the URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlHost {
    /// e.g. `git@gin.g-node.org:`
    ssh_root: String,
    /// e.g. `https://gin.g-node.org/`
    https_root: String,
    user: String,
}

impl UrlHost {
    /// Build a host from a URL root in SSH (`git@host:`) or HTTPS
    /// (`https://host/`) form.
    pub fn new(url_root: &str, user: &str) -> Result<Self> {
        let invalid = || Error::InvalidUrl {
            url: url_root.to_string(),
        };

        let host = if let Some(rest) = url_root.strip_prefix("https://") {
            rest.trim_end_matches('/').to_string()
        } else {
            let (user_host, _) = url_root.split_once(':').ok_or_else(invalid)?;
            let (_, host) = user_host.split_once('@').ok_or_else(invalid)?;
            host.to_string()
        };
        if host.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            ssh_root: format!("git@{host}:"),
            https_root: format!("https://{host}/"),
            user: user.to_string(),
        })
    }
}

impl RepositoryHost for UrlHost {
    fn ensure_repository(&self, name: &str, private: bool, replace: bool) -> Result<HostedRepository> {
        if !is_valid_repo_name(name) {
            return Err(Error::InvalidUrl {
                url: name.to_string(),
            });
        }
        if replace {
            tracing::warn!(repository = %name, "Cannot recreate repositories on a URL host, reusing it");
        }

        let ssh_url = format!("{}{}/{}.git", self.ssh_root, self.user, name);
        tracing::debug!(url = %ssh_url, private, "Repository is expected to exist on the host");
        Ok(HostedRepository {
            https_url: ssh_to_https(&ssh_url),
            ssh_url,
        })
    }
}

/// Pick a host for a URL root: a local directory (plain path or `file://`)
/// or a hosting service.
pub fn host_for(url_root: &str, user: &str) -> Result<Box<dyn RepositoryHost>> {
    if let Some(path) = url_root.strip_prefix("file://") {
        return Ok(Box::new(LocalHost::new(Path::new(path).join(user))));
    }
    if Path::new(url_root).is_absolute() {
        return Ok(Box::new(LocalHost::new(Path::new(url_root).join(user))));
    }
    Ok(Box::new(UrlHost::new(url_root, user)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_host_formats_both_forms() {
        let host = UrlHost::new("git@gin.g-node.org:/", "alice").unwrap();
        let repo = host.ensure_repository("lab", false, false).unwrap();
        assert_eq!(repo.ssh_url, "git@gin.g-node.org:alice/lab.git");
        assert_eq!(repo.https_url, "https://gin.g-node.org/alice/lab");
    }

    #[test]
    fn url_host_accepts_https_root() {
        let host = UrlHost::new("https://gin.example.org/", "bob").unwrap();
        let repo = host.ensure_repository("x", true, false).unwrap();
        assert_eq!(repo.ssh_url, "git@gin.example.org:bob/x.git");
    }

    #[test]
    fn url_host_rejects_garbage() {
        assert!(UrlHost::new("not a url", "bob").is_err());
    }
}
