//! Publishing the tree to, and synchronizing it with, remote siblings

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dm_fs::{SELF_KEY, expand_user, find_container_and_relative, relative_key};
use dm_git::{
    AccessProtocol, DataPolicy, ExistingPolicy, SiblingRequest, StorageEngine, sibling_repo_name,
    ssh_to_https,
};

use crate::config::{DEFAULT_REMOTE_URL, DataManagerConfig};
use crate::log::Logger;
use crate::{Error, Result};

/// Sibling name publishing targets by default.
pub const DEFAULT_SIBLING: &str = "gin";

/// Siblings a failed push falls back to, in order.
const FALLBACK_SIBLINGS: [&str; 2] = ["gin", "origin"];

/// What to publish and how to reach the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// Sibling name inside the containers.
    pub sibling: String,
    /// Base repository name, falls back to the configured one.
    pub repo_name: Option<String>,
    /// Container to publish, the managed root when unset.
    pub container: Option<PathBuf>,
    pub access_protocol: AccessProtocol,
    pub credential: Option<String>,
    pub private: bool,
    pub existing: ExistingPolicy,
    pub recursive: bool,
    /// Message of the final recursive save.
    pub message: Option<String>,
}

impl Default for PublishRequest {
    fn default() -> Self {
        Self {
            sibling: DEFAULT_SIBLING.to_string(),
            repo_name: None,
            container: None,
            access_protocol: AccessProtocol::Ssh,
            credential: None,
            private: false,
            existing: ExistingPolicy::Skip,
            recursive: true,
            message: None,
        }
    }
}

/// Remote publication and synchronization of containers.
pub struct RemoteSyncManager<'a> {
    engine: &'a Arc<dyn StorageEngine>,
    config: &'a DataManagerConfig,
    log: &'a Logger,
}

impl<'a> RemoteSyncManager<'a> {
    pub fn new(engine: &'a Arc<dyn StorageEngine>, config: &'a DataManagerConfig, log: &'a Logger) -> Self {
        Self { engine, config, log }
    }

    fn root(&self) -> &Path {
        &self.config.dm_root
    }

    fn require_installed(&self, container: &Path) -> Result<()> {
        if self.engine.is_installed(container) {
            Ok(())
        } else {
            Err(Error::ContainerNotInstalled {
                path: container.to_path_buf(),
            })
        }
    }

    fn outside(&self, path: &Path) -> Error {
        Error::OutsideManagedRoot {
            path: path.to_path_buf(),
            root: self.root().to_path_buf(),
        }
    }

    /// The container enclosing `container`'s directory, if any.
    fn parent_container(&self, container: &Path) -> Option<PathBuf> {
        let dir = container.parent()?;
        find_container_and_relative(dir, self.root()).map(|(parent, _)| parent)
    }

    /// Publish the nearest ancestor that already has a sibling.
    ///
    /// Climbs from the start container through enclosing containers until
    /// one carries the requested sibling or `origin`, or the root is
    /// reached, then publishes recursively from there.
    pub fn publish_lazy_to_remote(&self, request: &PublishRequest) -> Result<PathBuf> {
        let root = self.root().to_path_buf();
        let start = request.container.clone().unwrap_or_else(|| root.clone());
        if !start.starts_with(&root) {
            return Err(self.outside(&start));
        }
        self.require_installed(&start)?;

        let mut current = start;
        let sibling = loop {
            self.require_installed(&current)?;
            let siblings = self.engine.query_siblings(&current, None, false)?;
            if siblings.iter().any(|s| s.name == request.sibling) {
                break request.sibling.clone();
            }
            if siblings.iter().any(|s| s.name == "origin") {
                break "origin".to_string();
            }
            if current == root {
                break request.sibling.clone();
            }
            current = self
                .parent_container(&current)
                .ok_or_else(|| self.outside(&current))?;
        };
        self.log.debug(format!(
            "Publishing from {} via sibling '{}'",
            current.display(),
            sibling
        ));

        self.publish_sibling(&PublishRequest {
            sibling,
            container: Some(current.clone()),
            recursive: true,
            ..request.clone()
        })?;
        let message = request.message.as_deref().unwrap_or("Publish subtree");
        self.engine.save(&current, Some(message), true)?;
        Ok(current)
    }

    /// Create or reconfigure the sibling of a container, point the parent's
    /// subdataset records at the published repositories, and push.
    pub fn publish_sibling(&self, request: &PublishRequest) -> Result<()> {
        let root = self.root().to_path_buf();
        let target = request.container.clone().unwrap_or_else(|| root.clone());
        self.require_installed(&target)?;
        let key = relative_key(&root, &target).map_err(|_| self.outside(&target))?;

        let base = request
            .repo_name
            .clone()
            .or_else(|| self.config.remote.repo.clone())
            .ok_or_else(|| Error::ConfigurationMissing {
                field: "GIN_repo".to_string(),
            })?;
        let repo_name = sibling_repo_name(&base, &key);
        let name = request.sibling.as_str();

        self.engine.create_sibling(
            &target,
            &SiblingRequest {
                repo_name: repo_name.clone(),
                name: name.to_string(),
                access_protocol: request.access_protocol,
                credential: request.credential.clone(),
                private: request.private,
                existing: request.existing,
                recursive: request.recursive,
            },
        )?;

        for sibling in self.engine.query_siblings(&target, Some(name), request.recursive)? {
            if sibling.path == root {
                continue;
            }
            let Some(parent) = self.parent_container(&sibling.path) else {
                tracing::warn!(path = %sibling.path.display(), "No parent container to record the sibling URL in");
                continue;
            };
            let https_url = https_form(&sibling.url);
            self.engine
                .set_subdataset_urls(&parent, &sibling.path, &https_url, &sibling.url)?;
        }

        self.engine
            .save(&target, Some("GIN publishing"), request.recursive)?;
        self.engine
            .push(&target, name, request.recursive, DataPolicy::Anything)?;

        if key != SELF_KEY
            && let Some(parent) = self.parent_container(&target)
        {
            if self.engine.query_siblings(&parent, Some(name), false)?.is_empty() {
                self.log.warn(format!(
                    "Parent {} has no sibling '{}', its subdataset record is not pushed",
                    parent.display(),
                    name
                ));
            } else {
                self.engine.save(&parent, Some("GIN publishing"), false)?;
                self.engine.push(&parent, name, false, DataPolicy::Nothing)?;
            }
        }

        self.log.info(format!(
            "Reset sibling '{}' at repository '{}' and pushed (recursive={})",
            name, repo_name, request.recursive
        ));
        Ok(())
    }

    /// Merge changes from a sibling (the default one when unset) and record
    /// the result.
    pub fn pull_from_remotes(&self, container: &Path, recursive: bool, sibling: Option<&str>) -> Result<()> {
        self.require_installed(container)?;
        self.engine.update(container, sibling, recursive)?;
        self.engine
            .save(container, Some("updated from remote"), recursive)?;
        self.log.info(format!("Updated {} from remote", container.display()));
        Ok(())
    }

    /// Commit and push. A failed push is retried once on `gin`, else
    /// `origin`.
    pub fn push_to_remotes(
        &self,
        container: &Path,
        recursive: bool,
        message: Option<&str>,
        sibling: Option<&str>,
    ) -> Result<()> {
        self.require_installed(container)?;
        self.engine.save(container, message, recursive)?;

        let failure = match sibling {
            Some(name) => match self
                .engine
                .push(container, name, recursive, DataPolicy::Anything)
            {
                Ok(()) => {
                    self.log.info(format!("Pushed {} to '{}'", container.display(), name));
                    return Ok(());
                }
                Err(e) => Some((name, e)),
            },
            None => None,
        };

        let names: Vec<String> = self
            .engine
            .query_siblings(container, None, false)?
            .into_iter()
            .map(|s| s.name)
            .collect();
        let fallback = FALLBACK_SIBLINGS
            .into_iter()
            .find(|candidate| names.iter().any(|n| n == candidate) && Some(*candidate) != sibling);

        match (fallback, failure) {
            (Some(fallback), failure) => {
                if let Some((name, e)) = &failure {
                    self.log
                        .warn(format!("Push to '{}' failed ({}), retrying on '{}'", name, e, fallback));
                }
                self.engine
                    .push(container, fallback, recursive, DataPolicy::Anything)?;
                self.log
                    .info(format!("Pushed {} to '{}'", container.display(), fallback));
                Ok(())
            }
            (None, Some((name, e))) if names.iter().any(|n| n == name) => Err(e.into()),
            (None, _) => Err(Error::NoPublicationTarget {
                container: container.to_path_buf(),
            }),
        }
    }

    /// Remove the sibling `name` from a container.
    pub fn remove_siblings(&self, container: &Path, name: &str, recursive: bool) -> Result<()> {
        self.require_installed(container)?;
        self.engine.remove_sibling(container, name, recursive)?;
        self.log
            .info(format!("Removed sibling '{}' from {}", name, container.display()));
        Ok(())
    }

    /// Clone a published tree into the empty directory `dest` and install
    /// its subdatasets.
    pub fn clone_from_remote(
        &self,
        dest: &Path,
        url_root: Option<&str>,
        user: Option<&str>,
        repo: Option<&str>,
    ) -> Result<PathBuf> {
        let dest = std::path::absolute(expand_user(dest)).map_err(|e| Error::io(dest, e))?;
        fs::create_dir_all(&dest).map_err(|e| Error::io(&dest, e))?;
        let occupied = fs::read_dir(&dest)
            .map_err(|e| Error::io(&dest, e))?
            .next()
            .is_some();
        if occupied {
            return Err(Error::InvalidDestination {
                path: dest,
                reason: "destination must be empty".to_string(),
            });
        }

        let remote = &self.config.remote;
        let url_root = url_root
            .map(str::to_string)
            .or_else(|| remote.url.clone())
            .unwrap_or_else(|| DEFAULT_REMOTE_URL.to_string());
        let user = user
            .map(str::to_string)
            .or_else(|| remote.user.clone())
            .ok_or_else(|| Error::ConfigurationMissing {
                field: "GIN_user".to_string(),
            })?;
        let repo = repo
            .map(str::to_string)
            .or_else(|| remote.repo.clone())
            .ok_or_else(|| Error::ConfigurationMissing {
                field: "GIN_repo".to_string(),
            })?;

        let url = repository_url(&url_root, &user, &repo);
        self.engine.clone_dataset(&url, &dest)?;
        self.pull_from_remotes(&dest, true, None)?;
        self.log
            .info(format!("Cloned {} into {}", url, dest.display()));
        Ok(dest)
    }
}

/// URL of `user`'s repository `repo` below `url_root`.
pub fn repository_url(url_root: &str, user: &str, repo: &str) -> String {
    let separator = if url_root.ends_with('/') || url_root.ends_with(':') {
        ""
    } else {
        "/"
    };
    format!("{url_root}{separator}{user}/{repo}.git")
}

/// Browsable HTTPS form of a sibling URL.
fn https_form(url: &str) -> String {
    if url.starts_with("http") {
        url.strip_suffix(".git").unwrap_or(url).to_string()
    } else {
        ssh_to_https(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("git@gin.g-node.org:/", "git@gin.g-node.org:/alice/lab.git")]
    #[case("git@gin.g-node.org:", "git@gin.g-node.org:alice/lab.git")]
    #[case("https://gin.g-node.org", "https://gin.g-node.org/alice/lab.git")]
    #[case("/srv/hosts/", "/srv/hosts/alice/lab.git")]
    fn repository_urls(#[case] root: &str, #[case] expected: &str) {
        assert_eq!(repository_url(root, "alice", "lab"), expected);
    }

    #[rstest]
    #[case("https://gin.g-node.org/alice/lab.git", "https://gin.g-node.org/alice/lab")]
    #[case("https://gin.g-node.org/alice/lab.git.git", "https://gin.g-node.org/alice/lab.git")]
    #[case("https://gin.g-node.org/alice/lab", "https://gin.g-node.org/alice/lab")]
    fn https_forms(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(https_form(url), expected);
    }

    #[test]
    fn publish_defaults() {
        let request = PublishRequest::default();
        assert_eq!(request.sibling, "gin");
        assert_eq!(request.access_protocol, AccessProtocol::Ssh);
        assert_eq!(request.existing, ExistingPolicy::Skip);
        assert!(request.recursive);
    }
}
