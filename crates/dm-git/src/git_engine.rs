//! Git-backed storage engine
//!
//! A container is a git repository whose `.datalad/config` carries a
//! `datalad.dataset.id`. Subdatasets are git submodules recorded in
//! `.gitmodules` plus a gitlink in the parent's index, and siblings are git
//! remotes. File content always lives in git history, so there is no
//! separate content to get or drop.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use git2::build::RepoBuilder;
use git2::{
    Config, FetchOptions, IndexAddOption, Oid, Repository, RepositoryInitOptions, Signature,
    Status, StatusOptions,
};
use uuid::Uuid;

use dm_fs::{DmPath, SELF_KEY, is_container_dir, relative_key};

use crate::engine::{
    AccessProtocol, CreateOptions, DataPolicy, EntryState, ExistingPolicy, Removal, Sibling,
    SiblingRequest, StatusEntry, StorageEngine, Subdataset,
};
use crate::host::RepositoryHost;
use crate::naming::sibling_repo_name;
use crate::{DEFAULT_BRANCH, Error, Result, helpers, submodules};

/// Config key holding the container id in `.datalad/config`.
pub const DATASET_ID_KEY: &str = "datalad.dataset.id";

const DEFAULT_SAVE_MESSAGE: &str = "[DATALAD] Recorded changes";

/// `.gitattributes` rule keeping text files in git (the `text2git` profile).
const TEXT2GIT_RULE: &str = "* annex.largefiles=((mimeencoding=binary)and(largerthan=0))";

/// Author of every commit the engine makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Name of the environment variable holding the token of `credential`.
pub fn credential_token_var(credential: &str) -> String {
    let name: String = credential
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("DATALAD_CREDENTIAL_{name}_TOKEN")
}

/// Storage engine on top of libgit2.
pub struct GitEngine {
    identity: Identity,
    host: Option<Box<dyn RepositoryHost>>,
    env: HashMap<String, String>,
}

impl GitEngine {
    /// Create an engine committing as `identity`, without a repository host.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            host: None,
            env: HashMap::new(),
        }
    }

    /// Use `host` for sibling creation.
    pub fn with_host(mut self, host: Box<dyn RepositoryHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Environment consulted for credential tokens.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    fn signature(&self) -> Result<Signature<'static>> {
        Ok(Signature::now(&self.identity.name, &self.identity.email)?)
    }

    fn token_for(&self, repo: &Repository, remote: &str) -> Option<String> {
        let credential = repo
            .config()
            .ok()?
            .get_string(&format!("remote.{remote}.dm-credential"))
            .ok()?;
        self.env.get(&credential_token_var(&credential)).cloned()
    }

    fn read_id(path: &Path) -> Option<String> {
        let config_path = path.join(DmPath::DataladConfig);
        if !config_path.is_file() {
            return None;
        }
        Config::open(&config_path).ok()?.get_string(DATASET_ID_KEY).ok()
    }

    /// The innermost installed container holding `path`, and the key of
    /// `path` in it (`None` for the container itself).
    fn enclosing_container(&self, path: &Path) -> Result<(PathBuf, Option<String>)> {
        let mut current = path;
        loop {
            if self.is_installed(current) {
                let key = relative_key(current, path)?;
                let scope = (key != SELF_KEY).then_some(key);
                return Ok((current.to_path_buf(), scope));
            }
            current = current.parent().ok_or_else(|| Error::NotInstalled {
                path: path.to_path_buf(),
            })?;
        }
    }

    fn has_remote(&self, container: &Path, name: &str) -> bool {
        helpers::open(container)
            .map(|repo| repo.find_remote(name).is_ok())
            .unwrap_or(false)
    }

    fn head_id(&self, container: &Path) -> Result<Option<Oid>> {
        let repo = helpers::open(container)?;
        Ok(helpers::head_commit(&repo)?.map(|c| c.id()))
    }

    /// `origin` when present, else the first remote.
    fn default_remote(repo: &Repository) -> Result<Option<String>> {
        let names: Vec<String> = repo.remotes()?.iter().flatten().map(String::from).collect();
        if names.iter().any(|n| n == "origin") {
            return Ok(Some("origin".to_string()));
        }
        Ok(names.into_iter().next())
    }

    fn apply_profile(path: &Path, profile: &str) -> Result<Vec<PathBuf>> {
        match profile {
            "text2git" => {
                let attributes = path.join(".gitattributes");
                let existing = fs::read_to_string(&attributes).unwrap_or_default();
                if !existing.lines().any(|l| l == TEXT2GIT_RULE) {
                    let mut content = existing;
                    if !content.is_empty() && !content.ends_with('\n') {
                        content.push('\n');
                    }
                    content.push_str(TEXT2GIT_RULE);
                    content.push('\n');
                    fs::write(&attributes, content).map_err(|e| Error::io(&attributes, e))?;
                }
                Ok(vec![PathBuf::from(".gitattributes")])
            }
            "default" => Ok(Vec::new()),
            other => Err(Error::UnknownProfile {
                name: other.to_string(),
            }),
        }
    }

    /// Source to install a missing subdataset from.
    fn subdataset_source(parent_repo: &Repository, sub: &Subdataset) -> Option<String> {
        let candidates = [sub.engine_url.as_deref(), sub.url.as_deref()];
        if let Some(url) = candidates.iter().flatten().find(|u| !u.starts_with("./")) {
            return Some(url.to_string());
        }

        // relative records resolve against the parent's own remote
        let relative = candidates.iter().flatten().next()?;
        let remote_name = Self::default_remote(parent_repo).ok()??;
        let remote = parent_repo.find_remote(&remote_name).ok()?;
        let base = remote.url()?.trim_end_matches('/').to_string();
        Some(format!("{}/{}", base, relative.trim_start_matches("./")))
    }

    fn install_subdataset(&self, source: &str, sub: &Subdataset) -> Result<()> {
        if sub.path.is_dir() && is_empty_dir(&sub.path)? {
            fs::remove_dir(&sub.path).map_err(|e| Error::io(&sub.path, e))?;
        }
        tracing::debug!(path = %sub.path.display(), source, "Installing subdataset");
        self.clone_dataset(source, &sub.path)
    }

    fn unregister(&self, parent: &Path, key: &str) -> Result<()> {
        submodules::forget(parent, key)?;
        let repo = helpers::open(parent)?;
        let mut index = repo.index()?;
        // the entry may never have been staged
        let _ = index.remove_path(Path::new(key));
        if parent.join(DmPath::Gitmodules).is_file() {
            index.add_path(Path::new(DmPath::Gitmodules.as_str()))?;
        }
        index.write()?;
        Ok(())
    }

    fn check_safe_to_remove(&self, container: &Path, recursive: bool) -> Result<()> {
        if !self.status(container, recursive)?.is_empty() {
            return Err(Error::UnsavedChanges {
                path: container.to_path_buf(),
            });
        }
        let repo = helpers::open(container)?;
        if !helpers::head_is_published(&repo)? {
            return Err(Error::NotAvailableElsewhere {
                path: container.to_path_buf(),
            });
        }
        if recursive {
            for sub in self.subdatasets(container)? {
                if sub.installed {
                    self.check_safe_to_remove(&sub.path, true)?;
                }
            }
        }
        Ok(())
    }

    fn create_sibling_at(
        &self,
        container: &Path,
        repo_name: &str,
        request: &SiblingRequest,
    ) -> Result<()> {
        let repo = helpers::open(container)?;
        let exists = repo.find_remote(&request.name).is_ok();

        match (exists, request.existing) {
            (true, ExistingPolicy::Skip) => {
                tracing::debug!(sibling = %request.name, path = %container.display(), "Sibling exists, skipping");
                return Ok(());
            }
            (true, ExistingPolicy::Error) => {
                return Err(Error::SiblingExists {
                    name: request.name.clone(),
                    path: container.to_path_buf(),
                });
            }
            _ => {}
        }

        let host = self.host.as_ref().ok_or_else(|| Error::NoHost {
            name: request.name.clone(),
        })?;
        let hosted = host.ensure_repository(
            repo_name,
            request.private,
            request.existing == ExistingPolicy::Replace,
        )?;

        let (url, push_url) = match request.access_protocol {
            AccessProtocol::Ssh => (hosted.ssh_url, None),
            AccessProtocol::Https => (hosted.https_url, None),
            AccessProtocol::HttpsSsh => (hosted.https_url, Some(hosted.ssh_url)),
        };

        let had_push_url = if exists {
            repo.remote_set_url(&request.name, &url)?;
            repo.find_remote(&request.name)?.pushurl_bytes().is_some()
        } else {
            repo.remote(&request.name, &url)?;
            false
        };
        // Clearing a pushurl that was never set is an error in libgit2.
        if push_url.is_some() || had_push_url {
            repo.remote_set_pushurl(&request.name, push_url.as_deref())?;
        }

        if let Some(credential) = &request.credential {
            repo.config()?
                .set_str(&format!("remote.{}.dm-credential", request.name), credential)?;
        }

        tracing::debug!(
            sibling = %request.name,
            repository = %repo_name,
            url = %url,
            path = %container.display(),
            "Configured sibling"
        );
        Ok(())
    }
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| Error::io(path, e))?;
    Ok(entries.next().is_none())
}

/// Whether `key` lies at or below `scope`. No scope covers everything.
fn in_scope(key: &str, scope: Option<&str>) -> bool {
    scope.is_none_or(|s| key == s || key.starts_with(&format!("{s}/")))
}

/// Whether `rel` is, or lies inside, a container nested in `root`.
fn inside_nested_container(root: &Path, rel: &str) -> bool {
    let mut current = root.to_path_buf();
    for segment in rel.split('/').filter(|s| !s.is_empty()) {
        current.push(segment);
        if is_container_dir(&current) {
            return true;
        }
    }
    false
}

fn entry_state(status: Status) -> Option<EntryState> {
    let state = if status.is_conflicted() {
        EntryState::Conflicted
    } else if status.is_index_new() {
        EntryState::Added
    } else if status.is_wt_new() {
        EntryState::Untracked
    } else if status.is_index_deleted() || status.is_wt_deleted() {
        EntryState::Deleted
    } else if status.is_index_renamed() || status.is_wt_renamed() {
        EntryState::Renamed
    } else if status.is_index_typechange() || status.is_wt_typechange() {
        EntryState::TypeChanged
    } else if status.is_index_modified() || status.is_wt_modified() {
        EntryState::Modified
    } else {
        return None;
    };
    Some(state)
}

impl StorageEngine for GitEngine {
    fn is_installed(&self, path: &Path) -> bool {
        path.join(DmPath::GitDir).exists() && Self::read_id(path).is_some()
    }

    fn create(&self, path: &Path, parent: Option<&Path>, options: &CreateOptions) -> Result<()> {
        if self.is_installed(path) {
            return Err(Error::AlreadyInstalled {
                path: path.to_path_buf(),
            });
        }
        if path.is_dir() && !options.force && !is_empty_dir(path)? {
            return Err(Error::NotEmpty {
                path: path.to_path_buf(),
            });
        }
        fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;

        let mut init = RepositoryInitOptions::new();
        init.initial_head(DEFAULT_BRANCH);
        let repo = Repository::init_opts(path, &init)?;

        let datalad_dir = path.join(DmPath::DataladDir);
        fs::create_dir_all(&datalad_dir).map_err(|e| Error::io(&datalad_dir, e))?;
        let config_path = path.join(DmPath::DataladConfig);
        if !config_path.exists() {
            fs::write(&config_path, "").map_err(|e| Error::io(&config_path, e))?;
        }
        let id = Uuid::new_v4().to_string();
        Config::open(&config_path)?.set_str(DATASET_ID_KEY, &id)?;

        // Only the engine's own files go into the first commit, pre-existing
        // content stays untracked until the next save
        let mut staged = vec![PathBuf::from(DmPath::DataladConfig.as_str())];
        if let Some(profile) = &options.profile {
            staged.extend(Self::apply_profile(path, profile)?);
        }
        let mut index = repo.index()?;
        for file in &staged {
            index.add_path(file)?;
        }
        helpers::commit_index(&repo, &mut index, "[DATALAD] new dataset", &self.signature()?)?;
        tracing::debug!(path = %path.display(), id = %id, "Created container");

        if let Some(parent) = parent {
            self.register_subdataset(parent, path)?;
        }
        Ok(())
    }

    fn save(&self, path: &Path, message: Option<&str>, recursive: bool) -> Result<()> {
        let (container, scope) = self.enclosing_container(path)?;
        let scope = scope.as_deref();
        let subs = self.subdatasets(&container)?;

        if recursive {
            for sub in subs.iter().filter(|s| s.installed && in_scope(&s.key, scope)) {
                self.save(&sub.path, message, true)?;
            }
        }

        let repo = helpers::open(&container)?;
        let mut index = repo.index()?;
        let registered: Vec<&str> = subs.iter().map(|s| s.key.as_str()).collect();

        let mut skip_nested = |p: &Path, _: &[u8]| -> i32 {
            let rel = p.to_string_lossy().replace('\\', "/");
            let rel = rel.trim_end_matches('/');
            if registered.iter().any(|k| in_scope(rel, Some(k)))
                || inside_nested_container(&container, rel)
            {
                1
            } else {
                0
            }
        };
        let pathspec = [scope.unwrap_or("*")];
        index.add_all(
            pathspec.iter(),
            IndexAddOption::DEFAULT,
            Some(&mut skip_nested as &mut git2::IndexMatchedPath<'_>),
        )?;
        index.update_all(
            pathspec.iter(),
            Some(&mut skip_nested as &mut git2::IndexMatchedPath<'_>),
        )?;

        for sub in subs.iter().filter(|s| s.installed && in_scope(&s.key, scope)) {
            if let Some(head) = self.head_id(&sub.path)? {
                index.add(&helpers::gitlink_entry(&sub.key, head))?;
            }
        }

        let message = message.unwrap_or(DEFAULT_SAVE_MESSAGE);
        helpers::commit_index(&repo, &mut index, message, &self.signature()?)?;
        Ok(())
    }

    fn clone_dataset(&self, source: &str, dest: &Path) -> Result<()> {
        if dest.is_dir() && !is_empty_dir(dest)? {
            return Err(Error::NotEmpty {
                path: dest.to_path_buf(),
            });
        }

        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(helpers::remote_callbacks(None));
        RepoBuilder::new().fetch_options(fetch).clone(source, dest)?;

        if !self.is_installed(dest) {
            tracing::warn!(source, path = %dest.display(), "Cloned repository carries no dataset id");
        }
        Ok(())
    }

    fn push(&self, container: &Path, to: &str, recursive: bool, data: DataPolicy) -> Result<()> {
        if recursive {
            for sub in self.subdatasets(container)? {
                if !sub.installed {
                    continue;
                }
                if self.has_remote(&sub.path, to) {
                    self.push(&sub.path, to, true, data)?;
                } else {
                    tracing::debug!(path = %sub.path.display(), sibling = to, "Subdataset has no such sibling, skipping");
                }
            }
        }

        let repo = helpers::open(container)?;
        if helpers::head_commit(&repo)?.is_none() {
            tracing::debug!(path = %container.display(), "Nothing to push");
            return Ok(());
        }
        // all content lives in history, so every policy pushes the same refs
        tracing::debug!(path = %container.display(), sibling = to, data = ?data, "Pushing");
        let branch = helpers::current_branch(&repo)?;
        helpers::push(&repo, to, &branch, self.token_for(&repo, to))
    }

    fn update(&self, container: &Path, sibling: Option<&str>, recursive: bool) -> Result<()> {
        let repo = helpers::open(container)?;
        let remote = match sibling {
            Some(name) if repo.find_remote(name).is_ok() => Some(name.to_string()),
            Some(name) => {
                return Err(Error::RemoteNotFound {
                    name: name.to_string(),
                });
            }
            None => Self::default_remote(&repo)?,
        };

        match remote {
            Some(remote) => {
                let branch = helpers::current_branch(&repo)?;
                helpers::pull(
                    &repo,
                    &remote,
                    &branch,
                    self.token_for(&repo, &remote),
                    &self.signature()?,
                )?;
            }
            None => tracing::debug!(path = %container.display(), "No sibling to update from"),
        }

        if recursive {
            for sub in self.subdatasets(container)? {
                if !sub.installed {
                    match Self::subdataset_source(&repo, &sub) {
                        Some(source) => self.install_subdataset(&source, &sub)?,
                        None => {
                            tracing::warn!(path = %sub.path.display(), "No source known for subdataset");
                            continue;
                        }
                    }
                }
                let sub_sibling = sibling.filter(|s| self.has_remote(&sub.path, s));
                self.update(&sub.path, sub_sibling, true)?;
            }
        }
        Ok(())
    }

    fn get_content(&self, container: &Path, path: Option<&Path>, recursive: bool) -> Result<()> {
        let scope = match path {
            Some(p) => {
                let target = if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    container.join(p)
                };
                if !target.exists() {
                    return Err(Error::PathNotFound { path: target });
                }
                Some(relative_key(container, &target)?).filter(|k| k != SELF_KEY)
            }
            None => None,
        };

        let repo = helpers::open(container)?;
        for sub in self.subdatasets(container)? {
            // a subdataset is needed when it lies in the requested scope or contains it
            let needed = in_scope(&sub.key, scope.as_deref())
                || scope.as_deref().is_some_and(|s| in_scope(s, Some(&sub.key)));
            if !needed {
                continue;
            }
            if !sub.installed {
                match Self::subdataset_source(&repo, &sub) {
                    Some(source) => self.install_subdataset(&source, &sub)?,
                    None => {
                        tracing::warn!(path = %sub.path.display(), "No source known for subdataset");
                        continue;
                    }
                }
            }
            if recursive {
                self.get_content(&sub.path, None, true)?;
            }
        }
        Ok(())
    }

    fn drop_content(&self, _container: &Path, _path: Option<&Path>, _recursive: bool) -> Result<()> {
        Err(Error::Unsupported {
            operation: "drop".to_string(),
            engine: "git".to_string(),
            hint: "Content is stored in git history; use remove to delete files.".to_string(),
        })
    }

    fn remove(&self, container: &Path, path: Option<&Path>, recursive: bool, removal: Removal) -> Result<()> {
        let target = match path {
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => container.join(p),
            None => container.to_path_buf(),
        };
        if fs::symlink_metadata(&target).is_err() {
            return Err(Error::PathNotFound { path: target });
        }

        if self.is_installed(&target) {
            let subs = self.subdatasets(&target)?;
            if !subs.is_empty() && !recursive {
                return Err(Error::HasSubdatasets { path: target });
            }
            if removal == Removal::Safe {
                self.check_safe_to_remove(&target, recursive)?;
            }

            let parent = target
                .parent()
                .and_then(|dir| self.enclosing_container(dir).ok());
            fs::remove_dir_all(&target).map_err(|e| Error::io(&target, e))?;

            if let Some((parent, _)) = parent {
                let key = relative_key(&parent, &target)?;
                self.unregister(&parent, &key)?;
                let repo = helpers::open(&parent)?;
                let mut index = repo.index()?;
                helpers::commit_index(
                    &repo,
                    &mut index,
                    &format!("[DATALAD] removed {key}"),
                    &self.signature()?,
                )?;
            }
            tracing::debug!(path = %target.display(), "Removed container");
            return Ok(());
        }

        let (owner, scope) = self.enclosing_container(&target)?;
        let Some(key) = scope else {
            return Err(Error::NotInstalled { path: target });
        };

        let nested: Vec<Subdataset> = self
            .subdatasets(&owner)?
            .into_iter()
            .filter(|s| in_scope(&s.key, Some(&key)))
            .collect();
        if !nested.is_empty() && !recursive {
            return Err(Error::HasSubdatasets { path: target });
        }
        for sub in &nested {
            if sub.installed {
                self.remove(&sub.path, None, true, removal)?;
            }
        }

        if removal == Removal::Safe {
            let dirty = self
                .status(&owner, false)?
                .into_iter()
                .any(|entry| entry.path.starts_with(&target));
            if dirty {
                return Err(Error::UnsavedChanges { path: target });
            }
        }

        if target.is_dir() {
            fs::remove_dir_all(&target).map_err(|e| Error::io(&target, e))?;
        } else {
            fs::remove_file(&target).map_err(|e| Error::io(&target, e))?;
        }

        let repo = helpers::open(&owner)?;
        let mut index = repo.index()?;
        index.remove_all([key.as_str()].iter(), None)?;
        helpers::commit_index(
            &repo,
            &mut index,
            &format!("[DATALAD] removed {key}"),
            &self.signature()?,
        )?;
        tracing::debug!(path = %target.display(), "Removed path");
        Ok(())
    }

    fn register_subdataset(&self, parent: &Path, child: &Path) -> Result<()> {
        if !self.is_installed(parent) {
            return Err(Error::NotInstalled {
                path: parent.to_path_buf(),
            });
        }
        let key = relative_key(parent, child)?;
        if key == SELF_KEY {
            return Err(Error::SelfRegistration {
                path: child.to_path_buf(),
            });
        }
        let id = self.id(child)?;
        let head = Oid::from_str(&self.version(child)?)?;

        submodules::record(parent, &key, &id)?;

        let repo = helpers::open(parent)?;
        let mut index = repo.index()?;
        index.add_path(Path::new(DmPath::Gitmodules.as_str()))?;
        index.add(&helpers::gitlink_entry(&key, head))?;
        // unchanged registrations produce no commit
        helpers::commit_index(
            &repo,
            &mut index,
            &format!("[DATALAD] Added subdataset {key}"),
            &self.signature()?,
        )?;
        Ok(())
    }

    fn is_registered(&self, parent: &Path, child: &Path) -> Result<bool> {
        let key = relative_key(parent, child)?;
        Ok(self.subdatasets(parent)?.iter().any(|s| s.key == key))
    }

    fn subdatasets(&self, container: &Path) -> Result<Vec<Subdataset>> {
        let repo = helpers::open(container)?;
        let mut found = Vec::new();
        for module in repo.submodules()? {
            let key = module.path().to_string_lossy().replace('\\', "/");
            let name = module.name().unwrap_or(&key).to_string();
            let path = container.join(&key);
            found.push(Subdataset {
                installed: self.is_installed(&path),
                engine_url: submodules::engine_url(container, &name)?,
                url: module.url().map(str::to_string),
                path,
                key,
            });
        }
        found.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(found)
    }

    fn set_subdataset_urls(&self, parent: &Path, child: &Path, url: &str, engine_url: &str) -> Result<()> {
        if !self.is_registered(parent, child)? {
            return Err(Error::NotRegistered {
                parent: parent.to_path_buf(),
                child: child.to_path_buf(),
            });
        }
        let key = relative_key(parent, child)?;
        submodules::set_urls(parent, &key, url, engine_url)?;

        let repo = helpers::open(parent)?;
        let mut index = repo.index()?;
        index.add_path(Path::new(DmPath::Gitmodules.as_str()))?;
        index.write()?;
        Ok(())
    }

    fn query_siblings(&self, container: &Path, name: Option<&str>, recursive: bool) -> Result<Vec<Sibling>> {
        let repo = helpers::open(container)?;
        let mut siblings = Vec::new();
        for remote_name in repo.remotes()?.iter().flatten() {
            if name.is_some_and(|n| n != remote_name) {
                continue;
            }
            let remote = repo.find_remote(remote_name)?;
            siblings.push(Sibling {
                name: remote_name.to_string(),
                url: remote.url().unwrap_or_default().to_string(),
                path: container.to_path_buf(),
            });
        }

        if recursive {
            for sub in self.subdatasets(container)? {
                if sub.installed {
                    siblings.extend(self.query_siblings(&sub.path, name, true)?);
                }
            }
        }
        Ok(siblings)
    }

    fn create_sibling(&self, container: &Path, request: &SiblingRequest) -> Result<()> {
        self.create_sibling_at(container, &request.repo_name, request)?;

        if request.recursive {
            for sub in self.subdatasets(container)? {
                if !sub.installed {
                    continue;
                }
                let nested = SiblingRequest {
                    repo_name: sibling_repo_name(&request.repo_name, &sub.key),
                    ..request.clone()
                };
                self.create_sibling(&sub.path, &nested)?;
            }
        }
        Ok(())
    }

    fn remove_sibling(&self, container: &Path, name: &str, recursive: bool) -> Result<()> {
        let repo = helpers::open(container)?;
        if repo.find_remote(name).is_ok() {
            repo.remote_delete(name)?;
            tracing::debug!(sibling = name, path = %container.display(), "Removed sibling");
        }
        if recursive {
            for sub in self.subdatasets(container)? {
                if sub.installed {
                    self.remove_sibling(&sub.path, name, true)?;
                }
            }
        }
        Ok(())
    }

    fn id(&self, container: &Path) -> Result<String> {
        Self::read_id(container).ok_or_else(|| Error::NotInstalled {
            path: container.to_path_buf(),
        })
    }

    fn version(&self, container: &Path) -> Result<String> {
        let repo = helpers::open(container)?;
        if let Some(commit) = helpers::head_commit(&repo)? {
            return Ok(commit.id().to_string());
        }

        let ignore = container.join(".gitignore");
        if !ignore.exists() {
            fs::write(&ignore, "").map_err(|e| Error::io(&ignore, e))?;
        }
        let mut index = repo.index()?;
        index.add_path(Path::new(".gitignore"))?;
        helpers::commit_index(&repo, &mut index, "Initial commit (auto)", &self.signature()?)?;

        helpers::head_commit(&repo)?
            .map(|c| c.id().to_string())
            .ok_or_else(|| Error::Engine {
                message: format!("no commit recorded in {}", container.display()),
            })
    }

    fn status(&self, container: &Path, recursive: bool) -> Result<Vec<StatusEntry>> {
        let repo = helpers::open(container)?;
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .exclude_submodules(true);

        let mut entries = Vec::new();
        for entry in repo.statuses(Some(&mut opts))?.iter() {
            let Some(rel) = entry.path() else {
                continue;
            };
            if let Some(state) = entry_state(entry.status()) {
                entries.push(StatusEntry {
                    path: container.join(rel.trim_end_matches('/')),
                    state,
                });
            }
        }

        if recursive {
            for sub in self.subdatasets(container)? {
                if sub.installed {
                    entries.extend(self.status(&sub.path, true)?);
                }
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_var_is_upper_snake() {
        assert_eq!(credential_token_var("gin"), "DATALAD_CREDENTIAL_GIN_TOKEN");
        assert_eq!(credential_token_var("my-host.org"), "DATALAD_CREDENTIAL_MY_HOST_ORG_TOKEN");
    }

    #[test]
    fn scope_matching() {
        assert!(in_scope("raw/a", None));
        assert!(in_scope("raw/a", Some("raw")));
        assert!(in_scope("raw", Some("raw")));
        assert!(!in_scope("rawdata", Some("raw")));
    }

    #[test]
    fn unchanged_status_has_no_state() {
        assert_eq!(entry_state(Status::CURRENT), None);
        assert_eq!(entry_state(Status::WT_NEW), Some(EntryState::Untracked));
        assert_eq!(entry_state(Status::INDEX_MODIFIED), Some(EntryState::Modified));
    }
}
