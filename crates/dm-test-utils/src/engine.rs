//! [`FakeEngine`]: an in-memory [`StorageEngine`] for fast tests.
//!
//! Realism level: **FAKE**. Containers are real directories carrying a
//! `.datalad/config` marker so filesystem layout detection works, but
//! history, siblings and publication live in memory. Every call is logged
//! and any operation can be made to fail.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use dm_fs::{DmPath, SELF_KEY, relative_key};
use dm_git::{
    AccessProtocol, CreateOptions, DataPolicy, EntryState, Error, ExistingPolicy, Removal, Result,
    Sibling, SiblingRequest, StatusEntry, StorageEngine, Subdataset, sibling_repo_name,
};

/// Host name used in sibling URLs.
pub const FAKE_HOST: &str = "fake.host";

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: String,
    pub path: PathBuf,
    /// Operation-specific detail: message, sibling name, URL or child path.
    pub arg: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct SubRecord {
    url: Option<String>,
    engine_url: Option<String>,
}

#[derive(Debug, Clone)]
struct Container {
    id: String,
    version: u64,
    commits: Vec<String>,
    subdatasets: BTreeMap<String, SubRecord>,
    siblings: BTreeMap<String, String>,
    unsaved: bool,
}

impl Container {
    fn new(id: String) -> Self {
        Self {
            id,
            version: 0,
            commits: Vec::new(),
            subdatasets: BTreeMap::new(),
            siblings: BTreeMap::new(),
            unsaved: false,
        }
    }
}

/// What a push left at a sibling URL.
#[derive(Debug, Clone)]
struct Published {
    id: String,
    subdatasets: BTreeMap<String, SubRecord>,
}

#[derive(Debug, Default)]
struct State {
    containers: HashMap<PathBuf, Container>,
    published: HashMap<String, Published>,
    calls: Vec<Call>,
    failures: Vec<(String, Option<String>, String)>,
    status: HashMap<PathBuf, Vec<StatusEntry>>,
}

/// An in-memory storage engine.
#[derive(Debug)]
pub struct FakeEngine {
    state: Mutex<State>,
    user: String,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::default(),
            user: "tester".to_string(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every call to `op` fail. With `arg`, only calls whose detail
    /// equals it fail.
    pub fn fail(&self, op: &str, arg: Option<&str>, message: &str) {
        self.state().failures.push((
            op.to_string(),
            arg.map(str::to_string),
            message.to_string(),
        ));
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Calls to `op`, in order.
    pub fn calls_of(&self, op: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.op == op).collect()
    }

    /// Forget the call log.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Commit messages of `container`, oldest first.
    pub fn commits(&self, container: &Path) -> Vec<String> {
        self.state()
            .containers
            .get(container)
            .map(|c| c.commits.clone())
            .unwrap_or_default()
    }

    /// Mark `container` as holding unsaved changes.
    pub fn mark_unsaved(&self, container: &Path) {
        if let Some(c) = self.state().containers.get_mut(container) {
            c.unsaved = true;
        }
    }

    /// Report `entries` from the next status queries of `container`.
    pub fn set_status(&self, container: &Path, entries: Vec<StatusEntry>) {
        self.state().status.insert(container.to_path_buf(), entries);
    }

    /// Add a sibling without going through a host.
    pub fn add_sibling(&self, container: &Path, name: &str, url: &str) {
        if let Some(c) = self.state().containers.get_mut(container) {
            c.siblings.insert(name.to_string(), url.to_string());
        }
    }

    /// Whether something was pushed to `url`.
    pub fn is_published(&self, url: &str) -> bool {
        self.state().published.contains_key(url)
    }

    /// Log a call and fail it when a matching failure was injected.
    fn record(&self, op: &str, path: &Path, arg: Option<&str>) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call {
            op: op.to_string(),
            path: path.to_path_buf(),
            arg: arg.map(str::to_string),
        });
        let failure = state.failures.iter().find(|(fop, farg, _)| {
            fop == op && farg.as_deref().is_none_or(|a| Some(a) == arg)
        });
        match failure {
            Some((_, _, message)) => Err(Error::Engine {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn not_installed(path: &Path) -> Error {
        Error::NotInstalled {
            path: path.to_path_buf(),
        }
    }

    /// The innermost container holding `path`.
    fn enclosing(&self, path: &Path) -> Result<PathBuf> {
        let state = self.state();
        path.ancestors()
            .find(|p| state.containers.contains_key(*p))
            .map(Path::to_path_buf)
            .ok_or_else(|| Self::not_installed(path))
    }

    fn with_container<T>(&self, path: &Path, f: impl FnOnce(&mut Container) -> T) -> Result<T> {
        let mut state = self.state();
        let container = state
            .containers
            .get_mut(path)
            .ok_or_else(|| Self::not_installed(path))?;
        Ok(f(container))
    }

    fn installed_subdatasets(&self, container: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .subdatasets(container)?
            .into_iter()
            .filter(|s| s.installed)
            .map(|s| s.path)
            .collect())
    }

    fn commit(&self, container: &Path, message: &str) -> Result<()> {
        self.with_container(container, |c| {
            c.version += 1;
            c.commits.push(message.to_string());
            c.unsaved = false;
        })
    }

    fn write_marker(path: &Path, id: &str) -> Result<()> {
        let dir = path.join(DmPath::DataladDir);
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        let config = path.join(DmPath::DataladConfig);
        fs::write(&config, format!("[datalad \"dataset\"]\n\tid = {id}\n"))
            .map_err(|e| Error::io(&config, e))
    }

    fn urls(&self, repo_name: &str) -> (String, String) {
        (
            format!("git@{FAKE_HOST}:{}/{repo_name}.git", self.user),
            format!("https://{FAKE_HOST}/{}/{repo_name}", self.user),
        )
    }

    fn install_clone(&self, source: &str, dest: &Path) -> Result<()> {
        let published = self
            .state()
            .published
            .get(source)
            .cloned()
            .ok_or_else(|| Error::Engine {
                message: format!("nothing published at {source}"),
            })?;
        Self::write_marker(dest, &published.id)?;

        let mut container = Container::new(published.id);
        container.version = 1;
        container.commits.push("cloned".to_string());
        container.subdatasets = published.subdatasets;
        container
            .siblings
            .insert("origin".to_string(), source.to_string());
        self.state().containers.insert(dest.to_path_buf(), container);
        Ok(())
    }
}

impl StorageEngine for FakeEngine {
    fn is_installed(&self, path: &Path) -> bool {
        self.state().containers.contains_key(path)
    }

    fn create(&self, path: &Path, parent: Option<&Path>, options: &CreateOptions) -> Result<()> {
        self.record("create", path, options.profile.as_deref())?;
        if self.is_installed(path) && !options.force {
            return Err(Error::AlreadyInstalled {
                path: path.to_path_buf(),
            });
        }
        if let Some(parent) = parent
            && !self.is_installed(parent)
        {
            return Err(Self::not_installed(parent));
        }

        fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
        let id = uuid::Uuid::new_v4().to_string();
        Self::write_marker(path, &id)?;
        let mut container = Container::new(id);
        container.version = 1;
        container.commits.push("[DATALAD] new dataset".to_string());
        self.state().containers.insert(path.to_path_buf(), container);

        if let Some(parent) = parent {
            self.register_subdataset(parent, path)?;
        }
        Ok(())
    }

    fn save(&self, path: &Path, message: Option<&str>, recursive: bool) -> Result<()> {
        self.record("save", path, message)?;
        let container = self.enclosing(path)?;
        if recursive {
            for sub in self.installed_subdatasets(&container)? {
                if sub.starts_with(path) {
                    self.save(&sub, message, true)?;
                }
            }
        }
        self.commit(&container, message.unwrap_or("[DATALAD] Recorded changes"))
    }

    fn clone_dataset(&self, source: &str, dest: &Path) -> Result<()> {
        self.record("clone", dest, Some(source))?;
        if dest.is_dir()
            && fs::read_dir(dest)
                .map_err(|e| Error::io(dest, e))?
                .next()
                .is_some()
        {
            return Err(Error::NotEmpty {
                path: dest.to_path_buf(),
            });
        }
        self.install_clone(source, dest)
    }

    fn push(&self, container: &Path, to: &str, recursive: bool, data: DataPolicy) -> Result<()> {
        self.record("push", container, Some(to))?;
        if recursive {
            for sub in self.installed_subdatasets(container)? {
                if self.with_container(&sub, |c| c.siblings.contains_key(to))? {
                    self.push(&sub, to, true, data)?;
                }
            }
        }
        let (url, published) = self.with_container(container, |c| {
            (
                c.siblings.get(to).cloned(),
                Published {
                    id: c.id.clone(),
                    subdatasets: c.subdatasets.clone(),
                },
            )
        })?;
        let url = url.ok_or_else(|| Error::RemoteNotFound {
            name: to.to_string(),
        })?;
        let mut state = self.state();
        // register the https form too so clones by either URL resolve
        state
            .published
            .insert(dm_git::ssh_to_https(&url), published.clone());
        state.published.insert(url, published);
        Ok(())
    }

    fn update(&self, container: &Path, sibling: Option<&str>, recursive: bool) -> Result<()> {
        self.record("update", container, sibling)?;
        if let Some(name) = sibling
            && !self.with_container(container, |c| c.siblings.contains_key(name))?
        {
            return Err(Error::RemoteNotFound {
                name: name.to_string(),
            });
        }
        if recursive {
            for sub in self.subdatasets(container)? {
                if !sub.installed {
                    let Some(source) = sub.engine_url.clone().or(sub.url.clone()) else {
                        continue;
                    };
                    self.install_clone(&source, &sub.path)?;
                }
                self.update(&sub.path, None, true)?;
            }
        }
        Ok(())
    }

    fn get_content(&self, container: &Path, path: Option<&Path>, _recursive: bool) -> Result<()> {
        let arg = path.map(|p| p.to_string_lossy().into_owned());
        self.record("get", container, arg.as_deref())?;
        self.with_container(container, |_| ())
    }

    fn drop_content(&self, container: &Path, path: Option<&Path>, _recursive: bool) -> Result<()> {
        let arg = path.map(|p| p.to_string_lossy().into_owned());
        self.record("drop", container, arg.as_deref())?;
        self.with_container(container, |_| ())
    }

    fn remove(&self, container: &Path, path: Option<&Path>, recursive: bool, removal: Removal) -> Result<()> {
        let target = match path {
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => container.join(p),
            None => container.to_path_buf(),
        };
        self.record("remove", &target, None)?;
        if fs::symlink_metadata(&target).is_err() {
            return Err(Error::PathNotFound { path: target });
        }

        if self.is_installed(&target) {
            let unsaved = self.with_container(&target, |c| c.unsaved)?;
            if !self.subdatasets(&target)?.is_empty() && !recursive {
                return Err(Error::HasSubdatasets { path: target });
            }
            if removal == Removal::Safe && unsaved {
                return Err(Error::UnsavedChanges { path: target });
            }
            fs::remove_dir_all(&target).map_err(|e| Error::io(&target, e))?;

            let mut state = self.state();
            state.containers.retain(|p, _| !p.starts_with(&target));
            let owner = target
                .ancestors()
                .skip(1)
                .find(|p| state.containers.contains_key(*p))
                .map(Path::to_path_buf);
            if let Some(owner) = owner
                && let Ok(key) = relative_key(&owner, &target)
                && let Some(c) = state.containers.get_mut(&owner)
            {
                c.subdatasets.remove(&key);
                c.version += 1;
                c.commits.push(format!("[DATALAD] removed {key}"));
            }
            return Ok(());
        }

        if target.is_dir() {
            fs::remove_dir_all(&target).map_err(|e| Error::io(&target, e))?;
        } else {
            fs::remove_file(&target).map_err(|e| Error::io(&target, e))?;
        }
        self.commit(container, "[DATALAD] removed content")
    }

    fn register_subdataset(&self, parent: &Path, child: &Path) -> Result<()> {
        self.record("register", parent, Some(&child.to_string_lossy()))?;
        if !self.is_installed(child) {
            return Err(Self::not_installed(child));
        }
        let key = relative_key(parent, child)?;
        if key == SELF_KEY {
            return Err(Error::SelfRegistration {
                path: child.to_path_buf(),
            });
        }
        let added = self.with_container(parent, |c| {
            if c.subdatasets.contains_key(&key) {
                return false;
            }
            c.subdatasets.insert(
                key.clone(),
                SubRecord {
                    url: Some(format!("./{key}")),
                    engine_url: None,
                },
            );
            true
        })?;
        if added {
            self.commit(parent, &format!("[DATALAD] Added subdataset {key}"))?;
        }
        Ok(())
    }

    fn is_registered(&self, parent: &Path, child: &Path) -> Result<bool> {
        let key = relative_key(parent, child)?;
        self.with_container(parent, |c| c.subdatasets.contains_key(&key))
    }

    fn subdatasets(&self, container: &Path) -> Result<Vec<Subdataset>> {
        let records = self.with_container(container, |c| c.subdatasets.clone())?;
        Ok(records
            .into_iter()
            .map(|(key, record)| {
                let path = container.join(&key);
                Subdataset {
                    installed: self.is_installed(&path),
                    path,
                    key,
                    url: record.url,
                    engine_url: record.engine_url,
                }
            })
            .collect())
    }

    fn set_subdataset_urls(&self, parent: &Path, child: &Path, url: &str, engine_url: &str) -> Result<()> {
        self.record("set_urls", child, Some(url))?;
        let key = relative_key(parent, child)?;
        let found = self.with_container(parent, |c| match c.subdatasets.get_mut(&key) {
            Some(record) => {
                record.url = Some(url.to_string());
                record.engine_url = Some(engine_url.to_string());
                true
            }
            None => false,
        })?;
        if found {
            Ok(())
        } else {
            Err(Error::NotRegistered {
                parent: parent.to_path_buf(),
                child: child.to_path_buf(),
            })
        }
    }

    fn query_siblings(&self, container: &Path, name: Option<&str>, recursive: bool) -> Result<Vec<Sibling>> {
        let mut siblings: Vec<Sibling> = self.with_container(container, |c| {
            c.siblings
                .iter()
                .filter(|(n, _)| name.is_none_or(|wanted| wanted == n.as_str()))
                .map(|(n, url)| Sibling {
                    name: n.clone(),
                    url: url.clone(),
                    path: container.to_path_buf(),
                })
                .collect()
        })?;
        if recursive {
            for sub in self.installed_subdatasets(container)? {
                siblings.extend(self.query_siblings(&sub, name, true)?);
            }
        }
        Ok(siblings)
    }

    fn create_sibling(&self, container: &Path, request: &SiblingRequest) -> Result<()> {
        self.record("create_sibling", container, Some(&request.repo_name))?;
        let exists = self.with_container(container, |c| c.siblings.contains_key(&request.name))?;
        match (exists, request.existing) {
            (true, ExistingPolicy::Skip) => {}
            (true, ExistingPolicy::Error) => {
                return Err(Error::SiblingExists {
                    name: request.name.clone(),
                    path: container.to_path_buf(),
                });
            }
            _ => {
                let (ssh, https) = self.urls(&request.repo_name);
                let url = match request.access_protocol {
                    AccessProtocol::Ssh => ssh,
                    AccessProtocol::Https | AccessProtocol::HttpsSsh => https,
                };
                self.with_container(container, |c| {
                    c.siblings.insert(request.name.clone(), url);
                })?;
            }
        }

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
        self.record("remove_sibling", container, Some(name))?;
        self.with_container(container, |c| {
            c.siblings.remove(name);
        })?;
        if recursive {
            for sub in self.installed_subdatasets(container)? {
                self.remove_sibling(&sub, name, true)?;
            }
        }
        Ok(())
    }

    fn id(&self, container: &Path) -> Result<String> {
        self.with_container(container, |c| c.id.clone())
    }

    fn version(&self, container: &Path) -> Result<String> {
        self.with_container(container, |c| format!("{:040x}", c.version))
    }

    fn status(&self, container: &Path, _recursive: bool) -> Result<Vec<StatusEntry>> {
        self.record("status", container, None)?;
        let unsaved = self.with_container(container, |c| c.unsaved)?;
        let mut entries = self.state().status.get(container).cloned().unwrap_or_default();
        if unsaved && entries.is_empty() {
            entries.push(StatusEntry {
                path: container.to_path_buf(),
                state: EntryState::Modified,
            });
        }
        Ok(entries)
    }
}
