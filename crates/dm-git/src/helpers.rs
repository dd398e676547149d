//! Shared git2 helper functions
//!
//! Opening containers, committing an index, and the fetch/merge/push cycle
//! used by the git engine.

use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{
    Commit, Cred, CredentialType, ErrorCode, FetchOptions, Index, IndexEntry, IndexTime,
    MergeOptions, Oid, PushOptions, RemoteCallbacks, Repository, Signature,
};

use dm_fs::DmPath;

use crate::{Error, Result};

/// File mode git uses for submodule entries.
pub const GITLINK_MODE: u32 = 0o160000;

/// Open the repository of the container at `path`.
///
/// Never searches parent directories.
pub fn open(path: &Path) -> Result<Repository> {
    if !path.join(DmPath::GitDir).exists() {
        return Err(Error::NotInstalled {
            path: path.to_path_buf(),
        });
    }
    Repository::open(path).map_err(|e| {
        if e.code() == ErrorCode::NotFound {
            Error::NotInstalled {
                path: path.to_path_buf(),
            }
        } else {
            e.into()
        }
    })
}

/// The commit HEAD points at, or `None` while the branch is unborn.
pub fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_commit()?)),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Get the branch HEAD points to, even when it has no commits yet.
pub fn current_branch(repo: &Repository) -> Result<String> {
    let head = repo.find_reference("HEAD")?;
    if let Some(target) = head.symbolic_target() {
        return Ok(target.trim_start_matches("refs/heads/").to_string());
    }
    Err(Error::DetachedHead {
        path: repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf(),
    })
}

/// Write `index` and commit it on HEAD.
///
/// Returns `None` without committing when the tree equals HEAD's tree.
pub fn commit_index(
    repo: &Repository,
    index: &mut Index,
    message: &str,
    signature: &Signature<'_>,
) -> Result<Option<Oid>> {
    let tree_id = index.write_tree()?;
    index.write()?;

    let parent = head_commit(repo)?;
    if let Some(parent) = &parent
        && parent.tree_id() == tree_id
    {
        return Ok(None);
    }

    let tree = repo.find_tree(tree_id)?;
    let parents: Vec<&Commit<'_>> = parent.iter().collect();
    let oid = repo.commit(Some("HEAD"), signature, signature, message, &tree, &parents)?;
    tracing::debug!(commit = %oid, message, "Committed");
    Ok(Some(oid))
}

/// Index entry recording `id` as the commit of the submodule at `key`.
pub fn gitlink_entry(key: &str, id: Oid) -> IndexEntry {
    IndexEntry {
        ctime: IndexTime::new(0, 0),
        mtime: IndexTime::new(0, 0),
        dev: 0,
        ino: 0,
        mode: GITLINK_MODE,
        uid: 0,
        gid: 0,
        file_size: 0,
        id,
        flags: key.len().min(0xfff) as u16,
        flags_extended: 0,
        path: key.as_bytes().to_vec(),
    }
}

/// Callbacks answering credential requests with a token or the SSH agent.
pub fn remote_callbacks(token: Option<String>) -> RemoteCallbacks<'static> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0;
    callbacks.credentials(move |url, username, allowed| {
        attempts += 1;
        if attempts > 3 {
            return Err(git2::Error::from_str(&format!("authentication failed for {url}")));
        }
        let user = username.unwrap_or("git");
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
            && let Some(token) = &token
        {
            return Cred::userpass_plaintext(user, token);
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(user);
        }
        if allowed.contains(CredentialType::USERNAME) {
            return Cred::username(user);
        }
        Cred::default()
    });
    callbacks
}

/// Push `branch` to the remote `remote_name`.
///
/// Rejected reference updates are reported as failures.
pub fn push(repo: &Repository, remote_name: &str, branch: &str, token: Option<String>) -> Result<()> {
    let mut remote = repo
        .find_remote(remote_name)
        .map_err(|_| Error::RemoteNotFound {
            name: remote_name.to_string(),
        })?;

    let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);

    let mut callbacks = remote_callbacks(token);
    callbacks.push_update_reference(|refname, status| match status {
        Some(message) => Err(git2::Error::from_str(&format!("{refname} rejected: {message}"))),
        None => Ok(()),
    });
    let mut opts = PushOptions::new();
    opts.remote_callbacks(callbacks);

    remote
        .push(&[&refspec], Some(&mut opts))
        .map_err(|e| Error::PushFailed {
            message: e.message().to_string(),
        })?;

    Ok(())
}

/// Fetch from `remote_name` and merge its `branch` into the current branch.
///
/// Fast-forwards when possible, otherwise creates a merge commit. A remote
/// without the branch leaves the repository untouched.
pub fn pull(
    repo: &Repository,
    remote_name: &str,
    branch: &str,
    token: Option<String>,
    signature: &Signature<'_>,
) -> Result<()> {
    let mut remote = repo
        .find_remote(remote_name)
        .map_err(|_| Error::RemoteNotFound {
            name: remote_name.to_string(),
        })?;

    let mut opts = FetchOptions::new();
    opts.remote_callbacks(remote_callbacks(token));
    remote
        .fetch::<&str>(&[], Some(&mut opts), None)
        .map_err(|e| Error::PullFailed {
            message: format!("Fetch failed: {}", e.message()),
        })?;

    let tracking = format!("refs/remotes/{}/{}", remote_name, branch);
    let Ok(reference) = repo.find_reference(&tracking) else {
        tracing::debug!(remote = %remote_name, branch, "Remote has no such branch, nothing to merge");
        return Ok(());
    };
    let fetch_commit = reference.peel_to_commit().map_err(|e| Error::PullFailed {
        message: format!("Could not resolve {}: {}", tracking, e.message()),
    })?;
    let annotated = repo.find_annotated_commit(fetch_commit.id())?;

    let (merge_analysis, _) = repo.merge_analysis(&[&annotated])?;

    if merge_analysis.is_up_to_date() {
        return Ok(());
    }

    let refname = format!("refs/heads/{}", branch);

    if merge_analysis.is_unborn() {
        repo.reference(&refname, fetch_commit.id(), true, "pull: initial checkout")?;
        repo.set_head(&refname)?;
        repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
        return Ok(());
    }

    if merge_analysis.is_fast_forward() {
        // Check out first so local modifications abort the update
        repo.checkout_tree(fetch_commit.as_object(), Some(CheckoutBuilder::default().safe()))?;
        let mut reference = repo.find_reference(&refname)?;
        reference.set_target(
            fetch_commit.id(),
            &format!("pull: fast-forward to {}", fetch_commit.id()),
        )?;
        return Ok(());
    }

    // Normal merge
    let mut merge_opts = MergeOptions::new();
    repo.merge(&[&annotated], Some(&mut merge_opts), None)?;

    let mut index = repo.index()?;
    if index.has_conflicts() {
        repo.cleanup_state()?;
        return Err(Error::MergeConflict {
            message: format!("Merge of '{}/{}' resulted in conflicts", remote_name, branch),
        });
    }

    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;
    let head_commit = repo.head()?.peel_to_commit()?;

    let message = format!("Merge remote-tracking branch '{}/{}'", remote_name, branch);
    repo.commit(
        Some("HEAD"),
        signature,
        signature,
        &message,
        &tree,
        &[&head_commit, &fetch_commit],
    )?;

    repo.cleanup_state()?;

    Ok(())
}

/// Whether the current HEAD is contained in some remote-tracking branch.
pub fn head_is_published(repo: &Repository) -> Result<bool> {
    let Some(head) = head_commit(repo)? else {
        return Ok(true);
    };
    let branch = current_branch(repo)?;

    for remote in repo.remotes()?.iter().flatten() {
        let tracking = format!("refs/remotes/{}/{}", remote, branch);
        let Ok(reference) = repo.find_reference(&tracking) else {
            continue;
        };
        let Some(remote_id) = reference.target() else {
            continue;
        };
        if remote_id == head.id() || repo.graph_descendant_of(remote_id, head.id())? {
            return Ok(true);
        }
    }
    Ok(false)
}
