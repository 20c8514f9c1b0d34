//! Tree materialization: writing a tree's contents into the working tree and
//! replacing the index to match.
//!
//! Used by `checkout`, `reset --hard`, and to apply a clean merge or
//! completed rebase to the working tree.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use bstr::{BStr, ByteSlice};
use pygit_hash::ObjectId;
use pygit_index::Index;
use pygit_object::{FileMode, Object};
use pygit_odb::ObjectDatabase;

use pygit_ref::{RefName, RefStore};

use crate::RepoError;

/// Errors specific to materializing a tree into the working tree.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("the following untracked files would be overwritten by checkout: {0:?}")]
    WouldOverwriteUntracked(Vec<String>),
}

/// Replace the working tree's tracked contents with `target_tree`, and
/// replace `index` with the target's flattened entries.
///
/// 1. Compute currently tracked paths from `index`.
/// 2. Flatten `target_tree` into a path → (oid, mode) map.
/// 3. Remove working-tree files tracked now but absent from the target,
///    then prune directories left empty.
/// 4. Refuse (before writing anything) if a target path already exists in
///    the working tree as an untracked file — checking every path up front
///    keeps this a fail-fast, no-partial-mutation operation.
/// 5. Write each target path's blob content, creating directories as
///    needed, and set the executable bit from its mode.
/// 6. Replace `index` with the target's entries.
pub fn materialize_tree(
    odb: &ObjectDatabase,
    work_tree: &Path,
    index: &Index,
    target_tree: &ObjectId,
) -> Result<Index, RepoError> {
    let tracked: BTreeSet<&BStr> = index.iter().filter(|e| !e.is_deleted()).map(|e| e.path.as_bstr()).collect();
    let target = Index::from_tree(target_tree, odb)?;

    let mut untracked_conflicts = Vec::new();
    for entry in target.iter() {
        let path = entry.path.as_bstr();
        let fs_path = work_tree.join(path.to_str_lossy().as_ref());
        if !tracked.contains(path) && fs_path.exists() {
            untracked_conflicts.push(path.to_string());
        }
    }
    if !untracked_conflicts.is_empty() {
        return Err(CheckoutError::WouldOverwriteUntracked(untracked_conflicts).into());
    }

    for path in &tracked {
        if target.get(*path).is_none() {
            let fs_path = work_tree.join(path.to_str_lossy().as_ref());
            if fs_path.is_file() || fs_path.is_symlink() {
                fs::remove_file(&fs_path)?;
                prune_empty_dirs(work_tree, fs_path.parent());
            }
        }
    }

    for entry in target.iter() {
        let fs_path = work_tree.join(entry.path.to_str_lossy().as_ref());
        if let Some(parent) = fs_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = read_blob(odb, &entry.oid)?;
        fs::write(&fs_path, data)?;
        set_executable(&fs_path, entry.mode)?;
    }

    Ok(target)
}

/// Point HEAD at `branch` and materialize its tip into the working tree.
pub fn checkout_branch(repo: &mut crate::Repository, branch: &str) -> Result<(), RepoError> {
    let branch_ref = RefName::new(format!("refs/heads/{branch}"))?;
    let oid = repo.refs().resolve_to_oid(&branch_ref)?.ok_or_else(|| RepoError::PathNotTracked(branch.to_string()))?;
    checkout_to(repo, &oid)?;
    let head_ref = RefName::new("HEAD")?;
    repo.refs().write_symbolic_ref(&head_ref, &branch_ref)?;
    Ok(())
}

/// Detach HEAD at `oid` and materialize its tree into the working tree.
pub fn checkout_detached(repo: &mut crate::Repository, oid: &ObjectId) -> Result<(), RepoError> {
    checkout_to(repo, oid)?;
    let head_ref = RefName::new("HEAD")?;
    repo.refs().write_ref(&head_ref, oid)?;
    Ok(())
}

fn checkout_to(repo: &mut crate::Repository, oid: &ObjectId) -> Result<(), RepoError> {
    let work_tree = repo.require_work_tree()?.to_path_buf();
    let tree = commit_tree(repo.odb(), oid)?;
    let index = repo.index()?.clone();
    let new_index = materialize_tree(repo.odb(), &work_tree, &index, &tree)?;
    repo.set_index(new_index);
    repo.write_index()
}

pub(crate) fn commit_tree(odb: &ObjectDatabase, commit_oid: &ObjectId) -> Result<ObjectId, RepoError> {
    match odb.read(commit_oid)?.ok_or(pygit_odb::OdbError::NotFound(*commit_oid))? {
        Object::Commit(c) => Ok(c.tree),
        other => Err(RepoError::UnexpectedObjectType {
            oid: *commit_oid,
            expected: "commit",
            actual: other.object_type().to_string(),
        }),
    }
}

fn read_blob(odb: &ObjectDatabase, oid: &ObjectId) -> Result<Vec<u8>, RepoError> {
    match odb.read(oid)?.ok_or(pygit_odb::OdbError::NotFound(*oid))? {
        Object::Blob(b) => Ok(b.data),
        other => Err(RepoError::UnexpectedObjectType {
            oid: *oid,
            expected: "blob",
            actual: other.object_type().to_string(),
        }),
    }
}

fn set_executable(path: &Path, mode: FileMode) -> Result<(), RepoError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        let bits = if matches!(mode, FileMode::Executable) { 0o755 } else { 0o644 };
        perms.set_mode(bits);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
    Ok(())
}

fn prune_empty_dirs(work_tree: &Path, mut dir: Option<&Path>) {
    while let Some(d) = dir {
        if d == work_tree {
            break;
        }
        match fs::read_dir(d) {
            Ok(mut entries) if entries.next().is_none() => {
                let _ = fs::remove_dir(d);
                dir = d.parent();
            }
            _ => break,
        }
    }
}
