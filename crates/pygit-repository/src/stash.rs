//! `stash`: save the working tree and index aside as a commit-like object,
//! then restore it later.
//!
//! A stash entry is encoded the same way a merge commit would be: its tree
//! is the working-tree snapshot, and its parents are `[HEAD, index-commit]`
//! where `index-commit` is a synthetic one-parent commit whose tree is the
//! index snapshot. This needs no new object kind — `pygit-odb` only ever
//! sees ordinary commits.

use bstr::BString;
use pygit_hash::ObjectId;
use pygit_index::{Index, StagedState};
use pygit_object::{Commit, Object};

use crate::{RepoError, Repository};

/// One saved stash, oldest list index last (`stash@{0}` is `entries()[0]`,
/// the most recently pushed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashEntry {
    pub oid: ObjectId,
    pub message: String,
}

fn log_path(repo: &Repository) -> std::path::PathBuf {
    repo.git_dir().join("stash").join("log")
}

fn read_log(repo: &Repository) -> Result<Vec<ObjectId>, RepoError> {
    match std::fs::read_to_string(log_path(repo)) {
        Ok(content) => content.lines().map(|l| Ok(ObjectId::from_hex(l)?)).collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn write_log(repo: &Repository, entries: &[ObjectId]) -> Result<(), RepoError> {
    let path = log_path(repo);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut content = String::new();
    for oid in entries {
        content.push_str(&oid.to_hex());
        content.push('\n');
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn read_commit(repo: &Repository, oid: &ObjectId) -> Result<Commit, RepoError> {
    match repo.odb().read(oid)?.ok_or(pygit_odb::OdbError::NotFound(*oid))? {
        Object::Commit(c) => Ok(c),
        other => Err(RepoError::UnexpectedObjectType {
            oid: *oid,
            expected: "commit",
            actual: other.object_type().to_string(),
        }),
    }
}

/// Snapshot the working tree (tracked paths only) into a tree object,
/// reading each path's current on-disk content rather than the index's
/// recorded blob.
fn snapshot_worktree(repo: &Repository, index: &Index, work_tree: &std::path::Path) -> Result<ObjectId, RepoError> {
    let mut snapshot = Index::new();
    for entry in index.iter() {
        if entry.is_deleted() {
            continue;
        }
        let fs_path = work_tree.join(entry.path.to_str_lossy().as_ref());
        match std::fs::read(&fs_path) {
            Ok(data) => {
                let oid = repo.odb().write_raw(pygit_object::ObjectType::Blob, &data)?;
                snapshot.stage_file(entry.path.clone(), oid, entry.mode, StagedState::Unchanged);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        }
    }
    snapshot.to_tree(repo.odb())
}

/// Save the current index and working tree as a new stash entry, then reset
/// both to match `HEAD`.
pub fn stash_push(repo: &mut Repository, message: Option<String>) -> Result<StashEntry, RepoError> {
    let head_oid = repo.head_oid()?.ok_or(RepoError::PathNotTracked("HEAD".to_string()))?;
    let head_tree = crate::checkout::commit_tree(repo.odb(), &head_oid)?;
    let work_tree = repo.require_work_tree()?.to_path_buf();

    let index = repo.index()?.clone();
    let index_tree = index.to_tree(repo.odb())?;
    let worktree_tree = snapshot_worktree(repo, &index, &work_tree)?;

    if index_tree == head_tree && worktree_tree == head_tree {
        return Err(RepoError::NothingToStash);
    }

    let signature = repo.signature()?;
    let branch = repo.current_branch()?.unwrap_or_else(|| "HEAD".to_string());

    let index_commit = Commit {
        tree: index_tree,
        parents: vec![head_oid],
        author: signature.clone(),
        committer: signature.clone(),
        encoding: None,
        gpgsig: None,
        extra_headers: Vec::new(),
        message: BString::from(format!("index on {branch}\n")),
    };
    let index_commit_oid = repo.odb().write(&Object::Commit(index_commit))?;

    let message = message.unwrap_or_else(|| format!("WIP on {branch}\n"));
    let stash_commit = Commit {
        tree: worktree_tree,
        parents: vec![head_oid, index_commit_oid],
        author: signature.clone(),
        committer: signature,
        encoding: None,
        gpgsig: None,
        extra_headers: Vec::new(),
        message: BString::from(message.clone()),
    };
    let stash_oid = repo.odb().write(&Object::Commit(stash_commit))?;

    let mut entries = read_log(repo)?;
    entries.insert(0, stash_oid);
    write_log(repo, &entries)?;

    let current_index = repo.index()?.clone();
    let new_index = crate::checkout::materialize_tree(repo.odb(), &work_tree, &current_index, &head_tree)?;
    repo.set_index(new_index);
    repo.write_index()?;

    Ok(StashEntry { oid: stash_oid, message })
}

/// List stash entries, most recent first.
pub fn stash_list(repo: &Repository) -> Result<Vec<StashEntry>, RepoError> {
    read_log(repo)?
        .into_iter()
        .map(|oid| {
            let commit = read_commit(repo, &oid)?;
            Ok(StashEntry { oid, message: commit.message.to_string() })
        })
        .collect()
}

/// Apply the most recent stash entry (`stash@{0}`) to the working tree and
/// index, then drop it from the log.
pub fn stash_pop(repo: &mut Repository) -> Result<StashEntry, RepoError> {
    let mut entries = read_log(repo)?;
    if entries.is_empty() {
        return Err(RepoError::StashEmpty);
    }
    let stash_oid = entries.remove(0);

    let stash_commit = read_commit(repo, &stash_oid)?;
    let index_commit_oid = *stash_commit.parents.get(1).ok_or(RepoError::StashEmpty)?;
    let index_commit = read_commit(repo, &index_commit_oid)?;

    let work_tree = repo.require_work_tree()?.to_path_buf();
    let current_index = repo.index()?.clone();
    let new_index =
        crate::checkout::materialize_tree(repo.odb(), &work_tree, &current_index, &stash_commit.tree)?;
    repo.set_index(new_index);

    let staged_index = Index::from_tree(&index_commit.tree, repo.odb())?;
    repo.set_index(staged_index);
    repo.write_index()?;

    write_log(repo, &entries)?;

    Ok(StashEntry { oid: stash_oid, message: stash_commit.message.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::{commit, CommitOptions};
    use pygit_object::{FileMode, ObjectType};
    use tempfile::TempDir;

    fn init_with_commit(dir: &TempDir) -> Repository {
        let mut repo = Repository::init(dir.path()).unwrap();
        repo.config_mut().set_string("user.name", "Test").unwrap();
        repo.config_mut().set_string("user.email", "t@example.com").unwrap();
        let oid = repo.odb().write_raw(ObjectType::Blob, b"one\n").unwrap();
        repo.index_mut().unwrap().stage_file("a.txt", oid, FileMode::Regular, StagedState::Added);
        repo.write_index().unwrap();
        commit(&mut repo, "initial\n", &CommitOptions::default()).unwrap();
        repo
    }

    #[test]
    fn push_with_no_changes_errors() {
        let dir = TempDir::new().unwrap();
        let mut repo = init_with_commit(&dir);
        let err = stash_push(&mut repo, None).unwrap_err();
        assert!(matches!(err, RepoError::NothingToStash));
    }

    #[test]
    fn push_restores_head_and_pop_brings_changes_back() {
        let dir = TempDir::new().unwrap();
        let mut repo = init_with_commit(&dir);

        std::fs::write(dir.path().join("a.txt"), b"modified\n").unwrap();

        stash_push(&mut repo, Some("wip\n".to_string())).unwrap();
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"one\n");

        let list = stash_list(&repo).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].message, "wip\n");

        stash_pop(&mut repo).unwrap();
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"modified\n");
        assert!(stash_list(&repo).unwrap().is_empty());
    }

    #[test]
    fn pop_with_empty_stash_errors() {
        let dir = TempDir::new().unwrap();
        let mut repo = init_with_commit(&dir);
        let err = stash_pop(&mut repo).unwrap_err();
        assert!(matches!(err, RepoError::StashEmpty));
    }
}
