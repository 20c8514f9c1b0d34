//! `reset`: moving the current branch (or detached `HEAD`) to a different
//! commit, with three levels of how much else gets touched.

use pygit_hash::ObjectId;
use pygit_index::Index;
use pygit_ref::{RefName, RefStore};

use crate::{RepoError, Repository};

/// How much of the index and working tree a reset touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Move HEAD only; leave the index and working tree untouched.
    Soft,
    /// Move HEAD and replace the index with the target's tree; leave the
    /// working tree untouched.
    Mixed,
    /// Move HEAD, replace the index, and overwrite the working tree to match.
    Hard,
}

/// Reset the current branch (or `HEAD`, if detached) to `target`.
pub fn reset(repo: &mut Repository, target: &str, mode: ResetMode) -> Result<ObjectId, RepoError> {
    let oid = repo.resolve(target)?;
    let head_ref = RefName::new("HEAD")?;

    match repo.refs().resolve(&head_ref)? {
        Some(pygit_ref::Reference::Symbolic { target: branch_ref, .. }) => {
            repo.refs().write_ref(&branch_ref, &oid)?;
        }
        _ => {
            repo.refs().write_ref(&head_ref, &oid)?;
        }
    }

    if matches!(mode, ResetMode::Soft) {
        return Ok(oid);
    }

    let tree = crate::checkout::commit_tree(repo.odb(), &oid)?;
    let new_index = Index::from_tree(&tree, repo.odb())?;

    if matches!(mode, ResetMode::Hard) {
        let work_tree = repo.require_work_tree()?.to_path_buf();
        let current_index = repo.index()?.clone();
        crate::checkout::materialize_tree(repo.odb(), &work_tree, &current_index, &tree)?;
    }

    repo.set_index(new_index);
    repo.write_index()?;
    Ok(oid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::{commit, CommitOptions};
    use pygit_index::StagedState;
    use pygit_object::{FileMode, ObjectType};
    use tempfile::TempDir;

    fn init_with_two_commits(dir: &TempDir) -> (Repository, ObjectId, ObjectId) {
        let mut repo = Repository::init(dir.path()).unwrap();
        repo.config_mut().set_string("user.name", "Test").unwrap();
        repo.config_mut().set_string("user.email", "t@example.com").unwrap();

        let first = commit(&mut repo, "first\n", &CommitOptions::default()).unwrap().oid;

        let oid = repo.odb().write_raw(ObjectType::Blob, b"content\n").unwrap();
        repo.index_mut().unwrap().stage_file("a.txt", oid, FileMode::Regular, StagedState::Added);
        repo.write_index().unwrap();
        let second = commit(&mut repo, "second\n", &CommitOptions::default()).unwrap().oid;

        (repo, first, second)
    }

    #[test]
    fn soft_reset_moves_head_only() {
        let dir = TempDir::new().unwrap();
        let (mut repo, first, _second) = init_with_two_commits(&dir);

        reset(&mut repo, &first.to_hex(), ResetMode::Soft).unwrap();
        assert_eq!(repo.head_oid().unwrap(), Some(first));
        assert_eq!(repo.reload_index().unwrap().len(), 1);
    }

    #[test]
    fn mixed_reset_unstages_but_keeps_worktree() {
        let dir = TempDir::new().unwrap();
        let (mut repo, first, _second) = init_with_two_commits(&dir);

        reset(&mut repo, &first.to_hex(), ResetMode::Mixed).unwrap();
        assert_eq!(repo.head_oid().unwrap(), Some(first));
        assert_eq!(repo.reload_index().unwrap().len(), 0);
        assert!(repo.work_tree().unwrap().join("a.txt").exists());
    }

    #[test]
    fn hard_reset_removes_worktree_file() {
        let dir = TempDir::new().unwrap();
        let (mut repo, first, _second) = init_with_two_commits(&dir);

        reset(&mut repo, &first.to_hex(), ResetMode::Hard).unwrap();
        assert_eq!(repo.head_oid().unwrap(), Some(first));
        assert!(!repo.work_tree().unwrap().join("a.txt").exists());
    }
}
