//! `merge`: fast-forward when possible, three-way merge otherwise.

use pygit_hash::ObjectId;
use pygit_merge::{conflict, tree::merge_trees, MergeError};
use pygit_object::{Commit, Object};
use pygit_ref::{RefName, RefStore};
use pygit_revwalk::merge_base_one;

use crate::{RepoError, Repository};

/// What a merge attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// `theirs` is already an ancestor of `HEAD`; nothing to do.
    AlreadyUpToDate,
    /// `HEAD` was an ancestor of `theirs`; the branch ref was simply moved.
    FastForward { oid: ObjectId },
    /// A three-way merge produced a clean merge commit.
    Merged { oid: ObjectId },
    /// A three-way merge left conflicts; `MERGE_HEAD` now records the
    /// in-progress merge and the working tree holds conflict markers.
    Conflicted { conflict_count: usize },
}

/// Merge `theirs` (a branch name or any revision expression) into the
/// current branch.
pub fn merge_branch(repo: &mut Repository, theirs: &str) -> Result<MergeOutcome, RepoError> {
    if repo.merge_head()?.is_some() {
        return Err(RepoError::MergeInProgress);
    }

    let our_oid = repo.head_oid()?.ok_or(RepoError::PathNotTracked("HEAD".to_string()))?;
    let their_oid = repo.resolve(theirs)?;

    if our_oid == their_oid {
        return Ok(MergeOutcome::AlreadyUpToDate);
    }

    let base = merge_base_one(repo.odb(), &our_oid, &their_oid)?.ok_or(MergeError::UnrelatedHistories)?;

    if base == their_oid {
        return Ok(MergeOutcome::AlreadyUpToDate);
    }

    if base == our_oid {
        let work_tree = repo.require_work_tree()?.to_path_buf();
        let target_tree = crate::checkout::commit_tree(repo.odb(), &their_oid)?;
        let current_index = repo.index()?.clone();
        let new_index = crate::checkout::materialize_tree(repo.odb(), &work_tree, &current_index, &target_tree)?;
        repo.set_index(new_index);
        repo.write_index()?;
        advance_current_ref(repo, &their_oid)?;
        return Ok(MergeOutcome::FastForward { oid: their_oid });
    }

    let our_tree = crate::checkout::commit_tree(repo.odb(), &our_oid)?;
    let their_tree = crate::checkout::commit_tree(repo.odb(), &their_oid)?;
    let outcome = merge_trees(repo.odb(), Some(&base), &our_tree, &their_tree, theirs)?;

    let work_tree = repo.require_work_tree()?.to_path_buf();
    let current_index = repo.index()?.clone();
    let new_index =
        crate::checkout::materialize_tree(repo.odb(), &work_tree, &current_index, &outcome.tree)?;

    if outcome.is_clean() {
        repo.set_index(new_index);
        repo.write_index()?;

        let signature = repo.signature()?;
        let commit = Commit {
            tree: outcome.tree,
            parents: vec![our_oid, their_oid],
            author: signature.clone(),
            committer: signature,
            encoding: None,
            gpgsig: None,
            extra_headers: Vec::new(),
            message: format!("Merge {theirs} into {}\n", repo.current_branch()?.unwrap_or_else(|| "HEAD".to_string())).into(),
        };
        let oid = repo.odb().write(&Object::Commit(commit))?;
        advance_current_ref(repo, &oid)?;
        Ok(MergeOutcome::Merged { oid })
    } else {
        for (path, content) in &outcome.worktree_writes {
            conflict::write_worktree_file(&work_tree, path.as_ref(), content)?;
        }
        repo.set_index(new_index);
        repo.write_index()?;
        repo.write_state_oid("MERGE_HEAD", &their_oid)?;
        Ok(MergeOutcome::Conflicted { conflict_count: outcome.conflicts.len() })
    }
}

fn advance_current_ref(repo: &Repository, oid: &ObjectId) -> Result<(), RepoError> {
    let head_ref = RefName::new("HEAD")?;
    match repo.refs().resolve(&head_ref)? {
        Some(pygit_ref::Reference::Symbolic { target, .. }) => {
            repo.refs().write_ref(&target, oid)?;
        }
        _ => {
            repo.refs().write_ref(&head_ref, oid)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::branch_create;
    use crate::checkout::checkout_branch;
    use crate::commit::{commit, CommitOptions};
    use pygit_index::StagedState;
    use pygit_object::{FileMode, ObjectType};
    use tempfile::TempDir;

    fn init_repo(dir: &TempDir) -> Repository {
        let mut repo = Repository::init(dir.path()).unwrap();
        repo.config_mut().set_string("user.name", "Test").unwrap();
        repo.config_mut().set_string("user.email", "t@example.com").unwrap();
        repo
    }

    fn stage_and_commit(repo: &mut Repository, name: &str, content: &[u8], message: &str) -> ObjectId {
        let oid = repo.odb().write_raw(ObjectType::Blob, content).unwrap();
        repo.index_mut().unwrap().stage_file(name, oid, FileMode::Regular, StagedState::Added);
        repo.write_index().unwrap();
        commit(repo, message, &CommitOptions::default()).unwrap().oid
    }

    #[test]
    fn fast_forward_merge_moves_branch() {
        let dir = TempDir::new().unwrap();
        let mut repo = init_repo(&dir);
        stage_and_commit(&mut repo, "a.txt", b"one\n", "first\n");
        branch_create(&repo, "feature", None).unwrap();
        checkout_branch(&mut repo, "feature").unwrap();
        let second = stage_and_commit(&mut repo, "b.txt", b"two\n", "second\n");

        checkout_branch(&mut repo, "main").unwrap();
        let outcome = merge_branch(&mut repo, "feature").unwrap();
        assert_eq!(outcome, MergeOutcome::FastForward { oid: second });
    }

    #[test]
    fn already_up_to_date_when_target_is_ancestor() {
        let dir = TempDir::new().unwrap();
        let mut repo = init_repo(&dir);
        stage_and_commit(&mut repo, "a.txt", b"one\n", "first\n");
        branch_create(&repo, "feature", None).unwrap();

        let outcome = merge_branch(&mut repo, "feature").unwrap();
        assert_eq!(outcome, MergeOutcome::AlreadyUpToDate);
    }

    #[test]
    fn three_way_merge_is_clean_when_non_overlapping() {
        let dir = TempDir::new().unwrap();
        let mut repo = init_repo(&dir);
        stage_and_commit(&mut repo, "base.txt", b"base\n", "first\n");
        branch_create(&repo, "feature", None).unwrap();

        checkout_branch(&mut repo, "feature").unwrap();
        stage_and_commit(&mut repo, "feature.txt", b"feature\n", "feature commit\n");

        checkout_branch(&mut repo, "main").unwrap();
        stage_and_commit(&mut repo, "main.txt", b"main\n", "main commit\n");

        let outcome = merge_branch(&mut repo, "feature").unwrap();
        assert!(matches!(outcome, MergeOutcome::Merged { .. }));
        assert!(dir.path().join("feature.txt").exists());
        assert!(dir.path().join("main.txt").exists());
    }

    #[test]
    fn conflicting_merge_sets_merge_head() {
        let dir = TempDir::new().unwrap();
        let mut repo = init_repo(&dir);
        stage_and_commit(&mut repo, "a.txt", b"base\n", "first\n");
        branch_create(&repo, "feature", None).unwrap();

        checkout_branch(&mut repo, "feature").unwrap();
        stage_and_commit(&mut repo, "a.txt", b"from feature\n", "feature change\n");

        checkout_branch(&mut repo, "main").unwrap();
        stage_and_commit(&mut repo, "a.txt", b"from main\n", "main change\n");

        let outcome = merge_branch(&mut repo, "feature").unwrap();
        assert!(matches!(outcome, MergeOutcome::Conflicted { conflict_count: 1 }));
        assert!(repo.merge_head().unwrap().is_some());

        let content = std::fs::read(dir.path().join("a.txt")).unwrap();
        assert!(content.windows(7).any(|w| w == b"<<<<<<<"));
    }
}
