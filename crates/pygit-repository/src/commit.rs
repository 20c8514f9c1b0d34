//! Creating commits: building the commit object from the index's tree and
//! advancing the current branch (or `HEAD` directly, if detached).

use bstr::BString;
use pygit_hash::ObjectId;
use pygit_object::{Commit, Object};
use pygit_ref::{RefName, RefStore, RefTransaction};

use crate::{RepoError, Repository};

/// Options controlling how a commit is built.
#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// Allow creating a commit whose tree is identical to its sole parent's.
    pub allow_empty: bool,
}

/// Summary of a newly created commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub oid: ObjectId,
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub is_merge: bool,
}

/// Record a new commit from the current index.
///
/// - Resolves the current parent (HEAD, plus `MERGE_HEAD` if a merge is in
///   progress, producing a two-parent merge commit).
/// - Builds a tree object from the index.
/// - Refuses with `NothingToCommit` unless the tree differs from the parent's
///   tree, `options.allow_empty` is set, or there is no parent yet (the
///   first commit on an unborn branch is never "empty").
/// - Advances the current branch ref via a CAS transaction, or `HEAD`
///   directly when detached.
/// - Clears `MERGE_HEAD` on success.
pub fn commit(repo: &mut Repository, message: impl Into<BString>, options: &CommitOptions) -> Result<CommitSummary, RepoError> {
    let message = message.into();
    let signature = repo.signature()?;

    let head_oid = repo.head_oid()?;
    let merge_head = repo.merge_head()?;

    let mut parents = Vec::new();
    if let Some(oid) = head_oid {
        parents.push(oid);
    }
    if let Some(oid) = merge_head {
        parents.push(oid);
    }

    let tree = repo.index()?.to_tree(repo.odb())?;

    if !options.allow_empty {
        if let Some(parent) = parents.first() {
            let parent_tree = crate::checkout::commit_tree(repo.odb(), parent)?;
            if parents.len() == 1 && parent_tree == tree {
                return Err(RepoError::NothingToCommit);
            }
        }
    }

    let commit = Commit {
        tree,
        parents: parents.clone(),
        author: signature.clone(),
        committer: signature,
        encoding: None,
        gpgsig: None,
        extra_headers: Vec::new(),
        message,
    };
    let oid = repo.odb().write(&Object::Commit(commit))?;

    advance_head(repo, &oid, head_oid)?;
    if merge_head.is_some() {
        repo.remove_state("MERGE_HEAD")?;
    }

    Ok(CommitSummary { oid, tree, parents, is_merge: parents.len() > 1 })
}

/// Point the current branch (or `HEAD` itself, if detached) at `new_oid`,
/// using a CAS transaction when there is a previous value to guard against a
/// concurrent update racing this one.
fn advance_head(repo: &Repository, new_oid: &ObjectId, old_oid: Option<ObjectId>) -> Result<(), RepoError> {
    let head_ref = RefName::new("HEAD")?;
    match repo.refs().resolve(&head_ref)? {
        Some(pygit_ref::Reference::Symbolic { target, .. }) => {
            let mut tx = RefTransaction::new();
            match old_oid {
                Some(old) => tx.update(target, old, *new_oid),
                None => tx.create(target, *new_oid),
            }
            repo.refs().commit_transaction(tx)?;
        }
        _ => {
            repo.refs().write_ref(&head_ref, new_oid)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_commit_on_unborn_branch() {
        let dir = TempDir::new().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        repo.config_mut().set_string("user.name", "Test").unwrap();
        repo.config_mut().set_string("user.email", "test@example.com").unwrap();

        let summary = commit(&mut repo, "initial\n", &CommitOptions::default()).unwrap();
        assert!(summary.parents.is_empty());
        assert!(!summary.is_merge);
        assert_eq!(repo.head_oid().unwrap(), Some(summary.oid));
    }

    #[test]
    fn refuses_empty_commit_by_default() {
        let dir = TempDir::new().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        repo.config_mut().set_string("user.name", "Test").unwrap();
        repo.config_mut().set_string("user.email", "test@example.com").unwrap();

        commit(&mut repo, "initial\n", &CommitOptions::default()).unwrap();
        let err = commit(&mut repo, "again\n", &CommitOptions::default()).unwrap_err();
        assert!(matches!(err, RepoError::NothingToCommit));
    }

    #[test]
    fn allow_empty_permits_identical_tree() {
        let dir = TempDir::new().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        repo.config_mut().set_string("user.name", "Test").unwrap();
        repo.config_mut().set_string("user.email", "test@example.com").unwrap();

        let first = commit(&mut repo, "initial\n", &CommitOptions::default()).unwrap();
        let opts = CommitOptions { allow_empty: true };
        let second = commit(&mut repo, "again\n", &opts).unwrap();
        assert_eq!(second.parents, vec![first.oid]);
    }

    #[test]
    fn missing_identity_errors() {
        let dir = TempDir::new().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        let err = commit(&mut repo, "initial\n", &CommitOptions::default()).unwrap_err();
        assert!(matches!(err, RepoError::MissingAuthorIdentity));
    }
}
