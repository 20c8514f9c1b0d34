//! `rebase`: replaying a linear run of commits onto a new base, one at a
//! time, via the same three-way tree merge `merge` uses.
//!
//! Progress is persisted to `rebase-merge/state` under the git directory so
//! `--continue`/`--abort` survive process restarts, the same way `MERGE_HEAD`
//! does for an in-progress merge.

use std::path::PathBuf;

use pygit_hash::ObjectId;
use pygit_merge::{conflict, rebase::RebaseState, tree::merge_trees};
use pygit_object::{Commit, Object};
use pygit_ref::{RefName, RefStore};
use pygit_revwalk::{merge_base_one, FirstParentWalk, WalkOptions};

use crate::{RepoError, Repository};

/// What a rebase step (start, or a replay step during continue) did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseOutcome {
    /// `onto` was already an ancestor of `HEAD`, or `HEAD` equalled `onto`;
    /// nothing to replay.
    UpToDate,
    /// Every commit replayed cleanly; the branch now points at `oid`.
    Done { oid: ObjectId },
    /// Replay paused on a conflicting commit; resolve it and stage the
    /// result, then call `rebase_continue`.
    Conflicted { commit: ObjectId, conflict_count: usize },
}

fn state_path(repo: &Repository) -> PathBuf {
    repo.git_dir().join("rebase-merge").join("state")
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

/// Begin rebasing the current branch onto `onto`.
pub fn rebase_start(repo: &mut Repository, onto: &str) -> Result<RebaseOutcome, RepoError> {
    if repo.rebase_in_progress() {
        return Err(RepoError::RebaseInProgress);
    }

    let head_oid = repo.head_oid()?.ok_or(RepoError::PathNotTracked("HEAD".to_string()))?;
    let onto_oid = repo.resolve(onto)?;

    if head_oid == onto_oid {
        return Ok(RebaseOutcome::UpToDate);
    }

    let base = merge_base_one(repo.odb(), &head_oid, &onto_oid)?.ok_or(pygit_merge::MergeError::UnrelatedHistories)?;

    if base == onto_oid {
        return Ok(RebaseOutcome::UpToDate);
    }

    let mut commits: Vec<ObjectId> = FirstParentWalk::new(repo.odb(), head_oid, WalkOptions::default())
        .take_while(|r| !matches!(r, Ok((oid, _)) if *oid == base))
        .map(|r| r.map(|(oid, _)| oid))
        .collect::<Result<_, _>>()?;
    commits.reverse();

    if base == head_oid {
        // HEAD is already an ancestor of onto: nothing of ours to replay,
        // just fast-forward the branch the same way a merge would.
        advance_to(repo, &onto_oid)?;
        return Ok(RebaseOutcome::Done { oid: onto_oid });
    }

    let state = RebaseState::new(onto_oid, head_oid, commits);
    replay(repo, state)
}

/// Resume a paused rebase with the current index as the resolved tree for
/// the commit that was conflicting.
pub fn rebase_continue(repo: &mut Repository) -> Result<RebaseOutcome, RepoError> {
    let mut state = RebaseState::load_from(&state_path(repo)).map_err(|_| RepoError::NoRebaseInProgress)?;
    let commit_oid = state.next().ok_or(RepoError::NoRebaseInProgress)?;
    let original = read_commit(repo, &commit_oid)?;

    let tree = repo.index()?.to_tree(repo.odb())?;
    let new_commit = Commit {
        tree,
        parents: vec![state.onto],
        author: original.author,
        committer: repo.signature()?,
        encoding: original.encoding,
        gpgsig: None,
        extra_headers: original.extra_headers,
        message: original.message,
    };
    let new_oid = repo.odb().write(&Object::Commit(new_commit))?;
    state.advance(new_oid);
    repo.remove_state("REBASE_HEAD")?;

    replay(repo, state)
}

/// Abort an in-progress rebase, restoring the branch to its pre-rebase tip.
pub fn rebase_abort(repo: &mut Repository) -> Result<(), RepoError> {
    let state = RebaseState::load_from(&state_path(repo)).map_err(|_| RepoError::NoRebaseInProgress)?;

    let work_tree = repo.require_work_tree()?.to_path_buf();
    let tree = crate::checkout::commit_tree(repo.odb(), &state.original_head)?;
    let current_index = repo.index()?.clone();
    let new_index = crate::checkout::materialize_tree(repo.odb(), &work_tree, &current_index, &tree)?;
    repo.set_index(new_index);
    repo.write_index()?;

    advance_to(repo, &state.original_head)?;
    cleanup_state(repo)?;
    Ok(())
}

fn advance_to(repo: &Repository, oid: &ObjectId) -> Result<(), RepoError> {
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

fn cleanup_state(repo: &Repository) -> Result<(), RepoError> {
    repo.remove_state("REBASE_HEAD")?;
    let dir = repo.git_dir().join("rebase-merge");
    match std::fs::remove_dir_all(&dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn save_state(repo: &Repository, state: &RebaseState) -> Result<(), RepoError> {
    Ok(state.save_to(&state_path(repo))?)
}

/// Replay commits from `state` until it is exhausted or a conflict pauses it.
fn replay(repo: &mut Repository, mut state: RebaseState) -> Result<RebaseOutcome, RepoError> {
    loop {
        if state.is_done() {
            advance_to(repo, &state.onto)?;
            cleanup_state(repo)?;
            return Ok(RebaseOutcome::Done { oid: state.onto });
        }

        let commit_oid = state.next().expect("checked by is_done");
        let commit = read_commit(repo, &commit_oid)?;

        let base_tree = match commit.parents.first() {
            Some(parent) => Some(crate::checkout::commit_tree(repo.odb(), parent)?),
            None => None,
        };
        let ours_tree = crate::checkout::commit_tree(repo.odb(), &state.onto)?;
        let theirs_tree = commit.tree;

        let outcome =
            merge_trees(repo.odb(), base_tree.as_ref(), &ours_tree, &theirs_tree, &commit_oid.to_hex()[..8])?;

        let work_tree = repo.require_work_tree()?.to_path_buf();
        let current_index = repo.index()?.clone();
        let new_index = crate::checkout::materialize_tree(repo.odb(), &work_tree, &current_index, &outcome.tree)?;

        if outcome.is_clean() {
            repo.set_index(new_index);
            repo.write_index()?;

            let new_commit = Commit {
                tree: outcome.tree,
                parents: vec![state.onto],
                author: commit.author,
                committer: repo.signature()?,
                encoding: commit.encoding,
                gpgsig: None,
                extra_headers: commit.extra_headers,
                message: commit.message,
            };
            let new_oid = repo.odb().write(&Object::Commit(new_commit))?;
            state.advance(new_oid);

            if state.is_done() {
                advance_to(repo, &new_oid)?;
                cleanup_state(repo)?;
                return Ok(RebaseOutcome::Done { oid: new_oid });
            }
            save_state(repo, &state)?;
        } else {
            for (path, content) in &outcome.worktree_writes {
                conflict::write_worktree_file(&work_tree, path.as_ref(), content)?;
            }
            repo.set_index(new_index);
            repo.write_index()?;
            repo.write_state_oid("REBASE_HEAD", &commit_oid)?;
            save_state(repo, &state)?;
            return Ok(RebaseOutcome::Conflicted { commit: commit_oid, conflict_count: outcome.conflicts.len() });
        }
    }
}
