//! Branch listing, creation, and deletion (`refs/heads/*`).

use pygit_hash::ObjectId;
use pygit_ref::{RefName, RefStore};

use crate::{RepoError, Repository};

/// One branch and the commit it currently points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSummary {
    pub name: String,
    pub oid: ObjectId,
    pub is_current: bool,
}

/// All local branches, sorted by name.
#[derive(Debug, Clone)]
pub struct BranchList {
    pub branches: Vec<BranchSummary>,
}

impl BranchList {
    /// List every branch under `refs/heads/`.
    pub fn list(repo: &Repository) -> Result<Self, RepoError> {
        let current = repo.current_branch()?;
        let mut branches = Vec::new();
        for result in repo.refs().iter(Some("refs/heads/"))? {
            let reference = result?;
            if let Some(oid) = reference.target_oid() {
                let name = reference.name().short_name().to_string();
                let is_current = current.as_deref() == Some(name.as_str());
                branches.push(BranchSummary { name, oid, is_current });
            }
        }
        branches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self { branches })
    }
}

/// Create a new branch named `name` pointing at `start_point` (or the current
/// commit, if `start_point` is `None`).
pub fn branch_create(repo: &Repository, name: &str, start_point: Option<&str>) -> Result<ObjectId, RepoError> {
    let oid = match start_point {
        Some(rev) => repo.resolve(rev)?,
        None => repo.head_oid()?.ok_or(RepoError::PathNotTracked("HEAD".to_string()))?,
    };
    let branch_ref = RefName::new(format!("refs/heads/{name}"))?;
    if repo.refs().resolve_to_oid(&branch_ref)?.is_some() {
        return Err(RepoError::RefExists(name.to_string()));
    }
    repo.refs().write_ref(&branch_ref, &oid)?;
    Ok(oid)
}

/// Delete branch `name`. Refuses to delete the branch `HEAD` currently points at.
pub fn branch_delete(repo: &Repository, name: &str) -> Result<ObjectId, RepoError> {
    if repo.current_branch()?.as_deref() == Some(name) {
        return Err(RepoError::RefInUse(name.to_string()));
    }
    let branch_ref = RefName::new(format!("refs/heads/{name}"))?;
    let oid = repo.refs().resolve_to_oid(&branch_ref)?.ok_or_else(|| RepoError::PathNotTracked(name.to_string()))?;
    repo.refs().delete_ref(&branch_ref)?;
    Ok(oid)
}
