//! The status engine: comparing HEAD, the index, and the working tree.

use std::collections::BTreeSet;
use std::path::Path;

use bstr::ByteSlice;
use pygit_diff::{worktree, DiffOptions, FileStatus};

use crate::ignore::IgnoreStack;
use crate::{RepoError, Repository};

/// Where HEAD currently points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorktreeStatus {
    /// On a branch with at least one commit.
    Branch(String),
    /// On a branch with no commits yet.
    Unborn(String),
    /// HEAD does not point at a branch.
    Detached(String),
}

/// One changed path and its status relative to either HEAD or the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatusEntry {
    pub path: String,
    pub status: FileStatus,
}

/// Full status of a repository: branch state, staged/unstaged changes, and
/// untracked files.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub branch: WorktreeStatus,
    pub merge_in_progress: bool,
    pub rebase_in_progress: bool,
    /// Changes between HEAD and the index (what `commit` would record).
    pub staged: Vec<FileStatusEntry>,
    /// Changes between the index and the working tree.
    pub unstaged: Vec<FileStatusEntry>,
    /// Paths present in the working tree but neither tracked nor ignored.
    pub untracked: Vec<String>,
}

impl StatusReport {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }
}

/// Compute the full status of `repo`.
///
/// For a bare repository, `staged` and `unstaged`/`untracked` collapse to
/// just the staged-vs-HEAD comparison, since there is no working tree to
/// compare against.
pub fn status(repo: &mut Repository) -> Result<StatusReport, RepoError> {
    let branch = branch_status(repo)?;
    let merge_in_progress = repo.merge_head()?.is_some();
    let rebase_in_progress = repo.rebase_in_progress();

    let head_tree = match repo.head_oid()? {
        Some(oid) => Some(crate::checkout::commit_tree(repo.odb(), &oid)?),
        None => None,
    };

    let index = repo.index()?.clone();
    let odb = repo.odb();

    let staged_diff = worktree::diff_head_to_index(odb, head_tree.as_ref(), &index, &DiffOptions::default())?;
    let staged = staged_diff.files.into_iter().map(to_entry).collect();

    let (unstaged, untracked) = if let Some(work_tree) = repo.work_tree() {
        let unstaged_diff = worktree::diff_index_to_worktree(odb, &index, work_tree, &DiffOptions::default())?;
        let unstaged = unstaged_diff.files.into_iter().map(to_entry).collect();

        let tracked: BTreeSet<String> =
            index.iter().filter(|e| !e.is_deleted()).map(|e| e.path.to_str_lossy().into_owned()).collect();
        let mut untracked = Vec::new();
        let ignores = IgnoreStack::for_directory(work_tree, work_tree);
        walk_untracked(work_tree, work_tree, &tracked, ignores, &mut untracked)?;
        untracked.sort();

        (unstaged, untracked)
    } else {
        (Vec::new(), Vec::new())
    };

    Ok(StatusReport { branch, merge_in_progress, rebase_in_progress, staged, unstaged, untracked })
}

fn to_entry(diff: pygit_diff::FileDiff) -> FileStatusEntry {
    let path = diff.path().to_string();
    FileStatusEntry { path, status: diff.status }
}

fn branch_status(repo: &Repository) -> Result<WorktreeStatus, RepoError> {
    match repo.current_branch()? {
        Some(name) => {
            if repo.is_unborn()? {
                Ok(WorktreeStatus::Unborn(name))
            } else {
                Ok(WorktreeStatus::Branch(name))
            }
        }
        None => match repo.head_oid()? {
            Some(oid) => Ok(WorktreeStatus::Detached(oid.to_hex())),
            None => Ok(WorktreeStatus::Unborn("HEAD".to_string())),
        },
    }
}

/// Recursively walk `dir`, collecting untracked, non-ignored file paths
/// (relative to `work_tree`, `/`-separated) into `result`.
///
/// Nested `.gitignore` files are layered in as the walk descends, matching
/// how git scopes ignore rules to the directory they're found in.
pub(crate) fn walk_untracked(
    work_tree: &Path,
    dir: &Path,
    tracked: &BTreeSet<String>,
    ignores: IgnoreStack,
    result: &mut Vec<String>,
) -> Result<(), RepoError> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.file_name().map(|n| n == ".pygit").unwrap_or(false) {
            continue;
        }

        let rel = path.strip_prefix(work_tree).unwrap_or(&path);
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        let is_dir = path.is_dir();

        if ignores.is_ignored(&rel_str, is_dir) {
            continue;
        }

        if is_dir {
            let mut nested = ignores.clone();
            nested.push_level(&path);
            walk_untracked(work_tree, &path, tracked, nested, result)?;
        } else if !tracked.contains(&rel_str) {
            result.push(rel_str);
        }
    }
    Ok(())
}
