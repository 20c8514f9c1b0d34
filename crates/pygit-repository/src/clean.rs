//! `clean`: list or remove untracked files (and, with `-d`, whole untracked
//! directories) from the working tree.

use std::collections::BTreeSet;
use std::path::Path;

use bstr::ByteSlice;

use crate::ignore::IgnoreStack;
use crate::{RepoError, Repository};

/// Options controlling a `clean` run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    /// List what would be removed without touching the filesystem (`-n`).
    pub dry_run: bool,
    /// Remove whole untracked directories as a unit, not just loose files (`-d`).
    pub include_directories: bool,
}

/// Paths removed (or that would be removed, under `dry_run`). Directory
/// entries carry a trailing `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanOutcome {
    pub removed: Vec<String>,
}

/// Remove (or, with `dry_run`, merely list) untracked files from the working
/// tree, honoring `.gitignore`.
pub fn clean_worktree(repo: &mut Repository, options: &CleanOptions) -> Result<CleanOutcome, RepoError> {
    let work_tree = repo.require_work_tree()?.to_path_buf();
    let index = repo.index()?.clone();
    let tracked: BTreeSet<String> =
        index.iter().filter(|e| !e.is_deleted()).map(|e| e.path.to_str_lossy().into_owned()).collect();

    let mut removed = Vec::new();
    let ignores = IgnoreStack::for_directory(&work_tree, &work_tree);
    walk(&work_tree, &work_tree, &tracked, ignores, options.include_directories, &mut removed)?;
    removed.sort();

    if !options.dry_run {
        for path in &removed {
            let fs_path = work_tree.join(path.trim_end_matches('/'));
            if path.ends_with('/') {
                std::fs::remove_dir_all(&fs_path)?;
            } else {
                std::fs::remove_file(&fs_path)?;
            }
        }
    }

    Ok(CleanOutcome { removed })
}

fn walk(
    work_tree: &Path,
    dir: &Path,
    tracked: &BTreeSet<String>,
    ignores: IgnoreStack,
    include_directories: bool,
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
            let has_tracked_contents = tracked.iter().any(|t| t.starts_with(&format!("{rel_str}/")));
            if include_directories && !has_tracked_contents {
                result.push(format!("{rel_str}/"));
                continue;
            }
            let mut nested = ignores.clone();
            nested.push_level(&path);
            walk(work_tree, &path, tracked, nested, include_directories, result)?;
        } else if !tracked.contains(&rel_str) {
            result.push(rel_str);
        }
    }
    Ok(())
}
