use std::path::Path;

use crate::{DiscoveredRepo, RepoError, RepositoryKind};

/// Discover a repository by walking up from `start` looking for `.pygit/`.
///
/// 1. Check for a `.pygit/` directory at the current level.
/// 2. Check if the current directory itself looks like a bare repository
///    (has `HEAD`, `objects/`, `refs/` directly).
/// 3. Go to the parent, repeat until the filesystem root is reached.
pub fn discover_git_dir(start: &Path) -> Result<DiscoveredRepo, RepoError> {
    let start = std::fs::canonicalize(start).map_err(|_| RepoError::NotARepo(start.to_path_buf()))?;

    let mut current = start.clone();
    loop {
        let dot_pygit = current.join(".pygit");

        if dot_pygit.is_dir() && is_git_dir(&dot_pygit) {
            return Ok(DiscoveredRepo {
                git_dir: dot_pygit,
                work_tree: Some(current),
                kind: RepositoryKind::Normal,
            });
        }

        if is_git_dir(&current) {
            return Ok(DiscoveredRepo { git_dir: current, work_tree: None, kind: RepositoryKind::Bare });
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => return Err(RepoError::NotARepo(start)),
        }
    }
}

/// Open a known repository directory path directly.
pub fn open_git_dir(git_dir: &Path) -> Result<DiscoveredRepo, RepoError> {
    let git_dir = std::fs::canonicalize(git_dir).map_err(|_| RepoError::NotARepo(git_dir.to_path_buf()))?;

    if !is_git_dir(&git_dir) {
        return Err(RepoError::InvalidGitDir { path: git_dir, reason: "missing HEAD, objects/, or refs/".to_string() });
    }

    if git_dir.file_name().map(|n| n == ".pygit").unwrap_or(false) {
        if let Some(parent) = git_dir.parent() {
            return Ok(DiscoveredRepo { git_dir, work_tree: Some(parent.to_path_buf()), kind: RepositoryKind::Normal });
        }
    }

    Ok(DiscoveredRepo { git_dir, work_tree: None, kind: RepositoryKind::Bare })
}

/// Open a repository when the working tree root is already known.
pub fn open_git_dir_from_work_tree(work_tree: &Path) -> Result<DiscoveredRepo, RepoError> {
    let dot_pygit = work_tree.join(".pygit");
    if dot_pygit.is_dir() {
        let dot_pygit =
            std::fs::canonicalize(&dot_pygit).map_err(|_| RepoError::NotARepo(dot_pygit.clone()))?;
        let work_tree =
            std::fs::canonicalize(work_tree).map_err(|_| RepoError::NotARepo(work_tree.to_path_buf()))?;
        return Ok(DiscoveredRepo { git_dir: dot_pygit, work_tree: Some(work_tree), kind: RepositoryKind::Normal });
    }
    Err(RepoError::NotARepo(work_tree.to_path_buf()))
}

/// Check whether a directory looks like a repository dir (has HEAD, objects/, refs/).
pub fn is_git_dir(path: &Path) -> bool {
    path.join("HEAD").is_file() && path.join("objects").is_dir() && path.join("refs").is_dir()
}
