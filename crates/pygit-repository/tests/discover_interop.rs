//! Repository discovery: walking up from a subdirectory to find `.pygit/`,
//! and opening bare repositories directly.

use pygit_repository::{RepoError, Repository, RepositoryKind};

#[test]
fn discover_from_work_tree_root() {
    let dir = tempfile::tempdir().unwrap();
    let work_tree = std::fs::canonicalize(dir.path()).unwrap();
    Repository::init(&work_tree).unwrap();

    let repo = Repository::discover(&work_tree).unwrap();
    assert_eq!(repo.git_dir(), work_tree.join(".pygit"));
    assert_eq!(repo.work_tree().unwrap(), work_tree);
    assert_eq!(repo.kind(), RepositoryKind::Normal);
}

#[test]
fn discover_from_subdirectory() {
    let dir = tempfile::tempdir().unwrap();
    let work_tree = std::fs::canonicalize(dir.path()).unwrap();
    Repository::init(&work_tree).unwrap();

    let sub = work_tree.join("a").join("b").join("c");
    std::fs::create_dir_all(&sub).unwrap();

    let repo = Repository::discover(&sub).unwrap();
    assert_eq!(repo.git_dir(), work_tree.join(".pygit"));
    assert_eq!(repo.work_tree().unwrap(), work_tree);
}

#[test]
fn discover_bare_repository() {
    let dir = tempfile::tempdir().unwrap();
    let bare_dir = std::fs::canonicalize(dir.path()).unwrap();
    Repository::init_bare(&bare_dir).unwrap();

    let repo = Repository::open(&bare_dir).unwrap();
    assert_eq!(repo.kind(), RepositoryKind::Bare);
    assert!(repo.is_bare());
    assert!(repo.work_tree().is_none());
}

#[test]
fn discover_not_a_repo() {
    let dir = tempfile::tempdir().unwrap();
    let result = Repository::discover(dir.path());
    assert!(matches!(result.unwrap_err(), RepoError::NotARepo(_)));
}

#[test]
fn open_from_git_dir() {
    let dir = tempfile::tempdir().unwrap();
    let work_tree = std::fs::canonicalize(dir.path()).unwrap();
    Repository::init(&work_tree).unwrap();
    let git_dir = work_tree.join(".pygit");

    let repo = Repository::open(&git_dir).unwrap();
    assert_eq!(repo.git_dir(), git_dir);
    assert_eq!(repo.kind(), RepositoryKind::Normal);
}

#[test]
fn open_from_work_tree() {
    let dir = tempfile::tempdir().unwrap();
    let work_tree = std::fs::canonicalize(dir.path()).unwrap();
    Repository::init(&work_tree).unwrap();

    let repo = Repository::open(&work_tree).unwrap();
    assert_eq!(repo.git_dir(), work_tree.join(".pygit"));
    assert_eq!(repo.work_tree().unwrap(), work_tree);
}

#[test]
fn reinit_is_safe_noop() {
    let dir = tempfile::tempdir().unwrap();
    let work_tree = std::fs::canonicalize(dir.path()).unwrap();
    Repository::init(&work_tree).unwrap();

    let repo = Repository::init(&work_tree).unwrap();
    assert_eq!(repo.kind(), RepositoryKind::Normal);
}
