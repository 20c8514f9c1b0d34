use std::path::PathBuf;

use pygit_hash::ObjectId;

/// Errors from repository operations.
///
/// Composes every subsystem's own error type via `#[from]`, plus the
/// repository-level failure kinds named in the error taxonomy (dirty
/// working tree, ref conflicts, stale locks) that only make sense once
/// several subsystems are involved at once.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a git repository (or any of the parent directories): {0}")]
    NotARepo(PathBuf),

    #[error("invalid git directory: {path}: {reason}")]
    InvalidGitDir { path: PathBuf, reason: String },

    #[error("repository already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("bare repository has no working tree")]
    BareNoWorkTree,

    #[error("path not tracked: {0}")]
    PathNotTracked(String),

    #[error("path does not exist: {0}")]
    PathMissing(PathBuf),

    #[error("nothing to commit")]
    NothingToCommit,

    #[error("user.name and user.email are not set (and PYGIT_AUTHOR_NAME/PYGIT_AUTHOR_EMAIL are not both set)")]
    MissingAuthorIdentity,

    #[error("working tree or index has uncommitted changes")]
    Dirty,

    #[error("would overwrite untracked files: {0:?}")]
    WouldOverwriteUntracked(Vec<String>),

    #[error("merge conflict in {0} file(s); resolve and commit, or abort")]
    MergeConflict(usize),

    #[error("a merge is already in progress (MERGE_HEAD exists)")]
    MergeInProgress,

    #[error("no merge in progress")]
    NoMergeInProgress,

    #[error("a rebase is already in progress")]
    RebaseInProgress,

    #[error("no rebase in progress")]
    NoRebaseInProgress,

    #[error("ref already exists: {0}")]
    RefExists(String),

    #[error("ref is in use (cannot delete HEAD or the current branch): {0}")]
    RefInUse(String),

    #[error("expected {expected} object, got {actual} for {oid}")]
    UnexpectedObjectType { oid: ObjectId, expected: &'static str, actual: String },

    #[error("another process holds the lock: {0}")]
    Locked(PathBuf),

    #[error("cannot stash: nothing to save")]
    NothingToStash,

    #[error("no stash entries")]
    StashEmpty,

    #[error(transparent)]
    Checkout(#[from] crate::checkout::CheckoutError),

    #[error(transparent)]
    Config(#[from] pygit_config::ConfigError),

    #[error(transparent)]
    Odb(#[from] pygit_odb::OdbError),

    #[error(transparent)]
    Ref(#[from] pygit_ref::RefError),

    #[error(transparent)]
    Index(#[from] pygit_index::IndexError),

    #[error(transparent)]
    Object(#[from] pygit_object::ObjectError),

    #[error(transparent)]
    Hash(#[from] pygit_hash::HashError),

    #[error(transparent)]
    Diff(#[from] pygit_diff::DiffError),

    #[error(transparent)]
    Merge(#[from] pygit_merge::MergeError),

    #[error(transparent)]
    RevWalk(#[from] pygit_revwalk::RevWalkError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RepoError {
    /// The object id a `RevWalk`/`Odb` "not found" error was about, if any —
    /// used by the CLI layer to print `BadRevision`-style diagnostics.
    pub fn missing_oid(&self) -> Option<ObjectId> {
        match self {
            RepoError::Odb(pygit_odb::OdbError::NotFound(oid)) => Some(*oid),
            RepoError::RevWalk(pygit_revwalk::RevWalkError::ObjectNotFound(oid))
            | RepoError::RevWalk(pygit_revwalk::RevWalkError::CommitNotFound(oid)) => Some(*oid),
            _ => None,
        }
    }
}
