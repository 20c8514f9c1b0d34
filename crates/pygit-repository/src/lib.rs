//! Repository discovery, initialization, and central access for all subsystems:
//! the object database, ref store, config, and index, plus the higher-level
//! operations (`commit`, `status`, `checkout`, `merge`, `rebase`, `stash`,
//! `reset`, `clean`) built on top of them.

mod branch;
mod checkout;
mod clean;
mod commit;
mod discover;
mod env;
mod error;
mod ignore;
mod init;
mod merge;
mod rebase;
mod reset;
mod stash;
mod status;
mod tag;

pub use branch::{BranchList, BranchSummary};
pub use checkout::{checkout_branch, checkout_detached, materialize_tree, CheckoutError};
pub use clean::{clean_worktree, CleanOptions, CleanOutcome};
pub use commit::{commit, CommitOptions, CommitSummary};
pub use env::AuthorOverride;
pub use error::RepoError;
pub use ignore::IgnoreStack;
pub use merge::{merge_branch, MergeOutcome};
pub use rebase::{rebase_abort, rebase_continue, rebase_start, RebaseOutcome};
pub use reset::{reset, ResetMode};
pub use stash::{stash_list, stash_pop, stash_push, StashEntry};
pub use status::{status, FileStatusEntry, StatusReport, WorktreeStatus};
pub use tag::{tag_create, tag_list, TagSummary};

use std::path::{Path, PathBuf};

use pygit_config::Config;
use pygit_hash::ObjectId;
use pygit_index::Index;
use pygit_odb::ObjectDatabase;
use pygit_ref::{FilesRefStore, RefName, RefStore, Reference};

/// Type of repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryKind {
    /// Normal repository with a working tree.
    Normal,
    /// Bare repository (no working tree).
    Bare,
}

/// Result of repository discovery, before the subsystems are opened.
#[derive(Debug)]
pub struct DiscoveredRepo {
    pub git_dir: PathBuf,
    pub work_tree: Option<PathBuf>,
    pub kind: RepositoryKind,
}

/// Options for repository initialization.
pub struct InitOptions {
    pub bare: bool,
    pub default_branch: Option<String>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self { bare: false, default_branch: None }
    }
}

/// The central repository struct tying object database, refs, config, and
/// index together, plus the working-tree root for non-bare repositories.
pub struct Repository {
    git_dir: PathBuf,
    work_tree: Option<PathBuf>,
    odb: ObjectDatabase,
    refs: FilesRefStore,
    config: Config,
    index: Option<Index>,
    index_path: PathBuf,
    kind: RepositoryKind,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("git_dir", &self.git_dir)
            .field("work_tree", &self.work_tree)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Open an existing repository at the given path.
    ///
    /// `path` may point either to the `.pygit` directory or to the working
    /// tree root.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let path = path.as_ref();
        let discovered = if discover::is_git_dir(path) {
            discover::open_git_dir(path)?
        } else if path.join(".pygit").exists() {
            discover::open_git_dir_from_work_tree(path)?
        } else {
            return Err(RepoError::NotARepo(path.to_path_buf()));
        };
        Self::from_discovered(discovered)
    }

    /// Discover a repository starting from `start`, walking up toward the
    /// filesystem root.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self, RepoError> {
        let discovered = discover::discover_git_dir(start.as_ref())?;
        Self::from_discovered(discovered)
    }

    /// Initialize a new repository at `path`.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        Self::init_opts(path, &InitOptions::default())
    }

    /// Initialize a new bare repository at `path`.
    pub fn init_bare(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        Self::init_opts(path, &InitOptions { bare: true, ..Default::default() })
    }

    /// Initialize a new repository with custom options.
    pub fn init_opts(path: impl AsRef<Path>, opts: &InitOptions) -> Result<Self, RepoError> {
        let discovered = init::init_repository(path.as_ref(), opts)?;
        Self::from_discovered(discovered)
    }

    fn from_discovered(discovered: DiscoveredRepo) -> Result<Self, RepoError> {
        let DiscoveredRepo { git_dir, work_tree, kind } = discovered;

        let odb = ObjectDatabase::open(git_dir.join("objects"))?;
        let config = Config::load(&git_dir.join("config"))?;
        let refs = FilesRefStore::new(&git_dir);
        let index_path = git_dir.join("index");

        Ok(Repository { git_dir, work_tree, odb, refs, config, index: None, index_path, kind })
    }

    // --- Path accessors ---

    /// Path to the `.pygit` directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Path to the working tree (`None` for bare repositories).
    pub fn work_tree(&self) -> Option<&Path> {
        self.work_tree.as_deref()
    }

    /// Path to the working tree, or `BareNoWorkTree` if this is a bare repo.
    pub fn require_work_tree(&self) -> Result<&Path, RepoError> {
        self.work_tree.as_deref().ok_or(RepoError::BareNoWorkTree)
    }

    /// Repository kind.
    pub fn kind(&self) -> RepositoryKind {
        self.kind
    }

    /// Is this a bare repository?
    pub fn is_bare(&self) -> bool {
        self.kind == RepositoryKind::Bare
    }

    // --- Subsystem accessors ---

    /// Access the object database.
    pub fn odb(&self) -> &ObjectDatabase {
        &self.odb
    }

    /// Access the reference store.
    pub fn refs(&self) -> &FilesRefStore {
        &self.refs
    }

    /// Access the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Access the configuration mutably. Callers are responsible for calling
    /// `write_config` to persist any changes.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Write the in-memory configuration back to `.pygit/config`.
    pub fn write_config(&self) -> Result<(), RepoError> {
        self.config.write_to(&self.git_dir.join("config"))?;
        Ok(())
    }

    /// Access the index (lazy-loaded).
    pub fn index(&mut self) -> Result<&Index, RepoError> {
        if self.index.is_none() {
            self.load_index()?;
        }
        Ok(self.index.as_ref().unwrap())
    }

    /// Access the index mutably (lazy-loaded).
    pub fn index_mut(&mut self) -> Result<&mut Index, RepoError> {
        if self.index.is_none() {
            self.load_index()?;
        }
        Ok(self.index.as_mut().unwrap())
    }

    /// Replace the cached index with the given one.
    pub fn set_index(&mut self, index: Index) {
        self.index = Some(index);
    }

    /// Write the current in-memory index back to disk.
    pub fn write_index(&self) -> Result<(), RepoError> {
        if let Some(ref idx) = self.index {
            idx.write_to(&self.index_path)?;
        }
        Ok(())
    }

    /// Reload the index from disk, replacing any cached copy.
    pub fn reload_index(&mut self) -> Result<&Index, RepoError> {
        self.index = None;
        self.load_index()?;
        Ok(self.index.as_ref().unwrap())
    }

    fn load_index(&mut self) -> Result<(), RepoError> {
        let idx = if self.index_path.exists() { Index::read_from(&self.index_path)? } else { Index::new() };
        self.index = Some(idx);
        Ok(())
    }

    // --- Special refs / state files ---

    /// Path to a `.pygit`-rooted state file (`MERGE_HEAD`, `REBASE_HEAD`, …).
    fn state_path(&self, name: &str) -> PathBuf {
        self.git_dir.join(name)
    }

    pub(crate) fn read_state_oid(&self, name: &str) -> Result<Option<ObjectId>, RepoError> {
        match std::fs::read_to_string(self.state_path(name)) {
            Ok(content) => Ok(Some(ObjectId::from_hex(content.trim())?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn write_state_oid(&self, name: &str, oid: &ObjectId) -> Result<(), RepoError> {
        std::fs::write(self.state_path(name), format!("{}\n", oid.to_hex()))?;
        Ok(())
    }

    pub(crate) fn remove_state(&self, name: &str) -> Result<(), RepoError> {
        match std::fs::remove_file(self.state_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// `MERGE_HEAD`, if a merge is currently in progress.
    pub fn merge_head(&self) -> Result<Option<ObjectId>, RepoError> {
        self.read_state_oid("MERGE_HEAD")
    }

    /// Whether a rebase is currently in progress (`REBASE_HEAD` present).
    pub fn rebase_in_progress(&self) -> bool {
        self.state_path("REBASE_HEAD").is_file()
    }

    // --- Convenience methods ---

    /// Resolve `HEAD` to an object id.
    pub fn head_oid(&self) -> Result<Option<ObjectId>, RepoError> {
        let head_ref = RefName::new("HEAD")?;
        Ok(self.refs.resolve_to_oid(&head_ref)?)
    }

    /// The current branch name (`None` if HEAD is detached).
    pub fn current_branch(&self) -> Result<Option<String>, RepoError> {
        let head_ref = RefName::new("HEAD")?;
        match self.refs.resolve(&head_ref)? {
            Some(Reference::Symbolic { target, .. }) => {
                let name = target.as_str();
                let branch = name.strip_prefix("refs/heads/").unwrap_or(name);
                Ok(Some(branch.to_string()))
            }
            Some(Reference::Direct { .. }) => Ok(None),
            None => Ok(None),
        }
    }

    /// Whether HEAD is on a branch with no commits yet.
    pub fn is_unborn(&self) -> Result<bool, RepoError> {
        let head_ref = RefName::new("HEAD")?;
        match self.refs.resolve(&head_ref)? {
            Some(Reference::Symbolic { target, .. }) => Ok(self.refs.resolve_to_oid(&target)?.is_none()),
            Some(Reference::Direct { .. }) => Ok(false),
            None => Ok(true),
        }
    }

    /// Resolve a revision expression (`HEAD`, a branch/tag name, an
    /// abbreviated id, or an ancestry suffix like `HEAD~2`) to an object id.
    pub fn resolve(&self, rev: &str) -> Result<ObjectId, RepoError> {
        Ok(pygit_revwalk::resolve(&self.odb, &self.refs, rev)?)
    }

    /// The author/committer signature to use for a new commit or tag,
    /// combining `PYGIT_AUTHOR_*` environment overrides with `user.name`
    /// / `user.email` from config.
    pub fn signature(&self) -> Result<pygit_utils::date::Signature, RepoError> {
        let name = self.config.get_string("user.name")?;
        let email = self.config.get_string("user.email")?;
        AuthorOverride::from_env().resolve(name, email).ok_or(RepoError::MissingAuthorIdentity)
    }
}
