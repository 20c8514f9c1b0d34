//! The index (staging area).
//!
//! Sits between the working tree and the object database, tracking which
//! paths are staged for the next commit relative to HEAD's tree. Stored
//! on disk at `.pygit/index` in a format private to this implementation —
//! there is no requirement to read or write C git's own index format.

pub mod entry;
mod read;
mod write;

use std::path::Path;

use bstr::BStr;
use pygit_hash::ObjectId;
use pygit_odb::ObjectDatabase;

pub use entry::{IndexEntry, StagedState};
pub use error::IndexError;

mod error {
    use std::path::PathBuf;

    #[derive(Debug, thiserror::Error)]
    pub enum IndexError {
        #[error("invalid index header: {0}")]
        InvalidHeader(String),

        #[error("index checksum mismatch")]
        ChecksumMismatch,

        #[error("invalid index entry at offset {offset}: {reason}")]
        InvalidEntry { offset: usize, reason: String },

        #[error("duplicate path in index: {0}")]
        DuplicatePath(String),

        #[error("lock failed: {path}")]
        LockFailed { path: PathBuf },

        #[error("object {0} is not a tree")]
        NotATree(ObjectId),

        #[error(transparent)]
        Io(#[from] std::io::Error),

        #[error(transparent)]
        Odb(#[from] pygit_odb::OdbError),

        #[error(transparent)]
        Object(#[from] pygit_object::ObjectError),

        #[error(transparent)]
        Hash(#[from] pygit_hash::HashError),
    }
}

use pygit_hash::ObjectId as Oid;

/// The staging area.
///
/// Entries are kept sorted ascending by path with no duplicates, mirroring
/// the on-disk invariant.
#[derive(Debug, Default, Clone)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    /// Create a new, empty index.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Read the index from its on-disk file. A missing file is not an empty
    /// index — callers distinguish `ENOENT` themselves and use `new()`.
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let file = std::fs::File::open(path.as_ref())?;
        let data = unsafe { memmap2::Mmap::map(&file)? };
        read::parse_index(&data)
    }

    /// Write the index to its on-disk file atomically via a lock file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), IndexError> {
        write::write_index(self, path.as_ref())
    }

    /// Number of entries, including deletion tombstones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by exact path.
    pub fn get(&self, path: &BStr) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.path[..] == path[..])
    }

    /// Iterate entries in ascending path order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Stage a file addition or modification. Whether this records `Added`
    /// or `Modified` (relative to HEAD) is the caller's decision — the index
    /// does not itself know HEAD's tree.
    pub fn stage_file(&mut self, path: impl Into<bstr::BString>, oid: Oid, mode: pygit_object::FileMode, state: StagedState) {
        let entry = IndexEntry::new(path, oid, mode, state);
        self.insert_sorted(entry);
    }

    /// Stage a deletion: replaces any existing entry at `path` with a
    /// tombstone recording the removal, so it is carried through to the
    /// next `to_tree()` as an absence.
    pub fn stage_deletion(&mut self, path: impl Into<bstr::BString>) {
        let path = path.into();
        let oid = self
            .get(BStr::new(&path))
            .map(|e| e.oid)
            .unwrap_or(ObjectId::NULL);
        let mode = self
            .get(BStr::new(&path))
            .map(|e| e.mode)
            .unwrap_or(pygit_object::FileMode::Regular);
        self.insert_sorted(IndexEntry::new(path, oid, mode, StagedState::Deleted));
    }

    /// Remove any staged entry for `path`, leaving the path untracked by the
    /// index entirely. Restoring HEAD's version, if desired, is the caller's
    /// job (typically via `from_tree` on the HEAD commit's tree).
    pub fn unstage(&mut self, path: &BStr) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.path[..] != path[..]);
        self.entries.len() < before
    }

    fn insert_sorted(&mut self, entry: IndexEntry) {
        self.entries.retain(|e| e.path != entry.path);
        let pos = self
            .entries
            .binary_search_by(|e| e.path.cmp(&entry.path))
            .unwrap_or_else(|pos| pos);
        self.entries.insert(pos, entry);
    }

    /// Build a tree object from the current index state, writing every
    /// intermediate tree to `odb`. Deletion tombstones are excluded, and
    /// directories left empty as a result contribute no tree entry.
    pub fn to_tree(&self, odb: &ObjectDatabase) -> Result<ObjectId, IndexError> {
        write::write_tree_from_index(self, odb)
    }

    /// Replace the index's entries with the flattened contents of a tree,
    /// each marked `Unchanged` since they are read directly from it.
    pub fn from_tree(tree_id: &ObjectId, odb: &ObjectDatabase) -> Result<Self, IndexError> {
        let entries = read::flatten_tree(tree_id, odb)?;
        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pygit_object::FileMode;

    fn oid(byte: u8) -> ObjectId {
        let mut bytes = [0u8; 20];
        bytes[19] = byte;
        ObjectId::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn stage_file_inserts_sorted() {
        let mut idx = Index::new();
        idx.stage_file("b.txt", oid(1), FileMode::Regular, StagedState::Added);
        idx.stage_file("a.txt", oid(2), FileMode::Regular, StagedState::Added);
        let paths: Vec<_> = idx.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn stage_file_replaces_existing_path() {
        let mut idx = Index::new();
        idx.stage_file("a.txt", oid(1), FileMode::Regular, StagedState::Added);
        idx.stage_file("a.txt", oid(2), FileMode::Regular, StagedState::Modified);
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.get(BStr::new(b"a.txt")).unwrap().oid, oid(2));
    }

    #[test]
    fn stage_deletion_is_tombstone() {
        let mut idx = Index::new();
        idx.stage_file("a.txt", oid(1), FileMode::Regular, StagedState::Unchanged);
        idx.stage_deletion("a.txt");
        assert_eq!(idx.len(), 1);
        assert!(idx.get(BStr::new(b"a.txt")).unwrap().is_deleted());
    }

    #[test]
    fn unstage_removes_entry() {
        let mut idx = Index::new();
        idx.stage_file("a.txt", oid(1), FileMode::Regular, StagedState::Added);
        assert!(idx.unstage(BStr::new(b"a.txt")));
        assert!(idx.is_empty());
        assert!(!idx.unstage(BStr::new(b"a.txt")));
    }

    #[test]
    fn to_tree_then_from_tree_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();

        let blob_oid = odb
            .write_raw(pygit_object::ObjectType::Blob, b"hello\n")
            .unwrap();

        let mut idx = Index::new();
        idx.stage_file("src/main.rs", blob_oid, FileMode::Regular, StagedState::Added);
        idx.stage_file("README.md", blob_oid, FileMode::Regular, StagedState::Added);

        let tree_id = idx.to_tree(&odb).unwrap();
        let restored = Index::from_tree(&tree_id, &odb).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get(BStr::new(b"README.md")).unwrap().oid, blob_oid);
        assert_eq!(
            restored.get(BStr::new(b"src/main.rs")).unwrap().oid,
            blob_oid
        );

        let tree_id_again = restored.to_tree(&odb).unwrap();
        assert_eq!(tree_id, tree_id_again);
    }

    #[test]
    fn to_tree_skips_deleted_entries() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();
        let blob_oid = odb
            .write_raw(pygit_object::ObjectType::Blob, b"content")
            .unwrap();

        let mut idx = Index::new();
        idx.stage_file("keep.txt", blob_oid, FileMode::Regular, StagedState::Added);
        idx.stage_file("gone.txt", blob_oid, FileMode::Regular, StagedState::Unchanged);
        idx.stage_deletion("gone.txt");

        let tree_id = idx.to_tree(&odb).unwrap();
        let restored = Index::from_tree(&tree_id, &odb).unwrap();
        assert_eq!(restored.len(), 1);
        assert!(restored.get(BStr::new(b"keep.txt")).is_some());
    }

    #[test]
    fn empty_index_builds_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();
        let idx = Index::new();
        let tree_id = idx.to_tree(&odb).unwrap();
        let obj = odb.read(&tree_id).unwrap().unwrap();
        match obj {
            pygit_object::Object::Tree(t) => assert!(t.is_empty()),
            _ => panic!("expected tree"),
        }
    }
}
