//! Index entry types: `IndexEntry` and `StagedState`.

use bstr::BString;
use pygit_hash::ObjectId;
use pygit_object::FileMode;

/// How an entry's content relates to the corresponding path in HEAD's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StagedState {
    /// Present in HEAD's tree with this exact blob and mode; nothing staged.
    Unchanged,
    /// Path did not exist in HEAD's tree.
    Added,
    /// Path existed in HEAD's tree with a different blob or mode.
    Modified,
    /// Staged as removed; a tombstone kept in the index until committed.
    Deleted,
}

impl StagedState {
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Unchanged => 0,
            Self::Added => 1,
            Self::Modified => 2,
            Self::Deleted => 3,
        }
    }

    pub fn from_u8(n: u8) -> Option<Self> {
        match n {
            0 => Some(Self::Unchanged),
            1 => Some(Self::Added),
            2 => Some(Self::Modified),
            3 => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// A single entry in the index: a path staged against HEAD's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// `/`-separated path, relative to the repository root.
    pub path: BString,
    /// Blob this path points to. Meaningless (left as the last known value)
    /// when `state` is `Deleted`.
    pub oid: ObjectId,
    /// File mode (regular file or executable; never `Tree`).
    pub mode: FileMode,
    /// Staged state relative to HEAD.
    pub state: StagedState,
}

impl IndexEntry {
    pub fn new(path: impl Into<BString>, oid: ObjectId, mode: FileMode, state: StagedState) -> Self {
        Self {
            path: path.into(),
            oid,
            mode,
            state,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.state == StagedState::Deleted
    }
}
