//! Diff engine: Myers line diff, tree-to-tree diff, and unified output.
//!
//! Blob diff produces hunks using a longest-common-subsequence line diff
//! (Myers), run on a pre-trimmed common prefix/suffix. Tree diff walks two
//! trees in lock-step by sorted path, producing `Added`, `Deleted`, and
//! `Modified` entries. Rename and copy detection are out of scope — a moved
//! file shows up as a delete paired with an add.

pub mod algorithm;
pub mod binary;
pub mod format;
pub mod tree;
pub mod worktree;

use bstr::BString;
use pygit_hash::ObjectId;
use pygit_object::FileMode;

pub use format::unified::format as format_unified;

/// Options controlling diff computation.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Number of context lines around each hunk (default 3).
    pub context_lines: u32,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self { context_lines: 3 }
    }
}

/// Result of diffing two trees, or a tree against the index or working tree.
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    /// Per-file diff entries.
    pub files: Vec<FileDiff>,
}

impl DiffResult {
    /// True if no files changed.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of files changed.
    pub fn num_files_changed(&self) -> usize {
        self.files.len()
    }

    /// Total number of lines inserted across all files.
    pub fn insertions(&self) -> usize {
        self.files.iter().map(|f| f.insertions()).sum()
    }

    /// Total number of lines deleted across all files.
    pub fn deletions(&self) -> usize {
        self.files.iter().map(|f| f.deletions()).sum()
    }
}

/// Diff for a single file.
#[derive(Debug, Clone)]
pub struct FileDiff {
    /// Type of change.
    pub status: FileStatus,
    /// Old path (None for added files).
    pub old_path: Option<BString>,
    /// New path (None for deleted files).
    pub new_path: Option<BString>,
    /// Old file mode (None for added files).
    pub old_mode: Option<FileMode>,
    /// New file mode (None for deleted files).
    pub new_mode: Option<FileMode>,
    /// Old object ID (None for added files).
    pub old_oid: Option<ObjectId>,
    /// New object ID (None for deleted files).
    pub new_oid: Option<ObjectId>,
    /// Diff hunks (empty for binary files or mode-only changes).
    pub hunks: Vec<Hunk>,
    /// Whether the file is binary.
    pub is_binary: bool,
}

impl FileDiff {
    /// Number of lines inserted in this file.
    pub fn insertions(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| matches!(l, DiffLine::Addition(_)))
            .count()
    }

    /// Number of lines deleted in this file.
    pub fn deletions(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| matches!(l, DiffLine::Deletion(_)))
            .count()
    }

    /// The effective path for display (prefers new_path, falls back to old_path).
    pub fn path(&self) -> &BString {
        self.new_path
            .as_ref()
            .or(self.old_path.as_ref())
            .expect("FileDiff must have at least one path")
    }
}

/// File-level change status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Deleted,
    Modified,
}

impl FileStatus {
    /// Single-character status code matching C git output.
    pub fn as_char(&self) -> char {
        match self {
            Self::Added => 'A',
            Self::Deleted => 'D',
            Self::Modified => 'M',
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Added => "A",
            Self::Deleted => "D",
            Self::Modified => "M",
        })
    }
}

/// A contiguous region of changes.
#[derive(Debug, Clone)]
pub struct Hunk {
    /// Start line in the old file (1-based).
    pub old_start: u32,
    /// Number of lines from the old file.
    pub old_count: u32,
    /// Start line in the new file (1-based).
    pub new_start: u32,
    /// Number of lines from the new file.
    pub new_count: u32,
    /// Lines in this hunk.
    pub lines: Vec<DiffLine>,
}

/// A single line in a diff hunk.
#[derive(Debug, Clone)]
pub enum DiffLine {
    /// Unchanged context line.
    Context(BString),
    /// Added line.
    Addition(BString),
    /// Deleted line.
    Deletion(BString),
}

/// Error types for diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("failed to read object {oid}: {source}")]
    ObjectRead {
        oid: ObjectId,
        #[source]
        source: pygit_odb::OdbError,
    },

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("expected {expected} object, got {actual} for {oid}")]
    UnexpectedObjectType {
        oid: ObjectId,
        expected: &'static str,
        actual: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Index(#[from] pygit_index::IndexError),
}
