//! Merge engine: three-way content merge, tree-level merge, conflict
//! handling, and rebase replay state.
//!
//! Operates purely over objects and trees (`pygit-odb`, `pygit-object`,
//! `pygit-index`, `pygit-diff`) with no knowledge of a repository, HEAD, or
//! the working tree — `pygit-repository` composes this engine with ref and
//! working-tree operations to implement `merge` and `rebase`.

pub mod conflict;
pub mod content;
pub mod rebase;
pub mod tree;

use bstr::BString;
use pygit_hash::ObjectId;
use pygit_object::FileMode;

/// Options controlling merge operations.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Number of context lines to pass through to content diffing.
    pub context_lines: u32,
}

/// Result of a merge operation.
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// The resulting tree OID (if the merge was clean).
    pub tree: Option<ObjectId>,
    /// Whether the merge was clean (no conflicts).
    pub is_clean: bool,
    /// List of conflicts (empty if clean).
    pub conflicts: Vec<ConflictEntry>,
}

impl MergeResult {
    /// Create a clean merge result.
    pub fn clean(tree: ObjectId) -> Self {
        Self {
            tree: Some(tree),
            is_clean: true,
            conflicts: Vec::new(),
        }
    }

    /// Create a conflicted merge result.
    pub fn conflicted(conflicts: Vec<ConflictEntry>) -> Self {
        Self {
            tree: None,
            is_clean: false,
            conflicts,
        }
    }
}

/// A file-level conflict.
#[derive(Debug, Clone)]
pub struct ConflictEntry {
    /// Path of the conflicted file.
    pub path: BString,
    /// Type of conflict.
    pub conflict_type: ConflictType,
    /// Base (common ancestor) side, if the path existed there.
    pub base: Option<ConflictSide>,
    /// Our side (current branch), if the path exists there.
    pub ours: Option<ConflictSide>,
    /// Their side (branch being merged), if the path exists there.
    pub theirs: Option<ConflictSide>,
}

/// Types of merge conflicts this engine produces.
///
/// Rename/copy detection is out of scope, so a path switching between a
/// file and a directory decomposes into an ordinary delete-and-add pair
/// rather than a distinct conflict kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictType {
    /// Both sides modified the same region of a file's content.
    Content,
    /// One side modified a path, the other deleted it.
    ModifyDelete,
    /// Both sides added the same path with different content.
    AddAdd,
}

/// One side of a conflict.
#[derive(Debug, Clone)]
pub struct ConflictSide {
    /// Object ID of this side's content.
    pub oid: ObjectId,
    /// File mode.
    pub mode: FileMode,
}

/// Result of a three-way content merge.
#[derive(Debug, Clone)]
pub enum ContentMergeResult {
    /// Clean merge, no conflicts.
    Clean(Vec<u8>),
    /// Conflict with markers in the content.
    Conflict {
        /// Merged content including conflict markers.
        content: Vec<u8>,
        /// Number of conflict regions.
        conflict_count: usize,
    },
}

impl ContentMergeResult {
    /// Whether the merge was clean.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean(_))
    }

    /// Get the merged content (with or without conflict markers).
    pub fn content(&self) -> &[u8] {
        match self {
            Self::Clean(data) => data,
            Self::Conflict { content, .. } => content,
        }
    }
}

/// Error types for merge operations.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("no merge base found")]
    NoMergeBase,

    #[error("cannot merge unrelated histories")]
    UnrelatedHistories,

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("expected {expected} object, got {actual} for {oid}")]
    UnexpectedObjectType {
        oid: ObjectId,
        expected: &'static str,
        actual: String,
    },

    #[error("invalid rebase state: {0}")]
    InvalidRebaseState(String),

    #[error(transparent)]
    Diff(#[from] pygit_diff::DiffError),

    #[error(transparent)]
    Odb(#[from] pygit_odb::OdbError),

    #[error(transparent)]
    Index(#[from] pygit_index::IndexError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_merge_result() {
        let oid = ObjectId::from_hex("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
        let result = MergeResult::clean(oid);
        assert!(result.is_clean);
        assert!(result.conflicts.is_empty());
        assert_eq!(result.tree, Some(oid));
    }

    #[test]
    fn conflicted_merge_result() {
        let conflicts = vec![ConflictEntry {
            path: BString::from("file.txt"),
            conflict_type: ConflictType::Content,
            base: None,
            ours: None,
            theirs: None,
        }];
        let result = MergeResult::conflicted(conflicts);
        assert!(!result.is_clean);
        assert_eq!(result.conflicts.len(), 1);
        assert!(result.tree.is_none());
    }

    #[test]
    fn content_merge_result_clean() {
        let result = ContentMergeResult::Clean(b"hello world\n".to_vec());
        assert!(result.is_clean());
        assert_eq!(result.content(), b"hello world\n");
    }

    #[test]
    fn content_merge_result_conflict() {
        let result = ContentMergeResult::Conflict {
            content: b"<<<<<<< ours\nfoo\n=======\nbar\n>>>>>>> theirs\n".to_vec(),
            conflict_count: 1,
        };
        assert!(!result.is_clean());
        assert!(!result.content().is_empty());
    }

    #[test]
    fn conflict_types() {
        assert_eq!(ConflictType::Content, ConflictType::Content);
        assert_ne!(ConflictType::Content, ConflictType::AddAdd);
    }
}
