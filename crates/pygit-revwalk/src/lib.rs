//! Revision resolution, merge-base search, and first-parent history walk.
//!
//! Operates over `pygit-odb`/`pygit-ref` primitives, not a `Repository`, so
//! `pygit-repository` can depend on this crate (for `merge`'s base selection
//! and `log`'s traversal) without a workspace cycle.

mod merge_base;
mod resolve;
mod walk;

pub use merge_base::{is_ancestor, merge_base, merge_base_one};
pub use resolve::{parse_revision, resolve, RevisionExpr, RevisionSuffix};
pub use walk::{FirstParentWalk, WalkOptions};

use pygit_hash::ObjectId;

/// Errors produced by revision resolution and walking.
#[derive(Debug, thiserror::Error)]
pub enum RevWalkError {
    #[error("bad revision: {0}")]
    BadRevision(String),

    #[error("ambiguous revision {prefix}: matches {candidates:?}")]
    Ambiguous {
        prefix: String,
        candidates: Vec<ObjectId>,
    },

    #[error("commit not found: {0}")]
    CommitNotFound(ObjectId),

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("object is not a commit: {0}")]
    NotACommit(ObjectId),

    #[error("{oid} has only {available} parent(s), requested parent {requested}")]
    NoSuchParent {
        oid: ObjectId,
        requested: u32,
        available: usize,
    },

    #[error("no merge base found")]
    NoMergeBase,

    #[error(transparent)]
    Odb(#[from] pygit_odb::OdbError),

    #[error(transparent)]
    Ref(#[from] pygit_ref::RefError),

    #[error(transparent)]
    Object(#[from] pygit_object::ObjectError),

    #[error(transparent)]
    Hash(#[from] pygit_hash::HashError),
}
