//! Writing conflict results to the working tree and staging clean merges.
//!
//! This implementation has no merge-stage concept in the index (see
//! `pygit-index`): a conflicted path is simply left out of the index while
//! `MERGE_HEAD` records that a merge is in progress, and `commit` picks up
//! the working tree's resolved content once the user stages it.

use std::fs;
use std::path::Path;

use bstr::BStr;
use pygit_hash::ObjectId;
use pygit_index::{Index, StagedState};
use pygit_object::{Blob, FileMode, Object};
use pygit_odb::ObjectDatabase;

use crate::MergeError;

/// Write content (conflict-marked or clean) to a file in the working tree.
pub fn write_worktree_file(work_tree: &Path, path: &BStr, content: &[u8]) -> Result<(), MergeError> {
    let file_path = work_tree.join(path.to_string());
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(())
}

/// Record a clean merge result in the index: write the blob, then stage it
/// as `Modified` relative to HEAD (the caller commits on top of this).
pub fn record_clean_merge_in_index(
    index: &mut Index,
    odb: &ObjectDatabase,
    path: &BStr,
    content: &[u8],
    mode: FileMode,
) -> Result<ObjectId, MergeError> {
    let oid = odb.write(&Object::Blob(Blob { data: content.to_vec() }))?;
    index.stage_file(path.to_vec(), oid, mode, StagedState::Modified);
    Ok(oid)
}
