//! Three-way tree merge.
//!
//! Computes tree diffs `base→ours` and `base→theirs`, then classifies every
//! touched path per the merge table: a change on exactly one side wins
//! outright, identical changes on both sides are clean, and genuine
//! divergence is a conflict (content merge for a file, or a flagged
//! conflict for a modify/delete or add/add pair).

use std::collections::BTreeMap;

use bstr::BString;
use pygit_diff::{DiffOptions, FileDiff, FileStatus};
use pygit_hash::ObjectId;
use pygit_index::{Index, StagedState};
use pygit_odb::ObjectDatabase;

use crate::{content, ConflictEntry, ConflictSide, ConflictType, MergeError};

/// Outcome of merging two trees against a common base.
pub struct TreeMergeOutcome {
    /// The merged tree, built from every cleanly resolved path. `None` if
    /// there were no conflicts it is always `Some`; present even when there
    /// are conflicts, covering only the non-conflicted paths.
    pub tree: ObjectId,
    /// Conflicts that need user resolution.
    pub conflicts: Vec<ConflictEntry>,
    /// For each conflicted path, the bytes that should land in the working
    /// tree (conflict-marked content for file conflicts, or the surviving
    /// side's content for a modify/delete conflict).
    pub worktree_writes: Vec<(BString, Vec<u8>)>,
}

impl TreeMergeOutcome {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Three-way merge of `ours` and `theirs` trees against `base`.
///
/// `theirs_label` names the incoming side for conflict markers (typically
/// the ref being merged in).
pub fn merge_trees(
    odb: &ObjectDatabase,
    base_tree: Option<&ObjectId>,
    ours_tree: &ObjectId,
    theirs_tree: &ObjectId,
    theirs_label: &str,
) -> Result<TreeMergeOutcome, MergeError> {
    let options = DiffOptions::default();
    let diff_base_ours = pygit_diff::tree::diff_trees(odb, base_tree, Some(ours_tree), &options)?;
    let diff_base_theirs = pygit_diff::tree::diff_trees(odb, base_tree, Some(theirs_tree), &options)?;

    let mut by_path_ours: BTreeMap<BString, &FileDiff> = BTreeMap::new();
    for f in &diff_base_ours.files {
        by_path_ours.insert(f.path().clone(), f);
    }
    let mut by_path_theirs: BTreeMap<BString, &FileDiff> = BTreeMap::new();
    for f in &diff_base_theirs.files {
        by_path_theirs.insert(f.path().clone(), f);
    }

    // Seed with base's entries so paths untouched by either side survive;
    // every touched path below overwrites or tombstones its seeded entry.
    let mut result_index = match base_tree {
        Some(oid) => Index::from_tree(oid, odb)?,
        None => Index::new(),
    };
    let mut conflicts = Vec::new();
    let mut worktree_writes = Vec::new();

    let mut all_paths: Vec<&BString> = by_path_ours.keys().chain(by_path_theirs.keys()).collect();
    all_paths.sort();
    all_paths.dedup();

    for path in all_paths {
        let da = by_path_ours.get(path).copied();
        let db = by_path_theirs.get(path).copied();

        match (da, db) {
            (None, None) => unreachable!(),

            // Ours unchanged from base; theirs has the only change.
            (None, Some(d)) => apply_one_sided(&mut result_index, path, d)?,

            // Theirs unchanged from base; ours has the only change.
            (Some(d), None) => apply_one_sided(&mut result_index, path, d)?,

            (Some(a), Some(b)) => {
                classify_both_changed(
                    odb,
                    &mut result_index,
                    &mut conflicts,
                    &mut worktree_writes,
                    path,
                    a,
                    b,
                    theirs_label,
                )?;
            }
        }
    }

    let tree = result_index.to_tree(odb)?;

    Ok(TreeMergeOutcome {
        tree,
        conflicts,
        worktree_writes,
    })
}

/// Stage the one side's resulting state (the other side left it unchanged).
fn apply_one_sided(index: &mut Index, path: &BString, diff: &FileDiff) -> Result<(), MergeError> {
    match diff.status {
        FileStatus::Deleted => {
            index.stage_deletion(path.clone());
        }
        FileStatus::Added | FileStatus::Modified => {
            let oid = diff.new_oid.expect("added/modified diff has a new oid");
            let mode = diff.new_mode.expect("added/modified diff has a new mode");
            index.stage_file(path.clone(), oid, mode, StagedState::Modified);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn classify_both_changed(
    odb: &ObjectDatabase,
    index: &mut Index,
    conflicts: &mut Vec<ConflictEntry>,
    worktree_writes: &mut Vec<(BString, Vec<u8>)>,
    path: &BString,
    a: &FileDiff,
    b: &FileDiff,
    theirs_label: &str,
) -> Result<(), MergeError> {
    use FileStatus::*;

    match (a.status, b.status) {
        // Both deleted: agree, delete.
        (Deleted, Deleted) => {
            index.stage_deletion(path.clone());
        }

        // Both added or both modified: compare results.
        (Added, Added) | (Modified, Modified) => {
            if a.new_oid == b.new_oid && a.new_mode == b.new_mode {
                let oid = a.new_oid.unwrap();
                let mode = a.new_mode.unwrap();
                index.stage_file(path.clone(), oid, mode, StagedState::Modified);
            } else {
                let base_content = match a.old_oid {
                    Some(oid) => pygit_diff::tree::read_blob(odb, &oid)?,
                    None => Vec::new(),
                };
                let ours_content = pygit_diff::tree::read_blob(odb, &a.new_oid.unwrap())?;
                let theirs_content = pygit_diff::tree::read_blob(odb, &b.new_oid.unwrap())?;

                let merged = content::merge_content(&base_content, &ours_content, &theirs_content, theirs_label);
                let mode = a.new_mode.unwrap();

                if merged.is_clean() {
                    let oid = odb.write_raw(pygit_object::ObjectType::Blob, merged.content())?;
                    index.stage_file(path.clone(), oid, mode, StagedState::Modified);
                } else {
                    let conflict_type = if a.status == Added { ConflictType::AddAdd } else { ConflictType::Content };
                    conflicts.push(ConflictEntry {
                        path: path.clone(),
                        conflict_type,
                        base: a.old_oid.map(|oid| ConflictSide { oid, mode: a.old_mode.unwrap() }),
                        ours: Some(ConflictSide { oid: a.new_oid.unwrap(), mode }),
                        theirs: Some(ConflictSide { oid: b.new_oid.unwrap(), mode: b.new_mode.unwrap() }),
                    });
                    worktree_writes.push((path.clone(), merged.content().to_vec()));
                    index.stage_deletion(path.clone());
                }
            }
        }

        // One side modified, the other deleted (in either order): keep the
        // modified content and flag a conflict.
        (Modified, Deleted) | (Deleted, Modified) => {
            let (surviving, base_side) = if a.status == Modified {
                (a, a.old_oid.zip(a.old_mode))
            } else {
                (b, b.old_oid.zip(b.old_mode))
            };
            let oid = surviving.new_oid.unwrap();
            let mode = surviving.new_mode.unwrap();
            let content = pygit_diff::tree::read_blob(odb, &oid)?;

            conflicts.push(ConflictEntry {
                path: path.clone(),
                conflict_type: ConflictType::ModifyDelete,
                base: base_side.map(|(oid, mode)| ConflictSide { oid, mode }),
                ours: if a.status == Modified { Some(ConflictSide { oid, mode }) } else { None },
                theirs: if b.status == Modified { Some(ConflictSide { oid, mode }) } else { None },
            });
            worktree_writes.push((path.clone(), content));
            index.stage_deletion(path.clone());
        }

        // Both diffs are computed against the same base tree, so one can't
        // say a path was added (absent from base) while the other says it
        // was deleted (present in base).
        (Added, Deleted) | (Deleted, Added) => unreachable!("diffs against the same base disagree on {path:?}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::ByteSlice;
    use pygit_object::{FileMode, ObjectType, Tree, TreeEntry};
    use tempfile::TempDir;

    fn make_odb() -> (TempDir, ObjectDatabase) {
        let dir = TempDir::new().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();
        (dir, odb)
    }

    fn blob(odb: &ObjectDatabase, data: &[u8]) -> ObjectId {
        odb.write_raw(ObjectType::Blob, data).unwrap()
    }

    fn tree(odb: &ObjectDatabase, entries: Vec<(&str, ObjectId, FileMode)>) -> ObjectId {
        let entries = entries
            .into_iter()
            .map(|(name, oid, mode)| TreeEntry { mode, name: BString::from(name), oid })
            .collect();
        odb.write_raw(ObjectType::Tree, &Tree { entries }.serialize_content()).unwrap()
    }

    #[test]
    fn only_ours_changed_takes_ours() {
        let (_dir, odb) = make_odb();
        let base_blob = blob(&odb, b"base\n");
        let ours_blob = blob(&odb, b"ours\n");
        let base = tree(&odb, vec![("a.txt", base_blob, FileMode::Regular)]);
        let ours = tree(&odb, vec![("a.txt", ours_blob, FileMode::Regular)]);
        let theirs = base;

        let outcome = merge_trees(&odb, Some(&base), &ours, &theirs, "feature").unwrap();
        assert!(outcome.is_clean());
        assert_eq!(outcome.tree, ours);
    }

    #[test]
    fn both_sides_modify_non_conflicting_is_clean() {
        let (_dir, odb) = make_odb();
        let base_blob = blob(&odb, b"line1\nline2\nline3\n");
        let ours_blob = blob(&odb, b"modified1\nline2\nline3\n");
        let theirs_blob = blob(&odb, b"line1\nline2\nmodified3\n");
        let base = tree(&odb, vec![("a.txt", base_blob, FileMode::Regular)]);
        let ours = tree(&odb, vec![("a.txt", ours_blob, FileMode::Regular)]);
        let theirs = tree(&odb, vec![("a.txt", theirs_blob, FileMode::Regular)]);

        let outcome = merge_trees(&odb, Some(&base), &ours, &theirs, "feature").unwrap();
        assert!(outcome.is_clean());
    }

    #[test]
    fn overlapping_content_conflict() {
        let (_dir, odb) = make_odb();
        let base_blob = blob(&odb, b"line1\n");
        let ours_blob = blob(&odb, b"ours-line\n");
        let theirs_blob = blob(&odb, b"theirs-line\n");
        let base = tree(&odb, vec![("a.txt", base_blob, FileMode::Regular)]);
        let ours = tree(&odb, vec![("a.txt", ours_blob, FileMode::Regular)]);
        let theirs = tree(&odb, vec![("a.txt", theirs_blob, FileMode::Regular)]);

        let outcome = merge_trees(&odb, Some(&base), &ours, &theirs, "feature").unwrap();
        assert!(!outcome.is_clean());
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].conflict_type, ConflictType::Content);
        assert_eq!(outcome.worktree_writes.len(), 1);
    }

    #[test]
    fn modify_delete_conflict() {
        let (_dir, odb) = make_odb();
        let base_blob = blob(&odb, b"line1\n");
        let ours_blob = blob(&odb, b"changed\n");
        let base = tree(&odb, vec![("a.txt", base_blob, FileMode::Regular)]);
        let ours = tree(&odb, vec![("a.txt", ours_blob, FileMode::Regular)]);
        let theirs = tree(&odb, vec![]);

        let outcome = merge_trees(&odb, Some(&base), &ours, &theirs, "feature").unwrap();
        assert!(!outcome.is_clean());
        assert_eq!(outcome.conflicts[0].conflict_type, ConflictType::ModifyDelete);
    }

    #[test]
    fn add_add_conflict_with_empty_base() {
        let (_dir, odb) = make_odb();
        let base = tree(&odb, vec![]);
        let ours_blob = blob(&odb, b"ours content\n");
        let theirs_blob = blob(&odb, b"theirs content\n");
        let ours = tree(&odb, vec![("new.txt", ours_blob, FileMode::Regular)]);
        let theirs = tree(&odb, vec![("new.txt", theirs_blob, FileMode::Regular)]);

        let outcome = merge_trees(&odb, Some(&base), &ours, &theirs, "feature").unwrap();
        assert!(!outcome.is_clean());
        assert_eq!(outcome.conflicts[0].conflict_type, ConflictType::AddAdd);
    }

    #[test]
    fn untouched_paths_survive_the_merge() {
        let (_dir, odb) = make_odb();
        let untouched_blob = blob(&odb, b"unrelated\n");
        let base_blob = blob(&odb, b"base\n");
        let ours_blob = blob(&odb, b"ours\n");
        let base = tree(&odb, vec![("a.txt", base_blob, FileMode::Regular), ("b.txt", untouched_blob, FileMode::Regular)]);
        let ours = tree(&odb, vec![("a.txt", ours_blob, FileMode::Regular), ("b.txt", untouched_blob, FileMode::Regular)]);
        let theirs = base;

        let outcome = merge_trees(&odb, Some(&base), &ours, &theirs, "feature").unwrap();
        assert!(outcome.is_clean());
        let restored = Index::from_tree(&outcome.tree, &odb).unwrap();
        assert!(restored.get(b"b.txt".as_bstr()).is_some(), "untouched file must survive the merge");
    }

    #[test]
    fn fast_forward_like_unborn_base() {
        let (_dir, odb) = make_odb();
        let blob_oid = blob(&odb, b"content\n");
        let ours = tree(&odb, vec![]);
        let theirs = tree(&odb, vec![("new.txt", blob_oid, FileMode::Regular)]);

        let outcome = merge_trees(&odb, None, &ours, &theirs, "feature").unwrap();
        assert!(outcome.is_clean());
        assert_eq!(outcome.tree, theirs);
    }
}
