//! Tree-to-tree diff.
//!
//! Walks two tree objects in parallel (sorted by git's tree entry order),
//! identifying added, deleted, and modified entries. Recurses into nested
//! trees, including the case where a path switches between a tree and a
//! blob.

use bstr::BString;
use pygit_hash::ObjectId;
use pygit_object::{Object, Tree, TreeEntry};
use pygit_odb::ObjectDatabase;

use crate::algorithm;
use crate::binary::is_binary;
use crate::{DiffError, DiffOptions, DiffResult, FileDiff, FileStatus};

/// Diff two trees, producing a list of file-level changes.
///
/// Either tree OID can be None to represent an empty tree (e.g., for initial commits).
pub fn diff_trees(
    odb: &ObjectDatabase,
    old_tree: Option<&ObjectId>,
    new_tree: Option<&ObjectId>,
    options: &DiffOptions,
) -> Result<DiffResult, DiffError> {
    let old = match old_tree {
        Some(oid) => Some(read_tree(odb, oid)?),
        None => None,
    };
    let new = match new_tree {
        Some(oid) => Some(read_tree(odb, oid)?),
        None => None,
    };

    let old_entries = old.as_ref().map_or(&[][..], |t| &t.entries);
    let new_entries = new.as_ref().map_or(&[][..], |t| &t.entries);

    let mut files = Vec::new();
    let prefix = BString::from("");
    diff_tree_entries(odb, old_entries, new_entries, &prefix, options, &mut files)?;

    Ok(DiffResult { files })
}

/// Read and parse a tree object from the ODB.
fn read_tree(odb: &ObjectDatabase, oid: &ObjectId) -> Result<Tree, DiffError> {
    let obj = odb
        .read(oid)
        .map_err(|e| DiffError::ObjectRead {
            oid: *oid,
            source: e,
        })?
        .ok_or(DiffError::ObjectNotFound(*oid))?;

    match obj {
        Object::Tree(tree) => Ok(tree),
        other => Err(DiffError::UnexpectedObjectType {
            oid: *oid,
            expected: "tree",
            actual: other.object_type().to_string(),
        }),
    }
}

/// Read blob data from the ODB.
pub fn read_blob(odb: &ObjectDatabase, oid: &ObjectId) -> Result<Vec<u8>, DiffError> {
    let obj = odb
        .read(oid)
        .map_err(|e| DiffError::ObjectRead {
            oid: *oid,
            source: e,
        })?
        .ok_or(DiffError::ObjectNotFound(*oid))?;

    match obj {
        Object::Blob(blob) => Ok(blob.data),
        other => Err(DiffError::UnexpectedObjectType {
            oid: *oid,
            expected: "blob",
            actual: other.object_type().to_string(),
        }),
    }
}

/// Recursively diff two sets of sorted tree entries.
fn diff_tree_entries(
    odb: &ObjectDatabase,
    old_entries: &[TreeEntry],
    new_entries: &[TreeEntry],
    prefix: &BString,
    options: &DiffOptions,
    files: &mut Vec<FileDiff>,
) -> Result<(), DiffError> {
    let mut oi = 0;
    let mut ni = 0;

    while oi < old_entries.len() || ni < new_entries.len() {
        match (old_entries.get(oi), new_entries.get(ni)) {
            (Some(old_entry), Some(new_entry)) => {
                let cmp = TreeEntry::cmp_entries(old_entry, new_entry);
                match cmp {
                    std::cmp::Ordering::Less => {
                        collect_deleted(odb, old_entry, prefix, options, files)?;
                        oi += 1;
                    }
                    std::cmp::Ordering::Greater => {
                        collect_added(odb, new_entry, prefix, options, files)?;
                        ni += 1;
                    }
                    std::cmp::Ordering::Equal => {
                        if old_entry.oid != new_entry.oid || old_entry.mode != new_entry.mode {
                            collect_modified(odb, old_entry, new_entry, prefix, options, files)?;
                        }
                        oi += 1;
                        ni += 1;
                    }
                }
            }
            (Some(old_entry), None) => {
                collect_deleted(odb, old_entry, prefix, options, files)?;
                oi += 1;
            }
            (None, Some(new_entry)) => {
                collect_added(odb, new_entry, prefix, options, files)?;
                ni += 1;
            }
            (None, None) => break,
        }
    }

    Ok(())
}

/// Build the full path for a tree entry.
fn full_path(prefix: &BString, name: &BString) -> BString {
    if prefix.is_empty() {
        name.clone()
    } else {
        let mut p = prefix.clone();
        p.push(b'/');
        p.extend_from_slice(name);
        p
    }
}

/// Collect a deleted entry (recursing into trees).
fn collect_deleted(
    odb: &ObjectDatabase,
    entry: &TreeEntry,
    prefix: &BString,
    options: &DiffOptions,
    files: &mut Vec<FileDiff>,
) -> Result<(), DiffError> {
    let path = full_path(prefix, &entry.name);

    if entry.mode.is_tree() {
        let tree = read_tree(odb, &entry.oid)?;
        diff_tree_entries(odb, &tree.entries, &[], &path, options, files)?;
    } else {
        let blob_data = read_blob(odb, &entry.oid)?;
        let binary = is_binary(&blob_data);
        let hunks = if binary {
            Vec::new()
        } else {
            algorithm::diff_lines(&blob_data, &[], options.context_lines)
        };
        files.push(FileDiff {
            status: FileStatus::Deleted,
            old_path: Some(path),
            new_path: None,
            old_mode: Some(entry.mode),
            new_mode: None,
            old_oid: Some(entry.oid),
            new_oid: None,
            hunks,
            is_binary: binary,
        });
    }
    Ok(())
}

/// Collect an added entry (recursing into trees).
fn collect_added(
    odb: &ObjectDatabase,
    entry: &TreeEntry,
    prefix: &BString,
    options: &DiffOptions,
    files: &mut Vec<FileDiff>,
) -> Result<(), DiffError> {
    let path = full_path(prefix, &entry.name);

    if entry.mode.is_tree() {
        let tree = read_tree(odb, &entry.oid)?;
        diff_tree_entries(odb, &[], &tree.entries, &path, options, files)?;
    } else {
        let blob_data = read_blob(odb, &entry.oid)?;
        let binary = is_binary(&blob_data);
        let hunks = if binary {
            Vec::new()
        } else {
            algorithm::diff_lines(&[], &blob_data, options.context_lines)
        };
        files.push(FileDiff {
            status: FileStatus::Added,
            old_path: None,
            new_path: Some(path),
            old_mode: None,
            new_mode: Some(entry.mode),
            old_oid: None,
            new_oid: Some(entry.oid),
            hunks,
            is_binary: binary,
        });
    }
    Ok(())
}

/// Collect a modified entry, or one whose path switched between tree and blob.
fn collect_modified(
    odb: &ObjectDatabase,
    old_entry: &TreeEntry,
    new_entry: &TreeEntry,
    prefix: &BString,
    options: &DiffOptions,
    files: &mut Vec<FileDiff>,
) -> Result<(), DiffError> {
    let path = full_path(prefix, &old_entry.name);

    let old_is_tree = old_entry.mode.is_tree();
    let new_is_tree = new_entry.mode.is_tree();

    if old_is_tree && new_is_tree {
        let old_tree = read_tree(odb, &old_entry.oid)?;
        let new_tree = read_tree(odb, &new_entry.oid)?;
        diff_tree_entries(odb, &old_tree.entries, &new_tree.entries, &path, options, files)?;
    } else if old_is_tree && !new_is_tree {
        // Tree replaced by file: delete tree contents, add file
        let old_tree = read_tree(odb, &old_entry.oid)?;
        diff_tree_entries(odb, &old_tree.entries, &[], &path, options, files)?;
        let blob_data = read_blob(odb, &new_entry.oid)?;
        let binary = is_binary(&blob_data);
        let hunks = if binary {
            Vec::new()
        } else {
            algorithm::diff_lines(&[], &blob_data, options.context_lines)
        };
        files.push(FileDiff {
            status: FileStatus::Added,
            old_path: None,
            new_path: Some(path),
            old_mode: None,
            new_mode: Some(new_entry.mode),
            old_oid: None,
            new_oid: Some(new_entry.oid),
            hunks,
            is_binary: binary,
        });
    } else if !old_is_tree && new_is_tree {
        // File replaced by tree: delete file, add tree contents
        let blob_data = read_blob(odb, &old_entry.oid)?;
        let binary = is_binary(&blob_data);
        let hunks = if binary {
            Vec::new()
        } else {
            algorithm::diff_lines(&blob_data, &[], options.context_lines)
        };
        files.push(FileDiff {
            status: FileStatus::Deleted,
            old_path: Some(path.clone()),
            new_path: None,
            old_mode: Some(old_entry.mode),
            new_mode: None,
            old_oid: Some(old_entry.oid),
            new_oid: None,
            hunks,
            is_binary: binary,
        });
        let new_tree = read_tree(odb, &new_entry.oid)?;
        diff_tree_entries(odb, &[], &new_tree.entries, &path, options, files)?;
    } else {
        // Both blobs: a content and/or mode change
        let old_data = read_blob(odb, &old_entry.oid)?;
        let new_data = read_blob(odb, &new_entry.oid)?;
        let binary = is_binary(&old_data) || is_binary(&new_data);
        let hunks = if binary {
            Vec::new()
        } else {
            algorithm::diff_lines(&old_data, &new_data, options.context_lines)
        };

        files.push(FileDiff {
            status: FileStatus::Modified,
            old_path: Some(path.clone()),
            new_path: Some(path),
            old_mode: Some(old_entry.mode),
            new_mode: Some(new_entry.mode),
            old_oid: Some(old_entry.oid),
            new_oid: Some(new_entry.oid),
            hunks,
            is_binary: binary,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pygit_object::{FileMode, ObjectType};
    use tempfile::TempDir;

    fn make_odb() -> (TempDir, ObjectDatabase) {
        let dir = TempDir::new().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();
        (dir, odb)
    }

    fn write_tree(odb: &ObjectDatabase, entries: Vec<TreeEntry>) -> ObjectId {
        let tree = Tree { entries };
        odb.write_raw(ObjectType::Tree, &tree.serialize_content()).unwrap()
    }

    fn write_blob(odb: &ObjectDatabase, content: &[u8]) -> ObjectId {
        odb.write_raw(ObjectType::Blob, content).unwrap()
    }

    #[test]
    fn diff_trees_detects_added_file() {
        let (_dir, odb) = make_odb();
        let old_tree = write_tree(&odb, vec![]);
        let blob = write_blob(&odb, b"hello\n");
        let new_tree = write_tree(
            &odb,
            vec![TreeEntry {
                mode: FileMode::Regular,
                name: BString::from("a.txt"),
                oid: blob,
            }],
        );

        let result = diff_trees(&odb, Some(&old_tree), Some(&new_tree), &DiffOptions::default()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].status, FileStatus::Added);
        assert_eq!(result.files[0].path().to_string(), "a.txt");
    }

    #[test]
    fn diff_trees_detects_deleted_file() {
        let (_dir, odb) = make_odb();
        let blob = write_blob(&odb, b"hello\n");
        let old_tree = write_tree(
            &odb,
            vec![TreeEntry {
                mode: FileMode::Regular,
                name: BString::from("a.txt"),
                oid: blob,
            }],
        );
        let new_tree = write_tree(&odb, vec![]);

        let result = diff_trees(&odb, Some(&old_tree), Some(&new_tree), &DiffOptions::default()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].status, FileStatus::Deleted);
    }

    #[test]
    fn diff_trees_detects_modified_content() {
        let (_dir, odb) = make_odb();
        let old_blob = write_blob(&odb, b"hello\n");
        let new_blob = write_blob(&odb, b"goodbye\n");
        let old_tree = write_tree(
            &odb,
            vec![TreeEntry { mode: FileMode::Regular, name: BString::from("a.txt"), oid: old_blob }],
        );
        let new_tree = write_tree(
            &odb,
            vec![TreeEntry { mode: FileMode::Regular, name: BString::from("a.txt"), oid: new_blob }],
        );

        let result = diff_trees(&odb, Some(&old_tree), Some(&new_tree), &DiffOptions::default()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].status, FileStatus::Modified);
        assert_eq!(result.files[0].hunks.len(), 1);
    }

    #[test]
    fn diff_trees_mode_only_change_is_modified() {
        let (_dir, odb) = make_odb();
        let blob = write_blob(&odb, b"#!/bin/sh\n");
        let old_tree = write_tree(
            &odb,
            vec![TreeEntry { mode: FileMode::Regular, name: BString::from("run.sh"), oid: blob }],
        );
        let new_tree = write_tree(
            &odb,
            vec![TreeEntry { mode: FileMode::Executable, name: BString::from("run.sh"), oid: blob }],
        );

        let result = diff_trees(&odb, Some(&old_tree), Some(&new_tree), &DiffOptions::default()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].status, FileStatus::Modified);
        assert!(result.files[0].hunks.is_empty());
    }

    #[test]
    fn diff_trees_recurses_into_subdirectories() {
        let (_dir, odb) = make_odb();
        let blob = write_blob(&odb, b"nested\n");
        let inner_old = write_tree(&odb, vec![]);
        let inner_new = write_tree(
            &odb,
            vec![TreeEntry { mode: FileMode::Regular, name: BString::from("f.txt"), oid: blob }],
        );
        let old_tree = write_tree(
            &odb,
            vec![TreeEntry { mode: FileMode::Tree, name: BString::from("dir"), oid: inner_old }],
        );
        let new_tree = write_tree(
            &odb,
            vec![TreeEntry { mode: FileMode::Tree, name: BString::from("dir"), oid: inner_new }],
        );

        let result = diff_trees(&odb, Some(&old_tree), Some(&new_tree), &DiffOptions::default()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].path().to_string(), "dir/f.txt");
        assert_eq!(result.files[0].status, FileStatus::Added);
    }

    #[test]
    fn diff_trees_file_replaced_by_tree() {
        let (_dir, odb) = make_odb();
        let old_blob = write_blob(&odb, b"was a file\n");
        let new_blob = write_blob(&odb, b"now nested\n");
        let old_tree = write_tree(
            &odb,
            vec![TreeEntry { mode: FileMode::Regular, name: BString::from("x"), oid: old_blob }],
        );
        let inner = write_tree(
            &odb,
            vec![TreeEntry { mode: FileMode::Regular, name: BString::from("y"), oid: new_blob }],
        );
        let new_tree = write_tree(
            &odb,
            vec![TreeEntry { mode: FileMode::Tree, name: BString::from("x"), oid: inner }],
        );

        let result = diff_trees(&odb, Some(&old_tree), Some(&new_tree), &DiffOptions::default()).unwrap();
        assert_eq!(result.files.len(), 2);
        assert!(result.files.iter().any(|f| f.status == FileStatus::Deleted && f.path().to_string() == "x"));
        assert!(result.files.iter().any(|f| f.status == FileStatus::Added && f.path().to_string() == "x/y"));
    }

    #[test]
    fn diff_trees_both_empty_is_empty() {
        let (_dir, odb) = make_odb();
        let result = diff_trees(&odb, None, None, &DiffOptions::default()).unwrap();
        assert!(result.is_empty());
    }
}
