//! Diffing the index against HEAD or the working tree.
//!
//! These operations work over primitives (an [`Index`], an [`ObjectDatabase`],
//! and a working-tree root) rather than a full repository, so that this crate
//! has no dependency on `pygit-repository` — it composes the other way.

use std::path::Path;

use bstr::ByteSlice;
use pygit_hash::ObjectId;
use pygit_index::{Index, StagedState};
use pygit_object::FileMode;
use pygit_odb::ObjectDatabase;

use crate::algorithm;
use crate::binary::is_binary;
use crate::tree::read_blob;
use crate::{DiffError, DiffOptions, DiffResult, FileDiff, FileStatus};

/// Diff the index's staged tree against the working tree (unstaged changes).
///
/// For every tracked, non-deleted entry: a missing file on disk is a
/// `Deleted` entry, and a file whose content no longer matches the staged
/// blob is a `Modified` entry. There is no stat cache, so every entry's file
/// is read and hashed.
pub fn diff_index_to_worktree(
    odb: &ObjectDatabase,
    index: &Index,
    work_tree: &Path,
    options: &DiffOptions,
) -> Result<DiffResult, DiffError> {
    let mut files = Vec::new();

    for entry in index.iter() {
        if entry.state == StagedState::Deleted {
            continue;
        }

        let fs_path = work_tree.join(entry.path.to_str_lossy().as_ref());

        if !fs_path.exists() {
            let blob_data = read_blob(odb, &entry.oid)?;
            let binary = is_binary(&blob_data);
            let hunks = if binary {
                Vec::new()
            } else {
                algorithm::diff_lines(&blob_data, &[], options.context_lines)
            };
            files.push(FileDiff {
                status: FileStatus::Deleted,
                old_path: Some(entry.path.clone()),
                new_path: None,
                old_mode: Some(entry.mode),
                new_mode: None,
                old_oid: Some(entry.oid),
                new_oid: None,
                hunks,
                is_binary: binary,
            });
            continue;
        }

        let worktree_content = std::fs::read(&fs_path)?;
        let new_oid = hash_blob(&worktree_content);
        let new_mode = file_mode_from_metadata(&std::fs::symlink_metadata(&fs_path)?);
        if new_oid == entry.oid && new_mode == entry.mode {
            continue;
        }

        let (binary, hunks) = if new_oid == entry.oid {
            // Mode-only change: content is identical, nothing to hunk.
            (false, Vec::new())
        } else {
            let blob_data = read_blob(odb, &entry.oid)?;
            let binary = is_binary(&blob_data) || is_binary(&worktree_content);
            let hunks = if binary {
                Vec::new()
            } else {
                algorithm::diff_lines(&blob_data, &worktree_content, options.context_lines)
            };
            (binary, hunks)
        };

        files.push(FileDiff {
            status: FileStatus::Modified,
            old_path: Some(entry.path.clone()),
            new_path: Some(entry.path.clone()),
            old_mode: Some(entry.mode),
            new_mode: Some(new_mode),
            old_oid: Some(entry.oid),
            new_oid: Some(new_oid),
            hunks,
            is_binary: binary,
        });
    }

    Ok(DiffResult { files })
}

/// Diff HEAD's tree against the tree implied by the index (staged changes).
///
/// `head_tree` is `None` for an unborn branch, in which case every tracked,
/// non-deleted index entry shows up as `Added`.
pub fn diff_head_to_index(
    odb: &ObjectDatabase,
    head_tree: Option<&ObjectId>,
    index: &Index,
    options: &DiffOptions,
) -> Result<DiffResult, DiffError> {
    let index_tree = index.to_tree(odb)?;
    crate::tree::diff_trees(odb, head_tree, Some(&index_tree), options)
}

/// Compute a blob OID for working tree content.
fn hash_blob(data: &[u8]) -> ObjectId {
    pygit_hash::hasher::Hasher::hash_object("blob", data)
}

/// Determine FileMode from filesystem metadata.
fn file_mode_from_metadata(meta: &std::fs::Metadata) -> FileMode {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 != 0 {
            return FileMode::Executable;
        }
    }
    FileMode::Regular
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::BString;
    use pygit_object::ObjectType;
    use tempfile::TempDir;

    fn make_odb() -> (TempDir, ObjectDatabase) {
        let dir = TempDir::new().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();
        (dir, odb)
    }

    #[test]
    fn unchanged_file_produces_no_diff() {
        let (_odb_dir, odb) = make_odb();
        let work_dir = TempDir::new().unwrap();
        std::fs::write(work_dir.path().join("a.txt"), b"hello\n").unwrap();

        let oid = odb.write_raw(ObjectType::Blob, b"hello\n").unwrap();
        let mut index = Index::new();
        index.stage_file("a.txt", oid, FileMode::Regular, StagedState::Unchanged);

        let result =
            diff_index_to_worktree(&odb, &index, work_dir.path(), &DiffOptions::default()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn modified_file_is_detected() {
        let (_odb_dir, odb) = make_odb();
        let work_dir = TempDir::new().unwrap();
        std::fs::write(work_dir.path().join("a.txt"), b"changed\n").unwrap();

        let oid = odb.write_raw(ObjectType::Blob, b"hello\n").unwrap();
        let mut index = Index::new();
        index.stage_file("a.txt", oid, FileMode::Regular, StagedState::Unchanged);

        let result =
            diff_index_to_worktree(&odb, &index, work_dir.path(), &DiffOptions::default()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].status, FileStatus::Modified);
    }

    #[cfg(unix)]
    #[test]
    fn mode_only_change_is_detected() {
        use std::os::unix::fs::PermissionsExt;

        let (_odb_dir, odb) = make_odb();
        let work_dir = TempDir::new().unwrap();
        let path = work_dir.path().join("a.txt");
        std::fs::write(&path, b"hello\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let oid = odb.write_raw(ObjectType::Blob, b"hello\n").unwrap();
        let mut index = Index::new();
        index.stage_file("a.txt", oid, FileMode::Regular, StagedState::Unchanged);

        let result =
            diff_index_to_worktree(&odb, &index, work_dir.path(), &DiffOptions::default()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].status, FileStatus::Modified);
        assert_eq!(result.files[0].new_mode, Some(FileMode::Executable));
        assert!(result.files[0].hunks.is_empty());
    }

    #[test]
    fn missing_file_is_deleted() {
        let (_odb_dir, odb) = make_odb();
        let work_dir = TempDir::new().unwrap();

        let oid = odb.write_raw(ObjectType::Blob, b"hello\n").unwrap();
        let mut index = Index::new();
        index.stage_file("a.txt", oid, FileMode::Regular, StagedState::Unchanged);

        let result =
            diff_index_to_worktree(&odb, &index, work_dir.path(), &DiffOptions::default()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].status, FileStatus::Deleted);
    }

    #[test]
    fn tombstone_entries_are_skipped() {
        let (_odb_dir, odb) = make_odb();
        let work_dir = TempDir::new().unwrap();

        let mut index = Index::new();
        index.stage_deletion("gone.txt");

        let result =
            diff_index_to_worktree(&odb, &index, work_dir.path(), &DiffOptions::default()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn staged_addition_shows_up_against_head() {
        let (_odb_dir, odb) = make_odb();
        let oid = odb.write_raw(ObjectType::Blob, b"new content\n").unwrap();
        let mut index = Index::new();
        index.stage_file("new.txt", oid, FileMode::Regular, StagedState::Added);

        let result = diff_head_to_index(&odb, None, &index, &DiffOptions::default()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].status, FileStatus::Added);
        assert_eq!(result.files[0].path(), &BString::from("new.txt"));
    }
}
