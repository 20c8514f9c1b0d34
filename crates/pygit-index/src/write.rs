//! Index file writing and tree building.

use std::path::Path;

use pygit_hash::ObjectId;
use pygit_hash::hasher::Hasher;
use pygit_object::{FileMode, ObjectType, Tree, TreeEntry};
use pygit_odb::ObjectDatabase;

use crate::entry::{IndexEntry, StagedState};
use crate::{Index, IndexError};

/// Magic bytes at the start of every index file.
const INDEX_SIGNATURE: &[u8; 4] = b"PIDX";

/// Write the index to `path` atomically using a lock file.
pub fn write_index(index: &Index, path: &Path) -> Result<(), IndexError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut lock =
        pygit_utils::lockfile::LockFile::acquire(path).map_err(|_| IndexError::LockFailed {
            path: path.to_path_buf(),
        })?;

    let data = serialize_index(index);
    std::io::Write::write_all(&mut lock, &data)?;
    lock.commit().map_err(|_| IndexError::LockFailed {
        path: path.to_path_buf(),
    })?;

    Ok(())
}

/// Serialize the index to bytes: header, entries, trailing checksum.
fn serialize_index(index: &Index) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.extend_from_slice(INDEX_SIGNATURE);
    buf.extend_from_slice(&(index.len() as u32).to_be_bytes());

    for entry in index.iter() {
        write_entry(&mut buf, entry);
    }

    let checksum = Hasher::digest(&buf);
    buf.extend_from_slice(checksum.as_bytes());

    buf
}

fn write_entry(buf: &mut Vec<u8>, entry: &IndexEntry) {
    buf.extend_from_slice(&(entry.path.len() as u32).to_be_bytes());
    buf.extend_from_slice(&entry.path);
    buf.extend_from_slice(&entry.mode.raw().to_be_bytes());
    buf.extend_from_slice(entry.oid.as_bytes());
    buf.push(entry.state.as_u8());
}

/// Build a tree hierarchy from the index's stage-0-equivalent entries
/// (everything except deletion tombstones), writing every subtree to `odb`.
pub fn write_tree_from_index(index: &Index, odb: &ObjectDatabase) -> Result<ObjectId, IndexError> {
    let entries: Vec<&IndexEntry> = index.iter().filter(|e| !e.is_deleted()).collect();

    if entries.is_empty() {
        let tree_bytes = Tree::new().serialize_content();
        return Ok(odb.write_raw(ObjectType::Tree, &tree_bytes)?);
    }

    build_tree(&entries, b"", odb)
}

/// Recursively build tree objects from path-sorted index entries, grouping
/// each run of entries by their immediate directory component.
fn build_tree(
    entries: &[&IndexEntry],
    prefix: &[u8],
    odb: &ObjectDatabase,
) -> Result<ObjectId, IndexError> {
    let mut tree_entries: Vec<TreeEntry> = Vec::new();
    let mut i = 0;

    while i < entries.len() {
        let entry = entries[i];
        let rest = &entry.path[prefix.len()..];

        if let Some(slash_pos) = rest.iter().position(|&b| b == b'/') {
            let dir_name = &rest[..slash_pos];
            let subtree_end = entries[i..]
                .iter()
                .position(|e| {
                    let p = &e.path[prefix.len()..];
                    !(p.starts_with(dir_name) && p.get(slash_pos) == Some(&b'/'))
                })
                .map(|pos| i + pos)
                .unwrap_or(entries.len());

            let subtree_entries = &entries[i..subtree_end];

            let mut new_prefix = prefix.to_vec();
            new_prefix.extend_from_slice(dir_name);
            new_prefix.push(b'/');

            let subtree_oid = build_tree(subtree_entries, &new_prefix, odb)?;

            tree_entries.push(TreeEntry {
                mode: FileMode::Tree,
                name: dir_name.into(),
                oid: subtree_oid,
            });

            i = subtree_end;
        } else {
            tree_entries.push(TreeEntry {
                mode: entry.mode,
                name: rest.into(),
                oid: entry.oid,
            });
            i += 1;
        }
    }

    let mut tree = Tree::new();
    tree.entries = tree_entries;
    tree.sort();
    let tree_bytes = tree.serialize_content();
    Ok(odb.write_raw(ObjectType::Tree, &tree_bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::BString;

    #[test]
    fn serialize_then_parse_round_trips() {
        let mut idx = Index::new();
        idx.stage_file(
            BString::from("a.txt"),
            ObjectId::NULL,
            FileMode::Regular,
            StagedState::Added,
        );
        let bytes = serialize_index(&idx);
        let parsed = crate::read::parse_index(&bytes).unwrap();
        assert_eq!(parsed.len(), 1);
    }
}
