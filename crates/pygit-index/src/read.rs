//! Index file reading and tree flattening.

use bstr::BString;
use pygit_hash::ObjectId;
use pygit_hash::hasher::Hasher;
use pygit_object::{FileMode, Object};
use pygit_odb::ObjectDatabase;

use crate::entry::{IndexEntry, StagedState};
use crate::{Index, IndexError};

const INDEX_SIGNATURE: &[u8; 4] = b"PIDX";
const OID_LEN: usize = 20;

/// Parse an index file from raw bytes.
pub fn parse_index(data: &[u8]) -> Result<Index, IndexError> {
    if data.len() < 8 + OID_LEN {
        return Err(IndexError::InvalidHeader("index file too short".into()));
    }

    verify_checksum(data)?;

    let mut cursor = 0;

    let sig = &data[cursor..cursor + 4];
    if sig != INDEX_SIGNATURE {
        return Err(IndexError::InvalidHeader(format!(
            "bad signature: expected PIDX, got {sig:?}"
        )));
    }
    cursor += 4;

    let entry_count = read_u32(&data[cursor..]) as usize;
    cursor += 4;

    let content_end = data.len() - OID_LEN;
    let mut entries = Vec::with_capacity(entry_count);

    for _ in 0..entry_count {
        let (entry, new_cursor) = parse_entry(data, cursor, content_end)?;
        entries.push(entry);
        cursor = new_cursor;
    }

    Ok(Index { entries })
}

fn parse_entry(data: &[u8], start: usize, content_end: usize) -> Result<(IndexEntry, usize), IndexError> {
    let mut cursor = start;

    if cursor + 4 > content_end {
        return Err(IndexError::InvalidEntry {
            offset: start,
            reason: "truncated path length".into(),
        });
    }
    let path_len = read_u32(&data[cursor..]) as usize;
    cursor += 4;

    if cursor + path_len + 4 + OID_LEN + 1 > content_end {
        return Err(IndexError::InvalidEntry {
            offset: start,
            reason: "truncated entry".into(),
        });
    }

    let path = BString::from(&data[cursor..cursor + path_len]);
    cursor += path_len;

    let mode_raw = read_u32(&data[cursor..]);
    let mode = FileMode::from_raw(mode_raw).ok_or_else(|| IndexError::InvalidEntry {
        offset: start,
        reason: format!("invalid mode: {mode_raw:o}"),
    })?;
    cursor += 4;

    let oid = ObjectId::from_bytes(&data[cursor..cursor + OID_LEN])?;
    cursor += OID_LEN;

    let state_raw = data[cursor];
    let state = StagedState::from_u8(state_raw).ok_or_else(|| IndexError::InvalidEntry {
        offset: start,
        reason: format!("invalid staged state: {state_raw}"),
    })?;
    cursor += 1;

    Ok((IndexEntry { path, oid, mode, state }, cursor))
}

fn verify_checksum(data: &[u8]) -> Result<(), IndexError> {
    let content = &data[..data.len() - OID_LEN];
    let stored = &data[data.len() - OID_LEN..];
    let computed = Hasher::digest(content);
    if computed.as_bytes().as_slice() != stored {
        return Err(IndexError::ChecksumMismatch);
    }
    Ok(())
}

fn read_u32(data: &[u8]) -> u32 {
    u32::from_be_bytes([data[0], data[1], data[2], data[3]])
}

/// Recursively flatten a tree object into a path-sorted list of index
/// entries, all marked `Unchanged` (they are read directly from the tree).
pub fn flatten_tree(tree_id: &ObjectId, odb: &ObjectDatabase) -> Result<Vec<IndexEntry>, IndexError> {
    let mut entries = Vec::new();
    flatten_into(tree_id, b"", odb, &mut entries)?;
    entries.sort_by(|a: &IndexEntry, b: &IndexEntry| a.path.cmp(&b.path));
    Ok(entries)
}

fn flatten_into(
    tree_id: &ObjectId,
    prefix: &[u8],
    odb: &ObjectDatabase,
    out: &mut Vec<IndexEntry>,
) -> Result<(), IndexError> {
    let obj = odb.read(tree_id)?.ok_or(IndexError::NotATree(*tree_id))?;
    let tree = match obj {
        Object::Tree(t) => t,
        _ => return Err(IndexError::NotATree(*tree_id)),
    };

    for entry in tree.iter() {
        let mut path = prefix.to_vec();
        path.extend_from_slice(&entry.name);

        if entry.mode.is_tree() {
            path.push(b'/');
            flatten_into(&entry.oid, &path, odb, out)?;
        } else {
            out.push(IndexEntry {
                path: BString::from(path),
                oid: entry.oid,
                mode: entry.mode,
                state: StagedState::Unchanged,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pygit_object::ObjectType;

    #[test]
    fn flatten_tree_walks_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();

        let blob = odb.write_raw(ObjectType::Blob, b"x").unwrap();

        let mut inner = pygit_object::Tree::new();
        inner.entries.push(pygit_object::TreeEntry {
            mode: FileMode::Regular,
            name: "nested.txt".into(),
            oid: blob,
        });
        let inner_oid = odb
            .write_raw(ObjectType::Tree, &inner.serialize_content())
            .unwrap();

        let mut root = pygit_object::Tree::new();
        root.entries.push(pygit_object::TreeEntry {
            mode: FileMode::Tree,
            name: "dir".into(),
            oid: inner_oid,
        });
        root.entries.push(pygit_object::TreeEntry {
            mode: FileMode::Regular,
            name: "top.txt".into(),
            oid: blob,
        });
        let root_oid = odb
            .write_raw(ObjectType::Tree, &root.serialize_content())
            .unwrap();

        let entries = flatten_tree(&root_oid, &odb).unwrap();
        let paths: Vec<String> = entries.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["dir/nested.txt", "top.txt"]);
    }

    #[test]
    fn parse_rejects_bad_checksum() {
        let mut bytes = vec![];
        bytes.extend_from_slice(INDEX_SIGNATURE);
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&[0u8; OID_LEN]);
        assert!(matches!(
            parse_index(&bytes),
            Err(IndexError::ChecksumMismatch)
        ));
    }
}
