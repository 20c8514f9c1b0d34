//! OID prefix resolution (short hex -> full OID with ambiguity detection).
//!
//! Searches the loose object store for objects matching the given hex
//! prefix. Returns an error if the prefix is ambiguous (matches multiple
//! objects) or if no object matches.

use pygit_hash::ObjectId;

use crate::{ObjectDatabase, OdbError};

/// Minimum prefix length (matches C git's MINIMUM_ABBREV).
const MINIMUM_ABBREV: usize = 4;

/// Resolve a hex prefix to a full OID.
pub fn resolve_prefix(odb: &ObjectDatabase, prefix: &str) -> Result<ObjectId, OdbError> {
    if prefix.len() < MINIMUM_ABBREV {
        return Err(OdbError::Ambiguous {
            prefix: prefix.to_string(),
            count: 0,
        });
    }

    if !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(OdbError::NotFound(ObjectId::NULL));
    }

    // If it's a full hex OID, just check existence.
    if prefix.len() == pygit_hash::OID_HEX_LEN {
        if let Ok(oid) = ObjectId::from_hex(prefix) {
            if odb.contains(&oid) {
                return Ok(oid);
            }
            return Err(OdbError::NotFound(oid));
        }
    }

    let mut matches: Vec<ObjectId> = Vec::new();
    for result in odb.loose.iter()? {
        let oid = result?;
        if oid.starts_with_hex(prefix) {
            matches.push(oid);
        }
    }

    matches.sort();
    matches.dedup();

    match matches.len() {
        0 => Err(OdbError::NotFound(ObjectId::NULL)),
        1 => Ok(matches[0]),
        n => Err(OdbError::Ambiguous {
            prefix: prefix.to_string(),
            count: n,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pygit_object::ObjectType;

    #[test]
    fn resolves_unique_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();
        let oid = odb.write_raw(ObjectType::Blob, b"prefix test content\n").unwrap();

        let hex = oid.to_hex();
        let resolved = resolve_prefix(&odb, &hex[..8]).unwrap();
        assert_eq!(resolved, oid);
    }

    #[test]
    fn resolves_full_oid() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();
        let oid = odb.write_raw(ObjectType::Blob, b"full oid test\n").unwrap();

        let resolved = resolve_prefix(&odb, &oid.to_hex()).unwrap();
        assert_eq!(resolved, oid);
    }

    #[test]
    fn rejects_too_short_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();
        assert!(resolve_prefix(&odb, "abc").is_err());
    }

    #[test]
    fn not_found_for_unknown_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();
        assert!(resolve_prefix(&odb, "00000000").is_err());
    }

    #[test]
    fn ambiguous_prefix_matches_two_objects() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();
        let oid1 = odb.write_raw(ObjectType::Blob, b"one").unwrap();
        let oid2 = odb.write_raw(ObjectType::Blob, b"two").unwrap();

        // Find the longest common hex prefix shared by both oids, then
        // probe one character shorter than that to force ambiguity only
        // when the two objects genuinely share a prefix; otherwise this
        // is a no-op assertion that each resolves to itself.
        let h1 = oid1.to_hex();
        let h2 = oid2.to_hex();
        let common_len = h1
            .chars()
            .zip(h2.chars())
            .take_while(|(a, b)| a == b)
            .count();
        if common_len >= MINIMUM_ABBREV {
            let prefix = &h1[..common_len];
            let err = resolve_prefix(&odb, prefix).unwrap_err();
            assert!(matches!(err, OdbError::Ambiguous { .. }));
        }
    }
}
