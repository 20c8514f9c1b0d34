//! Revision expression parsing and resolution (`rev-parse`-style).
//!
//! Resolves strings like `HEAD`, `abc1234`, `main~3`, `HEAD^2^` to an object
//! id, following the resolution order: literal hex, abbreviated hex prefix,
//! `HEAD`, branch name, tag name (peeling tag objects), then ancestor/parent
//! suffixes applied left to right.

use pygit_hash::ObjectId;
use pygit_object::{Commit, Object};
use pygit_odb::ObjectDatabase;
use pygit_ref::{RefName, RefStore};

use crate::RevWalkError;

/// A single suffix operation in a revision expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionSuffix {
    /// `^` or `^N` — the Nth parent (default N=1; `^0` means the commit itself).
    Parent(u32),
    /// `~N` — the Nth first-parent ancestor (default N=1).
    Ancestor(u32),
}

/// A parsed revision expression: a base (hex id, ref name, `HEAD`) plus a
/// chain of suffixes applied left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionExpr {
    pub base: String,
    pub suffixes: Vec<RevisionSuffix>,
}

/// Parse a revision expression into its base and suffix chain.
///
/// Ref names cannot themselves contain `^` or `~` (forbidden by
/// `git-check-ref-format` rules), so the first occurrence of either
/// character unambiguously starts the suffix chain.
pub fn parse_revision(input: &str) -> Result<RevisionExpr, RevWalkError> {
    let bytes = input.as_bytes();
    let base_end = bytes.iter().position(|&b| b == b'^' || b == b'~').unwrap_or(bytes.len());
    let base = input[..base_end].to_string();
    if base.is_empty() {
        return Err(RevWalkError::BadRevision(input.to_string()));
    }

    let mut suffixes = Vec::new();
    let mut pos = base_end;
    while pos < bytes.len() {
        let (n, consumed) = parse_number(&bytes[pos + 1..]);
        match bytes[pos] {
            b'^' => suffixes.push(RevisionSuffix::Parent(n.unwrap_or(1))),
            b'~' => suffixes.push(RevisionSuffix::Ancestor(n.unwrap_or(1))),
            other => {
                return Err(RevWalkError::BadRevision(format!(
                    "unexpected character '{}' in revision '{input}'",
                    other as char
                )))
            }
        }
        pos += 1 + consumed;
    }

    Ok(RevisionExpr { base, suffixes })
}

fn parse_number(bytes: &[u8]) -> (Option<u32>, usize) {
    let mut n: u32 = 0;
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        n = n * 10 + u32::from(bytes[i] - b'0');
        i += 1;
    }
    if i == 0 {
        (None, 0)
    } else {
        (Some(n), i)
    }
}

/// Resolve a revision expression string to an object id.
pub fn resolve(odb: &ObjectDatabase, refs: &dyn RefStore, input: &str) -> Result<ObjectId, RevWalkError> {
    let expr = parse_revision(input)?;
    let mut oid = resolve_base(odb, refs, &expr.base)?;

    for suffix in &expr.suffixes {
        oid = match suffix {
            RevisionSuffix::Parent(0) => oid,
            RevisionSuffix::Parent(n) => {
                let commit = read_commit(odb, &oid)?;
                commit
                    .parents
                    .get(*n as usize - 1)
                    .copied()
                    .ok_or(RevWalkError::NoSuchParent {
                        oid,
                        requested: *n,
                        available: commit.parents.len(),
                    })?
            }
            RevisionSuffix::Ancestor(n) => {
                let mut cur = oid;
                for _ in 0..*n {
                    let commit = read_commit(odb, &cur)?;
                    cur = *commit.parents.first().ok_or(RevWalkError::NoSuchParent {
                        oid: cur,
                        requested: 1,
                        available: 0,
                    })?;
                }
                cur
            }
        };
    }

    Ok(oid)
}

fn resolve_base(odb: &ObjectDatabase, refs: &dyn RefStore, base: &str) -> Result<ObjectId, RevWalkError> {
    if base.len() == pygit_hash::OID_HEX_LEN && is_hex(base) {
        if let Ok(oid) = ObjectId::from_hex(base) {
            if odb.contains(&oid) {
                return Ok(oid);
            }
        }
    }

    if base.len() >= 4 && is_hex(base) {
        match odb.resolve_prefix(base) {
            Ok(oid) => return Ok(oid),
            Err(pygit_odb::OdbError::Ambiguous { .. }) => {
                let candidates = matching_prefix_oids(odb, base)?;
                return Err(RevWalkError::Ambiguous {
                    prefix: base.to_string(),
                    candidates,
                });
            }
            Err(pygit_odb::OdbError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    if base == "HEAD" {
        let name = RefName::new("HEAD").map_err(|_| RevWalkError::BadRevision(base.to_string()))?;
        if let Some(oid) = refs.resolve_to_oid(&name)? {
            return Ok(oid);
        }
        return Err(RevWalkError::BadRevision(base.to_string()));
    }

    let branch = RefName::new(format!("refs/heads/{base}"));
    if let Ok(name) = branch {
        if let Some(oid) = refs.resolve_to_oid(&name)? {
            return Ok(oid);
        }
    }

    let tag = RefName::new(format!("refs/tags/{base}"));
    if let Ok(name) = tag {
        if let Some(oid) = refs.resolve_to_oid(&name)? {
            return peel_tag(odb, oid);
        }
    }

    Err(RevWalkError::BadRevision(base.to_string()))
}

/// Peel a tag object chain down to the first non-tag object it references.
fn peel_tag(odb: &ObjectDatabase, mut oid: ObjectId) -> Result<ObjectId, RevWalkError> {
    loop {
        let obj = odb.read(&oid)?.ok_or(RevWalkError::ObjectNotFound(oid))?;
        match obj {
            Object::Tag(tag) => oid = tag.target,
            _ => return Ok(oid),
        }
    }
}

fn matching_prefix_oids(odb: &ObjectDatabase, prefix: &str) -> Result<Vec<ObjectId>, RevWalkError> {
    let mut matches = Vec::new();
    for result in odb.iter_all_oids()? {
        let oid = result?;
        if oid.starts_with_hex(prefix) {
            matches.push(oid);
        }
    }
    matches.sort();
    Ok(matches)
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn read_commit(odb: &ObjectDatabase, oid: &ObjectId) -> Result<Commit, RevWalkError> {
    let obj = odb.read(oid)?.ok_or(RevWalkError::CommitNotFound(*oid))?;
    match obj {
        Object::Commit(c) => Ok(c),
        _ => Err(RevWalkError::NotACommit(*oid)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pygit_object::{Blob, ObjectType, Tag};
    use pygit_ref::FilesRefStore;
    use pygit_utils::date::{GitDate, Signature};
    use tempfile::TempDir;

    fn make_odb() -> (TempDir, ObjectDatabase) {
        let dir = TempDir::new().unwrap();
        let odb = ObjectDatabase::open(dir.path().join("objects")).unwrap();
        (dir, odb)
    }

    fn make_refs(dir: &TempDir) -> FilesRefStore {
        FilesRefStore::new(dir.path().to_path_buf())
    }

    fn sig() -> Signature {
        Signature {
            name: "Test".into(),
            email: "test@example.com".into(),
            date: GitDate { timestamp: 1_700_000_000, tz_offset: 0 },
        }
    }

    fn write_commit(odb: &ObjectDatabase, tree: ObjectId, parents: Vec<ObjectId>, msg: &str) -> ObjectId {
        let commit = Commit {
            tree,
            parents,
            author: sig(),
            committer: sig(),
            encoding: None,
            gpgsig: None,
            extra_headers: Vec::new(),
            message: msg.into(),
        };
        odb.write(&Object::Commit(commit)).unwrap()
    }

    fn empty_tree(odb: &ObjectDatabase) -> ObjectId {
        odb.write(&Object::Tree(pygit_object::Tree { entries: Vec::new() })).unwrap()
    }

    #[test]
    fn parse_plain_and_suffixes() {
        assert_eq!(parse_revision("HEAD").unwrap().suffixes, vec![]);
        assert_eq!(parse_revision("HEAD^").unwrap().suffixes, vec![RevisionSuffix::Parent(1)]);
        assert_eq!(parse_revision("HEAD^2").unwrap().suffixes, vec![RevisionSuffix::Parent(2)]);
        assert_eq!(parse_revision("HEAD~3").unwrap().suffixes, vec![RevisionSuffix::Ancestor(3)]);
        assert_eq!(
            parse_revision("main~2^").unwrap(),
            RevisionExpr { base: "main".into(), suffixes: vec![RevisionSuffix::Ancestor(2), RevisionSuffix::Parent(1)] }
        );
    }

    #[test]
    fn resolve_full_hex() {
        let (_dir, odb) = make_odb();
        let oid = odb.write(&Object::Blob(Blob { data: b"x".to_vec() })).unwrap();
        let refs = TempDir::new().unwrap();
        let store = make_refs(&refs);
        assert_eq!(resolve(&odb, &store, &oid.to_hex()).unwrap(), oid);
    }

    #[test]
    fn resolve_abbreviated_prefix() {
        let (_dir, odb) = make_odb();
        let oid = odb.write(&Object::Blob(Blob { data: b"y".to_vec() })).unwrap();
        let refs = TempDir::new().unwrap();
        let store = make_refs(&refs);
        let hex = oid.to_hex();
        assert_eq!(resolve(&odb, &store, &hex[..8]).unwrap(), oid);
    }

    #[test]
    fn resolve_head_and_ancestor() {
        let (_dir, odb) = make_odb();
        let tree = empty_tree(&odb);
        let c1 = write_commit(&odb, tree, vec![], "first");
        let c2 = write_commit(&odb, tree, vec![c1], "second");
        let refs_dir = TempDir::new().unwrap();
        let store = make_refs(&refs_dir);
        store.write_ref(&RefName::new("refs/heads/main").unwrap(), &c2).unwrap();
        store.write_symbolic_ref(&RefName::new("HEAD").unwrap(), &RefName::new("refs/heads/main").unwrap()).unwrap();

        assert_eq!(resolve(&odb, &store, "HEAD").unwrap(), c2);
        assert_eq!(resolve(&odb, &store, "HEAD~1").unwrap(), c1);
        assert_eq!(resolve(&odb, &store, "main~1").unwrap(), c1);
    }

    #[test]
    fn resolve_merge_commit_parent_n() {
        let (_dir, odb) = make_odb();
        let tree = empty_tree(&odb);
        let c1 = write_commit(&odb, tree, vec![], "first");
        let c2 = write_commit(&odb, tree, vec![], "second");
        let merge = write_commit(&odb, tree, vec![c1, c2], "merge");
        let refs_dir = TempDir::new().unwrap();
        let store = make_refs(&refs_dir);

        assert_eq!(resolve(&odb, &store, &format!("{}^2", merge.to_hex())).unwrap(), c2);
    }

    #[test]
    fn resolve_tag_peels_to_commit() {
        let (_dir, odb) = make_odb();
        let tree = empty_tree(&odb);
        let c1 = write_commit(&odb, tree, vec![], "first");
        let tag = Tag {
            target: c1,
            target_type: ObjectType::Commit,
            tag_name: "v1.0".into(),
            tagger: Some(sig()),
            message: "release\n".into(),
            gpgsig: None,
        };
        let tag_oid = odb.write(&Object::Tag(tag)).unwrap();
        let refs_dir = TempDir::new().unwrap();
        let store = make_refs(&refs_dir);
        store.write_ref(&RefName::new("refs/tags/v1.0").unwrap(), &tag_oid).unwrap();

        assert_eq!(resolve(&odb, &store, "v1.0").unwrap(), c1);
    }

    #[test]
    fn unknown_name_is_bad_revision() {
        let (_dir, odb) = make_odb();
        let refs_dir = TempDir::new().unwrap();
        let store = make_refs(&refs_dir);
        assert!(matches!(resolve(&odb, &store, "nonexistent"), Err(RevWalkError::BadRevision(_))));
    }

    #[test]
    fn ambiguous_prefix_lists_candidates() {
        let (_dir, odb) = make_odb();
        let oid1 = odb.write(&Object::Blob(Blob { data: b"one".to_vec() })).unwrap();
        let oid2 = odb.write(&Object::Blob(Blob { data: b"two".to_vec() })).unwrap();
        let h1 = oid1.to_hex();
        let h2 = oid2.to_hex();
        let common_len = h1.chars().zip(h2.chars()).take_while(|(a, b)| a == b).count();
        if common_len >= 4 {
            let refs_dir = TempDir::new().unwrap();
            let store = make_refs(&refs_dir);
            let err = resolve(&odb, &store, &h1[..common_len]).unwrap_err();
            assert!(matches!(err, RevWalkError::Ambiguous { .. }));
        }
    }
}
