//! First-parent history walk, as used by `log`.

use pygit_hash::ObjectId;
use pygit_object::{Commit, Object};
use pygit_odb::ObjectDatabase;

use crate::RevWalkError;

/// Options controlling a first-parent walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    /// Stop after this many commits (`log -n <N>`).
    pub max_count: Option<usize>,
}

/// Iterator over a commit's first-parent ancestry, starting at the commit
/// itself and walking `parents[0]` until a root commit is reached.
pub struct FirstParentWalk<'a> {
    odb: &'a ObjectDatabase,
    next: Option<ObjectId>,
    emitted: usize,
    max_count: Option<usize>,
}

impl<'a> FirstParentWalk<'a> {
    /// Start a walk at `start` (typically the oid HEAD resolves to).
    pub fn new(odb: &'a ObjectDatabase, start: ObjectId, options: WalkOptions) -> Self {
        Self {
            odb,
            next: Some(start),
            emitted: 0,
            max_count: options.max_count,
        }
    }

    fn read_commit(&self, oid: &ObjectId) -> Result<Commit, RevWalkError> {
        let obj = self.odb.read(oid)?.ok_or(RevWalkError::CommitNotFound(*oid))?;
        match obj {
            Object::Commit(c) => Ok(c),
            _ => Err(RevWalkError::NotACommit(*oid)),
        }
    }
}

impl Iterator for FirstParentWalk<'_> {
    type Item = Result<(ObjectId, Commit), RevWalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(max) = self.max_count {
            if self.emitted >= max {
                return None;
            }
        }

        let oid = self.next.take()?;
        let commit = match self.read_commit(&oid) {
            Ok(c) => c,
            Err(e) => return Some(Err(e)),
        };

        self.next = commit.parents.first().copied();
        self.emitted += 1;
        Some(Ok((oid, commit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pygit_object::Tree;
    use pygit_utils::date::{GitDate, Signature};
    use tempfile::TempDir;

    fn make_odb() -> (TempDir, ObjectDatabase) {
        let dir = TempDir::new().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();
        (dir, odb)
    }

    fn sig() -> Signature {
        Signature {
            name: "Test".into(),
            email: "test@example.com".into(),
            date: GitDate { timestamp: 1_700_000_000, tz_offset: 0 },
        }
    }

    fn commit(odb: &ObjectDatabase, parents: Vec<ObjectId>, message: &str) -> ObjectId {
        let tree = odb.write(&Object::Tree(Tree { entries: Vec::new() })).unwrap();
        odb.write(&Object::Commit(Commit {
            tree,
            parents,
            author: sig(),
            committer: sig(),
            encoding: None,
            gpgsig: None,
            extra_headers: Vec::new(),
            message: message.into(),
        }))
        .unwrap()
    }

    #[test]
    fn walks_first_parent_chain_to_root() {
        let (_dir, odb) = make_odb();
        let root = commit(&odb, vec![], "root\n");
        let mid = commit(&odb, vec![root], "mid\n");
        let tip = commit(&odb, vec![mid], "tip\n");

        let walked: Vec<ObjectId> = FirstParentWalk::new(&odb, tip, WalkOptions::default())
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(walked, vec![tip, mid, root]);
    }

    #[test]
    fn ignores_second_parent_of_merge_commits() {
        let (_dir, odb) = make_odb();
        let root = commit(&odb, vec![], "root\n");
        let side = commit(&odb, vec![root], "side\n");
        let main = commit(&odb, vec![root], "main\n");
        let merge = commit(&odb, vec![main, side], "merge\n");

        let walked: Vec<ObjectId> = FirstParentWalk::new(&odb, merge, WalkOptions::default())
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(walked, vec![merge, main, root]);
    }

    #[test]
    fn respects_max_count() {
        let (_dir, odb) = make_odb();
        let root = commit(&odb, vec![], "root\n");
        let mid = commit(&odb, vec![root], "mid\n");
        let tip = commit(&odb, vec![mid], "tip\n");

        let walked: Vec<ObjectId> = FirstParentWalk::new(&odb, tip, WalkOptions { max_count: Some(2) })
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(walked, vec![tip, mid]);
    }
}
