//! Rebase replay state.
//!
//! A rebase replays a linear run of commits onto a new base, one at a time,
//! via the same three-way tree merge used by `merge`: for each commit `C`,
//! the merge base is `C`'s first parent, "ours" is the current rebase head,
//! and "theirs" is `C`. This module only tracks which commits remain and
//! where the rebase is headed; `pygit-repository` drives the replay loop
//! and owns `REBASE_HEAD`.

use std::fs;
use std::path::Path;

use pygit_hash::ObjectId;

use crate::MergeError;

/// Persisted state of an in-progress rebase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseState {
    /// The commit being rebased onto.
    pub onto: ObjectId,
    /// The original branch tip, restored on `--abort`.
    pub original_head: ObjectId,
    /// Commits still to be replayed, oldest first.
    pub remaining: Vec<ObjectId>,
}

impl RebaseState {
    /// Start a new rebase with the given commits queued for replay.
    pub fn new(onto: ObjectId, original_head: ObjectId, commits: Vec<ObjectId>) -> Self {
        Self {
            onto,
            original_head,
            remaining: commits,
        }
    }

    /// Whether every commit has been replayed.
    pub fn is_done(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Take the next commit to replay without removing it; the caller
    /// removes it via `advance` once the replay succeeds (or stays paused
    /// on conflict so `--continue` can retry the same commit).
    pub fn next(&self) -> Option<ObjectId> {
        self.remaining.first().copied()
    }

    /// Drop the commit just replayed and advance `onto` to its rewritten form.
    pub fn advance(&mut self, new_onto: ObjectId) {
        if !self.remaining.is_empty() {
            self.remaining.remove(0);
        }
        self.onto = new_onto;
    }

    /// Serialize to the on-disk format: `onto`, `original_head`, then one
    /// remaining commit OID per line.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(&self.onto.to_hex());
        out.push('\n');
        out.push_str(&self.original_head.to_hex());
        out.push('\n');
        for oid in &self.remaining {
            out.push_str(&oid.to_hex());
            out.push('\n');
        }
        out.into_bytes()
    }

    /// Parse the on-disk format written by `to_bytes`.
    pub fn parse(data: &[u8]) -> Result<Self, MergeError> {
        let text = std::str::from_utf8(data)
            .map_err(|_| MergeError::InvalidRebaseState("not valid utf-8".into()))?;
        let mut lines = text.lines();

        let onto = lines
            .next()
            .ok_or_else(|| MergeError::InvalidRebaseState("missing onto line".into()))?;
        let onto = ObjectId::from_hex(onto)
            .map_err(|e| MergeError::InvalidRebaseState(format!("invalid onto oid: {e}")))?;

        let original_head = lines
            .next()
            .ok_or_else(|| MergeError::InvalidRebaseState("missing original_head line".into()))?;
        let original_head = ObjectId::from_hex(original_head)
            .map_err(|e| MergeError::InvalidRebaseState(format!("invalid original_head oid: {e}")))?;

        let mut remaining = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let oid = ObjectId::from_hex(line)
                .map_err(|e| MergeError::InvalidRebaseState(format!("invalid remaining oid: {e}")))?;
            remaining.push(oid);
        }

        Ok(Self {
            onto,
            original_head,
            remaining,
        })
    }

    /// Write this state to `path` (typically `.pygit/rebase-merge/state`).
    pub fn save_to(&self, path: &Path) -> Result<(), MergeError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// Read a previously saved rebase state.
    pub fn load_from(path: &Path) -> Result<Self, MergeError> {
        let data = fs::read(path)?;
        Self::parse(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn oid(byte: u8) -> ObjectId {
        ObjectId::from_bytes(&[byte; 20]).unwrap()
    }

    #[test]
    fn advance_pops_and_updates_onto() {
        let mut state = RebaseState::new(oid(1), oid(2), vec![oid(3), oid(4)]);
        assert_eq!(state.next(), Some(oid(3)));
        state.advance(oid(10));
        assert_eq!(state.onto, oid(10));
        assert_eq!(state.next(), Some(oid(4)));
        assert!(!state.is_done());
        state.advance(oid(11));
        assert!(state.is_done());
        assert_eq!(state.next(), None);
    }

    #[test]
    fn roundtrip_through_bytes() {
        let state = RebaseState::new(oid(1), oid(2), vec![oid(3), oid(4)]);
        let bytes = state.to_bytes();
        let parsed = RebaseState::parse(&bytes).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rebase-merge/state");
        let state = RebaseState::new(oid(5), oid(6), vec![oid(7)]);
        state.save_to(&path).unwrap();
        let loaded = RebaseState::load_from(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn empty_remaining_is_done() {
        let state = RebaseState::new(oid(1), oid(2), Vec::new());
        assert!(state.is_done());
    }

    #[test]
    fn parse_rejects_truncated_input() {
        let err = RebaseState::parse(b"").unwrap_err();
        assert!(matches!(err, MergeError::InvalidRebaseState(_)));
    }
}
