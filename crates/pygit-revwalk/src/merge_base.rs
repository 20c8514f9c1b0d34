//! Merge-base computation using the paint algorithm.
//!
//! Marks commits reachable from each input with a distinct color; a commit
//! painted with both colors is a common ancestor. Redundant ancestors (a
//! base that is itself an ancestor of another base) are then dropped,
//! leaving only the lowest common ancestor(s).

use std::collections::{HashSet, VecDeque};

use pygit_hash::ObjectId;
use pygit_object::{Commit, Object};
use pygit_odb::ObjectDatabase;

use crate::RevWalkError;

const PARENT_A: u8 = 1;
const PARENT_B: u8 = 2;

/// Find all lowest common ancestors of `a` and `b`.
///
/// If several candidates exist (a criss-cross merge), all are returned,
/// sorted by object id so ties are resolved deterministically by the
/// caller (smallest id wins).
pub fn merge_base(odb: &ObjectDatabase, a: &ObjectId, b: &ObjectId) -> Result<Vec<ObjectId>, RevWalkError> {
    if a == b {
        return Ok(vec![*a]);
    }

    let candidates = paint_down_to_common(odb, a, b)?;
    remove_redundant(odb, candidates)
}

/// The single best merge base, picking the lexicographically smallest
/// object id among ties (criss-cross merges).
pub fn merge_base_one(odb: &ObjectDatabase, a: &ObjectId, b: &ObjectId) -> Result<Option<ObjectId>, RevWalkError> {
    let mut bases = merge_base(odb, a, b)?;
    bases.sort();
    Ok(bases.into_iter().next())
}

/// Whether `ancestor` is reachable from `descendant` by following parents.
pub fn is_ancestor(odb: &ObjectDatabase, ancestor: &ObjectId, descendant: &ObjectId) -> Result<bool, RevWalkError> {
    if ancestor == descendant {
        return Ok(true);
    }
    reachable_from(odb, descendant, ancestor)
}

fn paint_down_to_common(odb: &ObjectDatabase, a: &ObjectId, b: &ObjectId) -> Result<Vec<ObjectId>, RevWalkError> {
    let mut flags: std::collections::HashMap<ObjectId, u8> = std::collections::HashMap::new();
    let mut queue: VecDeque<ObjectId> = VecDeque::new();
    let mut results = Vec::new();

    flags.insert(*a, PARENT_A);
    flags.insert(*b, PARENT_B);
    queue.push_back(*a);
    queue.push_back(*b);

    let mut enqueued: HashSet<ObjectId> = [*a, *b].into_iter().collect();

    while let Some(oid) = queue.pop_front() {
        let current = *flags.get(&oid).unwrap_or(&0);
        if current == (PARENT_A | PARENT_B) {
            if !results.contains(&oid) {
                results.push(oid);
            }
            // Common ancestors of a common ancestor are redundant; don't
            // walk further up from here.
            continue;
        }

        let commit = read_commit(odb, &oid)?;
        for parent in &commit.parents {
            let parent_flags = flags.entry(*parent).or_insert(0);
            let merged = *parent_flags | current;
            if merged != *parent_flags || enqueued.insert(*parent) {
                *parent_flags = merged;
                queue.push_back(*parent);
            }
        }
    }

    Ok(results)
}

fn remove_redundant(odb: &ObjectDatabase, bases: Vec<ObjectId>) -> Result<Vec<ObjectId>, RevWalkError> {
    if bases.len() <= 1 {
        return Ok(bases);
    }

    let mut dropped: HashSet<usize> = HashSet::new();
    for i in 0..bases.len() {
        if dropped.contains(&i) {
            continue;
        }
        for j in (i + 1)..bases.len() {
            if dropped.contains(&j) {
                continue;
            }
            if reachable_from(odb, &bases[j], &bases[i])? {
                dropped.insert(i);
                break;
            } else if reachable_from(odb, &bases[i], &bases[j])? {
                dropped.insert(j);
            }
        }
    }

    Ok(bases.into_iter().enumerate().filter(|(i, _)| !dropped.contains(i)).map(|(_, oid)| oid).collect())
}

/// Whether `target` is reachable from `start` by following parent links.
fn reachable_from(odb: &ObjectDatabase, start: &ObjectId, target: &ObjectId) -> Result<bool, RevWalkError> {
    if start == target {
        return Ok(true);
    }
    let mut queue = VecDeque::from([*start]);
    let mut visited: HashSet<ObjectId> = [*start].into_iter().collect();

    while let Some(oid) = queue.pop_front() {
        let commit = read_commit(odb, &oid)?;
        for parent in &commit.parents {
            if parent == target {
                return Ok(true);
            }
            if visited.insert(*parent) {
                queue.push_back(*parent);
            }
        }
    }

    Ok(false)
}

fn read_commit(odb: &ObjectDatabase, oid: &ObjectId) -> Result<Commit, RevWalkError> {
    let obj = odb.read(oid)?.ok_or(RevWalkError::CommitNotFound(*oid))?;
    match obj {
        Object::Commit(c) => Ok(c),
        _ => Err(RevWalkError::NotACommit(*oid)),
    }
}
