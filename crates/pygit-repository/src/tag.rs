//! Tag creation and listing (`refs/tags/*`).
//!
//! Lightweight tags are a direct ref pointing at any object; annotated tags
//! additionally store a tag object with a message and tagger identity.

use bstr::BString;
use pygit_hash::ObjectId;
use pygit_object::{Object, Tag};
use pygit_ref::{RefName, RefStore};

use crate::{RepoError, Repository};

/// One tag and the object it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSummary {
    pub name: String,
    /// The tag ref's direct target: the tag object itself for annotated
    /// tags, or the tagged object directly for lightweight tags.
    pub oid: ObjectId,
    pub annotated: bool,
}

/// List every tag under `refs/tags/`, sorted by name.
pub fn tag_list(repo: &Repository) -> Result<Vec<TagSummary>, RepoError> {
    let mut tags = Vec::new();
    for result in repo.refs().iter(Some("refs/tags/"))? {
        let reference = result?;
        if let Some(oid) = reference.target_oid() {
            let name = reference.name().short_name().to_string();
            let annotated = matches!(repo.odb().read_header(&oid)?, Some(info) if info.obj_type == pygit_object::ObjectType::Tag);
            tags.push(TagSummary { name, oid, annotated });
        }
    }
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tags)
}

/// Create a tag named `name` pointing at `target` (or the current commit, if
/// `target` is `None`).
///
/// When `message` is `Some`, an annotated tag object is written and the ref
/// points at it; otherwise a lightweight tag points directly at the target.
pub fn tag_create(
    repo: &Repository,
    name: &str,
    target: Option<&str>,
    message: Option<impl Into<BString>>,
) -> Result<ObjectId, RepoError> {
    let target_oid = match target {
        Some(rev) => repo.resolve(rev)?,
        None => repo.head_oid()?.ok_or(RepoError::PathNotTracked("HEAD".to_string()))?,
    };

    let tag_ref = RefName::new(format!("refs/tags/{name}"))?;
    if repo.refs().resolve_to_oid(&tag_ref)?.is_some() {
        return Err(RepoError::RefExists(name.to_string()));
    }

    let ref_target = match message {
        Some(message) => {
            let target_type = repo
                .odb()
                .read_header(&target_oid)?
                .ok_or(pygit_odb::OdbError::NotFound(target_oid))?
                .obj_type;
            let tag = Tag {
                target: target_oid,
                target_type,
                tag_name: BString::from(name),
                tagger: Some(repo.signature()?),
                message: message.into(),
                gpgsig: None,
            };
            repo.odb().write(&Object::Tag(tag))?
        }
        None => target_oid,
    };

    repo.refs().write_ref(&tag_ref, &ref_target)?;
    Ok(ref_target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::{commit, CommitOptions};
    use tempfile::TempDir;

    fn init_with_commit(dir: &TempDir) -> Repository {
        let mut repo = Repository::init(dir.path()).unwrap();
        repo.config_mut().set_string("user.name", "Test").unwrap();
        repo.config_mut().set_string("user.email", "t@example.com").unwrap();
        commit(&mut repo, "initial\n", &CommitOptions::default()).unwrap();
        repo
    }

    #[test]
    fn lightweight_tag_points_at_commit() {
        let dir = TempDir::new().unwrap();
        let repo = init_with_commit(&dir);
        let head = repo.head_oid().unwrap().unwrap();

        let oid = tag_create(&repo, "v1", None, None::<String>).unwrap();
        assert_eq!(oid, head);

        let tags = tag_list(&repo).unwrap();
        assert_eq!(tags.len(), 1);
        assert!(!tags[0].annotated);
    }

    #[test]
    fn annotated_tag_wraps_commit() {
        let dir = TempDir::new().unwrap();
        let repo = init_with_commit(&dir);
        let head = repo.head_oid().unwrap().unwrap();

        let oid = tag_create(&repo, "v1", None, Some("release\n")).unwrap();
        assert_ne!(oid, head);

        let tags = tag_list(&repo).unwrap();
        assert!(tags[0].annotated);

        match repo.odb().read(&oid).unwrap().unwrap() {
            Object::Tag(tag) => assert_eq!(tag.target, head),
            _ => panic!("expected tag object"),
        }
    }

    #[test]
    fn cannot_create_duplicate_tag() {
        let dir = TempDir::new().unwrap();
        let repo = init_with_commit(&dir);
        tag_create(&repo, "v1", None, None::<String>).unwrap();
        let err = tag_create(&repo, "v1", None, None::<String>).unwrap_err();
        assert!(matches!(err, RepoError::RefExists(_)));
    }
}
