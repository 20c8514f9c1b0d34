//! Unified object database.
//!
//! Provides a single interface to read and write objects. This is the
//! primary abstraction that all higher-level pygit operations use to access
//! objects in the `.pygit/objects` directory.

pub mod prefix;

use std::path::{Path, PathBuf};

use pygit_hash::ObjectId;
use pygit_loose::LooseObjectStore;
use pygit_object::{Object, ObjectType};

pub use error::OdbError;

mod error {
    use pygit_hash::ObjectId;

    #[derive(Debug, thiserror::Error)]
    pub enum OdbError {
        #[error("object not found: {0}")]
        NotFound(ObjectId),

        #[error("ambiguous object name: {prefix} matches {count} objects")]
        Ambiguous { prefix: String, count: usize },

        #[error(transparent)]
        Loose(#[from] pygit_loose::LooseError),

        #[error(transparent)]
        Io(#[from] std::io::Error),
    }
}

/// Lightweight object info (header only, no content).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub obj_type: ObjectType,
    pub size: usize,
}

/// Unified object database over the loose object store.
pub struct ObjectDatabase {
    loose: LooseObjectStore,
    objects_dir: PathBuf,
}

impl ObjectDatabase {
    /// Open the object database at the given objects directory.
    pub fn open(objects_dir: impl AsRef<Path>) -> Result<Self, OdbError> {
        let objects_dir = objects_dir.as_ref().to_path_buf();
        let loose = LooseObjectStore::open(&objects_dir);
        Ok(Self { loose, objects_dir })
    }

    /// Read an object by OID.
    pub fn read(&self, oid: &ObjectId) -> Result<Option<Object>, OdbError> {
        Ok(self.loose.read(oid)?)
    }

    /// Read just the header (type + size) without full content.
    pub fn read_header(&self, oid: &ObjectId) -> Result<Option<ObjectInfo>, OdbError> {
        match self.loose.read_header(oid)? {
            Some((obj_type, size)) => Ok(Some(ObjectInfo { obj_type, size })),
            None => Ok(None),
        }
    }

    /// Check if an object exists.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.loose.contains(oid)
    }

    /// Write a new object.
    pub fn write(&self, obj: &Object) -> Result<ObjectId, OdbError> {
        Ok(self.loose.write(obj)?)
    }

    /// Write raw content with a known type.
    pub fn write_raw(&self, obj_type: ObjectType, content: &[u8]) -> Result<ObjectId, OdbError> {
        Ok(self.loose.write_raw(obj_type, content)?)
    }

    /// Resolve an OID prefix to a full OID.
    ///
    /// Returns an error if the prefix is ambiguous or matches nothing.
    pub fn resolve_prefix(&self, prefix: &str) -> Result<ObjectId, OdbError> {
        prefix::resolve_prefix(self, prefix)
    }

    /// Iterate over all known object OIDs (for `fsck`/`gc`-style walks).
    pub fn iter_all_oids(&self) -> Result<impl Iterator<Item = Result<ObjectId, OdbError>> + '_, OdbError> {
        Ok(self.loose.iter()?.map(|r| r.map_err(OdbError::from)))
    }

    /// Get the path to the objects directory.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pygit_object::Blob;

    #[test]
    fn write_then_read_through_odb() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();

        let obj = Object::Blob(Blob::new(b"hello from odb\n".to_vec()));
        let oid = odb.write(&obj).unwrap();

        let read_back = odb.read(&oid).unwrap().expect("object should exist");
        assert_eq!(read_back, obj);
    }

    #[test]
    fn read_returns_none_for_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();
        let oid = ObjectId::NULL;
        assert!(odb.read(&oid).unwrap().is_none());
    }

    #[test]
    fn read_header_matches_written_object() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();

        let content = b"header check content\n";
        let oid = odb.write_raw(ObjectType::Blob, content).unwrap();

        let info = odb.read_header(&oid).unwrap().expect("header should exist");
        assert_eq!(info.obj_type, ObjectType::Blob);
        assert_eq!(info.size, content.len());
    }

    #[test]
    fn write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();

        let content = b"idempotent odb write";
        let oid1 = odb.write_raw(ObjectType::Blob, content).unwrap();
        let oid2 = odb.write_raw(ObjectType::Blob, content).unwrap();
        assert_eq!(oid1, oid2);
    }

    #[test]
    fn contains_reflects_written_objects() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();

        let oid = odb.write_raw(ObjectType::Blob, b"exists check").unwrap();
        assert!(odb.contains(&oid));
        assert!(!odb.contains(&ObjectId::NULL));
    }

    #[test]
    fn iter_all_oids_includes_written_objects() {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path()).unwrap();

        let oid1 = odb.write_raw(ObjectType::Blob, b"one").unwrap();
        let oid2 = odb.write_raw(ObjectType::Blob, b"two").unwrap();

        let all: Vec<ObjectId> = odb.iter_all_oids().unwrap().filter_map(|r| r.ok()).collect();
        assert!(all.contains(&oid1));
        assert!(all.contains(&oid2));
    }
}
