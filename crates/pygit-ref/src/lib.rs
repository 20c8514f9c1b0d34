//! Reference system for the pygit implementation.
//!
//! This crate provides the core reference types and operations for refs:
//! resolving, creating, updating, deleting, and enumerating.
//!
//! The only backend is the files backend (`FilesRefStore`), which stores
//! loose refs as individual files under `.pygit/refs/`.

mod error;
pub mod files;
mod name;
mod store;

pub use error::RefError;
pub use files::FilesRefStore;
pub use name::RefName;
pub use store::{RefStore, RefTransaction, RefUpdate, RefUpdateAction};

/// A reference — either direct (points to an OID) or symbolic (points to another ref).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Direct reference to an object.
    Direct {
        name: RefName,
        target: pygit_hash::ObjectId,
    },
    /// Symbolic reference to another ref.
    Symbolic { name: RefName, target: RefName },
}

impl Reference {
    /// Get the ref name.
    pub fn name(&self) -> &RefName {
        match self {
            Reference::Direct { name, .. } => name,
            Reference::Symbolic { name, .. } => name,
        }
    }

    /// Is this a symbolic ref?
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Reference::Symbolic { .. })
    }

    /// Is this a direct ref?
    pub fn is_direct(&self) -> bool {
        matches!(self, Reference::Direct { .. })
    }

    /// Get the target OID if this is a direct ref.
    pub fn target_oid(&self) -> Option<pygit_hash::ObjectId> {
        match self {
            Reference::Direct { target, .. } => Some(*target),
            Reference::Symbolic { .. } => None,
        }
    }

    /// Get the symbolic target if this is a symbolic ref.
    pub fn symbolic_target(&self) -> Option<&RefName> {
        match self {
            Reference::Symbolic { target, .. } => Some(target),
            Reference::Direct { .. } => None,
        }
    }

    /// Resolve to a direct OID by following symbolic ref chains.
    /// Requires a ref store to look up intermediate refs.
    pub fn peel_to_oid(&self, store: &dyn RefStore) -> Result<pygit_hash::ObjectId, RefError> {
        match self {
            Reference::Direct { target, .. } => Ok(*target),
            Reference::Symbolic { target, .. } => store
                .resolve_to_oid(target)?
                .ok_or_else(|| RefError::NotFound(target.to_string())),
        }
    }
}
