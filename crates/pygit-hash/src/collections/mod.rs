//! OID-keyed collections used by the revision walker and merge engine.

mod oid_map;
mod oid_set;

pub use oid_map::OidMap;
pub use oid_set::OidSet;
