//! Object identity for the pygit implementation.
//!
//! This crate provides the core `ObjectId` type, hash computation, hex
//! encoding/decoding, and OID collections used throughout pygit.

mod error;
pub mod hex;
mod oid;
pub mod hasher;
pub mod collections;

pub use error::HashError;
pub use oid::ObjectId;

/// Digest length in bytes for the object-id hash (SHA-1).
pub const OID_LEN: usize = 20;
/// Digest length in hex characters for the object-id hash.
pub const OID_HEX_LEN: usize = OID_LEN * 2;
