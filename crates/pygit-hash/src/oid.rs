use std::fmt;
use std::str::FromStr;

use crate::hex::{hex_decode, hex_to_string};
use crate::HashError;

/// A pygit object identifier — the SHA-1 hash of an object's content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    /// The null OID (all zeros).
    pub const NULL: Self = Self([0u8; 20]);

    /// Create an ObjectId from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HashError> {
        if bytes.len() != 20 {
            return Err(HashError::InvalidHashLength {
                expected: 20,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Create an ObjectId from a fixed-size byte array.
    pub const fn from_array(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Create an ObjectId from a 40-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        if hex.len() != 40 {
            return Err(HashError::InvalidHexLength {
                expected: 40,
                actual: hex.len(),
            });
        }
        let mut bytes = [0u8; 20];
        hex_decode(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes of the hash.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the null (all-zeros) OID.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Get the hex string representation (lowercase).
    pub fn to_hex(&self) -> String {
        hex_to_string(&self.0)
    }

    /// Get the first byte of the hash (for fan-out indexing / loose object dirs).
    pub fn first_byte(&self) -> u8 {
        self.0[0]
    }

    /// Check if this OID's hex representation starts with the given hex prefix.
    pub fn starts_with_hex(&self, prefix: &str) -> bool {
        let hex = self.to_hex();
        hex.starts_with(&prefix.to_ascii_lowercase())
    }

    /// Get the loose object path component: `"xx/xxxx..."`.
    pub fn loose_path(&self) -> String {
        let hex = self.to_hex();
        format!("{}/{}", &hex[..2], &hex[2..])
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..8])
    }
}

impl FromStr for ObjectId {
    type Err = HashError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SHA1_HEX: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn from_hex_roundtrip() {
        let oid = ObjectId::from_hex(SHA1_HEX).unwrap();
        assert_eq!(oid.as_bytes().len(), 20);
        assert_eq!(oid.to_hex(), SHA1_HEX);
    }

    #[test]
    fn display_roundtrip() {
        let oid = ObjectId::from_hex(SHA1_HEX).unwrap();
        let displayed = oid.to_string();
        assert_eq!(displayed, SHA1_HEX);
        let parsed: ObjectId = displayed.parse().unwrap();
        assert_eq!(parsed, oid);
    }

    #[test]
    fn debug_shows_short_hash() {
        let oid = ObjectId::from_hex(SHA1_HEX).unwrap();
        let debug = format!("{:?}", oid);
        assert_eq!(debug, "ObjectId(da39a3ee)");
    }

    #[test]
    fn equality() {
        let a = ObjectId::from_hex(SHA1_HEX).unwrap();
        let b = ObjectId::from_hex(SHA1_HEX).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn ordering() {
        let a = ObjectId::from_hex("0000000000000000000000000000000000000001").unwrap();
        let b = ObjectId::from_hex("0000000000000000000000000000000000000002").unwrap();
        assert!(a < b);
    }

    #[test]
    fn hashmap_key() {
        let oid = ObjectId::from_hex(SHA1_HEX).unwrap();
        let mut map = HashMap::new();
        map.insert(oid, "value");
        assert_eq!(map.get(&oid), Some(&"value"));
    }

    #[test]
    fn null_oid() {
        assert!(ObjectId::NULL.is_null());
        let non_null = ObjectId::from_hex(SHA1_HEX).unwrap();
        assert!(!non_null.is_null());
    }

    #[test]
    fn from_bytes() {
        let oid = ObjectId::from_hex(SHA1_HEX).unwrap();
        let bytes = oid.as_bytes();
        let reconstructed = ObjectId::from_bytes(bytes).unwrap();
        assert_eq!(oid, reconstructed);
    }

    #[test]
    fn from_bytes_wrong_length() {
        let err = ObjectId::from_bytes(&[0; 10]).unwrap_err();
        assert!(matches!(
            err,
            HashError::InvalidHashLength {
                expected: 20,
                actual: 10
            }
        ));
    }

    #[test]
    fn invalid_hex_chars() {
        let err = ObjectId::from_hex("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").unwrap_err();
        assert!(matches!(err, HashError::InvalidHex { .. }));
    }

    #[test]
    fn invalid_hex_length() {
        let err = ObjectId::from_hex("abcd").unwrap_err();
        assert!(matches!(err, HashError::InvalidHexLength { .. }));
    }

    #[test]
    fn case_insensitive_hex_decode() {
        let lower = ObjectId::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
        let upper = ObjectId::from_hex("DA39A3EE5E6B4B0D3255BFEF95601890AFD80709").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn first_byte() {
        let oid = ObjectId::from_hex(SHA1_HEX).unwrap();
        assert_eq!(oid.first_byte(), 0xda);
    }

    #[test]
    fn starts_with_hex_prefix() {
        let oid = ObjectId::from_hex(SHA1_HEX).unwrap();
        assert!(oid.starts_with_hex("da39"));
        assert!(oid.starts_with_hex("DA39"));
        assert!(!oid.starts_with_hex("abcd"));
    }

    #[test]
    fn loose_path() {
        let oid = ObjectId::from_hex(SHA1_HEX).unwrap();
        let path = oid.loose_path();
        assert_eq!(path, format!("da/{}", &SHA1_HEX[2..]));
    }

    #[test]
    fn max_oid() {
        let max = ObjectId::from_hex("ffffffffffffffffffffffffffffffffffffffff").unwrap();
        assert!(!max.is_null());
        assert_eq!(max.first_byte(), 0xff);
    }
}
