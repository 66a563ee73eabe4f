//! Content hash used to address slices and identify files.
//!
//! A `Hash` is the 32-byte BLAKE3 digest of some content. Byte-identical
//! content always hashes to the same value, so a slice's hash doubles as its
//! storage key and two copies of one slice collapse into a single entry.

use std::fmt;
use std::str::FromStr;

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::crypto::blake3_hash;
use crate::encoding::{CanonicalDecode, CanonicalEncode, DecodeError};

/// Digest length in bytes.
pub const HASH_LENGTH: usize = 32;

/// Fixed-length content digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Hash(pub [u8; HASH_LENGTH]);

impl Hash {
    /// Creates a hash from raw digest bytes.
    pub const fn new(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Computes the hash of `data`.
    pub fn compute(data: &[u8]) -> Self {
        Self(blake3_hash(data))
    }

    /// Returns the inner bytes.
    pub const fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Returns the inner bytes as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Creates a hash from a byte slice of exactly [`HASH_LENGTH`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let arr: [u8; HASH_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| DecodeError::InvalidHashLength {
                    expected: HASH_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    /// Creates from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != HASH_LENGTH {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; HASH_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Returns as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; HASH_LENGTH]> for Hash {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl CanonicalEncode for Hash {
    fn encode(&self, buf: &mut BytesMut) {
        self.0.encode(buf);
    }
}

impl CanonicalDecode for Hash {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(Self(<[u8; HASH_LENGTH]>::decode(buf)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_content_same_hash() {
        let a = Hash::compute(b"the same bytes");
        let b = Hash::compute(b"the same bytes");
        let c = Hash::compute(b"other bytes");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display_is_full_hex() {
        let hash = Hash::compute(&[]);
        assert_eq!(
            hash.to_string(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
        assert_eq!(hash.to_string().parse::<Hash>().unwrap(), hash);
    }

    #[test]
    fn test_from_slice_length_check() {
        assert!(Hash::from_slice(&[0u8; 32]).is_ok());
        assert_eq!(
            Hash::from_slice(&[0u8; 20]),
            Err(DecodeError::InvalidHashLength {
                expected: 32,
                actual: 20
            })
        );
    }

    #[test]
    fn test_from_hex_rejects_short_input() {
        assert!(Hash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_canonical_roundtrip() {
        let hash = Hash::compute(b"slice");
        let decoded = Hash::from_bytes(&hash.to_vec()).unwrap();
        assert_eq!(hash, decoded);
    }
}
