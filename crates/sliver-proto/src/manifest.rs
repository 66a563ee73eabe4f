//! Manifest structure.
//!
//! A manifest names one logical file and advertises the slices believed to
//! exist for it. It is metadata only; the slices are stored separately under
//! their own content hashes.
//!
//! ```text
//! ┌───────────┬──────────┬──────────────┬─────────────┬──────────────────────┐
//! │ hlen (u8) │ id (hlen)│ length (i32) │ count (i32) │ count × hash (hlen)  │
//! └───────────┴──────────┴──────────────┴─────────────┴──────────────────────┘
//! ```

use bytes::{Bytes, BytesMut};
use sliver_core::encoding::{
    decode_i32_len, ensure_remaining, CanonicalDecode, CanonicalEncode, DecodeError,
};
use sliver_core::{Hash, HASH_LENGTH};
use thiserror::Error;

/// Error during manifest operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// File length does not fit the i32 length field
    #[error("File length {0} exceeds the manifest limit of {max} bytes", max = i32::MAX)]
    LengthOutOfRange(u64),

    /// Too many slice hashes for the i32 count field
    #[error("Too many slice hashes: {0}")]
    TooManySlices(usize),

    /// Fragment size of zero
    #[error("Fragment size must be positive")]
    ZeroFragmentSize,
}

/// Description of one file and its advertised slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Identifies the file (its content hash when produced by the encoder)
    pub id: Hash,
    length: u64,
    slice_hashes: Vec<Hash>,
}

impl Manifest {
    /// Creates a manifest for a file of `length` bytes with no slices yet.
    pub fn new(id: Hash, length: u64) -> Result<Self, ManifestError> {
        if length > i32::MAX as u64 {
            return Err(ManifestError::LengthOutOfRange(length));
        }
        Ok(Self {
            id,
            length,
            slice_hashes: Vec::new(),
        })
    }

    /// Creates a manifest advertising the given slices. Duplicate hashes are
    /// dropped; the first occurrence keeps its position.
    pub fn with_slices(
        id: Hash,
        length: u64,
        slice_hashes: impl IntoIterator<Item = Hash>,
    ) -> Result<Self, ManifestError> {
        let mut manifest = Self::new(id, length)?;
        for hash in slice_hashes {
            manifest.add_slice_hash(hash)?;
        }
        Ok(manifest)
    }

    /// Total original file length in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Advertised slice hashes in registration order.
    pub fn slice_hashes(&self) -> &[Hash] {
        &self.slice_hashes
    }

    /// Number of fragments (k) for a given fragment size: `ceil(length / fragment_size)`.
    pub fn fragment_count(&self, fragment_size: usize) -> Result<usize, ManifestError> {
        if fragment_size == 0 {
            return Err(ManifestError::ZeroFragmentSize);
        }
        Ok(self.length.div_ceil(fragment_size as u64) as usize)
    }

    /// Registers a slice hash. Returns `Ok(false)` if it was already listed.
    pub fn add_slice_hash(&mut self, hash: Hash) -> Result<bool, ManifestError> {
        if self.slice_hashes.contains(&hash) {
            return Ok(false);
        }
        if self.slice_hashes.len() >= i32::MAX as usize {
            return Err(ManifestError::TooManySlices(self.slice_hashes.len() + 1));
        }
        self.slice_hashes.push(hash);
        Ok(true)
    }

    /// Removes a slice hash. Returns true if it was listed.
    pub fn remove_slice_hash(&mut self, hash: &Hash) -> bool {
        let before = self.slice_hashes.len();
        self.slice_hashes.retain(|h| h != hash);
        self.slice_hashes.len() != before
    }

    /// Returns true if `hash` is advertised.
    pub fn contains_slice(&self, hash: &Hash) -> bool {
        self.slice_hashes.contains(hash)
    }
}

impl CanonicalEncode for Manifest {
    fn encode(&self, buf: &mut BytesMut) {
        (HASH_LENGTH as u8).encode(buf);
        self.id.encode(buf);
        (self.length as i32).encode(buf);
        (self.slice_hashes.len() as i32).encode(buf);
        for hash in &self.slice_hashes {
            hash.encode(buf);
        }
    }
}

impl CanonicalDecode for Manifest {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let hash_len = u8::decode(buf)? as usize;
        if hash_len != HASH_LENGTH {
            return Err(DecodeError::InvalidHashLength {
                expected: HASH_LENGTH,
                actual: hash_len,
            });
        }
        let id = Hash::decode(buf)?;
        let length = decode_i32_len(buf)? as u64;
        let count = decode_i32_len(buf)?;
        ensure_remaining(buf, count.saturating_mul(HASH_LENGTH))?;

        let mut slice_hashes = Vec::with_capacity(count);
        for _ in 0..count {
            slice_hashes.push(Hash::decode(buf)?);
        }

        Ok(Self {
            id,
            length,
            slice_hashes,
        })
    }
}
