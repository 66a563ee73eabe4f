//! BLAKE3 hashing.
//!
//! BLAKE3 in default mode with 256-bit output addresses every stored slice
//! and identifies the file behind a manifest.

/// Computes BLAKE3 hash in default mode with 256-bit output.
///
/// # Example
/// ```
/// use sliver_core::crypto::blake3_hash;
///
/// let hash = blake3_hash(&[]);
/// let expected = hex::decode("af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262").unwrap();
/// assert_eq!(hash.as_slice(), expected.as_slice());
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Incremental BLAKE3 hasher for content that arrives in pieces,
/// such as reconstructed fragments.
pub struct Blake3Hasher {
    inner: blake3::Hasher,
}

impl Blake3Hasher {
    /// Creates a new BLAKE3 hasher.
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    /// Updates the hasher with additional data.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalizes the hash and returns the 32-byte output.
    pub fn finalize(self) -> [u8; 32] {
        *self.inner.finalize().as_bytes()
    }
}

impl Default for Blake3Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_conformance_anchors() {
        assert_eq!(
            hex::encode(blake3_hash(&[])),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
        assert_eq!(
            hex::encode(blake3_hash(&[0x00])),
            "2d3adedff11b61f14c886e35afa036736dcd87a74d27b5c1510225d0f592e213"
        );
    }

    #[test]
    fn test_incremental_hasher() {
        let data = b"Hello, World!";

        let hash1 = blake3_hash(data);

        let mut hasher = Blake3Hasher::new();
        hasher.update(b"Hello, ");
        hasher.update(b"World!");
        let hash2 = hasher.finalize();

        assert_eq!(hash1, hash2);
    }
}
