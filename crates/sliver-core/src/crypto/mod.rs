//! Cryptographic primitives for Sliver.
//!
//! - HMAC-SHA-256 (RFC 2104) for credential derivation and request signing
//! - BLAKE3 (256-bit default mode) for content addressing
//! - Operating-system randomness for credentials and nonces

mod blake3_hash;
mod mac;
mod random;

pub use mac::{hmac_sha256, verify_hmac_sha256};
pub use blake3_hash::{blake3_hash, Blake3Hasher};
pub use random::{random_array, random_bytes, EntropyError};

/// Output size of HMAC-SHA-256 in bytes.
pub const MAC_SIZE: usize = 32;
