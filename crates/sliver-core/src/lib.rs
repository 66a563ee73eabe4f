//! Sliver Core - Core types and primitives for the Sliver slice store.
//!
//! This crate provides:
//! - Cryptographic primitives (HMAC-SHA-256, BLAKE3, secure randomness)
//! - Canonical little-endian encoding for the persisted binary layouts
//! - The content `Hash` used to address slices and manifests
//! - Unix timestamps and clock skew validation
//! - The server-side secret used to derive credentials

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod crypto;
pub mod encoding;
pub mod hash;
pub mod keys;
pub mod time;

pub use crypto::*;
pub use encoding::{CanonicalDecode, CanonicalEncode, DecodeError};
pub use hash::{Hash, HASH_LENGTH};
pub use keys::ServerSecret;
pub use time::*;

/// Default maximum clock skew tolerated on signed requests, in seconds (5 minutes).
pub const MAX_CLOCK_SKEW_SECS: i64 = 300;

/// Default fragment size in bytes. Every slice of a manifest carries a
/// payload of exactly this many bytes unless configured otherwise.
pub const DEFAULT_FRAGMENT_SIZE: usize = 65536;

/// Largest number of fragments a slice can describe (`u16` coefficient count).
pub const MAX_FRAGMENTS: usize = u16::MAX as usize;
