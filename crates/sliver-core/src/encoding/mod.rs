//! Canonical encoding for persisted and transmitted structures.
//!
//! Slices, manifests and credentials are stored and exchanged in a
//! deterministic, versionless binary form so that equal values always have
//! equal bytes and therefore equal hashes.
//!
//! # Encoding Rules
//!
//! - **Integers**: Little-endian encoding
//! - **Fixed Arrays**: Elements encoded consecutively without length prefix
//! - **Variable Sequences**: u32 length prefix followed by elements
//! - **Strings**: u32 byte length followed by UTF-8 bytes
//! - **Options**: 0x00 for None, 0x01 + value for Some
//! - **Structs**: Fields encoded in declaration order without padding
//!
//! Types with a fixed external layout (`Slice`, `Manifest`) implement the
//! traits by hand with their own length prefixes.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Errors during canonical decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not enough bytes to decode
    #[error("Insufficient bytes: expected {expected}, got {available}")]
    InsufficientBytes {
        /// Expected number of bytes
        expected: usize,
        /// Actually available bytes
        available: usize,
    },

    /// Bytes left over after a complete value
    #[error("Trailing bytes: {0} unread")]
    TrailingBytes(usize),

    /// A signed length field was negative
    #[error("Negative length: {0}")]
    NegativeLength(i64),

    /// Hash width differs from the supported digest length
    #[error("Invalid hash length: expected {expected}, got {actual}")]
    InvalidHashLength {
        /// Supported digest length
        expected: usize,
        /// Length found in the input
        actual: usize,
    },

    /// Unused bits of a packed bit vector were set
    #[error("Non-zero padding bits in packed bit vector")]
    NonZeroPadding,

    /// Invalid UTF-8 string
    #[error("Invalid UTF-8 string: {0}")]
    InvalidUtf8(String),

    /// Invalid enum tag
    #[error("Invalid enum tag: {0}")]
    InvalidEnumTag(u32),

    /// Custom decode error
    #[error("{0}")]
    Custom(String),
}

/// Trait for types that can be canonically encoded.
pub trait CanonicalEncode {
    /// Encodes the value to canonical byte representation.
    fn encode(&self, buf: &mut BytesMut);

    /// Returns the encoded byte representation.
    fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Returns the encoded byte representation as a Vec.
    fn to_vec(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }
}

/// Trait for types that can be decoded from canonical encoding.
pub trait CanonicalDecode: Sized {
    /// Decodes from canonical byte representation, consuming what it reads.
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError>;

    /// Decodes a complete value from a byte slice.
    ///
    /// Fails with [`DecodeError::TrailingBytes`] when input remains after
    /// the value.
    fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut buf = Bytes::copy_from_slice(bytes);
        let value = Self::decode(&mut buf)?;
        if buf.has_remaining() {
            return Err(DecodeError::TrailingBytes(buf.remaining()));
        }
        Ok(value)
    }
}

/// Fails unless `buf` holds at least `needed` bytes.
pub fn ensure_remaining(buf: &Bytes, needed: usize) -> Result<(), DecodeError> {
    if buf.remaining() < needed {
        return Err(DecodeError::InsufficientBytes {
            expected: needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}

/// Reads a little-endian `i32` length prefix and rejects negative values.
pub fn decode_i32_len(buf: &mut Bytes) -> Result<usize, DecodeError> {
    let len = i32::decode(buf)?;
    if len < 0 {
        return Err(DecodeError::NegativeLength(len as i64));
    }
    Ok(len as usize)
}

// ============================================================================
// Primitive implementations
// ============================================================================

macro_rules! impl_canonical_int {
    ($ty:ty, $size:expr, $put:ident, $get:ident) => {
        impl CanonicalEncode for $ty {
            fn encode(&self, buf: &mut BytesMut) {
                buf.$put(*self);
            }
        }

        impl CanonicalDecode for $ty {
            fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
                ensure_remaining(buf, $size)?;
                Ok(buf.$get())
            }
        }
    };
}

impl_canonical_int!(u8, 1, put_u8, get_u8);
impl_canonical_int!(u16, 2, put_u16_le, get_u16_le);
impl_canonical_int!(u32, 4, put_u32_le, get_u32_le);
impl_canonical_int!(i32, 4, put_i32_le, get_i32_le);
impl_canonical_int!(u64, 8, put_u64_le, get_u64_le);
impl_canonical_int!(i64, 8, put_i64_le, get_i64_le);

impl CanonicalEncode for () {
    fn encode(&self, _buf: &mut BytesMut) {}
}

impl CanonicalDecode for () {
    fn decode(_buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(())
    }
}

impl CanonicalEncode for bool {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(u8::from(*self));
    }
}

impl CanonicalDecode for bool {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        match u8::decode(buf)? {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(DecodeError::InvalidEnumTag(tag as u32)),
        }
    }
}

// ============================================================================
// Fixed array implementations
// ============================================================================

impl<const N: usize> CanonicalEncode for [u8; N] {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(self);
    }
}

impl<const N: usize> CanonicalDecode for [u8; N] {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        ensure_remaining(buf, N)?;
        let mut arr = [0u8; N];
        buf.copy_to_slice(&mut arr);
        Ok(arr)
    }
}

// ============================================================================
// Variable sequence implementations
// ============================================================================

impl<T: CanonicalEncode> CanonicalEncode for Vec<T> {
    fn encode(&self, buf: &mut BytesMut) {
        let len = self.len();
        assert!(len <= u32::MAX as usize, "Sequence length exceeds u32::MAX");
        (len as u32).encode(buf);
        for item in self {
            item.encode(buf);
        }
    }
}

impl<T: CanonicalDecode> CanonicalDecode for Vec<T> {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let len = u32::decode(buf)? as usize;
        // Every element takes at least one byte, so a larger count is truncated input.
        ensure_remaining(buf, len)?;
        let mut vec = Vec::with_capacity(len);
        for _ in 0..len {
            vec.push(T::decode(buf)?);
        }
        Ok(vec)
    }
}

// ============================================================================
// String implementation
// ============================================================================

impl CanonicalEncode for String {
    fn encode(&self, buf: &mut BytesMut) {
        self.as_str().encode(buf);
    }
}

impl CanonicalEncode for &str {
    fn encode(&self, buf: &mut BytesMut) {
        let bytes = self.as_bytes();
        let len = bytes.len();
        assert!(len <= u32::MAX as usize, "String length exceeds u32::MAX");
        (len as u32).encode(buf);
        buf.put_slice(bytes);
    }
}

impl CanonicalDecode for String {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let len = u32::decode(buf)? as usize;
        ensure_remaining(buf, len)?;
        let bytes = buf.copy_to_bytes(len);
        String::from_utf8(bytes.to_vec()).map_err(|e| DecodeError::InvalidUtf8(e.to_string()))
    }
}

// ============================================================================
// Option implementation
// ============================================================================

impl<T: CanonicalEncode> CanonicalEncode for Option<T> {
    fn encode(&self, buf: &mut BytesMut) {
        match self {
            None => buf.put_u8(0x00),
            Some(value) => {
                buf.put_u8(0x01);
                value.encode(buf);
            }
        }
    }
}

impl<T: CanonicalDecode> CanonicalDecode for Option<T> {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let tag = u8::decode(buf)?;
        match tag {
            0x00 => Ok(None),
            0x01 => Ok(Some(T::decode(buf)?)),
            _ => Err(DecodeError::InvalidEnumTag(tag as u32)),
        }
    }
}
