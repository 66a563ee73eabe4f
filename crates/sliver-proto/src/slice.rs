//! Slice storage format.
//!
//! A slice is one GF(2) linear combination of a file's fragments:
//! `encoding_symbol = XOR of fragment[i] for every set coefficient i`.
//!
//! ```text
//! ┌──────────────┬──────────────────────┬───────────────────┬──────────────────┐
//! │ count (u16)  │ packed coefficients  │ symbol_len (i32)  │ symbol (var)     │
//! └──────────────┴──────────────────────┴───────────────────┴──────────────────┘
//! ```
//!
//! Slices are content-addressed: the storage key is the hash of the encoded
//! bytes, so two identical slices are stored once.

use bytes::{BufMut, Bytes, BytesMut};
use sliver_core::encoding::{
    decode_i32_len, ensure_remaining, CanonicalDecode, CanonicalEncode, DecodeError,
};
use sliver_core::Hash;
use thiserror::Error;

use crate::bits::CoefficientVector;

/// Errors from slice construction and re-encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SliceError {
    /// Slices describe a different number of fragments
    #[error("Fragment count mismatch: {left} vs {right}")]
    FragmentCountMismatch {
        /// Fragment count of the first slice
        left: usize,
        /// Fragment count of the second slice
        right: usize,
    },

    /// Slices carry payloads of different lengths
    #[error("Symbol length mismatch: {left} vs {right}")]
    SymbolLengthMismatch {
        /// Payload length of the first slice
        left: usize,
        /// Payload length of the second slice
        right: usize,
    },

    /// Payload does not fit the i32 length field
    #[error("Symbol too long: {0} bytes")]
    SymbolTooLong(usize),
}

/// A linear combination of fragments together with its coefficients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    /// Which fragments are combined into the symbol
    pub coefficients: CoefficientVector,
    /// XOR of the selected fragments
    pub encoding_symbol: Vec<u8>,
}

impl Slice {
    /// Creates a slice.
    pub fn new(coefficients: CoefficientVector, encoding_symbol: Vec<u8>) -> Result<Self, SliceError> {
        if encoding_symbol.len() > i32::MAX as usize {
            return Err(SliceError::SymbolTooLong(encoding_symbol.len()));
        }
        Ok(Self {
            coefficients,
            encoding_symbol,
        })
    }

    /// Number of fragments (k) this slice is defined over.
    pub fn fragment_count(&self) -> usize {
        self.coefficients.len()
    }

    /// Payload length (m) in bytes.
    pub fn symbol_len(&self) -> usize {
        self.encoding_symbol.len()
    }

    /// Returns true if both slices share k and m and can be combined or
    /// solved together.
    pub fn same_geometry(&self, other: &Slice) -> bool {
        self.fragment_count() == other.fragment_count() && self.symbol_len() == other.symbol_len()
    }

    /// Returns true if the slice carries no information (zero coefficients).
    pub fn is_trivial(&self) -> bool {
        self.coefficients.is_zero()
    }

    /// Re-encodes two slices into a new one by adding them over GF(2).
    ///
    /// The result is a valid slice of the same manifest: its coefficients
    /// are the XOR of both coefficient vectors and its symbol the XOR of
    /// both symbols.
    pub fn combine(&self, other: &Slice) -> Result<Slice, SliceError> {
        if self.fragment_count() != other.fragment_count() {
            return Err(SliceError::FragmentCountMismatch {
                left: self.fragment_count(),
                right: other.fragment_count(),
            });
        }
        if self.symbol_len() != other.symbol_len() {
            return Err(SliceError::SymbolLengthMismatch {
                left: self.symbol_len(),
                right: other.symbol_len(),
            });
        }

        let mut coefficients = self.coefficients.clone();
        coefficients.xor_assign(&other.coefficients);

        let encoding_symbol = self
            .encoding_symbol
            .iter()
            .zip(&other.encoding_symbol)
            .map(|(a, b)| a ^ b)
            .collect();

        Ok(Slice {
            coefficients,
            encoding_symbol,
        })
    }

    /// Computes the content hash of the encoded slice; used as its storage key.
    pub fn compute_hash(&self) -> Hash {
        Hash::compute(&self.to_vec())
    }
}

impl CanonicalEncode for Slice {
    fn encode(&self, buf: &mut BytesMut) {
        self.coefficients.encode(buf);
        (self.encoding_symbol.len() as i32).encode(buf);
        buf.put_slice(&self.encoding_symbol);
    }
}

impl CanonicalDecode for Slice {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let coefficients = CoefficientVector::decode(buf)?;
        let len = decode_i32_len(buf)?;
        ensure_remaining(buf, len)?;
        let encoding_symbol = buf.split_to(len).to_vec();
        Ok(Self {
            coefficients,
            encoding_symbol,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(coefficients: &str, symbol: &[u8]) -> Slice {
        Slice::new(coefficients.parse().unwrap(), symbol.to_vec()).unwrap()
    }

    #[test]
    fn test_encoded_layout() {
        let s = slice("101", &[0xAA, 0xBB]);
        // count=3, packed 0b101, symbol_len=2, symbol
        let expected = hex::decode("03000502000000aabb").unwrap();
        assert_eq!(s.to_vec(), expected);
    }

    #[test]
    fn test_roundtrip() {
        let s = slice("1101001", b"payload bytes");
        let decoded = Slice::from_bytes(&s.to_vec()).unwrap();
        assert_eq!(decoded, s);
    }

    #[test]
    fn test_empty_slice_roundtrip() {
        let s = slice("", &[]);
        assert_eq!(s.to_vec(), vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(Slice::from_bytes(&s.to_vec()).unwrap(), s);
    }

    #[test]
    fn test_truncated_input_rejected() {
        let bytes = slice("101", &[1, 2, 3, 4]).to_vec();
        for cut in 0..bytes.len() {
            assert!(
                Slice::from_bytes(&bytes[..cut]).is_err(),
                "prefix of {cut} bytes decoded"
            );
        }
    }

    #[test]
    fn test_negative_symbol_length_rejected() {
        let bytes = [0x01, 0x00, 0x01, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(
            Slice::from_bytes(&bytes),
            Err(DecodeError::NegativeLength(-1))
        );
    }

    #[test]
    fn test_hash_is_content_address() {
        let a = slice("011", b"xyz");
        let b = slice("011", b"xyz");
        let c = slice("011", b"xyZ");

        assert_eq!(a.compute_hash(), b.compute_hash());
        assert_ne!(a.compute_hash(), c.compute_hash());
        assert_eq!(a.compute_hash(), Hash::compute(&a.to_vec()));
    }

    #[test]
    fn test_combine_xors_coefficients_and_payload() {
        let a = slice("110", &[0b1100, 0xFF]);
        let b = slice("011", &[0b1010, 0x0F]);

        let c = a.combine(&b).unwrap();
        assert_eq!(c.coefficients.to_string(), "101");
        assert_eq!(c.encoding_symbol, vec![0b0110, 0xF0]);
    }

    #[test]
    fn test_combine_rejects_mismatched_geometry() {
        let a = slice("110", &[1, 2]);
        assert_eq!(
            a.combine(&slice("1100", &[1, 2])),
            Err(SliceError::FragmentCountMismatch { left: 3, right: 4 })
        );
        assert_eq!(
            a.combine(&slice("110", &[1])),
            Err(SliceError::SymbolLengthMismatch { left: 2, right: 1 })
        );
    }
}

#[cfg(test)]
mod proptest_encoding {
    use super::*;
    use proptest::prelude::*;

    /// Slices whose coefficient counts straddle the packed byte boundaries.
    fn arb_slice() -> impl Strategy<Value = Slice> {
        (
            prop::collection::vec(any::<bool>(), 0..=20),
            prop::collection::vec(any::<u8>(), 0..64),
        )
            .prop_map(|(bits, symbol)| {
                Slice::new(CoefficientVector::from_bits(&bits), symbol).unwrap()
            })
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(slice in arb_slice()) {
            let bytes = slice.to_vec();
            let expected = 2 + crate::bits::packed_len(slice.fragment_count()) + 4 + slice.symbol_len();
            prop_assert_eq!(bytes.len(), expected);
            prop_assert_eq!(Slice::from_bytes(&bytes).unwrap(), slice);
        }

        #[test]
        fn truncated_encoding_rejected(slice in arb_slice(), cut in any::<prop::sample::Index>()) {
            let bytes = slice.to_vec();
            let cut = cut.index(bytes.len());
            prop_assert!(Slice::from_bytes(&bytes[..cut]).is_err());
        }

        #[test]
        fn hash_follows_encoding(a in arb_slice(), b in arb_slice()) {
            prop_assert_eq!(a.compute_hash() == b.compute_hash(), a == b);
        }
    }
}
