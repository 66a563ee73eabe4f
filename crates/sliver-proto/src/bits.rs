//! Packed GF(2) coefficient vectors.
//!
//! Bit `i` lives in byte `i / 8` at position `i % 8` (least significant bit
//! first). Bits past `len` in the last byte are always zero, which keeps the
//! packed form canonical: equal vectors have equal bytes.

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use rand::RngCore;
use sliver_core::encoding::{ensure_remaining, CanonicalDecode, CanonicalEncode, DecodeError};
use sliver_core::MAX_FRAGMENTS;

/// Bit vector of GF(2) coefficients, one per fragment.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct CoefficientVector {
    len: usize,
    bytes: Vec<u8>,
}

/// Number of bytes needed to pack `len` bits.
pub const fn packed_len(len: usize) -> usize {
    (len + 7) / 8
}

impl CoefficientVector {
    /// Creates an all-zero vector of `len` coefficients.
    ///
    /// # Panics
    /// Panics if `len` exceeds [`MAX_FRAGMENTS`].
    pub fn zeros(len: usize) -> Self {
        assert!(len <= MAX_FRAGMENTS, "Coefficient count exceeds u16::MAX");
        Self {
            len,
            bytes: vec![0u8; packed_len(len)],
        }
    }

    /// Creates the unit vector selecting fragment `index` alone.
    pub fn unit(len: usize, index: usize) -> Self {
        let mut v = Self::zeros(len);
        v.set(index, true);
        v
    }

    /// Creates a vector from individual bits.
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut v = Self::zeros(bits.len());
        for (i, bit) in bits.iter().enumerate() {
            v.set(i, *bit);
        }
        v
    }

    /// Creates a vector from its packed representation.
    ///
    /// Fails if `bytes` is not exactly `ceil(len / 8)` long or if any
    /// padding bit is set.
    pub fn from_packed(len: usize, bytes: Vec<u8>) -> Result<Self, DecodeError> {
        if len > MAX_FRAGMENTS {
            return Err(DecodeError::Custom(format!(
                "coefficient count {len} exceeds {MAX_FRAGMENTS}"
            )));
        }
        if bytes.len() != packed_len(len) {
            return Err(DecodeError::InsufficientBytes {
                expected: packed_len(len),
                available: bytes.len(),
            });
        }
        let used = len % 8;
        if used != 0 {
            let last = bytes[bytes.len() - 1];
            if last >> used != 0 {
                return Err(DecodeError::NonZeroPadding);
            }
        }
        Ok(Self { len, bytes })
    }

    /// Draws a uniformly random non-zero vector of `len` coefficients.
    ///
    /// Returns the zero vector when `len` is 0.
    pub fn random<R: RngCore + ?Sized>(len: usize, rng: &mut R) -> Self {
        let mut v = Self::zeros(len);
        if len == 0 {
            return v;
        }
        loop {
            rng.fill_bytes(&mut v.bytes);
            v.clear_padding();
            if !v.is_zero() {
                return v;
            }
        }
    }

    /// Number of coefficients.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true for a vector of zero coefficients.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns coefficient `index`.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len, "coefficient index out of range");
        self.bytes[index / 8] & (1 << (index % 8)) != 0
    }

    /// Sets coefficient `index`.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn set(&mut self, index: usize, value: bool) {
        assert!(index < self.len, "coefficient index out of range");
        let mask = 1u8 << (index % 8);
        if value {
            self.bytes[index / 8] |= mask;
        } else {
            self.bytes[index / 8] &= !mask;
        }
    }

    /// Adds `other` into `self` over GF(2).
    ///
    /// # Panics
    /// Panics if the lengths differ.
    pub fn xor_assign(&mut self, other: &CoefficientVector) {
        assert_eq!(self.len, other.len, "coefficient vector length mismatch");
        for (a, b) in self.bytes.iter_mut().zip(&other.bytes) {
            *a ^= *b;
        }
    }

    /// Returns true if every coefficient is zero.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }

    /// Number of set coefficients (fragments combined into the slice).
    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Indices of the set coefficients in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |i| self.get(*i))
    }

    /// Returns the packed bytes.
    pub fn as_packed(&self) -> &[u8] {
        &self.bytes
    }

    fn clear_padding(&mut self) {
        let used = self.len % 8;
        if used != 0 {
            if let Some(last) = self.bytes.last_mut() {
                *last &= (1u8 << used) - 1;
            }
        }
    }
}

impl fmt::Debug for CoefficientVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CoefficientVector[{}]", self)
    }
}

impl fmt::Display for CoefficientVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len {
            f.write_str(if self.get(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Parses the `Display` form, e.g. `"101"` for fragments 0 and 2.
impl FromStr for CoefficientVector {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits = s
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(DecodeError::Custom(format!("invalid coefficient '{other}'"))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if bits.len() > MAX_FRAGMENTS {
            return Err(DecodeError::Custom("too many coefficients".to_string()));
        }
        Ok(Self::from_bits(&bits))
    }
}

/// `u16 count` followed by `ceil(count / 8)` packed bytes.
impl CanonicalEncode for CoefficientVector {
    fn encode(&self, buf: &mut BytesMut) {
        (self.len as u16).encode(buf);
        buf.put_slice(&self.bytes);
    }
}

impl CanonicalDecode for CoefficientVector {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let len = u16::decode(buf)? as usize;
        let packed = packed_len(len);
        ensure_remaining(buf, packed)?;
        let bytes = buf.split_to(packed).to_vec();
        Self::from_packed(len, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_layout_lsb_first() {
        let v: CoefficientVector = "1000000001".parse().unwrap();
        assert_eq!(v.as_packed(), &[0b0000_0001, 0b0000_0010]);
        assert_eq!(v.to_string(), "1000000001");
    }

    #[test]
    fn test_set_get_and_count() {
        let mut v = CoefficientVector::zeros(12);
        v.set(3, true);
        v.set(11, true);
        assert!(v.get(3));
        assert!(!v.get(4));
        assert_eq!(v.count_ones(), 2);
        assert_eq!(v.iter_ones().collect::<Vec<_>>(), vec![3, 11]);

        v.set(3, false);
        assert_eq!(v.count_ones(), 1);
    }

    #[test]
    fn test_xor_assign() {
        let mut a: CoefficientVector = "101".parse().unwrap();
        let b: CoefficientVector = "111".parse().unwrap();
        a.xor_assign(&b);
        assert_eq!(a.to_string(), "010");

        a.xor_assign(&a.clone());
        assert!(a.is_zero());
    }

    #[test]
    fn test_encoding_layout() {
        let v: CoefficientVector = "101".parse().unwrap();
        assert_eq!(v.to_vec(), vec![0x03, 0x00, 0b0000_0101]);
        assert_eq!(CoefficientVector::from_bytes(&v.to_vec()).unwrap(), v);
    }

    #[test]
    fn test_padding_bits_rejected() {
        assert_eq!(
            CoefficientVector::from_packed(3, vec![0b0000_1101]),
            Err(DecodeError::NonZeroPadding)
        );
    }

    #[test]
    fn test_truncated_packed_bytes() {
        // Claims 9 coefficients (2 bytes) but only one byte follows.
        assert!(CoefficientVector::from_bytes(&[0x09, 0x00, 0xFF]).is_err());
    }

    #[test]
    fn test_random_is_nonzero_and_canonical() {
        let mut rng = rand::thread_rng();
        for len in [1usize, 3, 8, 13] {
            let v = CoefficientVector::random(len, &mut rng);
            assert_eq!(v.len(), len);
            assert!(!v.is_zero());
            assert_eq!(CoefficientVector::from_bytes(&v.to_vec()).unwrap(), v);
        }
        assert!(CoefficientVector::random(0, &mut rng).is_empty());
    }

    #[test]
    fn test_parse_rejects_other_characters() {
        assert!("10x".parse::<CoefficientVector>().is_err());
    }
}
