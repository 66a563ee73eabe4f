//! File reconstruction from slices.

use sliver_core::Hash;
use sliver_proto::{Manifest, Slice};
use tracing::{debug, warn};

use crate::gaussian;
use crate::CodingError;

/// Reassembles the file described by a manifest.
#[derive(Debug, Clone)]
pub struct FileDecoder {
    manifest: Manifest,
    fragment_count: usize,
    fragment_size: usize,
}

impl FileDecoder {
    /// Creates a decoder for `manifest` split at `fragment_size` bytes.
    pub fn new(manifest: Manifest, fragment_size: usize) -> Result<Self, CodingError> {
        let fragment_count = manifest.fragment_count(fragment_size)?;
        if fragment_count > crate::params::MAX_FRAGMENTS {
            return Err(CodingError::TooManyFragments {
                count: fragment_count,
            });
        }
        Ok(Self {
            manifest,
            fragment_count,
            fragment_size,
        })
    }

    /// The manifest being decoded.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Fragment count (k) of the file.
    pub fn fragment_count(&self) -> usize {
        self.fragment_count
    }

    /// Returns true if `slice` has this file's geometry.
    pub fn fits(&self, slice: &Slice) -> bool {
        slice.fragment_count() == self.fragment_count && slice.symbol_len() == self.fragment_size
    }

    /// Independent slices among `slices` that fit this file.
    pub fn rank(&self, slices: &[Slice]) -> usize {
        gaussian::rank(&self.usable(slices))
    }

    /// Returns true once `slices` determine the whole file.
    pub fn is_complete(&self, slices: &[Slice]) -> bool {
        self.rank(slices) == self.fragment_count
    }

    /// Reconstructs the file bytes.
    ///
    /// Slices with a different geometry are skipped. Returns `None` when the
    /// remaining slices do not determine every fragment.
    pub fn decode(&self, slices: &[Slice]) -> Option<Vec<u8>> {
        if self.fragment_count == 0 {
            return Some(Vec::new());
        }

        let usable = self.usable(slices);
        let fragments = gaussian::solve(&usable)?;

        let mut data = fragments.concat();
        data.truncate(self.manifest.length() as usize);
        debug!(
            manifest = %self.manifest.id,
            slices = usable.len(),
            length = data.len(),
            "Reconstructed file"
        );
        Some(data)
    }

    /// Reconstructs the file and checks it hashes to the manifest id.
    pub fn decode_verified(&self, slices: &[Slice]) -> Result<Option<Vec<u8>>, CodingError> {
        let Some(data) = self.decode(slices) else {
            return Ok(None);
        };
        if Hash::compute(&data) != self.manifest.id {
            warn!(manifest = %self.manifest.id, "Reconstructed content hash mismatch");
            return Err(CodingError::ContentMismatch);
        }
        Ok(Some(data))
    }

    fn usable(&self, slices: &[Slice]) -> Vec<Slice> {
        let usable: Vec<Slice> = slices.iter().filter(|s| self.fits(s)).cloned().collect();
        if usable.len() != slices.len() {
            debug!(
                manifest = %self.manifest.id,
                skipped = slices.len() - usable.len(),
                "Skipped slices with mismatched geometry"
            );
        }
        usable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::SliceEncoder;

    const DATA: &[u8] = b"Slices are random linear combinations of fragments.";

    #[test]
    fn test_decode_from_random_slices() {
        let encoder = SliceEncoder::new(DATA, 8).unwrap();
        let decoder = FileDecoder::new(encoder.manifest().clone(), 8).unwrap();
        let mut rng = rand::thread_rng();

        let mut slices = Vec::new();
        while !decoder.is_complete(&slices) {
            slices.push(encoder.random_slice(&mut rng).unwrap());
        }

        assert_eq!(decoder.decode_verified(&slices).unwrap().unwrap(), DATA);
    }

    #[test]
    fn test_insufficient_slices() {
        let encoder = SliceEncoder::new(DATA, 8).unwrap();
        let decoder = FileDecoder::new(encoder.manifest().clone(), 8).unwrap();

        let mut slices = encoder.systematic();
        slices.pop();
        assert_eq!(decoder.rank(&slices), decoder.fragment_count() - 1);
        assert_eq!(decoder.decode(&slices), None);
        assert_eq!(decoder.decode_verified(&slices), Ok(None));
    }

    #[test]
    fn test_foreign_slices_skipped() {
        let encoder = SliceEncoder::new(DATA, 8).unwrap();
        let other = SliceEncoder::new(b"short", 4).unwrap();
        let decoder = FileDecoder::new(encoder.manifest().clone(), 8).unwrap();

        let mut slices = other.systematic();
        slices.extend(encoder.systematic());
        assert_eq!(decoder.decode(&slices).unwrap(), DATA);
    }

    #[test]
    fn test_tampered_payload_detected() {
        let encoder = SliceEncoder::new(DATA, 8).unwrap();
        let decoder = FileDecoder::new(encoder.manifest().clone(), 8).unwrap();

        let mut slices = encoder.systematic();
        slices[0].encoding_symbol[0] ^= 0x01;
        assert_eq!(decoder.decode_verified(&slices), Err(CodingError::ContentMismatch));
    }

    #[test]
    fn test_empty_file() {
        let encoder = SliceEncoder::new(b"", 8).unwrap();
        let decoder = FileDecoder::new(encoder.manifest().clone(), 8).unwrap();
        assert_eq!(decoder.fragment_count(), 0);
        assert_eq!(decoder.decode_verified(&[]).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_zero_fragment_size() {
        let encoder = SliceEncoder::new(DATA, 8).unwrap();
        assert!(FileDecoder::new(encoder.manifest().clone(), 0).is_err());
    }
}
