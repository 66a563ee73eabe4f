//! File splitting and slice encoding.

use rand::RngCore;
use sliver_core::Hash;
use sliver_proto::{CoefficientVector, Manifest, Slice};
use tracing::debug;

use crate::params::MAX_FRAGMENTS;
use crate::CodingError;

/// Splits `data` into fragments of exactly `fragment_size` bytes.
///
/// The last fragment is zero-padded. Empty input yields no fragments.
pub fn split_fragments(data: &[u8], fragment_size: usize) -> Result<Vec<Vec<u8>>, CodingError> {
    if fragment_size == 0 {
        return Err(CodingError::ZeroFragmentSize);
    }
    let count = data.len().div_ceil(fragment_size);
    if count > MAX_FRAGMENTS {
        return Err(CodingError::TooManyFragments { count });
    }

    Ok(data
        .chunks(fragment_size)
        .map(|chunk| {
            let mut fragment = chunk.to_vec();
            fragment.resize(fragment_size, 0);
            fragment
        })
        .collect())
}

/// Produces slices of one file.
///
/// The manifest id is the BLAKE3 hash of the file content, so a decoder
/// can check a reconstruction against it.
pub struct SliceEncoder {
    fragment_size: usize,
    fragments: Vec<Vec<u8>>,
    manifest: Manifest,
}

impl SliceEncoder {
    /// Splits `data` into fragments of `fragment_size` bytes.
    pub fn new(data: &[u8], fragment_size: usize) -> Result<Self, CodingError> {
        let fragments = split_fragments(data, fragment_size)?;
        let manifest = Manifest::new(Hash::compute(data), data.len() as u64)?;

        debug!(
            manifest = %manifest.id,
            length = data.len(),
            fragments = fragments.len(),
            fragment_size,
            "Split file into fragments"
        );

        Ok(Self {
            fragment_size,
            fragments,
            manifest,
        })
    }

    /// Fragment count (k).
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Fragment size (m).
    pub fn fragment_size(&self) -> usize {
        self.fragment_size
    }

    /// Manifest of the file, without slice hashes.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Encodes the combination of fragments selected by `coefficients`.
    pub fn encode(&self, coefficients: CoefficientVector) -> Result<Slice, CodingError> {
        if coefficients.len() != self.fragments.len() {
            return Err(CodingError::CoefficientCount {
                expected: self.fragments.len(),
                actual: coefficients.len(),
            });
        }

        let mut symbol = vec![0u8; self.fragment_size];
        for index in coefficients.iter_ones() {
            for (out, byte) in symbol.iter_mut().zip(&self.fragments[index]) {
                *out ^= *byte;
            }
        }

        Ok(Slice::new(coefficients, symbol)?)
    }

    /// One unit-vector slice per fragment: together they solve trivially.
    pub fn systematic(&self) -> Vec<Slice> {
        let k = self.fragments.len();
        self.fragments
            .iter()
            .enumerate()
            .map(|(index, fragment)| Slice {
                coefficients: CoefficientVector::unit(k, index),
                encoding_symbol: fragment.clone(),
            })
            .collect()
    }

    /// A slice with uniformly random non-zero coefficients.
    ///
    /// Returns `None` for an empty file, which has nothing to combine.
    pub fn random_slice<R: RngCore + ?Sized>(&self, rng: &mut R) -> Option<Slice> {
        if self.fragments.is_empty() {
            return None;
        }
        let coefficients = CoefficientVector::random(self.fragments.len(), rng);
        self.encode(coefficients).ok()
    }

    /// `count` random slices.
    pub fn random_slices<R: RngCore + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Slice> {
        (0..count).filter_map(|_| self.random_slice(rng)).collect()
    }

    /// Systematic slices followed by `redundancy` random ones, with a
    /// manifest advertising all of them.
    pub fn encode_file<R: RngCore + ?Sized>(
        &self,
        redundancy: usize,
        rng: &mut R,
    ) -> Result<(Manifest, Vec<Slice>), CodingError> {
        let mut slices = self.systematic();
        slices.extend(self.random_slices(redundancy, rng));

        let manifest = Manifest::with_slices(
            self.manifest.id,
            self.manifest.length(),
            slices.iter().map(Slice::compute_hash),
        )?;

        debug!(
            manifest = %manifest.id,
            slices = slices.len(),
            advertised = manifest.slice_hashes().len(),
            "Encoded file"
        );
        Ok((manifest, slices))
    }
}
