//! Sliver Coding - GF(2) linear coding of files into slices.
//!
//! A file is split into k fixed-size fragments. Instead of storing the
//! fragments, storage nodes hold slices: XOR combinations of fragments
//! chosen by a coefficient bit vector. Any k linearly independent slices
//! recover the file by Gauss–Jordan elimination over GF(2).
//!
//! - [`SliceEncoder`] splits a file and produces slices and the manifest
//! - [`solve`] recovers fragments from a batch of slices
//! - [`FileDecoder`] reassembles and checks a complete file

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod decoder;
mod encoder;
mod gaussian;

pub use decoder::FileDecoder;
pub use encoder::{split_fragments, SliceEncoder};
pub use gaussian::{rank, solve};

use sliver_proto::{ManifestError, SliceError};
use thiserror::Error;

/// Coding parameters.
pub mod params {
    /// Default fragment size (m): 64 KiB
    pub const DEFAULT_FRAGMENT_SIZE: usize = sliver_core::DEFAULT_FRAGMENT_SIZE;

    /// Largest fragment count representable in a slice's u16 coefficient count
    pub const MAX_FRAGMENTS: usize = sliver_core::MAX_FRAGMENTS;
}

/// Errors from encoding and decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodingError {
    /// Fragment size of zero
    #[error("Fragment size must be positive")]
    ZeroFragmentSize,

    /// File needs more fragments than a coefficient vector can address
    #[error("File needs {count} fragments, more than the limit of {max}", max = params::MAX_FRAGMENTS)]
    TooManyFragments {
        /// Required fragment count
        count: usize,
    },

    /// Coefficient vector length differs from the fragment count
    #[error("Coefficient count mismatch: expected {expected}, got {actual}")]
    CoefficientCount {
        /// Fragment count of the file
        expected: usize,
        /// Coefficient count supplied
        actual: usize,
    },

    /// Reconstructed bytes do not hash to the manifest id
    #[error("Reconstructed content does not match the manifest id")]
    ContentMismatch,

    /// Manifest error
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Slice error
    #[error("Slice error: {0}")]
    Slice(#[from] SliceError),
}
