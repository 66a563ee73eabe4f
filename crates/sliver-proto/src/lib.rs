//! Sliver Protocol - Data model and wire formats.
//!
//! This crate defines:
//! - GF(2) coefficient vectors and slices (linear combinations of fragments)
//! - Manifests describing a file and the slices advertised for it
//! - Credentials and signed-request authorization tokens
//! - The request view consumed by request signing
//! - Operation names and payloads exchanged with storage nodes

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod bits;
pub mod credential;
pub mod manifest;
pub mod operations;
pub mod request;
pub mod slice;
pub mod token;

pub use bits::CoefficientVector;
pub use credential::Credential;
pub use manifest::{Manifest, ManifestError};
pub use operations::{
    DeleteManifestResponse, GetSliceRequest, ManifestIdRequest, ManifestList, OperationKind,
    PutManifestRequest, PutManifestResponse, PutSliceRequest, PutSliceResponse, Status,
};
pub use request::{Request, RequestView, Response, OCTET_STREAM};
pub use slice::{Slice, SliceError};
pub use token::{AuthorizationToken, TokenParseError, AUTHORIZATION_HEADER};
