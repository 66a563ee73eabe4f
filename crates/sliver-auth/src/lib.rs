//! Sliver Auth - Stateless request authorization.
//!
//! Provides:
//! - Credential issuance where the private key is re-derived from the
//!   public id and a server secret, so nothing is stored per credential
//! - Request signing over a canonical byte stream of the request
//! - Verification with clock-skew and replay checks
//!
//! Verification failures are reported as a single opaque
//! [`AuthError::Unauthorized`]; the concrete reason is only logged.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod authority;
pub mod config;
pub mod factory;
pub mod replay;
pub mod verifier;

pub use authority::CredentialAuthority;
pub use config::AuthConfig;
pub use factory::{canonical_stream, create_token_for, new_nonce, sign_request};
pub use replay::ReplayDetector;
pub use verifier::{RequestVerifier, Verified};

use sliver_core::EntropyError;
use thiserror::Error;

/// Errors from credential issuance and request verification.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Request is not authorized
    #[error("Unauthorized")]
    Unauthorized,

    /// Secure random source failed
    #[error("Entropy source failed: {0}")]
    Entropy(#[from] EntropyError),

    /// Server secret missing or malformed
    #[error("Invalid server secret: {0}")]
    InvalidSecret(String),
}
