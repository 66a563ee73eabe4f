//! Credential issuance.
//!
//! The private half of a credential is `HMAC-SHA-256(server_secret, public)`.
//! The authority keeps no record of what it issued; it re-derives the
//! private key whenever it needs to check a signature.

use sliver_core::{random_bytes, verify_hmac_sha256, ServerSecret};
use sliver_proto::Credential;
use tracing::debug;

use crate::AuthError;

/// Default public id length in bytes.
pub const DEFAULT_PUBLIC_ID_LENGTH: usize = 16;

/// Issues and recognises credentials for one server secret.
#[derive(Debug, Clone)]
pub struct CredentialAuthority {
    secret: ServerSecret,
    public_id_length: usize,
}

impl CredentialAuthority {
    /// Creates an authority issuing public ids of the default length.
    pub fn new(secret: ServerSecret) -> Self {
        Self::with_public_id_length(secret, DEFAULT_PUBLIC_ID_LENGTH)
    }

    /// Creates an authority issuing public ids of `public_id_length` bytes.
    pub fn with_public_id_length(secret: ServerSecret, public_id_length: usize) -> Self {
        Self {
            secret,
            public_id_length,
        }
    }

    /// Issues a credential with a fresh random public id.
    ///
    /// Fails only if the secure random source fails.
    pub fn issue(&self) -> Result<Credential, AuthError> {
        let public = random_bytes(self.public_id_length)?;
        let private = self.derive_private(&public);
        debug!(public_len = public.len(), "Issued credential");
        Ok(Credential::new(public, private.to_vec()))
    }

    /// Private key belonging to `public_id`.
    pub fn derive_private(&self, public_id: &[u8]) -> [u8; 32] {
        self.secret.derive_private(public_id)
    }

    /// Returns true if `credential` was issued under this secret.
    pub fn is_authentic(&self, credential: &Credential) -> bool {
        verify_hmac_sha256(self.secret.as_bytes(), &credential.public, &credential.private)
    }
}
