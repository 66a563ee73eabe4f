//! Server-side secret key.
//!
//! The secret never leaves the storage node. It turns a credential's public
//! id into its private signing key, so the node can check any credential it
//! has issued without remembering which ones exist.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use zeroize::Zeroize;

use crate::crypto::{hmac_sha256, random_array, EntropyError};

/// Secret shared by all verifying nodes of one deployment.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerSecret([u8; 32]);

impl ServerSecret {
    /// Creates a secret from bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generates a random secret.
    pub fn random() -> Result<Self, EntropyError> {
        Ok(Self(random_array()?))
    }

    /// Returns the inner bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derives the private key belonging to a public credential id:
    /// `HMAC-SHA-256(secret, public_id)`.
    pub fn derive_private(&self, public_id: &[u8]) -> [u8; 32] {
        hmac_sha256(&self.0, public_id)
    }

    /// Encodes as standard base64 (for configuration files).
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Decodes from standard base64.
    pub fn from_base64(s: &str) -> Result<Self, base64::DecodeError> {
        let bytes = STANDARD.decode(s.trim())?;
        if bytes.len() != 32 {
            return Err(base64::DecodeError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for ServerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerSecret([REDACTED])")
    }
}

impl From<[u8; 32]> for ServerSecret {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Drop for ServerSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
