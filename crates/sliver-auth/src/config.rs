//! Authorization configuration.

use serde::{Deserialize, Serialize};
use sliver_core::{ServerSecret, MAX_CLOCK_SKEW_SECS};
use tracing::warn;

use crate::authority::{CredentialAuthority, DEFAULT_PUBLIC_ID_LENGTH};
use crate::factory::DEFAULT_NONCE_LENGTH;
use crate::verifier::RequestVerifier;
use crate::AuthError;

/// The `[auth]` section of a node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Server secret as standard base64 (32 bytes). A random secret is
    /// generated when unset, which invalidates credentials on restart.
    pub secret: Option<String>,
    /// Accepted distance between a token's time and the node's clock
    pub max_clock_skew_secs: i64,
    /// Nonce length used when signing
    pub nonce_length: usize,
    /// Length of issued public ids
    pub public_id_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            max_clock_skew_secs: MAX_CLOCK_SKEW_SECS,
            nonce_length: DEFAULT_NONCE_LENGTH,
            public_id_length: DEFAULT_PUBLIC_ID_LENGTH,
        }
    }
}

impl AuthConfig {
    /// Decodes the configured secret, or generates one.
    pub fn server_secret(&self) -> Result<ServerSecret, AuthError> {
        match &self.secret {
            Some(encoded) => ServerSecret::from_base64(encoded)
                .map_err(|e| AuthError::InvalidSecret(e.to_string())),
            None => {
                warn!("No server secret configured; generating an ephemeral one");
                Ok(ServerSecret::random()?)
            }
        }
    }

    /// Builds the credential authority.
    pub fn authority(&self) -> Result<CredentialAuthority, AuthError> {
        Ok(CredentialAuthority::with_public_id_length(
            self.server_secret()?,
            self.public_id_length,
        ))
    }

    /// Builds a request verifier around a fresh replay detector.
    pub fn verifier(&self) -> Result<RequestVerifier, AuthError> {
        Ok(RequestVerifier::new(self.authority()?, self.max_clock_skew_secs))
    }
}
