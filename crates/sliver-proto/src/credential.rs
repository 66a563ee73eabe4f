//! Credentials.
//!
//! A credential pairs a random public id with the private key
//! `HMAC-SHA-256(server_secret, public)`. Only the issuing authority can
//! compute the private half, and it can recompute it at any time from the
//! public id alone, so no table of issued credentials is kept.

use std::fmt;

use bytes::{Bytes, BytesMut};
use sliver_core::encoding::{CanonicalDecode, CanonicalEncode, DecodeError};
use zeroize::Zeroize;

/// Identity keypair held by a requester.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Random public identity, sent with every signed request
    pub public: Vec<u8>,
    /// Request signing key; never transmitted after issuance
    pub private: Vec<u8>,
}

impl Credential {
    /// Creates a credential from its two halves.
    pub fn new(public: Vec<u8>, private: Vec<u8>) -> Self {
        Self { public, private }
    }

    /// Public id as standard base64, the form used in token strings.
    pub fn public_base64(&self) -> String {
        use base64::{engine::general_purpose::STANDARD, Engine};
        STANDARD.encode(&self.public)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("public", &self.public_base64())
            .field("private", &"[REDACTED]")
            .finish()
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.private.zeroize();
    }
}

impl CanonicalEncode for Credential {
    fn encode(&self, buf: &mut BytesMut) {
        self.public.encode(buf);
        self.private.encode(buf);
    }
}

impl CanonicalDecode for Credential {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(Self {
            public: Vec::<u8>::decode(buf)?,
            private: Vec::<u8>::decode(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let credential = Credential::new(vec![1, 2, 3], vec![9; 32]);
        let decoded = Credential::from_bytes(&credential.to_vec()).unwrap();
        assert_eq!(decoded, credential);
    }

    #[test]
    fn test_debug_hides_private_key() {
        let credential = Credential::new(vec![0xAB; 4], vec![0xCD; 32]);
        let debug_str = format!("{:?}", credential);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("205, 205"));
        assert!(debug_str.contains(&credential.public_base64()));
    }
}
