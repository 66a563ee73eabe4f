//! Authorization tokens and their header string form.
//!
//! A token states that the holder of `id` performed one specific request at
//! `unix_time`, proven by `hmac` over the canonical request stream. On the
//! wire it travels in a single header as four colon-separated fields:
//!
//! ```text
//! base64(id) ":" base64(nonce) ":" decimal(unix_time) ":" base64(hmac)
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use sliver_core::UnixTime;
use thiserror::Error;

/// Header carrying the token string.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

const FIELD_COUNT: usize = 4;

/// Error while parsing a token string. No partial token is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenParseError {
    /// Not exactly four colon-separated fields
    #[error("Expected {FIELD_COUNT} fields, found {0}")]
    FieldCount(usize),

    /// A byte field is not valid base64
    #[error("Invalid base64 in {0} field")]
    InvalidBase64(&'static str),

    /// The time field is not a decimal integer
    #[error("Invalid unix time: {0}")]
    InvalidTime(String),
}

/// Signed-request assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationToken {
    /// Public id of the signing credential
    pub id: Vec<u8>,
    /// HMAC-SHA-256 over the canonical request stream
    pub hmac: Vec<u8>,
    /// Single-use random value
    pub nonce: Vec<u8>,
    /// Signer's clock when the request was made
    pub unix_time: UnixTime,
}

impl AuthorizationToken {
    /// Creates a token.
    pub fn new(id: Vec<u8>, hmac: Vec<u8>, nonce: Vec<u8>, unix_time: UnixTime) -> Self {
        Self {
            id,
            hmac,
            nonce,
            unix_time,
        }
    }

    /// Encodes the token as a header string.
    pub fn to_header_value(&self) -> String {
        self.to_string()
    }

    /// Parses a header string.
    pub fn parse(s: &str) -> Result<Self, TokenParseError> {
        s.parse()
    }
}

impl fmt::Display for AuthorizationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            STANDARD.encode(&self.id),
            STANDARD.encode(&self.nonce),
            self.unix_time.as_secs(),
            STANDARD.encode(&self.hmac)
        )
    }
}

impl FromStr for AuthorizationToken {
    type Err = TokenParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(':').collect();
        if fields.len() != FIELD_COUNT {
            return Err(TokenParseError::FieldCount(fields.len()));
        }

        let id = STANDARD
            .decode(fields[0])
            .map_err(|_| TokenParseError::InvalidBase64("id"))?;
        let nonce = STANDARD
            .decode(fields[1])
            .map_err(|_| TokenParseError::InvalidBase64("nonce"))?;
        let unix_time = fields[2]
            .parse::<i64>()
            .map_err(|e| TokenParseError::InvalidTime(e.to_string()))?;
        let hmac = STANDARD
            .decode(fields[3])
            .map_err(|_| TokenParseError::InvalidBase64("hmac"))?;

        Ok(Self {
            id,
            hmac,
            nonce,
            unix_time: UnixTime::new(unix_time),
        })
    }
}
