//! Node errors and their response status.

use sliver_auth::AuthError;
use sliver_core::DecodeError;
use sliver_proto::Status;
use sliver_store::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while serving an operation.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Missing or invalid authorization
    #[error("Unauthorized")]
    Unauthorized,

    /// Request body could not be decoded
    #[error("Malformed request: {0}")]
    Decode(#[from] DecodeError),

    /// Request is well-formed but invalid
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Credential issuance error
    #[error("Auth error: {0}")]
    Auth(AuthError),

    /// Node could not be configured
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<AuthError> for NodeError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthorized => NodeError::Unauthorized,
            other => NodeError::Auth(other),
        }
    }
}

impl NodeError {
    /// Response status reported for this error.
    pub fn status(&self) -> Status {
        match self {
            NodeError::Unauthorized => Status::Unauthorized,
            NodeError::Decode(_) | NodeError::BadRequest(_) => Status::BadRequest,
            NodeError::NotFound(_) => Status::NotFound,
            NodeError::Store(StoreError::ManifestNotFound(_)) => Status::NotFound,
            NodeError::Store(StoreError::NotOwner(_)) => Status::Forbidden,
            NodeError::Store(StoreError::Conflict(_)) => Status::Conflict,
            NodeError::Store(_) | NodeError::Auth(_) | NodeError::Config(_) => Status::Error,
        }
    }
}
