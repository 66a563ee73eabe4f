//! Sliver Store - Local storage engine.
//!
//! Provides:
//! - The [`Container`] key/value abstraction with in-memory and RocksDB
//!   implementations
//! - Content-addressed slice storage (keyed by slice hash)
//! - Manifest storage with owner tracking
//! - A client-side credential keyring

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod container;
pub mod credential;
pub mod manifest;
pub mod rocks;
pub mod slice;

pub use config::{StorageBackend, StorageContainers, StoreConfig};
pub use container::{Container, MemoryContainer};
pub use credential::CredentialStore;
pub use manifest::{ManifestStore, PublishOutcome};
pub use rocks::RocksContainer;
pub use slice::SliceStore;

use thiserror::Error;

/// Errors from storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RocksDB error
    #[error("Database error: {0}")]
    Database(String),

    /// Manifest not found
    #[error("Manifest not found: {0}")]
    ManifestNotFound(String),

    /// Requester does not own the manifest
    #[error("Not the owner of manifest {0}")]
    NotOwner(String),

    /// Stored manifest disagrees with the published one
    #[error("Manifest conflict: {0}")]
    Conflict(String),

    /// Encoding error
    #[error("Encoding error: {0}")]
    Encoding(#[from] sliver_core::encoding::DecodeError),

    /// Invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
