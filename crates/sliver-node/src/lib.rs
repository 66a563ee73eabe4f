//! Sliver Node - Storage nodes and their clients.
//!
//! This crate provides:
//! - [`StorageNode`], which serves the named operations over its stores
//! - The static operation table dispatching requests to typed handlers
//! - An abstract async [`Transport`] and an in-process loopback transport
//! - [`SliverClient`], which signs requests, spreads slices over nodes and
//!   reconstructs files from them
//! - Node configuration and logging setup

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod client;
pub mod config;
pub mod error;
pub mod node;
pub mod router;
pub mod telemetry;
pub mod transport;

pub use client::{ClientError, SliverClient};
pub use config::{CodingConfig, ConfigError, NodeConfig, NodeSection};
pub use error::NodeError;
pub use node::StorageNode;
pub use router::{Route, Router};
pub use transport::{LoopbackTransport, Transport, TransportError};
