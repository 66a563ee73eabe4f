//! Integration and end-to-end tests for Sliver.
//!
//! This crate provides:
//! - A multi-node test network wired through the loopback transport
//! - End-to-end tests for upload, download, authorization and persistence

pub mod harness;

pub use harness::TestNetwork;
