//! Transport trait and the in-process loopback transport.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use sliver_proto::{Request, Response};
use thiserror::Error;
use tracing::{debug, trace};

use crate::node::StorageNode;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No node is reachable under this host name
    #[error("Unknown host: {0}")]
    UnknownHost(String),

    /// Host is known but not answering
    #[error("Host unreachable: {0}")]
    Unreachable(String),

    /// Request did not complete in time
    #[error("Request timeout")]
    Timeout,

    /// Send failed
    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Abstract request transport.
///
/// Requests are addressed by their `host` field.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and waits for its response.
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        (**self).send(request).await
    }
}

/// Default per-request timeout of the loopback transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivers requests to nodes living in the same process.
///
/// Node work runs on the blocking pool since stores may touch disk.
pub struct LoopbackTransport {
    nodes: RwLock<HashMap<String, Arc<StorageNode>>>,
    offline: RwLock<HashSet<String>>,
    timeout: Duration,
}

impl LoopbackTransport {
    /// Creates a transport with no nodes.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a transport with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            offline: RwLock::new(HashSet::new()),
            timeout,
        }
    }

    /// Makes `node` reachable under its host name. Replaces any node
    /// previously registered under that name.
    pub fn add_node(&self, node: Arc<StorageNode>) {
        let host = node.host().to_string();
        debug!(host = %host, "Loopback node added");
        self.nodes.write().insert(host, node);
    }

    /// Removes a node.
    pub fn remove_node(&self, host: &str) -> Option<Arc<StorageNode>> {
        self.nodes.write().remove(host)
    }

    /// Marks a host as down or back up.
    pub fn set_offline(&self, host: &str, offline: bool) {
        let mut set = self.offline.write();
        if offline {
            set.insert(host.to_string());
        } else {
            set.remove(host);
        }
    }

    /// Registered host names, sorted.
    pub fn hosts(&self) -> Vec<String> {
        let mut hosts: Vec<_> = self.nodes.read().keys().cloned().collect();
        hosts.sort();
        hosts
    }

    fn route(&self, host: &str) -> Result<Arc<StorageNode>, TransportError> {
        if self.offline.read().contains(host) {
            return Err(TransportError::Unreachable(host.to_string()));
        }
        self.nodes
            .read()
            .get(host)
            .cloned()
            .ok_or_else(|| TransportError::UnknownHost(host.to_string()))
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let node = self.route(&request.host)?;
        trace!(host = %request.host, path = %request.path_and_query, "Loopback send");

        let task = tokio::task::spawn_blocking(move || node.handle(&request));
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(TransportError::SendFailed(e.to_string())),
            Err(_) => Err(TransportError::Timeout),
        }
    }
}
