//! Test network harness for multi-node integration testing.

use std::sync::Arc;

use anyhow::Result;
use sliver_core::ServerSecret;
use sliver_node::{CodingConfig, LoopbackTransport, NodeConfig, SliverClient, StorageNode};
use sliver_store::StoreConfig;
use tempfile::TempDir;
use tracing::info;

/// Fragment size used by test networks unless overridden.
pub const TEST_FRAGMENT_SIZE: usize = 16;

/// A set of storage nodes sharing one loopback transport.
pub struct TestNetwork {
    transport: Arc<LoopbackTransport>,
    nodes: Vec<Arc<StorageNode>>,
    configs: Vec<NodeConfig>,
    fragment_size: usize,
    temp_dir: TempDir,
}

impl TestNetwork {
    /// Creates an empty network.
    pub fn new(fragment_size: usize) -> Result<Self> {
        Ok(Self {
            transport: Arc::new(LoopbackTransport::new()),
            nodes: Vec::new(),
            configs: Vec::new(),
            fragment_size,
            temp_dir: TempDir::new()?,
        })
    }

    /// Creates a network of `count` in-memory nodes.
    pub fn with_nodes(count: usize) -> Result<Self> {
        let mut network = Self::new(TEST_FRAGMENT_SIZE)?;
        for _ in 0..count {
            network.add_node()?;
        }
        Ok(network)
    }

    /// Creates a network of `count` RocksDB-backed nodes under a temporary
    /// directory.
    pub fn with_rocksdb_nodes(count: usize) -> Result<Self> {
        let mut network = Self::new(TEST_FRAGMENT_SIZE)?;
        for _ in 0..count {
            network.add_rocksdb_node()?;
        }
        Ok(network)
    }

    fn next_config(&self) -> Result<NodeConfig> {
        let mut config = NodeConfig::for_host(format!("node-{}", self.nodes.len()));
        config.coding.fragment_size = self.fragment_size;
        config.auth.secret = Some(ServerSecret::random()?.to_base64());
        Ok(config)
    }

    /// Adds an in-memory node.
    pub fn add_node(&mut self) -> Result<Arc<StorageNode>> {
        let config = self.next_config()?;
        self.start(config)
    }

    /// Adds a RocksDB-backed node.
    pub fn add_rocksdb_node(&mut self) -> Result<Arc<StorageNode>> {
        let mut config = self.next_config()?;
        config.storage = StoreConfig::rocksdb(self.temp_dir.path().join(&config.node.host));
        self.start(config)
    }

    fn start(&mut self, config: NodeConfig) -> Result<Arc<StorageNode>> {
        let node = Arc::new(StorageNode::new(&config)?);
        self.transport.add_node(node.clone());
        self.nodes.push(node.clone());
        self.configs.push(config);
        info!(host = %node.host(), total = self.nodes.len(), "Added node to test network");
        Ok(node)
    }

    /// Stops node `index` and starts it again from the same configuration.
    ///
    /// The node's replay window is lost; its stores survive only when they
    /// are persistent. Handles to the old node must be dropped first, or a
    /// RocksDB-backed node cannot reopen its database.
    pub fn restart(&mut self, index: usize) -> Result<Arc<StorageNode>> {
        let config = self.configs[index].clone();
        self.transport.remove_node(&config.node.host);
        drop(self.nodes.remove(index));

        let node = Arc::new(StorageNode::new(&config)?);
        self.transport.add_node(node.clone());
        self.nodes.insert(index, node.clone());
        info!(host = %node.host(), "Restarted node");
        Ok(node)
    }

    /// Returns a node by index.
    pub fn node(&self, index: usize) -> Option<&Arc<StorageNode>> {
        self.nodes.get(index)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Host names of all nodes, in insertion order.
    pub fn hosts(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.host().to_string()).collect()
    }

    /// The shared transport.
    pub fn transport(&self) -> &Arc<LoopbackTransport> {
        &self.transport
    }

    /// Fragment size all nodes use.
    pub fn fragment_size(&self) -> usize {
        self.fragment_size
    }

    /// Coding parameters shared by the nodes and their clients.
    pub fn coding(&self) -> CodingConfig {
        CodingConfig {
            fragment_size: self.fragment_size,
            ..CodingConfig::default()
        }
    }

    /// Creates a client with an empty keyring.
    pub fn client(&self) -> SliverClient<Arc<LoopbackTransport>> {
        SliverClient::from_config(self.transport.clone(), &self.coding())
    }
}
