//! Shared harness for stow integration tests.
//!
//! [`TestCluster`] wires the real discovery, registry and placement code
//! together over in-memory storage nodes, so the tests exercise the full
//! write and read pipeline without sockets. Nodes keep their objects
//! across evict/reconnect cycles, like a real node that kept its disk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use stow_cluster::{Discovery, DiscoveryError, Locator, LocatorConfig};
use stow_placement::{HashModulo, PlacementStrategy};
use stow_router::{Distributor, RouterError};
use stow_store::{MemoryStore, ObjectStore, StoreError, StoreFactory};
use stow_types::{BackendId, Candidate};

// =========================================================================
// Scripted discovery
// =========================================================================

/// Discovery source whose candidate pool tests mutate at runtime.
pub struct SharedDiscovery {
    pool: Mutex<Vec<Candidate>>,
}

impl SharedDiscovery {
    pub fn new() -> Self {
        Self {
            pool: Mutex::new(Vec::new()),
        }
    }

    pub fn announce(&self, candidate: Candidate) {
        self.pool.lock().expect("lock poisoned").push(candidate);
    }

    pub fn withdraw(&self, addr: &str) {
        self.pool
            .lock()
            .expect("lock poisoned")
            .retain(|candidate| candidate.addr != addr);
    }
}

impl Default for SharedDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Discovery for SharedDiscovery {
    async fn search(&self, criteria: &str) -> Result<Vec<Candidate>, DiscoveryError> {
        let pool = self.pool.lock().expect("lock poisoned");
        Ok(pool
            .iter()
            .filter(|candidate| candidate.id.as_str().contains(criteria))
            .cloned()
            .collect())
    }
}

// =========================================================================
// Simulated storage nodes
// =========================================================================

/// One simulated storage node: an in-memory store plus a health switch.
pub struct TestNode {
    objects: MemoryStore,
    healthy: AtomicBool,
}

impl TestNode {
    fn new() -> Self {
        Self {
            objects: MemoryStore::new(),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    pub fn object_count(&self) -> usize {
        self.objects.object_count()
    }
}

#[async_trait]
impl ObjectStore for TestNode {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        self.objects.put(key, data).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        self.objects.get(key).await
    }

    async fn healthcheck(&self) -> Result<bool, StoreError> {
        Ok(self.is_healthy())
    }
}

/// Factory handing out one [`TestNode`] per address.
///
/// Connecting to an unhealthy node fails the way a refused TCP handshake
/// would, so discovery cannot resurrect a node that is still down.
pub struct NodePool {
    nodes: Mutex<HashMap<String, Arc<TestNode>>>,
}

impl NodePool {
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(HashMap::new()),
        }
    }

    /// The node behind `addr`, created on first use.
    pub fn node_at(&self, addr: &str) -> Arc<TestNode> {
        self.nodes
            .lock()
            .expect("lock poisoned")
            .entry(addr.to_string())
            .or_insert_with(|| Arc::new(TestNode::new()))
            .clone()
    }
}

impl Default for NodePool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreFactory for NodePool {
    async fn connect(&self, candidate: &Candidate) -> Result<Arc<dyn ObjectStore>, StoreError> {
        let node = self.node_at(&candidate.addr);
        if !node.is_healthy() {
            return Err(StoreError::Unhealthy {
                endpoint: candidate.addr.clone(),
            });
        }
        Ok(node)
    }
}

// =========================================================================
// TestCluster
// =========================================================================

/// A simulated router over `n` in-memory storage backends.
///
/// Backends are named `storage_1..=storage_n` at `10.0.0.{n}:7071` and
/// start healthy and registered. State changes go through the same sweep
/// the daemon runs: mutate the world, then [`tick`](Self::tick).
pub struct TestCluster {
    discovery: Arc<SharedDiscovery>,
    pool: Arc<NodePool>,
    distributor: Arc<Distributor>,
    locator: Locator,
    node_count: usize,
}

impl TestCluster {
    /// A cluster routing by hash modulo.
    pub async fn new(nodes: usize) -> Self {
        Self::with_strategy(nodes, Box::new(HashModulo::new())).await
    }

    /// A cluster with a caller-chosen placement strategy.
    pub async fn with_strategy(nodes: usize, strategy: Box<dyn PlacementStrategy>) -> Self {
        let discovery = Arc::new(SharedDiscovery::new());
        let pool = Arc::new(NodePool::new());
        let distributor = Arc::new(Distributor::new(strategy));
        let locator = Locator::new(
            LocatorConfig::test_config(),
            discovery.clone(),
            pool.clone(),
            distributor.clone(),
        );

        let mut cluster = Self {
            discovery,
            pool,
            distributor,
            locator,
            node_count: 0,
        };
        for _ in 0..nodes {
            cluster.add_node().await;
        }
        cluster
    }

    fn addr(index: usize) -> String {
        format!("10.0.0.{index}:7071")
    }

    /// Announce one more backend and sweep it in. Returns its id.
    pub async fn add_node(&mut self) -> BackendId {
        self.node_count += 1;
        let id = format!("storage_{}", self.node_count);
        self.discovery
            .announce(Candidate::new(id.clone(), Self::addr(self.node_count)));
        self.tick().await;
        BackendId::from(id)
    }

    /// Take backend `index` (1-based) offline and sweep it out.
    pub async fn kill_node(&self, index: usize) {
        let addr = Self::addr(index);
        self.pool.node_at(&addr).set_healthy(false);
        self.discovery.withdraw(&addr);
        self.tick().await;
    }

    /// Bring backend `index` back up with its objects intact.
    pub async fn revive_node(&self, index: usize) {
        let addr = Self::addr(index);
        self.pool.node_at(&addr).set_healthy(true);
        self.discovery
            .announce(Candidate::new(format!("storage_{index}"), addr));
        self.tick().await;
    }

    /// Run one membership sweep, panicking if it aborts.
    pub async fn tick(&self) {
        self.locator.tick().await.expect("membership sweep failed");
    }

    /// The registry the simulated router routes through.
    pub fn distributor(&self) -> Arc<Distributor> {
        self.distributor.clone()
    }

    /// Number of backends currently registered.
    pub fn registered(&self) -> usize {
        self.distributor.len()
    }

    /// Objects held by backend `index`, counting even while it is offline.
    pub fn object_count(&self, index: usize) -> usize {
        self.pool.node_at(&Self::addr(index)).object_count()
    }

    /// Store an object through the router.
    pub async fn put(&self, key: &str, data: Bytes) -> Result<(), RouterError> {
        self.distributor.put_object(key, data).await
    }

    /// Fetch an object through the router.
    pub async fn get(&self, key: &str) -> Result<Bytes, RouterError> {
        self.distributor.get_object(key).await
    }
}

// =========================================================================
// Test data
// =========================================================================

/// Deterministic test payload of `len` bytes.
pub fn test_data(len: usize) -> Vec<u8> {
    test_data_seeded(len, 0xDEAD_BEEF)
}

/// Deterministic test payload derived from `seed`, distinct per seed.
pub fn test_data_seeded(len: usize, seed: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(len);
    let mut state = seed;
    for _ in 0..len {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        data.push((state >> 16) as u8);
    }
    data
}
