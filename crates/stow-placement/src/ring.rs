//! Consistent hashing with bounded partition loads.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use stow_types::BackendId;
use tracing::debug;

use crate::strategy::{fnv1a, PlacementStrategy};

/// Tuning knobs for [`ConsistentRing`].
#[derive(Debug, Clone, PartialEq)]
pub struct RingConfig {
    /// Number of partitions keys hash into. Must stay fixed for the life
    /// of a deployment; changing it remaps almost every key.
    pub partition_count: usize,
    /// Virtual nodes placed on the ring per backend.
    pub replication_factor: usize,
    /// Bound on partitions per backend, as a multiple of the average load.
    /// `None` disables the bound and gives plain consistent hashing.
    pub load_factor: Option<f64>,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            partition_count: 7,
            replication_factor: 20,
            load_factor: Some(1.25),
        }
    }
}

/// Consistent hashing ring with bounded loads.
///
/// Keys hash onto a fixed set of partitions. Each partition is assigned to
/// a backend by walking the vnode ring clockwise from the partition's own
/// position; with a `load_factor` set, backends already at capacity are
/// skipped and the walk continues, which caps how uneven the assignment
/// can get when the member count is small.
///
/// Membership changes rebuild the partition table. Keys whose partition
/// kept its owner do not move.
#[derive(Debug, Clone)]
pub struct ConsistentRing {
    config: RingConfig,
    /// Physical members, sorted for deterministic rebuilds.
    members: BTreeSet<BackendId>,
    /// Vnode positions: ring position -> owning member.
    positions: BTreeMap<u64, BackendId>,
    /// Partition table, rebuilt on every membership change.
    partitions: Vec<Option<BackendId>>,
}

impl ConsistentRing {
    /// Create an empty ring with the given configuration.
    pub fn new(config: RingConfig) -> Self {
        let partitions = vec![None; config.partition_count];
        Self {
            config,
            members: BTreeSet::new(),
            positions: BTreeMap::new(),
            partitions,
        }
    }

    /// Create an empty ring with [`RingConfig::default`].
    pub fn with_defaults() -> Self {
        Self::new(RingConfig::default())
    }

    /// Number of physical members on the ring.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Total number of vnodes on the ring.
    pub fn vnode_count(&self) -> usize {
        self.positions.len()
    }

    /// Partitions currently assigned to each member.
    pub fn loads(&self) -> BTreeMap<BackendId, usize> {
        let mut loads = BTreeMap::new();
        for owner in self.partitions.iter().flatten() {
            *loads.entry(owner.clone()).or_insert(0usize) += 1;
        }
        loads
    }

    /// Maximum partitions a single member may own, `None` when unbounded.
    ///
    /// Computed with float division: integer division would floor the
    /// average to zero whenever there are more members than partitions.
    fn capacity(&self) -> Option<usize> {
        let factor = self.config.load_factor?;
        let average = self.config.partition_count as f64 / self.members.len() as f64;
        Some((average * factor).ceil().max(1.0) as usize)
    }

    /// Drop a member and its vnodes without rebuilding. Returns whether the
    /// member was present.
    fn detach(&mut self, id: &BackendId) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        for replica in 0..self.config.replication_factor {
            self.positions.remove(&vnode_position(id, replica));
        }
        true
    }

    /// Reassign every partition to a member.
    fn rebuild(&mut self) {
        self.partitions = vec![None; self.config.partition_count];
        if self.members.is_empty() {
            return;
        }

        let capacity = self.capacity();
        let mut loads: HashMap<BackendId, usize> = HashMap::new();

        for partition in 0..self.config.partition_count {
            let pos = partition_position(partition);
            if let Some(owner) = self.walk(pos, capacity, &loads) {
                *loads.entry(owner.clone()).or_insert(0) += 1;
                self.partitions[partition] = Some(owner);
            }
        }
    }

    /// Walk clockwise from `pos` to the first member below its capacity.
    ///
    /// Total capacity is at least the partition count for any load factor
    /// >= 1, so every walk finds an owner. With a custom factor below 1
    /// every member can be at capacity; the nearest vnode's owner then
    /// absorbs the partition rather than leaving it unassigned.
    fn walk(
        &self,
        pos: u64,
        capacity: Option<usize>,
        loads: &HashMap<BackendId, usize>,
    ) -> Option<BackendId> {
        let after = self.positions.range(pos..);
        let before = self.positions.range(..pos);

        let mut nearest = None;
        for (_, member) in after.chain(before) {
            if nearest.is_none() {
                nearest = Some(member.clone());
            }
            let under = capacity.map_or(true, |cap| loads.get(member).copied().unwrap_or(0) < cap);
            if under {
                return Some(member.clone());
            }
        }
        nearest
    }
}

impl PlacementStrategy for ConsistentRing {
    fn add_backend(&mut self, id: BackendId) {
        // Detach first so a re-add never leaves stale vnodes behind.
        self.detach(&id);

        for replica in 0..self.config.replication_factor {
            self.positions.insert(vnode_position(&id, replica), id.clone());
        }
        self.members.insert(id.clone());
        self.rebuild();
        debug!(%id, vnodes = self.config.replication_factor, "added backend to ring");
    }

    fn remove_backend(&mut self, id: &BackendId) {
        if self.detach(id) {
            self.rebuild();
            debug!(%id, "removed backend from ring");
        }
    }

    fn locate(&self, key: &str) -> Option<BackendId> {
        if self.members.is_empty() {
            return None;
        }
        let partition = (fnv1a(key.as_bytes()) % self.config.partition_count as u64) as usize;
        self.partitions.get(partition).and_then(|slot| slot.clone())
    }
}

/// A vnode's ring position: fnv1a of the member id with the replica index
/// appended in decimal.
fn vnode_position(id: &BackendId, replica: usize) -> u64 {
    fnv1a(format!("{id}{replica}").as_bytes())
}

/// A partition's ring position: fnv1a of the partition index.
fn partition_position(partition: usize) -> u64 {
    fnv1a(&(partition as u64).to_le_bytes())
}
