//! Caller-owned memoisation of clustering passes.
//!
//! The clustering functions never consult this cache. A caller that redraws
//! the same map repeatedly can route passes through [`PartitionCache`] and
//! decide itself when to drop stale entries.

use std::collections::{HashMap, VecDeque};

use sha2::{Digest, Sha256};
use tracing::trace;

use crate::cluster::{cluster_items, ClusterConfig, ClusterPartition};
use crate::item::MapItem;

/// Content fingerprint of an ordered item sequence plus clustering config.
pub type Fingerprint = [u8; 32];

const DEFAULT_CAPACITY: usize = 16;

/// Bounded FIFO cache of partitions keyed by input fingerprint.
#[derive(Debug)]
pub struct PartitionCache {
    capacity: usize,
    entries: HashMap<Fingerprint, ClusterPartition>,
    order: VecDeque<Fingerprint>,
    hits: u64,
    misses: u64,
}

impl Default for PartitionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PartitionCache {
    /// A cache holding at most `capacity` partitions (minimum one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached partition for `(items, config)`, computing it on a miss.
    pub fn get_or_compute(
        &mut self,
        items: &[MapItem],
        config: &ClusterConfig,
    ) -> &ClusterPartition {
        let key = fingerprint(items, config);
        if self.entries.contains_key(&key) {
            self.hits += 1;
            trace!(items = items.len(), "partition cache hit");
        } else {
            self.misses += 1;
            let partition = cluster_items(items, config);
            self.insert(key, partition);
        }
        &self.entries[&key]
    }

    fn insert(&mut self, key: Fingerprint, partition: ClusterPartition) {
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.entries.insert(key, partition);
        self.order.push_back(key);
    }

    /// Drop every cached partition. Hit/miss counters are kept.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

/// SHA-256 over every item field, in order, followed by the config.
///
/// Order matters because member order inside the returned partition follows
/// input order.
pub fn fingerprint(items: &[MapItem], config: &ClusterConfig) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update((items.len() as u64).to_le_bytes());
    for item in items {
        hasher.update((item.id.len() as u64).to_le_bytes());
        hasher.update(item.id.as_bytes());
        hasher.update(item.position.latitude.to_bits().to_le_bytes());
        hasher.update(item.position.longitude.to_bits().to_le_bytes());
        hasher.update(item.created_at.timestamp().to_le_bytes());
        hasher.update(item.created_at.timestamp_subsec_nanos().to_le_bytes());
        hasher.update(item.vote_score.to_le_bytes());
    }
    hasher.update(config.threshold_meters.to_bits().to_le_bytes());
    hasher.update((config.min_for_circle as u64).to_le_bytes());
    hasher.update(config.radius_padding_meters.to_bits().to_le_bytes());
    hasher.finalize().into()
}
