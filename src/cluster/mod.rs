//! Map clustering of location-tagged items.
//!
//! A pass runs in three stages:
//! - connected components over "within threshold" edges via the grid index
//! - union-find merging of overlapping large-cluster circles
//! - deterministic identity for every resulting cluster

// Core data structures
pub mod config;
pub mod partition;

// Algorithms
pub mod clustering;
pub mod identity;
pub mod merge;

// Re-exports
pub use clustering::cluster_items;
pub use config::ClusterConfig;
pub use identity::cluster_id;
pub use merge::{merge_overlapping, UnionFind};
pub use partition::{Cluster, ClusterPartition};
