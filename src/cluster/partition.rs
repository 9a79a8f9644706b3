use serde::{Deserialize, Serialize};

use super::identity::cluster_id;
use crate::geo::{centroid, distance_meters, GeoPoint};
use crate::item::MapItem;

/// A group of items rendered as one map marker or circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    id: String,
    center: GeoPoint,
    radius: f64,
    count: usize,
    members: Vec<MapItem>,
}

impl Cluster {
    /// Build a cluster from its members, deriving id, center and radius.
    ///
    /// `padding_meters` is added to the farthest-member distance.
    pub fn from_members(members: Vec<MapItem>, padding_meters: f64) -> Self {
        let center = centroid(members.iter().map(|m| &m.position))
            .unwrap_or(GeoPoint::new(0.0, 0.0));
        let farthest = members
            .iter()
            .map(|m| distance_meters(center, m.position))
            .fold(0.0f64, f64::max);
        Self {
            id: cluster_id(&members),
            center,
            radius: farthest + padding_meters,
            count: members.len(),
            members,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    /// Radius in meters.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn members(&self) -> &[MapItem] {
        &self.members
    }

    pub fn into_members(self) -> Vec<MapItem> {
        self.members
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.members.iter().any(|m| m.id == item_id)
    }

    /// True when this cluster's circle intersects `other`'s.
    pub fn overlaps(&self, other: &Cluster) -> bool {
        distance_meters(self.center, other.center) < self.radius + other.radius
    }
}

/// Three-way split of an item set for map rendering.
///
/// Every input item lands in exactly one of the groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPartition {
    pub large_clusters: Vec<Cluster>,
    pub small_clusters: Vec<Cluster>,
    pub unclustered: Vec<MapItem>,
}

impl ClusterPartition {
    pub fn is_empty(&self) -> bool {
        self.large_clusters.is_empty()
            && self.small_clusters.is_empty()
            && self.unclustered.is_empty()
    }

    /// Number of items covered by the partition.
    pub fn total_items(&self) -> usize {
        self.clusters().map(Cluster::count).sum::<usize>() + self.unclustered.len()
    }

    /// Number of large and small clusters.
    pub fn cluster_count(&self) -> usize {
        self.large_clusters.len() + self.small_clusters.len()
    }

    /// Large clusters first, then small ones.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.large_clusters.iter().chain(self.small_clusters.iter())
    }

    /// The cluster holding `item_id`, if it is clustered at all.
    pub fn cluster_of(&self, item_id: &str) -> Option<&Cluster> {
        self.clusters().find(|c| c.contains(item_id))
    }
}
