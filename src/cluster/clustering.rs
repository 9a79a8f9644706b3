//! Connected-component clustering over the spatial grid.
//!
//! Two items are connected when they lie within the threshold distance of
//! each other; a cluster is a connected component of that graph. Chains are
//! therefore merged: A near B and B near C puts A, B and C together even when
//! A and C are far apart.

use std::collections::VecDeque;

use tracing::{debug, warn};

use super::config::ClusterConfig;
use super::merge::merge_overlapping;
use super::partition::{Cluster, ClusterPartition};
use crate::geo::GeoPoint;
use crate::grid::SpatialGrid;
use crate::item::MapItem;

/// Partition `items` into large clusters, small clusters and single items.
///
/// Pure function of its inputs: the grid and every intermediate structure are
/// local to the call and `items` is only read.
pub fn cluster_items(items: &[MapItem], config: &ClusterConfig) -> ClusterPartition {
    if items.is_empty() {
        return ClusterPartition::default();
    }

    let positions: Vec<GeoPoint> = items.iter().map(|item| item.position).collect();
    let grid = SpatialGrid::build(&positions, config.threshold_meters);
    if !grid.is_active() {
        warn!(
            threshold_meters = config.threshold_meters,
            "clustering threshold is not positive; leaving every item unclustered"
        );
        return ClusterPartition {
            unclustered: items.to_vec(),
            ..ClusterPartition::default()
        };
    }

    let components = connected_components(&grid, positions.len());
    let large_floor = config.large_cluster_floor();
    let padding = config.effective_padding();

    let mut large_clusters = Vec::new();
    let mut small_clusters = Vec::new();
    let mut unclustered = Vec::new();

    for component in components {
        match component.len() {
            0 => {}
            1 => unclustered.push(items[component[0]].clone()),
            size => {
                let members: Vec<MapItem> =
                    component.iter().map(|&idx| items[idx].clone()).collect();
                let cluster = Cluster::from_members(members, padding);
                if size >= large_floor {
                    large_clusters.push(cluster);
                } else {
                    small_clusters.push(cluster);
                }
            }
        }
    }

    let components_as_circles = large_clusters.len();
    let large_clusters = merge_overlapping(large_clusters, padding);

    debug!(
        items = items.len(),
        cells = grid.cell_count(),
        max_cell_occupancy = grid.max_cell_occupancy(),
        large = large_clusters.len(),
        merged_away = components_as_circles - large_clusters.len(),
        small = small_clusters.len(),
        unclustered = unclustered.len(),
        "clustering pass complete"
    );

    ClusterPartition {
        large_clusters,
        small_clusters,
        unclustered,
    }
}

/// Breadth-first connected components over the grid's neighbour relation.
///
/// Components are returned in order of their first item, each listing item
/// indices in visit order. An explicit queue keeps stack usage flat for very
/// large components.
pub fn connected_components(grid: &SpatialGrid<'_>, len: usize) -> Vec<Vec<usize>> {
    let mut visited = vec![false; len];
    let mut queue = VecDeque::new();
    let mut components = Vec::new();

    for seed in 0..len {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        queue.push_back(seed);

        let mut component = Vec::new();
        while let Some(current) = queue.pop_front() {
            component.push(current);
            grid.for_each_neighbor(current, |neighbor| {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    queue.push_back(neighbor);
                }
            });
        }
        components.push(component);
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(id: &str, lat: f64, lon: f64) -> MapItem {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        MapItem::new(id, GeoPoint::new(lat, lon), created, 0)
    }

    fn config() -> ClusterConfig {
        ClusterConfig::new(2000.0, 5, 100.0)
    }

    #[test]
    fn antimeridian_cluster_stays_apart_from_distant_cluster() {
        let mut items = Vec::new();
        for i in 0..5 {
            let lon = if i % 2 == 0 { 179.998 } else { -179.998 };
            items.push(item(&format!("fiji-{i}"), -17.0, lon));
            items.push(item(&format!("london-{i}"), 51.5, -0.12 + i as f64 * 0.001));
        }
        let partition = cluster_items(&items, &config());

        assert_eq!(partition.large_clusters.len(), 2);
        let fiji = partition.cluster_of("fiji-0").unwrap();
        assert_eq!(fiji.count(), 5);
        assert!(fiji.center().longitude.abs() > 179.99);
        assert!(fiji.radius() < 1_000.0);
        assert!(!fiji.contains("london-0"));
    }

    #[test]
    fn empty_input_gives_empty_partition() {
        let partition = cluster_items(&[], &config());
        assert!(partition.is_empty());
    }

    #[test]
    fn single_item_is_unclustered() {
        let partition = cluster_items(&[item("solo", 48.85, 2.35)], &config());
        assert!(partition.large_clusters.is_empty());
        assert!(partition.small_clusters.is_empty());
        assert_eq!(partition.unclustered.len(), 1);
    }

    #[test]
    fn far_apart_items_stay_unclustered() {
        let items = vec![
            item("a", 0.0, 0.0),
            item("b", 1.0, 1.0),
            item("c", -1.0, 2.0),
            item("d", 30.0, -40.0),
        ];
        let partition = cluster_items(&items, &config());
        assert_eq!(partition.unclustered.len(), 4);
        assert_eq!(partition.cluster_count(), 0);
    }

    #[test]
    fn nearby_items_form_one_large_cluster() {
        let items: Vec<MapItem> = (0..8)
            .map(|i| item(&format!("n{i}"), 51.5 + i as f64 * 0.0005, -0.12))
            .collect();
        let partition = cluster_items(&items, &config());
        assert_eq!(partition.large_clusters.len(), 1);
        assert_eq!(partition.large_clusters[0].count(), 8);
        assert!(partition.unclustered.is_empty());
    }

    #[test]
    fn size_thresholds_classify_components() {
        let mut items = vec![item("p0", 10.0, 10.0), item("p1", 10.0, 10.001)];
        for i in 0..5 {
            items.push(item(&format!("q{i}"), 20.0, 20.0 + i as f64 * 0.001));
        }
        items.push(item("lonely", -20.0, -20.0));

        let partition = cluster_items(&items, &config());
        assert_eq!(partition.small_clusters.len(), 1);
        assert_eq!(partition.small_clusters[0].count(), 2);
        assert_eq!(partition.large_clusters.len(), 1);
        assert_eq!(partition.large_clusters[0].count(), 5);
        assert_eq!(partition.unclustered.len(), 1);
        assert_eq!(partition.unclustered[0].id, "lonely");
    }

    #[test]
    fn components_follow_first_seen_order() {
        let points = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(5.0, 5.0),
            GeoPoint::new(0.0, 0.001),
            GeoPoint::new(5.0, 5.001),
        ];
        let grid = SpatialGrid::build(&points, 500.0);
        let components = connected_components(&grid, points.len());
        assert_eq!(components, vec![vec![0, 2], vec![1, 3]]);
    }

    #[test]
    fn non_positive_threshold_leaves_everything_unclustered() {
        let items = vec![item("a", 1.0, 1.0), item("b", 1.0, 1.0), item("c", 1.0, 1.0)];
        for threshold in [0.0, -10.0, f64::NAN] {
            let partition = cluster_items(&items, &config().with_threshold(threshold));
            assert_eq!(partition.unclustered.len(), 3);
            assert_eq!(partition.cluster_count(), 0);
        }
    }

    #[test]
    fn min_for_circle_below_two_still_leaves_singletons() {
        let items = vec![item("a", 0.0, 0.0), item("b", 0.0, 0.001), item("c", 9.0, 9.0)];
        let partition = cluster_items(&items, &config().with_min_for_circle(0));
        assert_eq!(partition.large_clusters.len(), 1);
        assert_eq!(partition.large_clusters[0].count(), 2);
        assert_eq!(partition.unclustered.len(), 1);
    }

    #[test]
    fn overlapping_large_clusters_are_merged() {
        // Two tight groups 2.5 km apart: not connected at 2 km, but their
        // padded circles (padding 1.5 km) overlap.
        let mut items = Vec::new();
        for i in 0..5 {
            items.push(item(&format!("w{i}"), 0.0, i as f64 * 0.0001));
            items.push(item(&format!("e{i}"), 0.0, 0.0225 + i as f64 * 0.0001));
        }
        let partition = cluster_items(&items, &config().with_radius_padding(1500.0));
        assert_eq!(partition.large_clusters.len(), 1);
        assert_eq!(partition.large_clusters[0].count(), 10);

        let unpadded = cluster_items(&items, &config().with_radius_padding(0.0));
        assert_eq!(unpadded.large_clusters.len(), 2);
    }
}
