use sha2::{Digest, Sha256};

use crate::item::MapItem;

/// Prefix carried by every cluster id.
pub const CLUSTER_ID_PREFIX: &str = "cluster-";

// Ids are opaque strings; NUL is not expected inside them.
const ID_SEPARATOR: u8 = 0;

/// Stable identifier for a cluster's membership.
///
/// Member ids are sorted before hashing, so the id depends only on which
/// items are in the cluster, never on their order or on unrelated items.
pub fn cluster_id(members: &[MapItem]) -> String {
    let mut ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
    ids.sort_unstable();
    membership_id(&ids)
}

/// Same as [`cluster_id`] for bare ids that are already sorted.
pub fn membership_id(sorted_ids: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, id) in sorted_ids.iter().enumerate() {
        if i > 0 {
            hasher.update([ID_SEPARATOR]);
        }
        hasher.update(id.as_bytes());
    }
    format!("{CLUSTER_ID_PREFIX}{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use chrono::{TimeZone, Utc};

    fn item(id: &str) -> MapItem {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        MapItem::new(id, GeoPoint::new(0.0, 0.0), created, 0)
    }

    #[test]
    fn order_does_not_matter() {
        let forward = cluster_id(&[item("a"), item("b"), item("c")]);
        let backward = cluster_id(&[item("c"), item("b"), item("a")]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn different_membership_differs() {
        let abc = cluster_id(&[item("a"), item("b"), item("c")]);
        let abd = cluster_id(&[item("a"), item("b"), item("d")]);
        let ab = cluster_id(&[item("a"), item("b")]);
        assert_ne!(abc, abd);
        assert_ne!(abc, ab);
    }

    #[test]
    fn separator_prevents_concatenation_collisions() {
        let split = cluster_id(&[item("ab"), item("c")]);
        let joined = cluster_id(&[item("a"), item("bc")]);
        assert_ne!(split, joined);
    }

    #[test]
    fn id_has_prefix_and_full_digest() {
        let id = cluster_id(&[item("x")]);
        assert!(id.starts_with(CLUSTER_ID_PREFIX));
        assert_eq!(id.len(), CLUSTER_ID_PREFIX.len() + 64);
        assert!(id[CLUSTER_ID_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }
}
