//! Merging of large clusters whose circles overlap on the map.

use std::collections::HashMap;

use tracing::trace;

use super::partition::Cluster;

/// Disjoint-set forest over `0..len` with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of `x`'s set. Every node on the path is re-pointed at
    /// the root.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Join the sets of `x` and `y`. Returns false when they were already joined.
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return false;
        }
        match self.rank[rx].cmp(&self.rank[ry]) {
            std::cmp::Ordering::Less => self.parent[rx] = ry,
            std::cmp::Ordering::Greater => self.parent[ry] = rx,
            std::cmp::Ordering::Equal => {
                self.parent[ry] = rx;
                self.rank[rx] = self.rank[rx].saturating_add(1);
            }
        }
        true
    }

    /// Members of every set, each set in ascending order and the sets ordered
    /// by their smallest member.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for x in 0..self.len() {
            let root = self.find(x);
            let slot = *slot_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(x);
        }
        groups
    }
}

/// Merge clusters whose bounding circles overlap, transitively.
///
/// Clusters that overlap nothing are returned untouched. Merged clusters are
/// rebuilt from the union of their members, so center, radius and id are
/// recomputed exactly as for a fresh component.
pub fn merge_overlapping(clusters: Vec<Cluster>, padding_meters: f64) -> Vec<Cluster> {
    let n = clusters.len();
    if n < 2 {
        return clusters;
    }

    let mut sets = UnionFind::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if clusters[i].overlaps(&clusters[j]) {
                sets.union(i, j);
            }
        }
    }

    let groups = sets.groups();
    if groups.len() == n {
        return clusters;
    }

    let mut slots: Vec<Option<Cluster>> = clusters.into_iter().map(Some).collect();
    let mut merged = Vec::with_capacity(groups.len());
    for group in groups {
        if let [single] = group.as_slice() {
            if let Some(cluster) = slots[*single].take() {
                merged.push(cluster);
            }
            continue;
        }

        let members: Vec<_> = group
            .iter()
            .filter_map(|&idx| slots[idx].take())
            .flat_map(Cluster::into_members)
            .collect();
        trace!(
            clusters = group.len(),
            members = members.len(),
            "merging overlapping cluster circles"
        );
        merged.push(Cluster::from_members(members, padding_meters));
    }
    merged
}
