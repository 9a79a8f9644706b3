//! Uniform lat/lon bucketing for near-neighbour queries.
//!
//! Cells are sized so that two points within the threshold distance always
//! fall into the same or adjacent cells, which keeps neighbour lookup close to
//! constant time for spatially spread data.

use std::collections::{HashMap, HashSet};

use crate::geo::{distance_meters, mean_latitude, GeoPoint, METERS_PER_DEGREE};

/// Row/column cell coordinate.
pub type CellKey = (i64, i64);

// Above this many columns per side a query scans the matching rows instead.
const MAX_COLUMN_REACH: i64 = 64;

// Floor for cos(latitude) so cell widths stay finite near the poles.
const MIN_COS_LATITUDE: f64 = 1e-12;

/// Grid index over a borrowed set of positions.
///
/// Built once per clustering pass and dropped with it.
#[derive(Debug)]
pub struct SpatialGrid<'a> {
    points: &'a [GeoPoint],
    threshold_meters: f64,
    cell_height_deg: f64,
    cell_width_deg: f64,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl<'a> SpatialGrid<'a> {
    /// Bucket `points` into cells sized from `threshold_meters`.
    ///
    /// A threshold that is zero, negative or NaN yields an inactive grid
    /// whose queries never return neighbours.
    pub fn build(points: &'a [GeoPoint], threshold_meters: f64) -> Self {
        let mut grid = Self {
            points,
            threshold_meters,
            cell_height_deg: 0.0,
            cell_width_deg: 0.0,
            cells: HashMap::new(),
        };
        if !grid.is_active() || points.is_empty() {
            return grid;
        }

        let mean_latitude = mean_latitude(points);
        grid.cell_height_deg = threshold_meters / METERS_PER_DEGREE;
        grid.cell_width_deg = lon_span_deg(threshold_meters, mean_latitude);

        for (idx, point) in points.iter().enumerate() {
            let key = grid.cell_key(point);
            grid.cells.entry(key).or_default().push(idx);
        }

        grid
    }

    /// Whether the threshold admits any neighbours at all.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.threshold_meters > 0.0
    }

    pub fn threshold_meters(&self) -> f64 {
        self.threshold_meters
    }

    pub fn cell_height_deg(&self) -> f64 {
        self.cell_height_deg
    }

    pub fn cell_width_deg(&self) -> f64 {
        self.cell_width_deg
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Size of the most populated cell.
    pub fn max_cell_occupancy(&self) -> usize {
        self.cells.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell coordinate of a point. Non-finite coordinates collapse onto
    /// saturated keys rather than panicking.
    pub fn cell_key(&self, point: &GeoPoint) -> CellKey {
        let row = (point.latitude / self.cell_height_deg).floor() as i64;
        let col = (point.longitude / self.cell_width_deg).floor() as i64;
        (row, col)
    }

    /// Indices of all points within the threshold of `points[idx]`, excluding
    /// `idx` itself.
    pub fn neighbors(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.for_each_neighbor(idx, |other| out.push(other));
        out
    }

    /// Visit every point within the threshold of `points[idx]` exactly once.
    pub fn for_each_neighbor<F>(&self, idx: usize, mut visit: F)
    where
        F: FnMut(usize),
    {
        if !self.is_active() || self.cells.is_empty() {
            return;
        }
        let origin = self.points[idx];
        let mut probe = |candidates: &Vec<usize>| {
            for &other in candidates {
                if other != idx
                    && distance_meters(origin, self.points[other]) <= self.threshold_meters
                {
                    visit(other);
                }
            }
        };

        for key in self.candidate_cells(&origin) {
            if let Some(candidates) = self.cells.get(&key) {
                probe(candidates);
            }
        }
    }

    /// Keys of the cells that may hold a neighbour of `origin`.
    ///
    /// The 3x3 block around the origin's cell, widened in longitude when the
    /// threshold spans more than one column at the origin's latitude, and
    /// repeated across the antimeridian when the search span crosses it.
    fn candidate_cells(&self, origin: &GeoPoint) -> Vec<CellKey> {
        let (row, _) = self.cell_key(origin);
        let rows = row.saturating_sub(1)..=row.saturating_add(1);

        let poleward = (origin.latitude.abs() + self.cell_height_deg).min(90.0);
        let span_deg = lon_span_deg(self.threshold_meters, poleward);
        let reach = (span_deg / self.cell_width_deg).ceil();

        if reach.is_nan() || reach > MAX_COLUMN_REACH as f64 {
            let mut keys: Vec<CellKey> = self
                .cells
                .keys()
                .filter(|&&(r, _)| rows.contains(&r))
                .copied()
                .collect();
            keys.sort_unstable();
            return keys;
        }
        let reach = (reach as i64).max(1);

        let mut centers = vec![origin.longitude];
        if origin.longitude - span_deg < -180.0 {
            centers.push(origin.longitude + 360.0);
        }
        if origin.longitude + span_deg > 180.0 {
            centers.push(origin.longitude - 360.0);
        }

        let per_center = 3 * (2 * reach as usize + 1);
        let mut keys = Vec::with_capacity(per_center * centers.len());
        let mut seen = HashSet::with_capacity(keys.capacity());
        for lon in centers {
            let col = (lon / self.cell_width_deg).floor() as i64;
            for r in rows.clone() {
                let first = col.saturating_sub(reach);
                let last = col.saturating_add(reach);
                for c in first..=last {
                    if seen.insert((r, c)) {
                        keys.push((r, c));
                    }
                }
            }
        }
        keys
    }
}

/// Degrees of longitude covered by `meters` at `latitude`.
fn lon_span_deg(meters: f64, latitude: f64) -> f64 {
    let cos = latitude.to_radians().cos().abs().max(MIN_COS_LATITUDE);
    meters / (METERS_PER_DEGREE * cos)
}
