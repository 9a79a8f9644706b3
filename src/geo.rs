use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the Haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Length of one degree of latitude on the Haversine sphere.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

/// Latitude/longitude pair in degrees.
///
/// Ranges are not validated here; out-of-range and non-finite values are
/// carried through and handled by [`distance_meters`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite numbers.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    #[inline]
    fn bit_eq(&self, other: &GeoPoint) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
    }

    /// Great-circle distance to `other` in meters.
    #[inline]
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        distance_meters(*self, *other)
    }
}

/// Haversine great-circle distance between two points, in meters.
///
/// Always returns a finite value. Bit-identical points are 0 apart even when
/// their coordinates are invalid; any pair whose distance is undefined (NaN or
/// infinite coordinates) is reported as `f64::MAX`, so it never lands within a
/// clustering threshold and never poisons a sort.
#[inline]
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    if a.bit_eq(&b) {
        return 0.0;
    }

    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let half_dlat = (lat_b - lat_a) * 0.5;
    let half_dlon = (b.longitude - a.longitude).to_radians() * 0.5;

    let h = half_dlat.sin().powi(2) + lat_a.cos() * lat_b.cos() * half_dlon.sin().powi(2);
    // Rounding can push h slightly outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let distance = 2.0 * EARTH_RADIUS_METERS * h.sqrt().asin();

    if distance.is_finite() {
        distance
    } else {
        f64::MAX
    }
}

/// Arithmetic mean of the given points. Returns `None` for an empty input.
///
/// Longitudes are averaged in a continuous chart anchored at the first point,
/// so a group straddling the antimeridian keeps its center next to it. The
/// resulting longitude is wrapped back into `[-180, 180]`.
pub fn centroid<'a, I>(points: I) -> Option<GeoPoint>
where
    I: IntoIterator<Item = &'a GeoPoint>,
{
    let mut points = points.into_iter();
    let first = points.next()?;
    let anchor = first.longitude;
    let mut lat_sum = first.latitude;
    let mut lon_sum = anchor;
    let mut count = 1usize;
    for point in points {
        lat_sum += point.latitude;
        lon_sum += unwrap_longitude(point.longitude, anchor);
        count += 1;
    }
    let n = count as f64;
    Some(GeoPoint::new(lat_sum / n, wrap_longitude(lon_sum / n)))
}

/// Shift `longitude` by a full turn so it lies within 180 degrees of `anchor`.
fn unwrap_longitude(longitude: f64, anchor: f64) -> f64 {
    let delta = longitude - anchor;
    if delta > 180.0 {
        longitude - 360.0
    } else if delta < -180.0 {
        longitude + 360.0
    } else {
        longitude
    }
}

/// Bring a finite longitude back into `[-180, 180]`.
fn wrap_longitude(longitude: f64) -> f64 {
    if longitude.is_finite() && !(-180.0..=180.0).contains(&longitude) {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    } else {
        longitude
    }
}

/// Mean of the finite latitudes, clamped to the valid range.
pub fn mean_latitude(points: &[GeoPoint]) -> f64 {
    let (sum, count) = points
        .iter()
        .map(|p| p.latitude)
        .filter(|lat| lat.is_finite())
        .fold((0.0f64, 0usize), |(sum, count), lat| (sum + lat, count + 1));
    if count == 0 {
        return 0.0;
    }
    (sum / count as f64).clamp(-90.0, 90.0)
}
