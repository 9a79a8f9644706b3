use serde::{Deserialize, Serialize};

use crate::GeofeedError;

/// Web Mercator ground resolution at the equator for zoom level 0.
pub const EQUATOR_METERS_PER_PIXEL: f64 = 156_543.033_92;

/// Default on-screen marker radius used by [`ClusterConfig::for_zoom`].
pub const DEFAULT_MARKER_RADIUS_PX: f64 = 40.0;

/// Clustering configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Maximum distance between two directly connected items.
    pub threshold_meters: f64,
    /// Minimum membership rendered as an area circle.
    pub min_for_circle: usize,
    /// Added to the farthest-member distance to form the circle radius.
    pub radius_padding_meters: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            threshold_meters: 2000.0,
            min_for_circle: 5,
            radius_padding_meters: 100.0,
        }
    }
}

impl ClusterConfig {
    pub fn new(threshold_meters: f64, min_for_circle: usize, radius_padding_meters: f64) -> Self {
        Self {
            threshold_meters,
            min_for_circle,
            radius_padding_meters,
        }
    }

    /// Derive the threshold from what a marker covers on screen at `zoom`.
    ///
    /// Uses the Web Mercator ground resolution at `latitude`, so two items
    /// cluster when their markers would overlap on the rendered map.
    pub fn for_zoom(zoom: f64, latitude: f64, marker_radius_px: f64) -> Self {
        Self {
            threshold_meters: meters_per_pixel(zoom, latitude) * marker_radius_px,
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold_meters: f64) -> Self {
        self.threshold_meters = threshold_meters;
        self
    }

    pub fn with_min_for_circle(mut self, min_for_circle: usize) -> Self {
        self.min_for_circle = min_for_circle;
        self
    }

    pub fn with_radius_padding(mut self, radius_padding_meters: f64) -> Self {
        self.radius_padding_meters = radius_padding_meters;
        self
    }

    /// Smallest component size that counts as a large cluster. Components of
    /// one item are never clusters, whatever `min_for_circle` says.
    #[inline]
    pub fn large_cluster_floor(&self) -> usize {
        self.min_for_circle.max(2)
    }

    /// Padding actually applied to radii; non-finite or negative values count as 0.
    #[inline]
    pub fn effective_padding(&self) -> f64 {
        if self.radius_padding_meters.is_finite() && self.radius_padding_meters > 0.0 {
            self.radius_padding_meters
        } else {
            0.0
        }
    }

    /// Strict check for configuration supplied from outside the process.
    ///
    /// The clustering pass itself tolerates every value; this is for config
    /// files and command line overrides where a typo should be reported.
    pub fn validate(&self) -> Result<(), GeofeedError> {
        if !self.threshold_meters.is_finite() || self.threshold_meters < 0.0 {
            return Err(GeofeedError::InvalidConfig(
                "threshold_meters must be a finite, non-negative distance",
            ));
        }
        if self.min_for_circle < 2 {
            return Err(GeofeedError::InvalidConfig(
                "min_for_circle must be at least 2",
            ));
        }
        if !self.radius_padding_meters.is_finite() || self.radius_padding_meters < 0.0 {
            return Err(GeofeedError::InvalidConfig(
                "radius_padding_meters must be a finite, non-negative distance",
            ));
        }
        Ok(())
    }
}

/// Web Mercator meters per pixel at `zoom` and `latitude`.
pub fn meters_per_pixel(zoom: f64, latitude: f64) -> f64 {
    EQUATOR_METERS_PER_PIXEL * latitude.to_radians().cos().abs() / 2f64.powf(zoom)
}
