use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// A location-tagged media item as supplied by the data layer.
///
/// Items are never mutated or re-identified by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapItem {
    pub id: String,
    pub position: GeoPoint,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub vote_score: i64,
}

impl MapItem {
    pub fn new(
        id: impl Into<String>,
        position: GeoPoint,
        created_at: DateTime<Utc>,
        vote_score: i64,
    ) -> Self {
        Self {
            id: id.into(),
            position,
            created_at,
            vote_score,
        }
    }

    /// Age relative to `now` in fractional hours. Negative for future timestamps.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        age_hours_between(self.created_at, now)
    }
}

pub(crate) fn age_hours_between(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let elapsed = now.signed_duration_since(created_at);
    elapsed.num_milliseconds() as f64 / 3_600_000.0
}
