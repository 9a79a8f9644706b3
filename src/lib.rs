pub mod cache;
pub mod cluster;
pub mod config;
pub mod geo;
pub mod grid;
pub mod io;
pub mod item;
pub mod ranking;

pub use cache::PartitionCache;
pub use cluster::{cluster_id, cluster_items, Cluster, ClusterConfig, ClusterPartition};
pub use config::EngineConfig;
pub use geo::{distance_meters, GeoPoint, EARTH_RADIUS_METERS};
pub use grid::SpatialGrid;
pub use item::MapItem;
pub use ranking::{
    rank_items, ranking_score, score_items, Clock, FixedClock, Rankable, RankingConfig,
    ScoredItem, SystemClock,
};


/// Errors raised at the crate boundary: configuration loading and item I/O.
///
/// The clustering and ranking functions themselves never fail; malformed
/// numeric input degrades their output instead.
#[derive(thiserror::Error, Debug)]
pub enum GeofeedError {
    /// Returned when a configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// Returned when reading items or configuration hits an I/O failure.
    #[error("i/o error while reading or writing engine data: {0}")]
    Io(#[from] std::io::Error),
    /// Returned when item or output JSON cannot be (de)serialised.
    #[error("invalid item json: {0}")]
    Json(#[from] serde_json::Error),
    /// Returned when an engine configuration file is not valid TOML.
    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}
