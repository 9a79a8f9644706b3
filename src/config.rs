use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cluster::ClusterConfig;
use crate::ranking::RankingConfig;
use crate::GeofeedError;

/// Complete engine configuration as read from a TOML file.
///
/// ```toml
/// [clustering]
/// threshold_meters = 1500.0
/// min_for_circle = 4
///
/// [ranking]
/// downvote_penalty = 2.0
/// ```
///
/// Omitted tables and keys keep their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub clustering: ClusterConfig,
    pub ranking: RankingConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, GeofeedError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GeofeedError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), GeofeedError> {
        self.clustering.validate()?;
        self.ranking.validate()
    }
}
