//! Configuration loading for grid_coverage

use std::path::Path;

use serde::Deserialize;

use crate::common::{CoverageError, CoverageResult};
use crate::mapping::SensorConfig;
use crate::path_planning::{
    BestFirstConfig, CostWeights, GreedyConfig, RandomWalkConfig, ReachabilityConfig,
};

/// Main configuration structure
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    pub sensor: SensorConfig,
    pub cost: CostWeights,
    pub best_first: BestFirstConfig,
    pub greedy: GreedyConfig,
    pub reachability: ReachabilityConfig,
    pub random_walk: RandomWalkConfig,
    pub mission: MissionConfig,
}

/// Which planner a mission runs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Plan offline over the fetched grid, then execute
    #[default]
    BestFirst,
    /// Plan and execute one step at a time
    Greedy,
    /// Sweep everything reachable by trial moves
    Reachability,
    /// Bump-and-turn random walk
    RandomWalk,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    pub strategy: Strategy,
}

impl CoverageConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> CoverageResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoverageError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> CoverageResult<Self> {
        let config: CoverageConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoverageResult<()> {
        self.sensor.validate()?;
        self.cost.validate()?;
        self.best_first.validate()?;
        self.greedy.validate()?;
        self.reachability.validate()?;
        self.random_walk.validate()
    }
}
