//! grid_coverage - coverage-aware exploration planning on occupancy grids
//!
//! This crate plans and executes action sequences (forward, rotate left,
//! rotate right) that let a vehicle with a forward-looking sensor observe a
//! target fraction of the free cells of a grid world.

// Core modules
pub mod common;
pub mod utils;

// Sensing and planning
pub mod mapping;
pub mod path_planning;
pub mod path_tracking;

// Vehicles and mission glue
pub mod vehicle;
pub mod config;
pub mod mission;

// Re-export common types for convenience
pub use common::{Action, GridCell, Orientation, Plan, PlanStatus, Pose, StepOutcome, VehicleStatus};
pub use common::{CoveragePlanner, GridSource, Vehicle};
pub use common::{CoverageError, CoverageResult};
pub use config::CoverageConfig;
pub use mission::{run_mission, MissionReport};
pub use utils::OccupancyGrid;
