// Sensing model: footprint geometry and coverage bookkeeping

pub mod coverage_tracker;
pub mod sensor_footprint;

pub use coverage_tracker::*;
pub use sensor_footprint::*;
