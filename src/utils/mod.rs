//! Utility modules for grid_coverage

pub mod grid_map;
pub mod visualization;

pub use grid_map::*;
pub use visualization::{colors, CellStyle, Visualizer};
