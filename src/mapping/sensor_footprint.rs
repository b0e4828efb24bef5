//! Forward-looking sensor footprint
//!
//! The sensor observes a fixed rectangle in front of the vehicle. The pattern
//! is defined facing `Up` and turned by one quarter per orientation index, so
//! every heading sees the same shape.

use serde::Deserialize;

use crate::common::{CoverageError, CoverageResult, GridCell, Orientation, Pose};
use crate::utils::OccupancyGrid;

/// Configuration for the sensor rectangle
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Number of rows sensed ahead
    pub depth: usize,
    /// Number of columns sensed, centred on the vehicle
    pub width: usize,
    /// Distance from the vehicle to the nearest sensed row
    pub standoff: usize,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            width: 3,
            standoff: 1,
        }
    }
}

impl SensorConfig {
    pub fn validate(&self) -> CoverageResult<()> {
        if self.depth == 0 || self.width == 0 {
            return Err(CoverageError::InvalidParameter(
                "sensor depth and width must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rotate a `(d_row, d_col)` offset clockwise by one quarter per orientation
/// index.
pub fn rotate_offset(offset: (i32, i32), orientation: Orientation) -> (i32, i32) {
    let (mut r, mut c) = offset;
    for _ in 0..orientation.index() {
        let turned = (c, -r);
        r = turned.0;
        c = turned.1;
    }
    (r, c)
}

/// Sensor footprint with its base pattern precomputed
#[derive(Debug, Clone)]
pub struct SensorFootprint {
    offsets: Vec<(i32, i32)>,
}

impl SensorFootprint {
    pub fn new(config: &SensorConfig) -> CoverageResult<Self> {
        config.validate()?;
        let near = config.standoff as i32;
        let left = -((config.width as i32 - 1) / 2);
        let offsets = (0..config.depth as i32)
            .flat_map(|d| (0..config.width as i32).map(move |w| (-(near + d), left + w)))
            .collect();
        Ok(Self { offsets })
    }

    /// Offsets when facing `Up`
    pub fn base_offsets(&self) -> &[(i32, i32)] {
        &self.offsets
    }

    /// Number of cells in the pattern, before bounds filtering
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offsets for `orientation`
    pub fn relative(&self, orientation: Orientation) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.offsets.iter().map(move |&o| rotate_offset(o, orientation))
    }

    /// Absolute cells sensed from `pose`. Cells outside the grid are dropped.
    pub fn cells<'a>(
        &'a self,
        pose: &Pose,
        grid: &'a OccupancyGrid,
    ) -> impl Iterator<Item = GridCell> + 'a {
        let origin = pose.cell();
        self.relative(pose.orientation)
            .map(move |(dr, dc)| origin.offset(dr, dc))
            .filter(move |&cell| grid.contains(cell))
    }
}

impl Default for SensorFootprint {
    fn default() -> Self {
        let offsets = vec![(-1, -1), (-1, 0), (-1, 1), (-2, -1), (-2, 0), (-2, 1)];
        Self { offsets }
    }
}
