//! Common traits defining the planner and vehicle interfaces

use crate::common::error::CoverageResult;
use crate::common::types::*;
use crate::utils::OccupancyGrid;

/// Trait for coverage planning strategies
pub trait CoveragePlanner {
    /// Produce an action sequence that senses the configured fraction of
    /// free cells, starting from `start`.
    fn plan(&mut self, grid: &OccupancyGrid, start: Pose) -> CoverageResult<Plan>;
}

/// The four-operation surface of an external vehicle.
///
/// `Err` is reserved for transport failures. A refused forward move is a
/// normal answer and comes back as [`StepOutcome::Rejected`].
pub trait Vehicle {
    /// Attempt one step forward
    fn move_forward(&mut self) -> CoverageResult<StepOutcome>;

    /// Turn one quarter counter-clockwise; always succeeds
    fn rotate_left(&mut self) -> CoverageResult<Orientation>;

    /// Turn one quarter clockwise; always succeeds
    fn rotate_right(&mut self) -> CoverageResult<Orientation>;

    /// Authoritative pose
    fn get_status(&mut self) -> CoverageResult<Pose>;

    /// Issue the call matching `action` from the believed pose `from`.
    ///
    /// Returns the resulting pose, or `None` when the vehicle refused.
    fn perform(&mut self, action: Action, from: Pose) -> CoverageResult<Option<Pose>> {
        match action {
            Action::Forward => match self.move_forward()? {
                StepOutcome::Moved(pose) => Ok(Some(pose)),
                StepOutcome::Rejected => Ok(None),
            },
            Action::RotateLeft => {
                let orientation = self.rotate_left()?;
                Ok(Some(from.with_orientation(orientation)))
            }
            Action::RotateRight => {
                let orientation = self.rotate_right()?;
                Ok(Some(from.with_orientation(orientation)))
            }
        }
    }
}

impl<V: Vehicle + ?Sized> Vehicle for &mut V {
    fn move_forward(&mut self) -> CoverageResult<StepOutcome> {
        (**self).move_forward()
    }

    fn rotate_left(&mut self) -> CoverageResult<Orientation> {
        (**self).rotate_left()
    }

    fn rotate_right(&mut self) -> CoverageResult<Orientation> {
        (**self).rotate_right()
    }

    fn get_status(&mut self) -> CoverageResult<Pose> {
        (**self).get_status()
    }
}

/// Source of the occupancy grid for one planning run
pub trait GridSource {
    fn get_grid(&mut self) -> CoverageResult<OccupancyGrid>;
}
