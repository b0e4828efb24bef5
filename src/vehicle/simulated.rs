//! In-memory vehicle.
//!
//! Provides the same four operations as a remote vehicle plus the grid
//! fetch, so planners and executors can run without a world service.
//!
//! # Example
//!
//! ```ignore
//! let world = OccupancyGrid::from_rows(&vec![vec![0; 4]; 4])?;
//! let mut vehicle = SimulatedVehicle::new(world, Pose::new(3, 0, Orientation::Up))?;
//! vehicle.move_forward()?;
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Bernoulli, Distribution};

use crate::common::{
    Action, CoverageError, CoverageResult, GridSource, Orientation, Pose, StepOutcome, Vehicle,
};
use crate::utils::OccupancyGrid;

/// A vehicle moving on a known world grid.
///
/// The world decides which moves succeed. `get_grid` returns the snapshot,
/// which defaults to the world but may be set to a stale copy.
#[derive(Debug, Clone)]
pub struct SimulatedVehicle {
    world: OccupancyGrid,
    snapshot: Option<OccupancyGrid>,
    pose: Pose,
    /// Chance that an accepted forward move leaves the vehicle in place
    slip: Option<(Bernoulli, StdRng)>,
    history: Vec<Action>,
    rejected: usize,
}

impl SimulatedVehicle {
    pub fn new(world: OccupancyGrid, start: Pose) -> CoverageResult<Self> {
        if !world.is_free(start.cell()) {
            return Err(CoverageError::InvalidParameter(format!(
                "start {} is not a free cell",
                start
            )));
        }
        Ok(Self {
            world,
            snapshot: None,
            pose: start,
            slip: None,
            history: Vec::new(),
            rejected: 0,
        })
    }

    /// Make forward moves silently fail with probability `probability`
    pub fn with_slip(mut self, probability: f64, seed: u64) -> CoverageResult<Self> {
        let dist = Bernoulli::new(probability).map_err(|e| {
            CoverageError::InvalidParameter(format!("slip probability {}: {}", probability, e))
        })?;
        self.slip = Some((dist, StdRng::seed_from_u64(seed)));
        Ok(self)
    }

    /// Serve `snapshot` from `get_grid` instead of the world
    pub fn with_snapshot(mut self, snapshot: OccupancyGrid) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn world(&self) -> &OccupancyGrid {
        &self.world
    }

    /// Actions the vehicle carried out, refused moves excluded
    pub fn history(&self) -> &[Action] {
        &self.history
    }

    /// Number of refused forward moves
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    fn slipped(&mut self) -> bool {
        match self.slip.as_mut() {
            Some((dist, rng)) => dist.sample(rng),
            None => false,
        }
    }

    fn turn(&mut self, action: Action) -> Orientation {
        self.pose = self.pose.after(action);
        self.history.push(action);
        self.pose.orientation
    }
}

impl Vehicle for SimulatedVehicle {
    fn move_forward(&mut self) -> CoverageResult<StepOutcome> {
        let next = self.pose.after(Action::Forward);
        if !self.world.is_free(next.cell()) {
            self.rejected += 1;
            return Ok(StepOutcome::Rejected);
        }
        if !self.slipped() {
            self.pose = next;
        }
        self.history.push(Action::Forward);
        Ok(StepOutcome::Moved(self.pose))
    }

    fn rotate_left(&mut self) -> CoverageResult<Orientation> {
        Ok(self.turn(Action::RotateLeft))
    }

    fn rotate_right(&mut self) -> CoverageResult<Orientation> {
        Ok(self.turn(Action::RotateRight))
    }

    fn get_status(&mut self) -> CoverageResult<Pose> {
        Ok(self.pose)
    }
}

impl GridSource for SimulatedVehicle {
    fn get_grid(&mut self) -> CoverageResult<OccupancyGrid> {
        Ok(self.snapshot.as_ref().unwrap_or(&self.world).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::GridCell;

    fn world() -> OccupancyGrid {
        OccupancyGrid::from_rows(&[vec![0, 0, 0], vec![0, 1, 0], vec![0, 0, 0]]).unwrap()
    }

    #[test]
    fn test_moves_and_turns() {
        let mut vehicle = SimulatedVehicle::new(world(), Pose::new(2, 0, Orientation::Up)).unwrap();
        assert_eq!(
            vehicle.move_forward().unwrap(),
            StepOutcome::Moved(Pose::new(1, 0, Orientation::Up))
        );
        assert_eq!(vehicle.rotate_right().unwrap(), Orientation::Right);
        // (1,1) is an obstacle
        assert_eq!(vehicle.move_forward().unwrap(), StepOutcome::Rejected);
        assert_eq!(vehicle.rotate_left().unwrap(), Orientation::Up);
        assert_eq!(vehicle.get_status().unwrap(), Pose::new(1, 0, Orientation::Up));
        assert_eq!(vehicle.rejected(), 1);
        assert_eq!(
            vehicle.history(),
            &[Action::Forward, Action::RotateRight, Action::RotateLeft]
        );
    }

    #[test]
    fn test_edges_are_refused() {
        let mut vehicle = SimulatedVehicle::new(world(), Pose::new(0, 0, Orientation::Left)).unwrap();
        assert_eq!(vehicle.move_forward().unwrap(), StepOutcome::Rejected);
        assert!(SimulatedVehicle::new(world(), Pose::new(1, 1, Orientation::Up)).is_err());
    }

    #[test]
    fn test_snapshot_and_slip() {
        let stale = world().with_cell(GridCell::new(1, 1), false).unwrap();
        let mut vehicle = SimulatedVehicle::new(world(), Pose::new(2, 0, Orientation::Up))
            .unwrap()
            .with_snapshot(stale.clone());
        assert_eq!(vehicle.get_grid().unwrap(), stale);

        let mut stuck = SimulatedVehicle::new(world(), Pose::new(2, 0, Orientation::Up))
            .unwrap()
            .with_slip(1.0, 0)
            .unwrap();
        assert_eq!(
            stuck.move_forward().unwrap(),
            StepOutcome::Moved(Pose::new(2, 0, Orientation::Up))
        );
        assert!(SimulatedVehicle::new(world(), Pose::new(2, 0, Orientation::Up))
            .unwrap()
            .with_slip(1.5, 0)
            .is_err());
    }
}
