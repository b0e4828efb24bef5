//! Plan execution on a vehicle
//!
//! Issues a plan action by action. A refused forward move is logged and
//! skipped; the remaining actions are still sent. When the plan is done the
//! vehicle is asked for its pose, which is compared with the pose reckoned
//! from the actions it accepted.

use log::{debug, info, warn};

use crate::common::{Action, CoverageResult, Pose, Vehicle};

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    /// Actions sent to the vehicle
    pub issued: usize,
    /// Indices of refused actions
    pub skipped: Vec<usize>,
    /// Pose after every accepted action, start included
    pub trajectory: Vec<Pose>,
    /// Dead-reckoned pose at the end
    pub expected_pose: Pose,
    /// Pose the vehicle reports at the end
    pub reported_pose: Pose,
}

impl ExecutionReport {
    /// Whether the vehicle ended somewhere other than expected
    pub fn drifted(&self) -> bool {
        self.expected_pose != self.reported_pose
    }
}

pub struct PlanExecutor<V: Vehicle> {
    vehicle: V,
}

impl<V: Vehicle> PlanExecutor<V> {
    pub fn new(vehicle: V) -> Self {
        Self { vehicle }
    }

    pub fn vehicle(&self) -> &V {
        &self.vehicle
    }

    pub fn into_vehicle(self) -> V {
        self.vehicle
    }

    pub fn execute(&mut self, start: Pose, actions: &[Action]) -> CoverageResult<ExecutionReport> {
        info!("executing {} actions from {}", actions.len(), start);
        let mut expected = start;
        let mut actual = start;
        let mut trajectory = vec![start];
        let mut skipped = Vec::new();

        for (i, &action) in actions.iter().enumerate() {
            match self.vehicle.perform(action, actual)? {
                Some(pose) => {
                    debug!("step {}: {} -> {}", i, action, pose);
                    // dead reckoning ignores what the vehicle says it did
                    expected = expected.after(action);
                    actual = pose;
                    trajectory.push(pose);
                }
                None => {
                    warn!("step {}: {} refused at {}, skipping", i, action, actual);
                    skipped.push(i);
                }
            }
        }

        let reported = self.vehicle.get_status()?;
        if reported != expected {
            warn!("drift: expected {}, vehicle reports {}", expected, reported);
        }
        info!(
            "execution done: {} issued, {} skipped, final pose {}",
            actions.len(),
            skipped.len(),
            reported
        );
        Ok(ExecutionReport {
            issued: actions.len(),
            skipped,
            trajectory,
            expected_pose: expected,
            reported_pose: reported,
        })
    }

    /// Execute a plan written as an `F`/`L`/`R` string
    pub fn execute_str(&mut self, start: Pose, plan: &str) -> CoverageResult<ExecutionReport> {
        let actions = Action::parse_sequence(plan)?;
        self.execute(start, &actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{GridCell, Orientation};
    use crate::utils::OccupancyGrid;
    use crate::vehicle::SimulatedVehicle;

    #[test]
    fn test_clean_execution() {
        let grid = OccupancyGrid::from_rows(&vec![vec![0; 3]; 3]).unwrap();
        let start = Pose::new(2, 0, Orientation::Up);
        let mut vehicle = SimulatedVehicle::new(grid, start).unwrap();
        let report = PlanExecutor::new(&mut vehicle).execute_str(start, "FRF").unwrap();

        assert_eq!(report.issued, 3);
        assert!(report.skipped.is_empty());
        assert!(!report.drifted());
        assert_eq!(report.reported_pose, Pose::new(1, 1, Orientation::Right));
        assert_eq!(report.trajectory.len(), 4);
    }

    #[test]
    fn test_stale_snapshot_skips_refused_moves() {
        let snapshot = OccupancyGrid::from_rows(&vec![vec![0; 3]; 3]).unwrap();
        let world = snapshot.with_cell(GridCell::new(1, 0), true).unwrap();
        let start = Pose::new(2, 0, Orientation::Up);
        let mut vehicle = SimulatedVehicle::new(world, start).unwrap();
        let report = PlanExecutor::new(&mut vehicle).execute_str(start, "FRF").unwrap();

        assert_eq!(report.skipped, vec![0]);
        assert!(!report.drifted());
        assert_eq!(report.reported_pose, Pose::new(2, 1, Orientation::Right));
        assert_eq!(report.trajectory.len(), 3);
    }

    #[test]
    fn test_slipping_vehicle_drifts() {
        let grid = OccupancyGrid::from_rows(&vec![vec![0; 3]; 3]).unwrap();
        let start = Pose::new(2, 0, Orientation::Up);
        let mut vehicle = SimulatedVehicle::new(grid, start).unwrap().with_slip(1.0, 7).unwrap();
        let report = PlanExecutor::new(&mut vehicle).execute_str(start, "FF").unwrap();

        assert!(report.skipped.is_empty());
        assert!(report.drifted());
        assert_eq!(report.expected_pose, Pose::new(0, 0, Orientation::Up));
        assert_eq!(report.reported_pose, start);
    }

    #[test]
    fn test_bad_plan_string() {
        let grid = OccupancyGrid::from_rows(&vec![vec![0; 3]; 3]).unwrap();
        let start = Pose::new(2, 0, Orientation::Up);
        let mut vehicle = SimulatedVehicle::new(grid, start).unwrap();
        assert!(PlanExecutor::new(&mut vehicle).execute_str(start, "FXF").is_err());
        assert!(vehicle.history().is_empty());
    }
}
