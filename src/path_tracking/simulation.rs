// Offline replay of an action sequence over a grid.
// No vehicle is involved: a forward step into a blocked or out-of-bounds
// cell leaves the pose where it was.

use crate::common::{Action, Pose};
use crate::mapping::{CoverageTracker, SensorFootprint};
use crate::utils::OccupancyGrid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedStep {
    pub action: Action,
    pub pose: Pose,
    pub new_cells: usize,
    /// Covered fraction after this step
    pub coverage: f64,
    /// The step was a forward move the grid does not allow
    pub blocked: bool,
}

/// Replay `actions` from `start`. With `scan_start` the footprint of the
/// start pose counts as sensed before the first action.
pub fn simulate_plan(
    grid: &OccupancyGrid,
    footprint: &SensorFootprint,
    start: Pose,
    actions: &[Action],
    scan_start: bool,
) -> Vec<SimulatedStep> {
    let mut coverage = CoverageTracker::new(grid);
    if scan_start {
        coverage.mark_all(grid, footprint.cells(&start, grid));
    }

    let mut pose = start;
    let mut steps = Vec::with_capacity(actions.len());
    for &action in actions {
        let next = pose.after(action);
        let blocked = action == Action::Forward && !grid.is_free(next.cell());
        let new_cells = if blocked {
            0
        } else {
            pose = next;
            coverage.mark_all(grid, footprint.cells(&pose, grid))
        };
        steps.push(SimulatedStep {
            action,
            pose,
            new_cells,
            coverage: coverage.fraction(),
            blocked,
        });
    }
    steps
}

/// Poses visited by a replay, start included
pub fn trajectory(start: Pose, steps: &[SimulatedStep]) -> Vec<Pose> {
    std::iter::once(start).chain(steps.iter().map(|s| s.pose)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Orientation;

    #[test]
    fn test_replay_follows_kinematics() {
        let grid = OccupancyGrid::from_rows(&vec![vec![0; 4]; 4]).unwrap();
        let start = Pose::new(3, 0, Orientation::Up);
        let actions = Action::parse_sequence("FRFF").unwrap();
        let steps = simulate_plan(&grid, &SensorFootprint::default(), start, &actions, false);

        assert_eq!(steps.len(), 4);
        assert_eq!(steps[3].pose, Pose::new(2, 2, Orientation::Right));
        assert!(steps.iter().all(|s| !s.blocked));
        let path = trajectory(start, &steps);
        assert_eq!(path.len(), 5);
        assert_eq!(path[0], start);
    }

    #[test]
    fn test_coverage_never_decreases() {
        let grid = OccupancyGrid::from_rows(&[
            vec![0, 0, 0, 0, 0],
            vec![0, 1, 1, 0, 0],
            vec![0, 0, 0, 0, 1],
        ])
        .unwrap();
        let start = Pose::new(2, 0, Orientation::Up);
        let actions = Action::parse_sequence("FFRFFRLLFRRFF").unwrap();
        let steps = simulate_plan(&grid, &SensorFootprint::default(), start, &actions, true);

        let mut last = 0.0;
        for step in &steps {
            assert!(step.coverage >= last);
            assert!(grid.is_free(step.pose.cell()));
            last = step.coverage;
        }
    }

    #[test]
    fn test_blocked_forward_keeps_pose() {
        let grid = OccupancyGrid::from_rows(&[vec![1, 1, 1], vec![0, 0, 0]]).unwrap();
        let start = Pose::new(1, 1, Orientation::Up);
        let steps = simulate_plan(&grid, &SensorFootprint::default(), start, &[Action::Forward], false);

        assert!(steps[0].blocked);
        assert_eq!(steps[0].pose, start);
        assert_eq!(steps[0].new_cells, 0);
    }
}
