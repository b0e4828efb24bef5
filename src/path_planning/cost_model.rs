//! Cost model for coverage planning
//!
//! Every action costs one unit (moving and turning alike); every free cell
//! the sensor sees for the first time refunds one unit. Costing an action and
//! marking the cells it senses happen in the same call.

use serde::Deserialize;

use crate::common::{Action, CoverageError, CoverageResult, Pose};
use crate::mapping::{CoverageTracker, SensorConfig, SensorFootprint};
use crate::utils::OccupancyGrid;

/// Weights of the cost model
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    /// Cost of a forward step
    pub move_cost: f64,
    /// Cost of a quarter turn
    pub rotate_cost: f64,
    /// Refund per newly sensed free cell
    pub cell_credit: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            move_cost: 1.0,
            rotate_cost: 1.0,
            cell_credit: 1.0,
        }
    }
}

impl CostWeights {
    pub fn validate(&self) -> CoverageResult<()> {
        let weights = [self.move_cost, self.rotate_cost, self.cell_credit];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CoverageError::InvalidParameter(
                "cost weights must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// One partial plan. Each node owns its coverage snapshot, so expanding
/// siblings never share mutable state.
#[derive(Debug, Clone)]
pub struct PlanNode {
    pub pose: Pose,
    pub coverage: CoverageTracker,
    pub cost: f64,
    pub actions: Vec<Action>,
}

impl PlanNode {
    /// Node at `start` with nothing sensed yet
    pub fn root(grid: &OccupancyGrid, start: Pose) -> Self {
        Self {
            pose: start,
            coverage: CoverageTracker::new(grid),
            cost: 0.0,
            actions: Vec::new(),
        }
    }

    pub fn coverage_fraction(&self) -> f64 {
        self.coverage.fraction()
    }
}

#[derive(Debug, Clone)]
pub struct CostModel {
    footprint: SensorFootprint,
    weights: CostWeights,
}

impl CostModel {
    pub fn new(footprint: SensorFootprint, weights: CostWeights) -> CoverageResult<Self> {
        weights.validate()?;
        Ok(Self { footprint, weights })
    }

    pub fn from_config(sensor: &SensorConfig, weights: &CostWeights) -> CoverageResult<Self> {
        Self::new(SensorFootprint::new(sensor)?, weights.clone())
    }

    pub fn footprint(&self) -> &SensorFootprint {
        &self.footprint
    }

    pub fn weights(&self) -> &CostWeights {
        &self.weights
    }

    /// Pose after `action`, or `None` when a forward step would leave the
    /// grid or enter a blocked cell. Turns are always valid.
    pub fn successor(&self, grid: &OccupancyGrid, pose: &Pose, action: Action) -> Option<Pose> {
        let next = pose.after(action);
        if action == Action::Forward && !grid.is_free(next.cell()) {
            return None;
        }
        Some(next)
    }

    /// Cost of the action before any coverage refund
    pub fn base_cost(&self, action: Action) -> f64 {
        if action.is_rotation() {
            self.weights.rotate_cost
        } else {
            self.weights.move_cost
        }
    }

    /// Free cells seen from `pose` that `coverage` does not hold yet
    pub fn new_cells(&self, grid: &OccupancyGrid, coverage: &CoverageTracker, pose: &Pose) -> usize {
        self.footprint
            .cells(pose, grid)
            .filter(|&cell| coverage.is_new(grid, cell))
            .count()
    }

    /// Mark the footprint at `pose` and return the number of new cells
    pub fn sense(&self, grid: &OccupancyGrid, coverage: &mut CoverageTracker, pose: &Pose) -> usize {
        coverage.mark_all(grid, self.footprint.cells(pose, grid))
    }

    /// Marginal cost of an action that sensed `new_cells`
    pub fn marginal_cost(&self, action: Action, new_cells: usize) -> f64 {
        self.base_cost(action) - self.weights.cell_credit * new_cells as f64
    }

    /// Apply `action` to `node`: move it, mark what it now senses and add the
    /// marginal cost. Returns that cost, or `None` (node untouched) when the
    /// action is invalid.
    pub fn apply(&self, grid: &OccupancyGrid, node: &mut PlanNode, action: Action) -> Option<f64> {
        let next = self.successor(grid, &node.pose, action)?;
        let fresh = self.sense(grid, &mut node.coverage, &next);
        let marginal = self.marginal_cost(action, fresh);

        node.pose = next;
        node.cost += marginal;
        node.actions.push(action);
        Some(marginal)
    }

    /// Lowest possible cost of a single action
    pub fn min_marginal_cost(&self) -> f64 {
        self.weights.move_cost.min(self.weights.rotate_cost)
            - self.weights.cell_credit * self.footprint.len() as f64
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            footprint: SensorFootprint::default(),
            weights: CostWeights::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Orientation;

    fn open_3x3() -> OccupancyGrid {
        OccupancyGrid::from_rows(&vec![vec![0; 3]; 3]).unwrap()
    }

    #[test]
    fn test_forward_without_credit_costs_one() {
        let grid = open_3x3();
        let model = CostModel::default();
        let mut node = PlanNode::root(&grid, Pose::new(1, 1, Orientation::Up));

        let cost = model.apply(&grid, &mut node, Action::Forward).unwrap();
        assert_eq!(cost, 1.0);
        assert_eq!(node.pose, Pose::new(0, 1, Orientation::Up));
        assert_eq!(node.coverage.covered_count(), 0);
        assert_eq!(node.actions, vec![Action::Forward]);
    }

    #[test]
    fn test_rotation_earns_credit() {
        let grid = open_3x3();
        let model = CostModel::default();
        let mut node = PlanNode::root(&grid, Pose::new(1, 1, Orientation::Up));

        // facing left sees column 0
        let cost = model.apply(&grid, &mut node, Action::RotateLeft).unwrap();
        assert_eq!(cost, -2.0);
        assert_eq!(node.cost, -2.0);
        assert_eq!(node.coverage.covered_count(), 3);

        // same cells again earn nothing
        let mut twin = PlanNode::root(&grid, Pose::new(1, 1, Orientation::Up));
        model.apply(&grid, &mut twin, Action::RotateLeft);
        model.apply(&grid, &mut twin, Action::RotateRight);
        let cost = model.apply(&grid, &mut twin, Action::RotateLeft).unwrap();
        assert_eq!(cost, 1.0);
    }

    #[test]
    fn test_blocked_forward_is_invalid() {
        let grid = OccupancyGrid::from_rows(&[vec![1, 1, 1], vec![0, 0, 0], vec![0, 0, 0]]).unwrap();
        let model = CostModel::default();
        let mut node = PlanNode::root(&grid, Pose::new(1, 1, Orientation::Up));

        assert!(model.apply(&grid, &mut node, Action::Forward).is_none());
        assert_eq!(node.pose, Pose::new(1, 1, Orientation::Up));
        assert_eq!(node.cost, 0.0);
        assert!(node.actions.is_empty());

        let mut edge = PlanNode::root(&grid, Pose::new(2, 0, Orientation::Left));
        assert!(model.apply(&grid, &mut edge, Action::Forward).is_none());
        assert!(model.apply(&grid, &mut edge, Action::RotateLeft).is_some());
    }

    #[test]
    fn test_new_cells_does_not_mark() {
        let grid = open_3x3();
        let model = CostModel::default();
        let coverage = CoverageTracker::new(&grid);
        let pose = Pose::new(1, 1, Orientation::Right);
        assert_eq!(model.new_cells(&grid, &coverage, &pose), 3);
        assert_eq!(coverage.covered_count(), 0);
    }

    #[test]
    fn test_lower_bound_and_weights() {
        let model = CostModel::default();
        assert_eq!(model.min_marginal_cost(), -5.0);

        let bad = CostWeights {
            cell_credit: f64::NAN,
            ..Default::default()
        };
        assert!(CostModel::new(SensorFootprint::default(), bad).is_err());
    }
}
