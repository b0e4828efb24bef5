//! Random-walk exploration
//!
//! Drives forward until the vehicle refuses, then turns left a random number
//! of quarter turns and tries again. While moving it occasionally takes an
//! extra step or a left turn. Needs no grid for passability; the grid is
//! only used to score coverage.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::common::{
    Action, CoverageError, CoveragePlanner, CoverageResult, Plan, PlanStatus, Pose, Vehicle,
};
use crate::mapping::CoverageTracker;
use crate::path_planning::best_first_coverage::validate_target;
use crate::path_planning::cost_model::CostModel;
use crate::utils::OccupancyGrid;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RandomWalkConfig {
    /// Fraction of free cells to sense, in [0, 1]
    pub coverage_target: f64,
    /// Upper bound on vehicle commands, refused moves included
    pub max_commands: usize,
    pub seed: u64,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            coverage_target: 0.8,
            max_commands: 10_000,
            seed: 0,
        }
    }
}

impl RandomWalkConfig {
    pub fn validate(&self) -> CoverageResult<()> {
        validate_target(self.coverage_target)?;
        if self.max_commands == 0 {
            return Err(CoverageError::InvalidParameter(
                "max_commands must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct RandomWalkExplorer<V: Vehicle> {
    vehicle: V,
    model: CostModel,
    config: RandomWalkConfig,
    rng: StdRng,
}

impl<V: Vehicle> RandomWalkExplorer<V> {
    pub fn new(vehicle: V, model: CostModel, config: RandomWalkConfig) -> CoverageResult<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            vehicle,
            model,
            config,
            rng,
        })
    }

    pub fn into_vehicle(self) -> V {
        self.vehicle
    }

    /// Next action after a forward move went through
    fn after_move(&mut self) -> Option<Action> {
        match self.rng.gen_range(0..4) {
            0 => Some(Action::Forward),
            1 | 2 => Some(Action::RotateLeft),
            _ => None,
        }
    }
}

impl<V: Vehicle> CoveragePlanner for RandomWalkExplorer<V> {
    fn plan(&mut self, grid: &OccupancyGrid, start: Pose) -> CoverageResult<Plan> {
        if !grid.contains(start.cell()) {
            return Err(CoverageError::InvalidParameter(format!(
                "start {} is outside the grid",
                start
            )));
        }
        let target = self.config.coverage_target;
        info!("random walk from {}, target {:.2}", start, target);

        let mut pose = start;
        let mut coverage = CoverageTracker::new(grid);
        self.model.sense(grid, &mut coverage, &start);
        let mut actions = Vec::new();
        let mut cost = 0.0;
        let mut commands = 0;
        let mut queued: Vec<Action> = Vec::new();

        while coverage.fraction() < target && commands < self.config.max_commands {
            let action = queued.pop().unwrap_or(Action::Forward);
            commands += 1;
            match self.vehicle.perform(action, pose)? {
                Some(next) => {
                    let fresh = self.model.sense(grid, &mut coverage, &next);
                    cost += self.model.marginal_cost(action, fresh);
                    actions.push(action);
                    pose = next;
                    if action == Action::Forward {
                        queued.extend(self.after_move());
                    }
                }
                None => {
                    let turns = self.rng.gen_range(1..=3);
                    debug!("refused at {}, turning left {} times", pose, turns);
                    queued.clear();
                    queued.extend(std::iter::repeat(Action::RotateLeft).take(turns));
                }
            }
        }

        let status = if coverage.fraction() >= target {
            PlanStatus::TargetReached
        } else {
            PlanStatus::BudgetExhausted
        };
        info!(
            "random walk finished ({:?}) after {} commands: {} actions, coverage {:.3}",
            status,
            commands,
            actions.len(),
            coverage.fraction()
        );
        Ok(Plan {
            actions,
            final_pose: pose,
            coverage: coverage.fraction(),
            cost,
            status,
        })
    }
}
