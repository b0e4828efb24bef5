//! Greedy online coverage
//!
//! Plans one action at a time and executes it on the vehicle immediately.
//! Each step scores forward, rotate-left and rotate-right by the number of
//! free cells they would sense for the first time and performs the best one.
//! The pose and coverage are then taken from what the vehicle reports, so a
//! drifting vehicle is followed rather than fought.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Deserialize;

use crate::common::{
    Action, CoverageError, CoveragePlanner, CoverageResult, GridCell, Orientation, Plan,
    PlanStatus, Pose, Vehicle,
};
use crate::mapping::CoverageTracker;
use crate::path_planning::best_first_coverage::validate_target;
use crate::path_planning::cost_model::CostModel;
use crate::utils::OccupancyGrid;

/// Configuration for the greedy online planner
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GreedyConfig {
    /// Fraction of free cells to sense, in [0, 1]
    pub coverage_target: f64,
    /// Maximum number of steps, productive or not
    pub max_steps: usize,
    /// Consecutive steps without new coverage before giving up
    pub max_stalled_steps: usize,
    /// Heading assumed after a failed fallback move
    pub fallback_orientation: Orientation,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            coverage_target: 0.8,
            max_steps: 10_000,
            max_stalled_steps: 64,
            fallback_orientation: Orientation::Up,
        }
    }
}

impl GreedyConfig {
    pub fn validate(&self) -> CoverageResult<()> {
        validate_target(self.coverage_target)?;
        if self.max_stalled_steps == 0 {
            return Err(CoverageError::InvalidParameter(
                "max_stalled_steps must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// What a single greedy step achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// The chosen action sensed new cells
    Productive { new_cells: usize },
    /// Nothing scored; a forced forward move went through
    Fallback { new_cells: usize },
    /// No effect: the move was invalid or refused
    NonProductive,
}

impl StepKind {
    pub fn new_cells(&self) -> usize {
        match *self {
            StepKind::Productive { new_cells } | StepKind::Fallback { new_cells } => new_cells,
            StepKind::NonProductive => 0,
        }
    }
}

/// Record of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreedyStep {
    pub action: Action,
    pub kind: StepKind,
    /// Believed pose after the step
    pub pose: Pose,
}

/// Mutable state of one online run
#[derive(Debug, Clone)]
pub struct GreedyState {
    pub pose: Pose,
    pub coverage: CoverageTracker,
    pub cost: f64,
    /// Actions the vehicle carried out
    pub executed: Vec<Action>,
    pub steps: Vec<GreedyStep>,
    /// Cells the vehicle refused to enter although the grid shows them free
    pub refused: HashSet<GridCell>,
}

impl GreedyState {
    /// State at `start` with nothing sensed
    pub fn new(grid: &OccupancyGrid, start: Pose) -> Self {
        Self {
            pose: start,
            coverage: CoverageTracker::new(grid),
            cost: 0.0,
            executed: Vec::new(),
            steps: Vec::new(),
            refused: HashSet::new(),
        }
    }

    pub fn coverage_fraction(&self) -> f64 {
        self.coverage.fraction()
    }
}

/// Greedy planner bound to the vehicle it drives
pub struct GreedyOnlinePlanner<V: Vehicle> {
    vehicle: V,
    model: CostModel,
    config: GreedyConfig,
}

impl<V: Vehicle> GreedyOnlinePlanner<V> {
    pub fn new(vehicle: V, model: CostModel, config: GreedyConfig) -> CoverageResult<Self> {
        config.validate()?;
        Ok(Self {
            vehicle,
            model,
            config,
        })
    }

    pub fn vehicle(&self) -> &V {
        &self.vehicle
    }

    pub fn into_vehicle(self) -> V {
        self.vehicle
    }

    fn successor(&self, grid: &OccupancyGrid, state: &GreedyState, action: Action) -> Option<Pose> {
        self.model
            .successor(grid, &state.pose, action)
            .filter(|next| action != Action::Forward || !state.refused.contains(&next.cell()))
    }

    /// Best valid candidate that senses at least one new cell. Earlier
    /// actions in `Action::ALL` win ties.
    pub fn choose(&self, grid: &OccupancyGrid, state: &GreedyState) -> Option<(Action, usize)> {
        let mut best: Option<(Action, usize)> = None;
        for action in Action::ALL {
            let next = match self.successor(grid, state, action) {
                Some(next) => next,
                None => continue,
            };
            let gain = self.model.new_cells(grid, &state.coverage, &next);
            if gain > best.map_or(0, |(_, g)| g) {
                best = Some((action, gain));
            }
        }
        best
    }

    /// Perform `action` and fold the reported pose into `state`.
    /// Returns the number of new cells, or `None` if the vehicle refused.
    fn execute(
        &mut self,
        grid: &OccupancyGrid,
        state: &mut GreedyState,
        action: Action,
    ) -> CoverageResult<Option<usize>> {
        match self.vehicle.perform(action, state.pose)? {
            Some(pose) => {
                let fresh = self.model.sense(grid, &mut state.coverage, &pose);
                state.cost += self.model.marginal_cost(action, fresh);
                state.pose = pose;
                state.executed.push(action);
                Ok(Some(fresh))
            }
            None => {
                state.refused.insert(state.pose.ahead());
                Ok(None)
            }
        }
    }

    /// Choose, perform and record one step
    pub fn step(&mut self, grid: &OccupancyGrid, state: &mut GreedyState) -> CoverageResult<StepKind> {
        let (action, kind) = match self.choose(grid, state) {
            Some((action, gain)) => {
                debug!("{} -> {} ({} new cells expected)", state.pose, action, gain);
                let kind = match self.execute(grid, state, action)? {
                    Some(0) => StepKind::NonProductive,
                    Some(new_cells) => StepKind::Productive { new_cells },
                    None => {
                        warn!("vehicle refused {} from {}", action, state.pose);
                        StepKind::NonProductive
                    }
                };
                (action, kind)
            }
            None => (Action::Forward, self.fallback(grid, state)?),
        };
        state.steps.push(GreedyStep {
            action,
            kind,
            pose: state.pose,
        });
        Ok(kind)
    }

    /// Nothing scores: force a forward move, and if that cannot happen
    /// assume the default heading and carry on.
    fn fallback(&mut self, grid: &OccupancyGrid, state: &mut GreedyState) -> CoverageResult<StepKind> {
        if self.successor(grid, state, Action::Forward).is_some() {
            if let Some(new_cells) = self.execute(grid, state, Action::Forward)? {
                return Ok(StepKind::Fallback { new_cells });
            }
            warn!("vehicle refused fallback move from {}", state.pose);
        }
        debug!(
            "no move from {}, assuming {}",
            state.pose, self.config.fallback_orientation
        );
        state.pose = state.pose.with_orientation(self.config.fallback_orientation);
        Ok(StepKind::NonProductive)
    }

    /// Run from an existing state until the target, the step budget or the
    /// stall limit is hit.
    pub fn run(&mut self, grid: &OccupancyGrid, state: &mut GreedyState) -> CoverageResult<PlanStatus> {
        let target = self.config.coverage_target;
        let mut taken = 0;
        let mut stalled = 0;
        while state.coverage_fraction() < target {
            if taken >= self.config.max_steps {
                return Ok(PlanStatus::BudgetExhausted);
            }
            if stalled >= self.config.max_stalled_steps {
                warn!(
                    "no new coverage for {} steps at {:.3}, stopping",
                    stalled,
                    state.coverage_fraction()
                );
                return Ok(PlanStatus::Stalled);
            }
            if self.step(grid, state)?.new_cells() > 0 {
                stalled = 0;
            } else {
                stalled += 1;
            }
            taken += 1;
        }
        Ok(PlanStatus::TargetReached)
    }
}

impl<V: Vehicle> CoveragePlanner for GreedyOnlinePlanner<V> {
    fn plan(&mut self, grid: &OccupancyGrid, start: Pose) -> CoverageResult<Plan> {
        if !grid.contains(start.cell()) {
            return Err(CoverageError::InvalidParameter(format!(
                "start {} is outside the grid",
                start
            )));
        }
        info!(
            "greedy online coverage from {}, target {:.2}",
            start, self.config.coverage_target
        );

        // the vehicle already senses from where it stands
        let mut state = GreedyState::new(grid, start);
        self.model.sense(grid, &mut state.coverage, &start);

        let status = self.run(grid, &mut state)?;
        info!(
            "greedy run finished ({:?}) after {} steps: {} actions, coverage {:.3}",
            status,
            state.steps.len(),
            state.executed.len(),
            state.coverage_fraction()
        );
        Ok(Plan {
            coverage: state.coverage_fraction(),
            cost: state.cost,
            final_pose: state.pose,
            actions: state.executed,
            status,
        })
    }
}
