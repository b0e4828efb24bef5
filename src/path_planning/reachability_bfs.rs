//! Reachability sweep by trial moves
//!
//! Breadth-first exploration of the free space that does not trust the grid
//! for passability. From every dequeued state the vehicle is driven to the
//! state's cell and tries to step forward, left and right; whatever the
//! vehicle accepts is reachable. The grid only bounds the search and vets
//! cells before they are queued.

use std::collections::{BTreeSet, HashMap, VecDeque};

use log::{debug, info, warn};
use serde::Deserialize;

use crate::common::{
    Action, CoverageError, CoveragePlanner, CoverageResult, GridCell, Orientation, Plan,
    PlanStatus, Pose, Vehicle,
};
use crate::mapping::CoverageTracker;
use crate::path_planning::cost_model::CostModel;
use crate::utils::OccupancyGrid;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReachabilityConfig {
    /// Upper bound on vehicle commands issued by one sweep
    pub max_commands: usize,
}

impl Default for ReachabilityConfig {
    fn default() -> Self {
        Self {
            max_commands: 1_000_000,
        }
    }
}

impl ReachabilityConfig {
    pub fn validate(&self) -> CoverageResult<()> {
        if self.max_commands == 0 {
            return Err(CoverageError::InvalidParameter(
                "max_commands must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of one sweep
#[derive(Debug, Clone)]
pub struct ExplorationReport {
    /// Every cell the vehicle stood on
    pub visited: BTreeSet<GridCell>,
    /// Commands sent to the vehicle, rejected moves included
    pub commands: usize,
    pub rejected_moves: usize,
    /// Actions the vehicle carried out, in order
    pub actions: Vec<Action>,
    pub final_pose: Pose,
    /// Sensed fraction of free cells
    pub coverage: f64,
    pub cost: f64,
    /// False when the command budget ran out before the queue emptied
    pub complete: bool,
}

/// Bookkeeping of a sweep in progress
struct Sweep {
    pose: Pose,
    visited: BTreeSet<GridCell>,
    refused: BTreeSet<GridCell>,
    coverage: CoverageTracker,
    actions: Vec<Action>,
    cost: f64,
    commands: usize,
    rejected: usize,
    /// Set once a command was withheld for lack of budget
    budget_hit: bool,
}

pub struct ReachabilityBfsExplorer<V: Vehicle> {
    vehicle: V,
    model: CostModel,
    config: ReachabilityConfig,
}

impl<V: Vehicle> ReachabilityBfsExplorer<V> {
    pub fn new(vehicle: V, model: CostModel, config: ReachabilityConfig) -> CoverageResult<Self> {
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

    /// Send one command. `Ok(None)` means the vehicle refused the move or
    /// the command budget is spent.
    fn issue(
        &mut self,
        grid: &OccupancyGrid,
        sweep: &mut Sweep,
        action: Action,
    ) -> CoverageResult<Option<Pose>> {
        if sweep.commands >= self.config.max_commands {
            sweep.budget_hit = true;
            return Ok(None);
        }
        sweep.commands += 1;
        let pose = match self.vehicle.perform(action, sweep.pose)? {
            Some(pose) => pose,
            None => return Ok(None),
        };
        let fresh = self.model.sense(grid, &mut sweep.coverage, &pose);
        sweep.cost += self.model.marginal_cost(action, fresh);
        sweep.actions.push(action);
        sweep.pose = pose;
        Ok(Some(pose))
    }

    /// Turn to `heading` with the fewest quarter turns
    fn face(&mut self, grid: &OccupancyGrid, sweep: &mut Sweep, heading: Orientation) -> CoverageResult<bool> {
        let current = sweep.pose.orientation;
        let turns: &[Action] = if current == heading {
            &[]
        } else if current.rotated_left() == heading {
            &[Action::RotateLeft]
        } else if current.rotated_right() == heading {
            &[Action::RotateRight]
        } else {
            &[Action::RotateRight, Action::RotateRight]
        };
        for &turn in turns {
            if self.issue(grid, sweep, turn)?.is_none() {
                return Ok(false);
            }
        }
        Ok(sweep.pose.orientation == heading)
    }

    /// Drive to `target` along a shortest path through visited cells
    fn navigate_to(&mut self, grid: &OccupancyGrid, sweep: &mut Sweep, target: GridCell) -> CoverageResult<bool> {
        let origin = sweep.pose.cell();
        if origin == target {
            return Ok(true);
        }

        let mut came_from: HashMap<GridCell, (GridCell, Orientation)> = HashMap::new();
        let mut open = VecDeque::from([origin]);
        while let Some(cell) = open.pop_front() {
            if cell == target {
                break;
            }
            for (heading, next) in cell.neighbors() {
                if next != origin && sweep.visited.contains(&next) && !came_from.contains_key(&next) {
                    came_from.insert(next, (cell, heading));
                    open.push_back(next);
                }
            }
        }

        let mut headings = Vec::new();
        let mut cell = target;
        while cell != origin {
            let (previous, heading) = match came_from.get(&cell) {
                Some(&link) => link,
                None => {
                    warn!("no visited path from {:?} to {:?}", origin, target);
                    return Ok(false);
                }
            };
            headings.push(heading);
            cell = previous;
        }

        for heading in headings.into_iter().rev() {
            if !self.face(grid, sweep, heading)? || self.issue(grid, sweep, Action::Forward)?.is_none() {
                warn!("lost the way to {:?} at {}", target, sweep.pose);
                return Ok(false);
            }
        }
        Ok(sweep.pose.cell() == target)
    }

    /// Try a step from `state` in each of `headings`, queueing what the vehicle
    /// reaches and returning to the state's cell after every success.
    fn try_headings(
        &mut self,
        grid: &OccupancyGrid,
        sweep: &mut Sweep,
        queue: &mut VecDeque<Pose>,
        state: Pose,
        headings: &[Orientation],
    ) -> CoverageResult<()> {
        for &heading in headings {
            let (d_row, d_col) = heading.delta();
            let target = state.cell().offset(d_row, d_col);
            if !grid.contains(target) || sweep.visited.contains(&target) || sweep.refused.contains(&target) {
                continue;
            }
            if !self.face(grid, sweep, heading)? {
                return Ok(());
            }
            let reached = match self.issue(grid, sweep, Action::Forward)? {
                Some(pose) => pose,
                None if sweep.budget_hit => return Ok(()),
                None => {
                    sweep.rejected += 1;
                    sweep.refused.insert(target);
                    continue;
                }
            };

            let cell = reached.cell();
            sweep.visited.insert(cell);
            if grid.is_free(cell) {
                debug!("reached {:?} heading {}", cell, heading);
                queue.push_back(reached);
            } else {
                warn!("vehicle entered {:?}, which the grid shows blocked", cell);
            }

            if !self.navigate_to(grid, sweep, state.cell())? {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Sweep everything reachable from `start`
    pub fn explore(&mut self, grid: &OccupancyGrid, start: Pose) -> CoverageResult<ExplorationReport> {
        if !grid.contains(start.cell()) {
            return Err(CoverageError::InvalidParameter(format!(
                "start {} is outside the grid",
                start
            )));
        }
        info!("reachability sweep from {}", start);

        let mut sweep = Sweep {
            pose: start,
            visited: BTreeSet::from([start.cell()]),
            refused: BTreeSet::new(),
            coverage: CoverageTracker::new(grid),
            actions: Vec::new(),
            cost: 0.0,
            commands: 0,
            rejected: 0,
            budget_hit: false,
        };
        self.model.sense(grid, &mut sweep.coverage, &start);

        // the start state also looks behind, later states came from there
        let o = start.orientation;
        let mut queue = VecDeque::new();
        self.try_headings(
            grid,
            &mut sweep,
            &mut queue,
            start,
            &[o, o.rotated_left(), o.rotated_right(), o.opposite()],
        )?;

        while let Some(state) = queue.pop_front() {
            if sweep.budget_hit {
                break;
            }
            if !self.navigate_to(grid, &mut sweep, state.cell())? {
                continue;
            }
            let o = state.orientation;
            self.try_headings(
                grid,
                &mut sweep,
                &mut queue,
                state,
                &[o, o.rotated_left(), o.rotated_right()],
            )?;
        }

        let complete = !sweep.budget_hit;
        if !complete {
            warn!("command budget of {} spent", self.config.max_commands);
        }
        info!(
            "sweep visited {} cells with {} commands ({} rejected), coverage {:.3}",
            sweep.visited.len(),
            sweep.commands,
            sweep.rejected,
            sweep.coverage.fraction()
        );
        Ok(ExplorationReport {
            visited: sweep.visited,
            commands: sweep.commands,
            rejected_moves: sweep.rejected,
            actions: sweep.actions,
            final_pose: sweep.pose,
            coverage: sweep.coverage.fraction(),
            cost: sweep.cost,
            complete,
        })
    }
}

impl<V: Vehicle> CoveragePlanner for ReachabilityBfsExplorer<V> {
    /// The sweep is executed while it is planned; the returned plan records
    /// what the vehicle did.
    fn plan(&mut self, grid: &OccupancyGrid, start: Pose) -> CoverageResult<Plan> {
        let report = self.explore(grid, start)?;
        let status = if !report.complete {
            PlanStatus::BudgetExhausted
        } else if report.coverage >= 1.0 {
            PlanStatus::TargetReached
        } else {
            PlanStatus::SearchExhausted
        };
        Ok(Plan {
            actions: report.actions,
            final_pose: report.final_pose,
            coverage: report.coverage,
            cost: report.cost,
            status,
        })
    }
}
