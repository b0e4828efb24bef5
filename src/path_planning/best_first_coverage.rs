//! Best-first coverage planner
//!
//! Uniform-cost search over (pose, coverage) states. Edge weights are the
//! marginal costs of the cost model and may be negative, but each free cell
//! is credited at most once along a lineage, so the accumulated cost of a
//! plan is bounded below and there are no negative cycles.
//!
//! Nodes are popped in batches sharing the lowest (cost, covered count) key
//! and the search stops when a batch holds a node sensing the target
//! fraction of free cells. Every such node has the same coverage, so the
//! final coverage does not depend on the tie-break. When the target cannot be reached (for instance the start lies in a
//! pocket smaller than the target) the expansion and frontier caps end the
//! search and the best node generated so far is returned instead.

use std::collections::HashMap;

use log::{debug, info};
use serde::Deserialize;

use crate::common::{
    Action, CoverageError, CoveragePlanner, CoverageResult, Plan, PlanStatus, Pose,
};
use crate::mapping::CoverageKey;
use crate::path_planning::cost_model::{CostModel, PlanNode};
use crate::path_planning::frontier::{Frontier, TieBreak};
use crate::utils::OccupancyGrid;

/// Configuration for the best-first planner
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BestFirstConfig {
    /// Fraction of free cells to sense, in [0, 1]
    pub coverage_target: f64,
    /// Maximum number of node expansions
    pub max_expansions: usize,
    /// Maximum number of nodes waiting in the frontier
    pub max_frontier: usize,
    /// Ordering of equal-cost nodes
    pub tie_break: TieBreak,
    /// Seed for `TieBreak::Random`
    pub seed: u64,
}

impl Default for BestFirstConfig {
    fn default() -> Self {
        Self {
            coverage_target: 0.8,
            max_expansions: 50_000,
            max_frontier: 200_000,
            tie_break: TieBreak::Fifo,
            seed: 0,
        }
    }
}

impl BestFirstConfig {
    pub fn validate(&self) -> CoverageResult<()> {
        validate_target(self.coverage_target)?;
        if self.max_expansions == 0 || self.max_frontier == 0 {
            return Err(CoverageError::InvalidParameter(
                "max_expansions and max_frontier must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_target(target: f64) -> CoverageResult<()> {
    if !(0.0..=1.0).contains(&target) {
        return Err(CoverageError::InvalidParameter(format!(
            "coverage_target must be within [0, 1], got {}",
            target
        )));
    }
    Ok(())
}

/// Counters of the last search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub expansions: usize,
    pub generated: usize,
    pub pruned: usize,
}

/// Best-first (uniform-cost) coverage planner
pub struct BestFirstCoveragePlanner {
    model: CostModel,
    config: BestFirstConfig,
    stats: SearchStats,
}

impl BestFirstCoveragePlanner {
    pub fn new(model: CostModel, config: BestFirstConfig) -> CoverageResult<Self> {
        config.validate()?;
        Ok(Self {
            model,
            config,
            stats: SearchStats::default(),
        })
    }

    pub fn config(&self) -> &BestFirstConfig {
        &self.config
    }

    pub fn model(&self) -> &CostModel {
        &self.model
    }

    /// Counters of the most recent `plan` call
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Ordering used to pick the fallback plan: reaching the target wins,
    /// then lower cost, then more coverage.
    fn is_better(candidate: &PlanNode, incumbent: &PlanNode, target: f64) -> bool {
        let reached = |n: &PlanNode| n.coverage_fraction() >= target;
        match (reached(candidate), reached(incumbent)) {
            (true, false) => return true,
            (false, true) => return false,
            _ => {}
        }
        if candidate.cost != incumbent.cost {
            return candidate.cost < incumbent.cost;
        }
        candidate.coverage.covered_count() > incumbent.coverage.covered_count()
    }

    fn finish(node: PlanNode, status: PlanStatus) -> Plan {
        Plan {
            coverage: node.coverage_fraction(),
            cost: node.cost,
            final_pose: node.pose,
            actions: node.actions,
            status,
        }
    }
}

impl CoveragePlanner for BestFirstCoveragePlanner {
    fn plan(&mut self, grid: &OccupancyGrid, start: Pose) -> CoverageResult<Plan> {
        if !grid.contains(start.cell()) {
            return Err(CoverageError::InvalidParameter(format!(
                "start {} is outside the grid",
                start
            )));
        }
        let target = self.config.coverage_target;
        info!(
            "best-first coverage from {} on {}x{} grid, target {:.2}",
            start,
            grid.height(),
            grid.width(),
            target
        );

        let mut stats = SearchStats::default();
        let mut frontier = Frontier::new(self.config.tie_break, self.config.seed);
        // cheapest cost at which each (pose, coverage) state was generated
        let mut seen: HashMap<(Pose, CoverageKey), f64> = HashMap::new();

        let root = PlanNode::root(grid, start);
        seen.insert((root.pose, root.coverage.key()), root.cost);
        let mut best = root.clone();
        frontier.push(root);

        let status = 'search: loop {
            // every live node sharing the lowest (cost, coverage) key, so the
            // tie-break never decides what gets expanded
            let key = match frontier.peek_key() {
                Some(key) => key,
                None => break PlanStatus::SearchExhausted,
            };
            let mut batch = Vec::new();
            while frontier.peek_key() == Some(key) {
                if let Some(node) = frontier.pop() {
                    let cheapest = seen.get(&(node.pose, node.coverage.key()));
                    if cheapest.map_or(false, |&cost| cost < node.cost) {
                        stats.pruned += 1;
                    } else {
                        batch.push(node);
                    }
                }
            }

            if let Some(i) = batch.iter().position(|n| n.coverage_fraction() >= target) {
                let node = batch.swap_remove(i);
                info!(
                    "target reached after {} expansions: {} actions, cost {:.1}, coverage {:.3}",
                    stats.expansions,
                    node.actions.len(),
                    node.cost,
                    node.coverage_fraction()
                );
                self.stats = stats;
                return Ok(Self::finish(node, PlanStatus::TargetReached));
            }

            for node in batch {
                if stats.expansions >= self.config.max_expansions {
                    break 'search PlanStatus::BudgetExhausted;
                }
                stats.expansions += 1;

                for action in Action::ALL {
                    let mut child = node.clone();
                    if self.model.apply(grid, &mut child, action).is_none() {
                        continue;
                    }
                    let key = (child.pose, child.coverage.key());
                    if seen.get(&key).map_or(false, |&cost| cost <= child.cost) {
                        stats.pruned += 1;
                        continue;
                    }
                    seen.insert(key, child.cost);
                    stats.generated += 1;

                    if Self::is_better(&child, &best, target) {
                        best = child.clone();
                    }
                    frontier.push(child);
                }

                if stats.expansions % 1000 == 0 {
                    debug!(
                        "expansions: {}, frontier: {}, best cost: {:.1}, best coverage: {:.3}",
                        stats.expansions,
                        frontier.len(),
                        best.cost,
                        best.coverage_fraction()
                    );
                }
            }

            if frontier.len() > self.config.max_frontier {
                break PlanStatus::BudgetExhausted;
            }
        };

        info!(
            "search stopped ({:?}) after {} expansions, returning best plan: {} actions, coverage {:.3}",
            status,
            stats.expansions,
            best.actions.len(),
            best.coverage_fraction()
        );
        self.stats = stats;
        let status = if best.coverage_fraction() >= target {
            PlanStatus::TargetReached
        } else {
            status
        };
        Ok(Self::finish(best, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Orientation;
    use crate::mapping::SensorFootprint;
    use crate::path_tracking::simulate_plan;

    fn planner(target: f64) -> BestFirstCoveragePlanner {
        let config = BestFirstConfig {
            coverage_target: target,
            max_expansions: 20_000,
            ..Default::default()
        };
        BestFirstCoveragePlanner::new(CostModel::default(), config).unwrap()
    }

    fn replayed_coverage(grid: &OccupancyGrid, start: Pose, plan: &Plan) -> f64 {
        let steps = simulate_plan(grid, &SensorFootprint::default(), start, &plan.actions, false);
        steps.last().map(|s| s.coverage).unwrap_or(0.0)
    }

    #[test]
    fn test_open_3x3_low_target() {
        let grid = OccupancyGrid::from_rows(&vec![vec![0; 3]; 3]).unwrap();
        let start = Pose::new(1, 1, Orientation::Up);
        let plan = planner(0.1).plan(&grid, start).unwrap();

        assert!(!plan.is_empty());
        assert!(plan.reached_target());
        assert!(replayed_coverage(&grid, start, &plan) >= 0.1);
    }

    #[test]
    fn test_zero_target_gives_empty_plan() {
        let grid = OccupancyGrid::from_rows(&vec![vec![0; 3]; 3]).unwrap();
        let plan = planner(0.0).plan(&grid, Pose::new(1, 1, Orientation::Up)).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.status, PlanStatus::TargetReached);
    }

    #[test]
    fn test_blocked_top_row_never_starts_forward() {
        let grid = OccupancyGrid::from_rows(&[vec![1, 1, 1], vec![0, 0, 0], vec![0, 0, 0]]).unwrap();
        let start = Pose::new(1, 1, Orientation::Up);
        for target in [0.1, 0.5, 0.8, 1.0] {
            let plan = planner(target).plan(&grid, start).unwrap();
            assert_ne!(plan.actions.first(), Some(&Action::Forward));
        }
    }

    #[test]
    fn test_plans_never_enter_blocked_cells() {
        let grid = OccupancyGrid::from_rows(&[
            vec![0, 0, 0, 1, 0],
            vec![0, 1, 0, 1, 0],
            vec![0, 1, 0, 0, 0],
            vec![0, 0, 0, 1, 0],
        ])
        .unwrap();
        let start = Pose::new(3, 0, Orientation::Up);
        let plan = planner(0.6).plan(&grid, start).unwrap();

        let mut pose = start;
        for &action in &plan.actions {
            pose = pose.after(action);
            assert!(grid.is_free(pose.cell()), "entered {:?}", pose);
        }
        assert_eq!(pose, plan.final_pose);
        assert!(plan.reached_target());
        assert!((replayed_coverage(&grid, start, &plan) - plan.coverage).abs() < 1e-12);
    }

    #[test]
    fn test_unreachable_target_returns_best_plan() {
        // the start pocket holds 2 of the 6 free cells
        let grid = OccupancyGrid::from_rows(&[
            vec![0, 0, 1, 0, 0],
            vec![1, 1, 1, 0, 0],
        ])
        .unwrap();
        let config = BestFirstConfig {
            coverage_target: 0.9,
            max_expansions: 500,
            ..Default::default()
        };
        let mut planner = BestFirstCoveragePlanner::new(CostModel::default(), config).unwrap();
        let plan = planner.plan(&grid, Pose::new(0, 0, Orientation::Up)).unwrap();

        assert_ne!(plan.status, PlanStatus::TargetReached);
        assert!(plan.coverage < 0.9);
        assert!(planner.stats().expansions <= 500);
    }

    #[test]
    fn test_replanning_is_stable() {
        let square = OccupancyGrid::from_rows(&[
            vec![0, 0, 0, 0],
            vec![0, 1, 0, 0],
            vec![0, 0, 0, 1],
            vec![0, 0, 0, 0],
        ])
        .unwrap();
        let wide = OccupancyGrid::from_rows(&[
            vec![0, 0, 0, 1, 0],
            vec![0, 1, 0, 1, 0],
            vec![0, 1, 0, 0, 0],
            vec![0, 0, 0, 1, 0],
        ])
        .unwrap();
        let cases = [
            (&square, Pose::new(3, 0, Orientation::Right), 0.75),
            (&square, Pose::new(3, 0, Orientation::Up), 0.5),
            (&wide, Pose::new(3, 0, Orientation::Up), 0.6),
        ];

        for (grid, start, target) in cases {
            let first = planner(target).plan(grid, start).unwrap();
            let second = planner(target).plan(grid, start).unwrap();
            assert!(first.reached_target());
            assert_eq!(first.actions, second.actions);

            for seed in 0..8 {
                let config = BestFirstConfig {
                    coverage_target: target,
                    max_expansions: 20_000,
                    tie_break: TieBreak::Random,
                    seed,
                    ..Default::default()
                };
                let mut random = BestFirstCoveragePlanner::new(CostModel::default(), config).unwrap();
                let plan = random.plan(grid, start).unwrap();
                assert!(plan.reached_target());
                assert_eq!(plan.coverage, first.coverage, "seed {} target {}", seed, target);
                assert_eq!(plan.cost, first.cost);
            }
        }
    }

    #[test]
    fn test_rejects_start_outside_grid() {
        let grid = OccupancyGrid::from_rows(&vec![vec![0; 3]; 3]).unwrap();
        assert!(planner(0.5).plan(&grid, Pose::new(3, 0, Orientation::Up)).is_err());
        assert!(BestFirstCoveragePlanner::new(
            CostModel::default(),
            BestFirstConfig {
                coverage_target: 1.5,
                ..Default::default()
            }
        )
        .is_err());
    }
}
