//! End-to-end coverage mission
//!
//! Fetch the grid and the vehicle status, run the configured strategy from
//! the pose the vehicle reports and, for offline plans, execute the result.

use log::{info, warn};

use crate::common::{
    CoverageError, CoveragePlanner, CoverageResult, GridSource, Plan, Pose, Vehicle,
};
use crate::config::{CoverageConfig, Strategy};
use crate::path_planning::{
    BestFirstCoveragePlanner, CostModel, GreedyOnlinePlanner, RandomWalkExplorer,
    ReachabilityBfsExplorer,
};
use crate::path_tracking::{ExecutionReport, PlanExecutor};
use crate::utils::OccupancyGrid;

#[derive(Debug, Clone)]
pub struct MissionReport {
    pub strategy: Strategy,
    pub grid: OccupancyGrid,
    /// Pose the vehicle reported before planning
    pub start: Pose,
    pub plan: Plan,
    /// Present when the plan was executed after planning
    pub execution: Option<ExecutionReport>,
    /// Pose the vehicle reports at the end
    pub final_pose: Pose,
}

pub fn run_mission<V>(vehicle: &mut V, config: &CoverageConfig) -> CoverageResult<MissionReport>
where
    V: Vehicle + GridSource,
{
    config.validate()?;
    let grid = vehicle.get_grid()?;
    let start = vehicle.get_status()?;
    if !grid.contains(start.cell()) {
        return Err(CoverageError::InvalidParameter(format!(
            "vehicle reports {} outside the {}x{} grid",
            start,
            grid.height(),
            grid.width()
        )));
    }
    // a stale snapshot may show the vehicle's own cell blocked; planners only
    // check destinations, so planning from it is still sound
    if !grid.is_free(start.cell()) {
        warn!("grid shows the vehicle's cell {} as blocked", start);
    }
    let model = CostModel::from_config(&config.sensor, &config.cost)?;
    let strategy = config.mission.strategy;
    info!(
        "{:?} mission on {}x{} grid ({} free cells) from {}",
        strategy,
        grid.height(),
        grid.width(),
        grid.free_cell_count(),
        start
    );

    let (plan, execution) = match strategy {
        Strategy::BestFirst => {
            let plan = BestFirstCoveragePlanner::new(model, config.best_first.clone())?
                .plan(&grid, start)?;
            let execution = PlanExecutor::new(&mut *vehicle).execute(start, &plan.actions)?;
            (plan, Some(execution))
        }
        Strategy::Greedy => {
            let plan = GreedyOnlinePlanner::new(&mut *vehicle, model, config.greedy.clone())?
                .plan(&grid, start)?;
            (plan, None)
        }
        Strategy::Reachability => {
            let plan = ReachabilityBfsExplorer::new(&mut *vehicle, model, config.reachability.clone())?
                .plan(&grid, start)?;
            (plan, None)
        }
        Strategy::RandomWalk => {
            let plan = RandomWalkExplorer::new(&mut *vehicle, model, config.random_walk.clone())?
                .plan(&grid, start)?;
            (plan, None)
        }
    };

    let final_pose = vehicle.get_status()?;
    info!(
        "mission finished ({:?}): {} actions, coverage {:.3}, vehicle at {}",
        plan.status,
        plan.len(),
        plan.coverage,
        final_pose
    );
    Ok(MissionReport {
        strategy,
        grid,
        start,
        plan,
        execution,
        final_pose,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{GridCell, Orientation};
    use crate::config::MissionConfig;
    use crate::vehicle::SimulatedVehicle;

    fn config(strategy: Strategy) -> CoverageConfig {
        let mut config = CoverageConfig {
            mission: MissionConfig { strategy },
            ..Default::default()
        };
        config.best_first.coverage_target = 0.6;
        config.greedy.coverage_target = 0.6;
        config.random_walk.coverage_target = 0.6;
        config
    }

    fn world() -> OccupancyGrid {
        OccupancyGrid::from_rows(&[
            vec![0, 0, 0, 0, 0],
            vec![0, 1, 1, 0, 0],
            vec![0, 0, 0, 0, 1],
            vec![0, 0, 0, 0, 0],
        ])
        .unwrap()
    }

    #[test]
    fn test_best_first_mission_executes_plan() {
        let start = Pose::new(3, 0, Orientation::Up);
        let mut vehicle = SimulatedVehicle::new(world(), start).unwrap();
        let report = run_mission(&mut vehicle, &config(Strategy::BestFirst)).unwrap();

        assert!(report.plan.reached_target());
        let execution = report.execution.unwrap();
        assert!(execution.skipped.is_empty());
        assert!(!execution.drifted());
        assert_eq!(report.final_pose, report.plan.final_pose);
    }

    #[test]
    fn test_online_missions() {
        let start = Pose::new(3, 0, Orientation::Up);

        let mut vehicle = SimulatedVehicle::new(world(), start).unwrap();
        let greedy = run_mission(&mut vehicle, &config(Strategy::Greedy)).unwrap();
        assert!(greedy.plan.reached_target());
        assert!(greedy.execution.is_none());
        assert_eq!(vehicle.history(), greedy.plan.actions.as_slice());

        let mut vehicle = SimulatedVehicle::new(world(), start).unwrap();
        let sweep = run_mission(&mut vehicle, &config(Strategy::Reachability)).unwrap();
        assert_eq!(sweep.final_pose, sweep.plan.final_pose);
        assert!(sweep.plan.coverage > 0.6);
    }

    #[test]
    fn test_plans_from_reported_cell_on_stale_snapshot() {
        let world = OccupancyGrid::from_rows(&vec![vec![0; 5]; 5]).unwrap();
        let stale = world.with_cell(GridCell::new(0, 4), true).unwrap();
        let start = Pose::new(0, 4, Orientation::Up);

        for strategy in [Strategy::BestFirst, Strategy::Greedy, Strategy::Reachability] {
            let mut vehicle = SimulatedVehicle::new(world.clone(), start)
                .unwrap()
                .with_snapshot(stale.clone());
            let report = run_mission(&mut vehicle, &config(strategy)).unwrap();

            assert_eq!(report.start, start);
            assert_eq!(report.final_pose, report.plan.final_pose, "{:?}", strategy);
            if let Some(execution) = &report.execution {
                assert!(execution.skipped.is_empty());
                assert!(!execution.drifted());
            }
        }
    }

    #[test]
    fn test_random_walk_mission() {
        let start = Pose::new(3, 0, Orientation::Up);
        let mut vehicle = SimulatedVehicle::new(world(), start).unwrap();
        let report = run_mission(&mut vehicle, &config(Strategy::RandomWalk)).unwrap();

        assert!(report.execution.is_none());
        assert_eq!(vehicle.history(), report.plan.actions.as_slice());
        assert_eq!(report.final_pose, report.plan.final_pose);
    }

    #[test]
    fn test_vehicle_outside_grid_is_an_error() {
        let start = Pose::new(3, 0, Orientation::Up);
        let small = OccupancyGrid::from_rows(&vec![vec![0; 2]; 2]).unwrap();
        let mut vehicle = SimulatedVehicle::new(world(), start).unwrap().with_snapshot(small);
        assert!(matches!(
            run_mission(&mut vehicle, &config(Strategy::Greedy)),
            Err(CoverageError::InvalidParameter(_))
        ));
        assert!(vehicle.history().is_empty());
    }
}
