// Best-first coverage planning on a hand-drawn map.
// The plan is replayed offline and the covered cells are plotted.

use grid_coverage::mapping::{CoverageTracker, SensorFootprint};
use grid_coverage::path_planning::{BestFirstConfig, BestFirstCoveragePlanner, CostModel};
use grid_coverage::path_tracking::{simulate_plan, trajectory};
use grid_coverage::utils::Visualizer;
use grid_coverage::{CoveragePlanner, CoverageResult, OccupancyGrid, Orientation, Pose};

fn main() -> CoverageResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let grid = OccupancyGrid::from_rows(&[
        vec![0, 0, 0, 0, 0, 0],
        vec![0, 1, 1, 0, 0, 0],
        vec![0, 0, 0, 0, 1, 0],
        vec![0, 0, 1, 0, 1, 0],
        vec![0, 0, 0, 0, 0, 0],
    ])?
    .upscaled(2)?;
    let start = grid.resolve_start(Pose::new(grid.height() as i32 - 1, 0, Orientation::Up))?;

    let config = BestFirstConfig {
        coverage_target: 0.8,
        ..Default::default()
    };
    let mut planner = BestFirstCoveragePlanner::new(CostModel::default(), config)?;
    let plan = planner.plan(&grid, start)?;
    let stats = planner.stats();

    println!("status:     {:?}", plan.status);
    println!("actions:    {}", plan.action_string());
    println!("length:     {}", plan.len());
    println!("cost:       {:.1}", plan.cost);
    println!("coverage:   {:.3}", plan.coverage);
    println!("expansions: {} (generated {}, pruned {})", stats.expansions, stats.generated, stats.pruned);

    let footprint = SensorFootprint::default();
    let steps = simulate_plan(&grid, &footprint, start, &plan.actions, false);
    let poses = trajectory(start, &steps);
    let mut tracker = CoverageTracker::new(&grid);
    for pose in &poses[1..] {
        tracker.mark_all(&grid, footprint.cells(pose, &grid));
    }

    std::fs::create_dir_all("img/coverage")?;
    let mut vis = Visualizer::new();
    vis.set_title("Best-first coverage")
        .plot_grid(&grid)
        .plot_coverage(&grid, &tracker)
        .plot_trajectory(&poses)
        .plot_vehicle(&plan.final_pose);
    vis.save_svg("./img/coverage/best_first_coverage.svg")?;
    println!("Plot saved to ./img/coverage/best_first_coverage.svg");
    Ok(())
}
