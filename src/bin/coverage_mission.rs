// Coverage mission against a simulated vehicle on a random world.
//
// usage: coverage_mission [config.toml]

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use grid_coverage::mapping::{CoverageTracker, SensorFootprint};
use grid_coverage::path_tracking::simulate_plan;
use grid_coverage::utils::Visualizer;
use grid_coverage::vehicle::SimulatedVehicle;
use grid_coverage::{run_mission, CoverageConfig, CoverageResult, GridCell, OccupancyGrid, Orientation, Pose};

const HEIGHT: usize = 12;
const WIDTH: usize = 16;
const OBSTACLE_RATIO: f64 = 0.15;
const SEED: u64 = 7;

fn main() -> CoverageResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => CoverageConfig::load(Path::new(&path))?,
        None => CoverageConfig::default(),
    };

    let start = Pose::new(HEIGHT as i32 - 1, 1, Orientation::Up);
    let mut rng = StdRng::seed_from_u64(SEED);
    let world = OccupancyGrid::random(HEIGHT, WIDTH, OBSTACLE_RATIO, GridCell::new(start.row, start.col), &mut rng)?;
    let mut vehicle = SimulatedVehicle::new(world, start)?;

    let report = run_mission(&mut vehicle, &config)?;
    println!("strategy:   {:?}", report.strategy);
    println!("status:     {:?}", report.plan.status);
    println!("actions:    {}", report.plan.len());
    println!("coverage:   {:.3}", report.plan.coverage);
    println!("final pose: {}", report.final_pose);
    if let Some(execution) = &report.execution {
        println!("skipped:    {}", execution.skipped.len());
        println!("drifted:    {}", execution.drifted());
    }

    // redraw what the vehicle actually did
    let footprint = SensorFootprint::new(&config.sensor)?;
    let steps = simulate_plan(&report.grid, &footprint, report.start, vehicle.history(), true);
    let mut tracker = CoverageTracker::new(&report.grid);
    tracker.mark_all(&report.grid, footprint.cells(&report.start, &report.grid));
    let mut poses = vec![report.start];
    for step in &steps {
        tracker.mark_all(&report.grid, footprint.cells(&step.pose, &report.grid));
        poses.push(step.pose);
    }

    std::fs::create_dir_all("img/coverage")?;
    let mut vis = Visualizer::new();
    vis.set_title(&format!("{:?} mission", report.strategy))
        .plot_grid(&report.grid)
        .plot_coverage(&report.grid, &tracker)
        .plot_trajectory(&poses)
        .plot_vehicle(&report.final_pose);
    vis.save_png("./img/coverage/coverage_mission.png", 800, 600)?;
    println!("Plot saved to ./img/coverage/coverage_mission.png");
    Ok(())
}
