//! Visualization utilities for grid_coverage
//!
//! Renders an occupancy grid, the sensed cells and the driven trajectory with
//! gnuplot. Rows grow downwards on screen, so a cell is drawn at
//! `(col, -row)`.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{CoverageError, CoverageResult, GridCell, Pose};
use crate::mapping::CoverageTracker;
use crate::utils::OccupancyGrid;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const CYAN: &str = "#00FFFF";
    pub const GRAY: &str = "#808080";

    // Semantic colors
    pub const OBSTACLE: &str = BLACK;
    pub const COVERED: &str = "#35C788";
    pub const START: &str = GREEN;
    pub const TRAJECTORY: &str = RED;
    pub const VEHICLE: &str = CYAN;
    pub const VISITED: &str = GRAY;
}

/// Style for cell rendering
#[derive(Debug, Clone)]
pub struct CellStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl CellStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'S',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }
}

fn to_xy(cells: impl Iterator<Item = GridCell>) -> (Vec<f64>, Vec<f64>) {
    cells.map(|c| (c.col as f64, -(c.row as f64))).unzip()
}

/// Main visualizer struct
pub struct Visualizer {
    figure: Figure,
    title: String,
    extent: Option<(usize, usize)>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            figure: Figure::new(),
            title: String::new(),
            extent: None,
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Obstacles of the grid; also fixes the plot range to the grid
    pub fn plot_grid(&mut self, grid: &OccupancyGrid) -> &mut Self {
        self.extent = Some((grid.height(), grid.width()));
        let (x, y) = to_xy(grid.blocked_cells());
        self.figure.axes2d().points(
            &x,
            &y,
            &[
                Caption("Obstacles"),
                Color(colors::OBSTACLE),
                PointSymbol('S'),
                PointSize(1.5),
            ],
        );
        self
    }

    /// Cells sensed at least once
    pub fn plot_coverage(&mut self, grid: &OccupancyGrid, tracker: &CoverageTracker) -> &mut Self {
        let covered = grid.cells().filter(|&c| tracker.is_covered(c));
        self.plot_cells(covered, &CellStyle::new(colors::COVERED, "Covered"))
    }

    pub fn plot_cells(
        &mut self,
        cells: impl Iterator<Item = GridCell>,
        style: &CellStyle,
    ) -> &mut Self {
        let (x, y) = to_xy(cells);
        self.figure.axes2d().points(
            &x,
            &y,
            &[
                Caption(&style.caption),
                Color(&style.color),
                PointSymbol(style.symbol),
                PointSize(style.size),
            ],
        );
        self
    }

    /// Path through the cells of successive poses
    pub fn plot_trajectory(&mut self, poses: &[Pose]) -> &mut Self {
        let (x, y) = to_xy(poses.iter().map(|p| p.cell()));
        self.figure.axes2d().lines(
            &x,
            &y,
            &[
                Caption("Trajectory"),
                Color(colors::TRAJECTORY),
                LineWidth(2.0),
            ],
        );
        self
    }

    /// Vehicle marker with a short heading stroke
    pub fn plot_vehicle(&mut self, pose: &Pose) -> &mut Self {
        let (x, y) = (pose.col as f64, -(pose.row as f64));
        let (dr, dc) = pose.orientation.delta();
        let (hx, hy) = (x + 0.5 * dc as f64, y - 0.5 * dr as f64);
        self.figure
            .axes2d()
            .points(
                &[x],
                &[y],
                &[
                    Caption("Vehicle"),
                    Color(colors::VEHICLE),
                    PointSymbol('O'),
                    PointSize(2.0),
                ],
            )
            .lines(&[x, hx], &[y, hy], &[Color(colors::VEHICLE), LineWidth(2.0)]);
        self
    }

    pub fn show(&mut self) -> CoverageResult<()> {
        self.apply_settings();
        self.figure
            .show()
            .map(|_| ())
            .map_err(|e| CoverageError::Visualization(e.to_string()))
    }

    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> CoverageResult<()> {
        self.apply_settings();
        self.figure
            .save_to_png(path, width, height)
            .map_err(|e| CoverageError::Visualization(e.to_string()))
    }

    pub fn save_svg(&mut self, path: &str) -> CoverageResult<()> {
        self.apply_settings();
        self.figure
            .save_to_svg(path, 800, 600)
            .map_err(|e| CoverageError::Visualization(e.to_string()))
    }

    fn apply_settings(&mut self) {
        let title = self.title.clone();
        let extent = self.extent;
        let axes = self.figure.axes2d();

        if !title.is_empty() {
            axes.set_title(&title, &[]);
        }
        axes.set_x_label("col", &[]);
        axes.set_y_label("-row", &[]);
        if let Some((height, width)) = extent {
            axes.set_x_range(AutoOption::Fix(-1.0), AutoOption::Fix(width as f64));
            axes.set_y_range(AutoOption::Fix(-(height as f64)), AutoOption::Fix(1.0));
        }
        axes.set_aspect_ratio(AutoOption::Fix(1.0));
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_screen() {
        let (x, y) = to_xy(vec![GridCell::new(2, 5), GridCell::new(0, 1)].into_iter());
        assert_eq!(x, vec![5.0, 1.0]);
        assert_eq!(y, vec![-2.0, -0.0]);
    }

    #[test]
    fn test_cell_style() {
        let style = CellStyle::new(colors::RED, "Test").with_size(3.0);
        assert_eq!(style.size, 3.0);
        assert_eq!(style.color, colors::RED);
    }
}
