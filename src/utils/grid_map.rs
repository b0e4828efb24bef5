// Occupancy grid definition
// author:Salah Eddine Ghamri (s.ghamri)

use std::ops::Deref;

use itertools::iproduct;
use log::warn;
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};

use crate::common::{CoverageError, CoverageResult, GridCell, Pose};

extern crate nalgebra as na;

/// Traversable cell
pub const FREE: u8 = 0;
/// Obstacle cell
pub const BLOCKED: u8 = 1;

/// Basemap pixel value the world service uses for obstacles
const BLOCKED_RGB: [u8; 3] = [255, 255, 255];

/// Immutable rectangular occupancy grid, indexed `(row, col)`.
///
/// Construction guarantees every value is `FREE` or `BLOCKED` and that at
/// least one cell is free.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    grid: na::DMatrix<u8>,
    free_cells: usize,
}

impl OccupancyGrid {
    pub fn new(matrix: na::DMatrix<u8>) -> CoverageResult<Self> {
        if matrix.nrows() == 0 || matrix.ncols() == 0 {
            return Err(CoverageError::MalformedGrid("grid has no cells".to_string()));
        }
        if let Some(bad) = matrix.iter().find(|&&v| v != FREE && v != BLOCKED) {
            return Err(CoverageError::MalformedGrid(format!(
                "unexpected cell value {}",
                bad
            )));
        }
        let free_cells = matrix.iter().filter(|&&v| v == FREE).count();
        if free_cells == 0 {
            return Err(CoverageError::MalformedGrid("grid has no free cell".to_string()));
        }
        Ok(Self { grid: matrix, free_cells })
    }

    /// Build from rows of `0 = free, 1 = blocked`.
    pub fn from_rows(rows: &[Vec<u8>]) -> CoverageResult<Self> {
        let width = Self::check_rectangular(rows)?;
        let matrix = na::DMatrix::from_fn(rows.len(), width, |r, c| rows[r][c]);
        Self::new(matrix)
    }

    /// Build from the RGB basemap served by the world service, where white
    /// pixels are obstacles and everything else is free.
    pub fn from_rgb_rows(rows: &[Vec<[u8; 3]>]) -> CoverageResult<Self> {
        let width = Self::check_rectangular(rows)?;
        let matrix = na::DMatrix::from_fn(rows.len(), width, |r, c| {
            if rows[r][c] == BLOCKED_RGB {
                BLOCKED
            } else {
                FREE
            }
        });
        Self::new(matrix)
    }

    /// Random world with independent obstacles. `keep_free` is always free.
    pub fn random<R: Rng>(
        height: usize,
        width: usize,
        obstacle_ratio: f64,
        keep_free: GridCell,
        rng: &mut R,
    ) -> CoverageResult<Self> {
        let obstacle = Bernoulli::new(obstacle_ratio)
            .map_err(|e| CoverageError::InvalidParameter(format!("obstacle_ratio: {}", e)))?;
        let mut matrix = na::DMatrix::from_fn(height, width, |_, _| {
            if obstacle.sample(rng) {
                BLOCKED
            } else {
                FREE
            }
        });
        let in_bounds = keep_free.row >= 0
            && keep_free.col >= 0
            && (keep_free.row as usize) < height
            && (keep_free.col as usize) < width;
        if !in_bounds {
            return Err(CoverageError::InvalidParameter(format!(
                "cell ({}, {}) is outside a {}x{} grid",
                keep_free.row, keep_free.col, height, width
            )));
        }
        matrix[(keep_free.row as usize, keep_free.col as usize)] = FREE;
        Self::new(matrix)
    }

    /// Every cell becomes a `scale x scale` block.
    pub fn upscaled(&self, scale: usize) -> CoverageResult<Self> {
        if scale < 1 {
            return Err(CoverageError::InvalidParameter("scale must be >= 1".to_string()));
        }
        let grid = self
            .grid
            .kronecker(&na::DMatrix::<u8>::repeat(scale, scale, 1));
        Self::new(grid)
    }

    /// Copy of this grid with one cell changed.
    pub fn with_cell(&self, cell: GridCell, blocked: bool) -> CoverageResult<Self> {
        let (r, c) = self.index(cell).ok_or_else(|| {
            CoverageError::InvalidParameter(format!(
                "cell ({}, {}) is outside the grid",
                cell.row, cell.col
            ))
        })?;
        let mut grid = self.grid.clone();
        grid[(r, c)] = if blocked { BLOCKED } else { FREE };
        Self::new(grid)
    }

    fn check_rectangular<T>(rows: &[Vec<T>]) -> CoverageResult<usize> {
        let width = rows
            .first()
            .map(|row| row.len())
            .ok_or_else(|| CoverageError::MalformedGrid("grid has no rows".to_string()))?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(CoverageError::MalformedGrid(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
        }
        Ok(width)
    }

    pub fn height(&self) -> usize {
        self.grid.nrows()
    }

    pub fn width(&self) -> usize {
        self.grid.ncols()
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        self.index(cell).is_some()
    }

    /// Matrix index of an in-bounds cell
    pub fn index(&self, cell: GridCell) -> Option<(usize, usize)> {
        if cell.row < 0 || cell.col < 0 {
            return None;
        }
        let (r, c) = (cell.row as usize, cell.col as usize);
        if r < self.height() && c < self.width() {
            Some((r, c))
        } else {
            None
        }
    }

    /// In bounds and traversable
    pub fn is_free(&self, cell: GridCell) -> bool {
        self.index(cell)
            .map(|idx| self.grid[idx] == FREE)
            .unwrap_or(false)
    }

    pub fn free_cell_count(&self) -> usize {
        self.free_cells
    }

    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        iproduct!(0..self.height(), 0..self.width())
            .map(|(r, c)| GridCell::new(r as i32, c as i32))
    }

    pub fn free_cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.cells().filter(move |&cell| self.is_free(cell))
    }

    pub fn blocked_cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.cells().filter(move |&cell| !self.is_free(cell))
    }

    /// First free cell scanning from the bottom row upwards, leftmost first.
    pub fn fallback_start(&self) -> Option<GridCell> {
        (0..self.height())
            .rev()
            .flat_map(|r| (0..self.width()).map(move |c| GridCell::new(r as i32, c as i32)))
            .find(|&cell| self.is_free(cell))
    }

    /// Keep `pose` if it stands on a free cell, otherwise move it to
    /// [`fallback_start`](Self::fallback_start) with the same heading.
    pub fn resolve_start(&self, pose: Pose) -> CoverageResult<Pose> {
        if self.is_free(pose.cell()) {
            return Ok(pose);
        }
        let cell = self
            .fallback_start()
            .ok_or_else(|| CoverageError::MalformedGrid("grid has no free cell".to_string()))?;
        warn!(
            "start {} is not a free cell, falling back to ({}, {})",
            pose, cell.row, cell.col
        );
        Ok(Pose::at(cell, pose.orientation))
    }
}

impl Deref for OccupancyGrid {
    type Target = na::DMatrix<u8>;

    fn deref(&self) -> &Self::Target {
        &self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Orientation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_from_rows_rejects_ragged() {
        let rows = vec![vec![0, 0, 0], vec![0, 0]];
        let err = OccupancyGrid::from_rows(&rows).unwrap_err();
        assert!(matches!(err, CoverageError::MalformedGrid(_)));
    }

    #[test]
    fn test_from_rows_rejects_all_blocked() {
        let rows = vec![vec![1, 1], vec![1, 1]];
        assert!(OccupancyGrid::from_rows(&rows).is_err());
        assert!(OccupancyGrid::from_rows(&[]).is_err());
    }

    #[test]
    fn test_free_cell_queries() {
        let grid = OccupancyGrid::from_rows(&[vec![1, 1, 1], vec![0, 0, 0], vec![0, 1, 0]]).unwrap();
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.free_cell_count(), 5);
        assert!(grid.is_free(GridCell::new(1, 1)));
        assert!(!grid.is_free(GridCell::new(0, 1)));
        assert!(!grid.is_free(GridCell::new(-1, 1)));
        assert!(!grid.is_free(GridCell::new(1, 3)));
        assert_eq!(grid.free_cells().count(), 5);
    }

    #[test]
    fn test_from_rgb_rows() {
        let white = [255, 255, 255];
        let green = [0, 128, 0];
        let grid = OccupancyGrid::from_rgb_rows(&[vec![white, green], vec![green, green]]).unwrap();
        assert!(!grid.is_free(GridCell::new(0, 0)));
        assert!(grid.is_free(GridCell::new(0, 1)));
        assert_eq!(grid.free_cell_count(), 3);
    }

    #[test]
    fn test_upscaled() {
        let grid = OccupancyGrid::from_rows(&[vec![0, 1]]).unwrap();
        let big = grid.upscaled(2).unwrap();
        assert_eq!((big.height(), big.width()), (2, 4));
        assert_eq!(big.free_cell_count(), 4);
        assert!(!big.is_free(GridCell::new(1, 3)));
    }

    #[test]
    fn test_resolve_start_fallback() {
        let grid = OccupancyGrid::from_rows(&[vec![0, 0], vec![1, 0]]).unwrap();
        let start = Pose::new(1, 0, Orientation::Left);
        let resolved = grid.resolve_start(start).unwrap();
        assert_eq!(resolved, Pose::new(1, 1, Orientation::Left));

        let free = Pose::new(0, 0, Orientation::Up);
        assert_eq!(grid.resolve_start(free).unwrap(), free);
    }

    #[test]
    fn test_random_keeps_start_free() {
        let mut rng = StdRng::seed_from_u64(7);
        let start = GridCell::new(4, 4);
        let grid = OccupancyGrid::random(8, 8, 0.9, start, &mut rng).unwrap();
        assert!(grid.is_free(start));
        assert!(OccupancyGrid::random(8, 8, 1.5, start, &mut rng).is_err());
        assert!(OccupancyGrid::random(8, 8, 0.2, GridCell::new(8, 0), &mut rng).is_err());
    }
}
