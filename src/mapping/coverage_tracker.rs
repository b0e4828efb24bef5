//! Record of the free cells sensed so far in one planning run

use nalgebra::DMatrix;

use crate::common::GridCell;
use crate::utils::OccupancyGrid;

/// Covered set packed one bit per grid cell, in matrix storage order.
/// Equal keys mean equal covered sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoverageKey(Vec<u64>);

/// Boolean coverage grid with the same shape as the occupancy grid.
///
/// Only free cells are ever marked and nothing is ever unmarked, so the
/// coverage fraction is non-decreasing.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageTracker {
    covered: DMatrix<bool>,
    covered_free: usize,
    free_total: usize,
}

impl CoverageTracker {
    /// Empty tracker for `grid`
    pub fn new(grid: &OccupancyGrid) -> Self {
        Self {
            covered: DMatrix::from_element(grid.height(), grid.width(), false),
            covered_free: 0,
            free_total: grid.free_cell_count(),
        }
    }

    /// Mark `cell` if it is a free cell not yet covered. Returns whether it
    /// was newly marked.
    pub fn mark(&mut self, grid: &OccupancyGrid, cell: GridCell) -> bool {
        if !grid.is_free(cell) {
            return false;
        }
        match grid.index(cell) {
            Some(idx) if !self.covered[idx] => {
                self.covered[idx] = true;
                self.covered_free += 1;
                true
            }
            _ => false,
        }
    }

    /// Mark every cell of an iterator, returning how many were new
    pub fn mark_all(&mut self, grid: &OccupancyGrid, cells: impl Iterator<Item = GridCell>) -> usize {
        cells.filter(|&cell| self.mark(grid, cell)).count()
    }

    pub fn is_covered(&self, cell: GridCell) -> bool {
        if cell.row < 0 || cell.col < 0 {
            return false;
        }
        self.covered
            .get((cell.row as usize, cell.col as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Whether `cell` would count as new coverage
    pub fn is_new(&self, grid: &OccupancyGrid, cell: GridCell) -> bool {
        grid.is_free(cell) && !self.is_covered(cell)
    }

    pub fn covered_count(&self) -> usize {
        self.covered_free
    }

    /// covered free cells / free cells
    pub fn fraction(&self) -> f64 {
        if self.free_total == 0 {
            return 0.0;
        }
        self.covered_free as f64 / self.free_total as f64
    }

    pub fn is_complete(&self) -> bool {
        self.covered_free == self.free_total
    }

    /// Exact key of the covered set, used to recognise repeated search states
    pub fn key(&self) -> CoverageKey {
        let mut words = vec![0u64; (self.covered.len() + 63) / 64];
        for (i, _) in self.covered.iter().enumerate().filter(|&(_, &c)| c) {
            words[i / 64] |= 1 << (i % 64);
        }
        CoverageKey(words)
    }
}
