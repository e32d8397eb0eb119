//! Uniform grid binning of pointer positions.

use crate::models::ClickPoint;
use serde::Serialize;

use super::color::Rgb;

/// One bucket of the density grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub count: u32,
}

/// A non-empty cell after normalization against the densest cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellIntensity {
    pub row: usize,
    pub col: usize,
    pub value: f64,
    pub color: Rgb,
}

/// Row-major `rows x cols` counts covering a `width x height` canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    rows: usize,
    cols: usize,
    cell_size: u32,
    counts: Vec<u32>,
}

impl DensityGrid {
    /// Bins every finite, in-bounds point into `cell_size` squares.
    ///
    /// Points left of or above the origin, or past the last row/column, are
    /// dropped without error. `cell_size` must be non-zero; callers are
    /// expected to have validated it through `HeatmapConfig::validate`.
    pub fn from_points(points: &[ClickPoint], width: u32, height: u32, cell_size: u32) -> Self {
        let cell_size = cell_size.max(1);
        let cols = width.div_ceil(cell_size) as usize;
        let rows = height.div_ceil(cell_size) as usize;
        let mut counts = vec![0u32; rows * cols];
        let size = f64::from(cell_size);

        for point in points.iter().filter(|p| p.is_finite()) {
            let col = (point.x / size).floor();
            let row = (point.y / size).floor();
            if col < 0.0 || row < 0.0 || col >= cols as f64 || row >= rows as f64 {
                continue;
            }
            let idx = row as usize * cols + col as usize;
            counts[idx] = counts[idx].saturating_add(1);
        }

        Self {
            rows,
            cols,
            cell_size,
            counts,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn count(&self, row: usize, col: usize) -> Option<u32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.counts[row * self.cols + col])
    }

    pub fn max_density(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Number of points that landed inside the grid.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// `count / max_density`, or 0 for every cell when the grid is empty.
    pub fn normalized(&self, row: usize, col: usize) -> Option<f64> {
        let count = self.count(row, col)?;
        let max = self.max_density();
        if max == 0 {
            return Some(0.0);
        }
        Some(f64::from(count) / f64::from(max))
    }

    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.counts.iter().enumerate().map(|(idx, &count)| GridCell {
            row: idx / self.cols,
            col: idx % self.cols,
            count,
        })
    }

    pub fn intensities(&self) -> Vec<CellIntensity> {
        let max = self.max_density();
        if max == 0 {
            return Vec::new();
        }
        self.cells()
            .filter(|cell| cell.count > 0)
            .map(|cell| {
                let value = f64::from(cell.count) / f64::from(max);
                CellIntensity {
                    row: cell.row,
                    col: cell.col,
                    value,
                    color: Rgb::from_value(value),
                }
            })
            .collect()
    }
}
