use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::prelude::{StageError, StageResult};

/// A 2D field of samples paired with a validity mask.
///
/// `mask[[r, c]] == true` marks the cell as missing. Masked cells carry no
/// meaningful value and every stage skips them instead of reading the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskedGrid {
    data: Array2<f32>,
    mask: Array2<bool>,
}

impl MaskedGrid {
    pub fn new(data: Array2<f32>, mask: Array2<bool>) -> StageResult<Self> {
        if data.dim() != mask.dim() {
            return Err(StageError::ShapeMismatch {
                expected: data.len(),
                actual: mask.len(),
            });
        }
        Ok(Self { data, mask })
    }

    /// Wraps `data`, masking NaNs only.
    pub fn from_data(data: Array2<f32>) -> Self {
        let mask = data.mapv(f32::is_nan);
        Self { data, mask }
    }

    /// Wraps `data`, masking NaNs and cells equal to `sentinel`.
    pub fn from_sentinel(data: Array2<f32>, sentinel: f32) -> Self {
        let mask = data.mapv(|v| v.is_nan() || v == sentinel);
        Self { data, mask }
    }

    /// A grid of the given shape with every cell masked.
    pub fn masked(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            mask: Array2::from_elem((rows, cols), true),
        }
    }

    /// Builds a grid from optional cells; `None` becomes masked.
    pub fn from_options(rows: usize, cols: usize, cells: &[Option<f32>]) -> StageResult<Self> {
        if cells.len() != rows * cols {
            return Err(StageError::ShapeMismatch {
                expected: rows * cols,
                actual: cells.len(),
            });
        }
        let data = Array2::from_shape_fn((rows, cols), |(r, c)| cells[r * cols + c].unwrap_or(0.0));
        let mask = Array2::from_shape_fn((rows, cols), |(r, c)| cells[r * cols + c].is_none());
        Ok(Self { data, mask })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        match self.mask.get((row, col)) {
            Some(false) => self.data.get((row, col)).copied(),
            _ => None,
        }
    }

    pub fn set(&mut self, row: usize, col: usize, value: Option<f32>) {
        match value {
            Some(v) => {
                self.data[[row, col]] = v;
                self.mask[[row, col]] = false;
            }
            None => {
                self.data[[row, col]] = 0.0;
                self.mask[[row, col]] = true;
            }
        }
    }

    /// Masks every valid cell for which `predicate` holds.
    pub fn mask_where<F>(&mut self, predicate: F)
    where
        F: Fn(f32) -> bool,
    {
        ndarray::Zip::from(&mut self.mask)
            .and(&self.data)
            .for_each(|masked, &value| {
                if !*masked && predicate(value) {
                    *masked = true;
                }
            });
    }

    pub fn masked_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Swaps rows and columns.
    pub fn transposed(&self) -> Self {
        Self {
            data: self.data.t().to_owned(),
            mask: self.mask.t().to_owned(),
        }
    }

    /// Reverses the row order.
    pub fn flipped_rows(&self) -> Self {
        Self {
            data: self.data.slice(ndarray::s![..;-1, ..]).to_owned(),
            mask: self.mask.slice(ndarray::s![..;-1, ..]).to_owned(),
        }
    }

    /// Mean of the valid cells in each column, `None` when a column is fully masked.
    pub fn column_means(&self) -> Vec<Option<f32>> {
        self.data
            .axis_iter(Axis(1))
            .zip(self.mask.axis_iter(Axis(1)))
            .map(|(values, mask)| {
                crate::math::stats::masked_mean(values.iter().copied().zip(mask.iter().copied()))
            })
            .collect()
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn sentinel_and_nan_cells_are_masked() {
        let grid = MaskedGrid::from_sentinel(array![[1.0, -9999.0], [f32::NAN, 4.0]], -9999.0);
        assert_eq!(grid.get(0, 0), Some(1.0));
        assert_eq!(grid.get(0, 1), None);
        assert_eq!(grid.get(1, 0), None);
        assert_eq!(grid.masked_count(), 2);
    }

    #[test]
    fn mask_where_only_touches_valid_cells() {
        let mut grid = MaskedGrid::from_data(array![[0.5, -0.5], [0.05, 0.2]]);
        grid.mask_where(|v| !(-0.1..=0.1).contains(&v));
        assert_eq!(grid.get(1, 0), Some(0.05));
        assert_eq!(grid.masked_count(), 3);
    }

    #[test]
    fn new_rejects_mismatched_mask() {
        let err = MaskedGrid::new(Array2::zeros((2, 2)), Array2::from_elem((1, 2), false));
        assert!(matches!(err, Err(StageError::ShapeMismatch { .. })));
    }

    #[test]
    fn transposed_and_flipped_keep_masks_with_values() {
        let grid = MaskedGrid::from_options(2, 2, &[Some(1.0), None, Some(3.0), Some(4.0)]).unwrap();
        let t = grid.transposed();
        assert_eq!(t.get(1, 0), None);
        assert_eq!(t.get(0, 1), Some(3.0));
        let f = grid.flipped_rows();
        assert_eq!(f.get(0, 0), Some(3.0));
        assert_eq!(f.get(1, 1), None);
    }

    #[test]
    fn out_of_bounds_reads_are_masked() {
        let grid = MaskedGrid::from_data(array![[1.0]]);
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.get(0, 7), None);
    }
}
