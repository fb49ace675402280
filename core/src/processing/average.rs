use ndarray::{Array2, Axis};

use crate::grid::MaskedGrid;
use crate::math::stats::masked_mean;
use crate::prelude::{StageError, StageResult};

/// Averages every `width` consecutive profiles (rows) column by column.
///
/// Masked cells do not contribute; a window whose cells in a column are all
/// masked yields a masked output cell. The output has `rows / width` rows and
/// the incomplete trailing window is dropped. When `width` exceeds a non-empty
/// row count every available row is averaged into a single output row.
pub fn average_profiles(grid: &MaskedGrid, width: usize) -> StageResult<MaskedGrid> {
    if width == 0 {
        return Err(StageError::InvalidInput(
            "averaging width must be at least 1".into(),
        ));
    }

    let (rows, cols) = grid.dim();
    let (windows, window_len) = match rows {
        0 => (0, width),
        n if width > n => (1, n),
        n => (n / width, width),
    };

    let data = grid.data();
    let mask = grid.mask();
    let mut values = Array2::<f32>::zeros((windows, cols));
    let mut out_mask = Array2::from_elem((windows, cols), true);

    for w in 0..windows {
        let start = w * window_len;
        let block = data.slice(ndarray::s![start..start + window_len, ..]);
        let block_mask = mask.slice(ndarray::s![start..start + window_len, ..]);
        for (col, (column, column_mask)) in block
            .axis_iter(Axis(1))
            .zip(block_mask.axis_iter(Axis(1)))
            .enumerate()
        {
            if let Some(mean) = masked_mean(column.iter().copied().zip(column_mask.iter().copied())) {
                values[[w, col]] = mean;
                out_mask[[w, col]] = false;
            }
        }
    }

    MaskedGrid::new(values, out_mask)
}

/// First coordinate of each averaging window, aligned with [`average_profiles`].
pub fn decimate_coordinates(coords: &[f64], width: usize) -> StageResult<Vec<f64>> {
    if width == 0 {
        return Err(StageError::InvalidInput(
            "averaging width must be at least 1".into(),
        ));
    }
    if coords.is_empty() {
        return Ok(Vec::new());
    }
    if width > coords.len() {
        return Ok(vec![coords[0]]);
    }
    Ok(coords
        .chunks_exact(width)
        .map(|window| window[0])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn example_grid() -> MaskedGrid {
        MaskedGrid::from_options(
            4,
            2,
            &[
                Some(1.0),
                None,
                Some(3.0),
                Some(5.0),
                Some(5.0),
                Some(7.0),
                Some(7.0),
                Some(9.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn averages_pairs_ignoring_masked_cells() {
        let averaged = average_profiles(&example_grid(), 2).unwrap();
        assert_eq!(averaged.dim(), (2, 2));
        assert_eq!(averaged.get(0, 0), Some(2.0));
        assert_eq!(averaged.get(0, 1), Some(5.0));
        assert_eq!(averaged.get(1, 0), Some(6.0));
        assert_eq!(averaged.get(1, 1), Some(8.0));
    }

    #[test]
    fn output_row_count_is_floor_of_ratio() {
        let grid = MaskedGrid::from_data(Array2::from_elem((17, 3), 1.0));
        for width in 1..=17 {
            let averaged = average_profiles(&grid, width).unwrap();
            assert_eq!(averaged.rows(), 17 / width, "width {}", width);
            assert_eq!(averaged.cols(), 3);
        }
    }

    #[test]
    fn fully_masked_window_stays_masked() {
        let grid = MaskedGrid::from_options(
            4,
            1,
            &[None, None, Some(2.0), Some(4.0)],
        )
        .unwrap();
        let averaged = average_profiles(&grid, 2).unwrap();
        assert_eq!(averaged.get(0, 0), None);
        assert_eq!(averaged.get(1, 0), Some(3.0));
    }

    #[test]
    fn width_wider_than_input_averages_everything() {
        let grid = MaskedGrid::from_data(array![[1.0, 2.0], [3.0, 4.0], [5.0, 9.0]]);
        let averaged = average_profiles(&grid, 10).unwrap();
        assert_eq!(averaged.rows(), 1);
        assert_eq!(averaged.get(0, 0), Some(3.0));
        assert_eq!(averaged.get(0, 1), Some(5.0));
    }

    #[test]
    fn zero_width_is_rejected() {
        let grid = MaskedGrid::from_data(array![[1.0]]);
        assert!(matches!(
            average_profiles(&grid, 0),
            Err(StageError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let grid = MaskedGrid::from_data(Array2::zeros((0, 4)));
        assert_eq!(average_profiles(&grid, 3).unwrap().dim(), (0, 4));
    }

    #[test]
    fn decimated_coordinates_follow_window_starts() {
        let lat = [10.0, 9.0, 8.0, 7.0, 6.0];
        assert_eq!(decimate_coordinates(&lat, 2).unwrap(), vec![10.0, 8.0]);
        assert_eq!(decimate_coordinates(&lat, 9).unwrap(), vec![10.0]);
    }
}
