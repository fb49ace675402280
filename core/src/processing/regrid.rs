use crate::grid::MaskedGrid;
use crate::math::interp::{bracket, Bracket};
use crate::prelude::{AxisOrder, RegridMethod, RegridOptions, StageError, StageResult};

/// Resamples the altitude bins of `grid` from `source_axis` onto `target_axis`.
///
/// `grid` is profiles × source bins; the result is profiles × target bins.
/// Targets outside the source range are masked rather than extrapolated.
/// A target that coincides with a source altitude copies that cell.
pub fn regrid_lidar(
    source_axis: &[f64],
    grid: &MaskedGrid,
    target_axis: &[f64],
    options: &RegridOptions,
) -> StageResult<MaskedGrid> {
    if grid.cols() != source_axis.len() {
        return Err(StageError::ShapeMismatch {
            expected: source_axis.len(),
            actual: grid.cols(),
        });
    }
    if !(options.tolerance_km >= 0.0) {
        return Err(StageError::InvalidInput(format!(
            "tolerance must be non-negative, got {}",
            options.tolerance_km
        )));
    }
    let order = AxisOrder::of(source_axis)?;

    let brackets: Vec<Option<Bracket>> = target_axis
        .iter()
        .map(|&alt| bracket(source_axis, order, alt))
        .collect();

    let mut out = MaskedGrid::masked(grid.rows(), target_axis.len());
    for profile in 0..grid.rows() {
        for (bin, hit) in brackets.iter().enumerate() {
            let value = hit.and_then(|b| {
                sample(grid, profile, source_axis, target_axis[bin], b, options)
            });
            out.set(profile, bin, value);
        }
    }
    Ok(out)
}

fn sample(
    grid: &MaskedGrid,
    profile: usize,
    axis: &[f64],
    target: f64,
    hit: Bracket,
    options: &RegridOptions,
) -> Option<f32> {
    if hit.lower == hit.upper {
        return grid.get(profile, hit.lower);
    }
    let lower = grid.get(profile, hit.lower);
    let upper = grid.get(profile, hit.upper);
    let within = |idx: usize| (axis[idx] - target).abs() <= options.tolerance_km;

    match options.method {
        RegridMethod::Linear => match (lower, upper) {
            (Some(lo), Some(hi)) => {
                let w = hit.weight as f32;
                Some(lo * (1.0 - w) + hi * w)
            }
            (Some(lo), None) if within(hit.lower) => Some(lo),
            (None, Some(hi)) if within(hit.upper) => Some(hi),
            _ => None,
        },
        RegridMethod::Nearest => {
            let (near, far) = if hit.weight <= 0.5 {
                (hit.lower, hit.upper)
            } else {
                (hit.upper, hit.lower)
            };
            grid.get(profile, near)
                .or_else(|| grid.get(profile, far).filter(|_| within(far)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn axis() -> Vec<f64> {
        vec![4.0, 3.0, 2.0, 1.0]
    }

    #[test]
    fn regridding_onto_source_axis_is_identity() {
        let grid = MaskedGrid::from_options(
            2,
            4,
            &[
                Some(0.1),
                None,
                Some(0.3),
                Some(0.4),
                Some(1.5),
                Some(2.5),
                None,
                Some(4.5),
            ],
        )
        .unwrap();
        let out = regrid_lidar(&axis(), &grid, &axis(), &RegridOptions::default()).unwrap();
        assert_eq!(out, grid);
    }

    #[test]
    fn linear_blends_bracketing_bins() {
        let grid = MaskedGrid::from_data(array![[4.0, 3.0, 2.0, 1.0]]);
        let out = regrid_lidar(&axis(), &grid, &[3.5, 1.25], &RegridOptions::default()).unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap(), 3.5);
        assert_relative_eq!(out.get(0, 1).unwrap(), 1.25);
    }

    #[test]
    fn targets_outside_source_range_are_masked() {
        let grid = MaskedGrid::from_data(array![[4.0, 3.0, 2.0, 1.0]]);
        let out = regrid_lidar(&axis(), &grid, &[5.0, 2.0, 0.5], &RegridOptions::default()).unwrap();
        assert_eq!(out.get(0, 0), None);
        assert_eq!(out.get(0, 1), Some(2.0));
        assert_eq!(out.get(0, 2), None);
    }

    #[test]
    fn masked_neighbour_falls_back_within_tolerance() {
        let grid = MaskedGrid::from_options(1, 4, &[Some(4.0), None, Some(2.0), Some(1.0)]).unwrap();
        let options = RegridOptions {
            method: RegridMethod::Linear,
            tolerance_km: 0.2,
        };
        let out = regrid_lidar(&axis(), &grid, &[3.9, 3.5, 2.1], &options).unwrap();
        assert_eq!(out.get(0, 0), Some(4.0));
        assert_eq!(out.get(0, 1), None);
        assert_eq!(out.get(0, 2), Some(2.0));
    }

    #[test]
    fn nearest_picks_closer_bin() {
        let grid = MaskedGrid::from_data(array![[4.0, 3.0, 2.0, 1.0]]);
        let options = RegridOptions {
            method: RegridMethod::Nearest,
            tolerance_km: 0.0,
        };
        let out = regrid_lidar(&axis(), &grid, &[3.8, 3.2, 1.1], &options).unwrap();
        assert_eq!(out.get(0, 0), Some(4.0));
        assert_eq!(out.get(0, 1), Some(3.0));
        assert_eq!(out.get(0, 2), Some(1.0));
    }

    #[test]
    fn preserves_target_order_for_ascending_targets() {
        let grid = MaskedGrid::from_data(array![[4.0, 3.0, 2.0, 1.0]]);
        let out = regrid_lidar(&axis(), &grid, &[1.0, 2.0, 3.0, 4.0], &RegridOptions::default()).unwrap();
        let values: Vec<Option<f32>> = (0..4).map(|c| out.get(0, c)).collect();
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn rejects_axis_length_mismatch() {
        let grid = MaskedGrid::from_data(array![[1.0, 2.0]]);
        assert!(matches!(
            regrid_lidar(&axis(), &grid, &axis(), &RegridOptions::default()),
            Err(StageError::ShapeMismatch { .. })
        ));
    }
}
