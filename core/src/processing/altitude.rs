use serde::{Deserialize, Serialize};

use crate::prelude::{AxisOrder, StageError, StageResult};

/// Layout of the uniform altitude axis.
///
/// The Level 1B altitude bins are 30 m apart below the breakpoint and 60 m
/// apart above it; the upper region is resampled at `upper_step_km`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AltitudeGrid {
    pub breakpoint_km: f64,
    pub upper_step_km: f64,
}

impl Default for AltitudeGrid {
    fn default() -> Self {
        Self {
            breakpoint_km: 8.2,
            upper_step_km: 0.03,
        }
    }
}

/// Builds the uniform altitude axis for `axis`, capped at `max_alt` km.
///
/// Samples at or below the breakpoint are copied from `axis` untouched; above
/// it the axis is rebuilt at a fixed step up to `max_alt`. The result keeps the
/// ordering of `axis`.
pub fn uniform_altitudes(max_alt: f64, axis: &[f64], grid: &AltitudeGrid) -> StageResult<Vec<f64>> {
    if !max_alt.is_finite() {
        return Err(StageError::InvalidInput(format!(
            "maximum altitude must be finite, got {}",
            max_alt
        )));
    }
    if !(grid.upper_step_km > 0.0) {
        return Err(StageError::InvalidInput(format!(
            "upper step must be positive, got {}",
            grid.upper_step_km
        )));
    }
    let order = AxisOrder::of(axis)?;

    let lower_cap = grid.breakpoint_km.min(max_alt);
    let mut lower: Vec<f64> = axis.iter().copied().filter(|&a| a <= lower_cap).collect();

    let span = max_alt - grid.breakpoint_km;
    let steps = if span > 0.0 {
        // Tolerate representation error so 20 km over 0.03 km gives 393 steps, not 392.
        (span / grid.upper_step_km + 1e-9).floor() as usize
    } else {
        0
    };
    let mut upper: Vec<f64> = (1..=steps)
        .map(|k| grid.breakpoint_km + k as f64 * grid.upper_step_km)
        .collect();

    let merged = match order {
        AxisOrder::Descending => {
            upper.reverse();
            upper.extend(lower);
            upper
        }
        AxisOrder::Ascending => {
            lower.extend(upper);
            lower
        }
    };
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 60 m bins from 20.2 down to 8.26 km, then 30 m bins down to -0.5 km.
    fn level1b_like_axis() -> Vec<f64> {
        let mut axis: Vec<f64> = (0..200).map(|i| 20.2 - 0.06 * i as f64).collect();
        let lower_top = 8.2;
        axis.extend((0..291).map(|i| lower_top - 0.03 * i as f64));
        axis
    }

    #[test]
    fn output_is_strictly_descending_for_descending_input() {
        let axis = level1b_like_axis();
        let unified = uniform_altitudes(20.0, &axis, &AltitudeGrid::default()).unwrap();
        assert_eq!(AxisOrder::of(&unified).unwrap(), AxisOrder::Descending);
        assert!(unified[0] <= 20.0 + 1e-9);
    }

    #[test]
    fn lower_segment_matches_source_exactly() {
        let axis = level1b_like_axis();
        let unified = uniform_altitudes(20.0, &axis, &AltitudeGrid::default()).unwrap();
        let source_lower: Vec<f64> = axis.iter().copied().filter(|&a| a <= 8.2).collect();
        let unified_lower: Vec<f64> = unified.iter().copied().filter(|&a| a <= 8.2).collect();
        assert_eq!(source_lower, unified_lower);
    }

    #[test]
    fn upper_segment_uses_fixed_step() {
        let axis = level1b_like_axis();
        let grid = AltitudeGrid::default();
        let unified = uniform_altitudes(20.0, &axis, &grid).unwrap();
        let upper: Vec<f64> = unified.iter().copied().filter(|&a| a > 8.2).collect();
        assert_eq!(upper.len(), 393);
        for pair in upper.windows(2) {
            assert_relative_eq!(pair[0] - pair[1], grid.upper_step_km, epsilon = 1e-9);
        }
    }

    #[test]
    fn max_below_breakpoint_leaves_upper_segment_empty() {
        let axis = level1b_like_axis();
        let unified = uniform_altitudes(5.0, &axis, &AltitudeGrid::default()).unwrap();
        assert!(unified.iter().all(|&a| a <= 5.0));
        let expected: Vec<f64> = axis.iter().copied().filter(|&a| a <= 5.0).collect();
        assert_eq!(unified, expected);
    }

    #[test]
    fn ascending_input_gives_ascending_output() {
        let axis: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let grid = AltitudeGrid {
            breakpoint_km: 5.0,
            upper_step_km: 0.5,
        };
        let unified = uniform_altitudes(7.0, &axis, &grid).unwrap();
        assert_eq!(
            unified,
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 5.5, 6.0, 6.5, 7.0]
        );
    }

    #[test]
    fn rejects_bad_inputs() {
        let grid = AltitudeGrid::default();
        assert!(uniform_altitudes(f64::NAN, &[2.0, 1.0], &grid).is_err());
        assert!(uniform_altitudes(20.0, &[1.0], &grid).is_err());
        assert!(uniform_altitudes(
            20.0,
            &[2.0, 1.0],
            &AltitudeGrid {
                breakpoint_km: 8.2,
                upper_step_km: 0.0
            }
        )
        .is_err());
    }
}
