use serde::{Deserialize, Serialize};

use crate::grid::MaskedGrid;
use crate::math::interp::{bracket, linspace, Bracket};
use crate::prelude::{AxisOrder, StageError, StageResult};

/// Regular display grid the field is interpolated onto.
///
/// Row 0 sits at `z_top`, column 0 at `x_start`; both ends are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetGrid {
    pub x_start: f64,
    pub x_end: f64,
    pub nx: usize,
    pub z_top: f64,
    pub z_bottom: f64,
    pub nz: usize,
}

impl TargetGrid {
    pub fn x_coords(&self) -> Vec<f64> {
        linspace(self.x_start, self.x_end, self.nx)
    }

    pub fn z_coords(&self) -> Vec<f64> {
        linspace(self.z_top, self.z_bottom, self.nz)
    }
}

/// How one target coordinate maps onto a source axis.
#[derive(Debug, Clone, Copy)]
enum AxisHit {
    Inside(Bracket),
    /// Single-sample or zero-span source axis: every sample sits at the target.
    Broadcast,
    Outside,
}

struct SourceAxis<'a> {
    coords: &'a [f64],
    order: Option<AxisOrder>,
}

impl<'a> SourceAxis<'a> {
    fn new(coords: &'a [f64], name: &str) -> StageResult<Self> {
        if coords.is_empty() {
            return Err(StageError::InvalidInput(format!("{} axis is empty", name)));
        }
        let degenerate = coords.len() == 1 || coords.windows(2).all(|pair| pair[0] == pair[1]);
        let order = if degenerate {
            None
        } else {
            Some(AxisOrder::of(coords)?)
        };
        Ok(Self { coords, order })
    }

    /// Index/weight pairs contributing along this axis; a broadcast axis
    /// weighs every sample equally.
    fn taps(&self, value: f64) -> Option<Vec<(usize, f64)>> {
        match self.locate(value) {
            AxisHit::Broadcast => Some((0..self.coords.len()).map(|i| (i, 1.0)).collect()),
            AxisHit::Inside(b) => Some(vec![(b.lower, 1.0 - b.weight), (b.upper, b.weight)]),
            AxisHit::Outside => None,
        }
    }

    fn locate(&self, value: f64) -> AxisHit {
        match self.order {
            None => AxisHit::Broadcast,
            Some(order) => match bracket(self.coords, order, value) {
                Some(b) => AxisHit::Inside(b),
                None => AxisHit::Outside,
            },
        }
    }
}

/// Interpolates `grid` (profiles × bins) onto `target`, producing `nz × nx`.
///
/// `x` holds one horizontal coordinate per profile and `z` one altitude per
/// bin. Cells outside the source coordinate range, or whose contributing
/// neighbours are all masked, come back masked so the color map can paint
/// them with its "bad" color. A source axis with a single sample (or zero span)
/// is broadcast across the whole target range on that axis.
pub fn interpolate_field(
    grid: &MaskedGrid,
    x: &[f64],
    z: &[f64],
    target: &TargetGrid,
) -> StageResult<MaskedGrid> {
    if grid.rows() != x.len() {
        return Err(StageError::ShapeMismatch {
            expected: x.len(),
            actual: grid.rows(),
        });
    }
    if grid.cols() != z.len() {
        return Err(StageError::ShapeMismatch {
            expected: z.len(),
            actual: grid.cols(),
        });
    }
    let x_axis = SourceAxis::new(x, "horizontal")?;
    let z_axis = SourceAxis::new(z, "altitude")?;

    let columns: Vec<_> = target.x_coords().into_iter().map(|v| x_axis.taps(v)).collect();
    let rows: Vec<_> = target.z_coords().into_iter().map(|v| z_axis.taps(v)).collect();

    let mut out = MaskedGrid::masked(target.nz, target.nx);
    for (row, z_taps) in rows.iter().enumerate() {
        let Some(z_taps) = z_taps else { continue };
        for (col, x_taps) in columns.iter().enumerate() {
            let Some(x_taps) = x_taps else { continue };
            out.set(row, col, blend(grid, x_taps, z_taps));
        }
    }
    Ok(out)
}

/// Weighted mean over the unmasked corners; `None` if none carry weight.
fn blend(grid: &MaskedGrid, x_taps: &[(usize, f64)], z_taps: &[(usize, f64)]) -> Option<f32> {
    let mut sum = 0.0f64;
    let mut weight = 0.0f64;
    for &(profile, wx) in x_taps {
        for &(bin, wz) in z_taps {
            if let Some(value) = grid.get(profile, bin) {
                let w = wx * wz;
                sum += value as f64 * w;
                weight += w;
            }
        }
    }
    (weight > 0.0).then(|| (sum / weight) as f32)
}
