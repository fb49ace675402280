use crate::grid::MaskedGrid;

/// Masks backscatter below `min` or above `max`.
///
/// Negative returns are noise and very large ones are usually surface
/// reflections or spikes; neither should reach the averaging stage.
pub fn mask_out_of_range(grid: &mut MaskedGrid, min: f32, max: f32) {
    grid.mask_where(|v| v < min || v > max);
}
