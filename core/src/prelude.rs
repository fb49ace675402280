use serde::{Deserialize, Serialize};

pub use crate::grid::MaskedGrid;

/// Fill value written by the Level 1B products for missing samples.
pub const FILL_VALUE: f32 = -9999.0;

/// How the regridder combines the source rows that bracket a target altitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegridMethod {
    Nearest,
    #[default]
    Linear,
}

/// Options shared by the altitude regridding stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegridOptions {
    pub method: RegridMethod,
    /// Largest distance (km) a lone valid neighbour may sit from the target.
    pub tolerance_km: f64,
}

impl Default for RegridOptions {
    fn default() -> Self {
        Self {
            method: RegridMethod::Linear,
            tolerance_km: 0.06,
        }
    }
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum StageError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("axis is not strictly monotonic at index {0}")]
    NonMonotonicAxis(usize),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Ordering of a strictly monotonic coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    Ascending,
    Descending,
}

impl AxisOrder {
    /// Classifies `axis`, failing on repeats, reversals and non-finite samples.
    pub fn of(axis: &[f64]) -> StageResult<Self> {
        if axis.len() < 2 {
            return Err(StageError::InvalidInput(format!(
                "axis needs at least 2 samples, got {}",
                axis.len()
            )));
        }
        if let Some(idx) = axis.iter().position(|v| !v.is_finite()) {
            return Err(StageError::InvalidInput(format!(
                "non-finite axis value at index {}",
                idx
            )));
        }
        let order = if axis[1] > axis[0] {
            AxisOrder::Ascending
        } else {
            AxisOrder::Descending
        };
        for (idx, pair) in axis.windows(2).enumerate() {
            let ok = match order {
                AxisOrder::Ascending => pair[1] > pair[0],
                AxisOrder::Descending => pair[1] < pair[0],
            };
            if !ok {
                return Err(StageError::NonMonotonicAxis(idx + 1));
            }
        }
        Ok(order)
    }
}
