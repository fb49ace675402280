/// Mean of the unmasked values in `samples`, or `None` if every sample is masked.
///
/// Each item pairs a value with its mask flag (`true` = masked).
pub fn masked_mean<I>(samples: I) -> Option<f32>
where
    I: IntoIterator<Item = (f32, bool)>,
{
    let (sum, count) = samples
        .into_iter()
        .filter(|&(_, masked)| !masked)
        .fold((0.0f64, 0usize), |(sum, count), (value, _)| {
            (sum + value as f64, count + 1)
        });
    if count == 0 {
        None
    } else {
        Some((sum / count as f64) as f32)
    }
}

pub struct StatsHelper;

impl StatsHelper {
    /// Smallest and largest finite value, `None` for an empty or all-NaN slice.
    pub fn finite_range(samples: &[f32]) -> Option<(f32, f32)> {
        samples
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Largest gap between neighbouring samples of a coordinate axis.
    pub fn max_spacing(axis: &[f64]) -> f64 {
        axis.windows(2)
            .map(|pair| (pair[1] - pair[0]).abs())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_mean_skips_masked_samples() {
        let mean = masked_mean([(1.0, false), (100.0, true), (3.0, false)]);
        assert_eq!(mean, Some(2.0));
    }

    #[test]
    fn masked_mean_of_fully_masked_window_is_none() {
        assert_eq!(masked_mean([(1.0, true), (2.0, true)]), None);
        assert_eq!(masked_mean(std::iter::empty()), None);
    }

    #[test]
    fn finite_range_ignores_nan() {
        assert_eq!(
            StatsHelper::finite_range(&[f32::NAN, 2.0, -1.0]),
            Some((-1.0, 2.0))
        );
        assert_eq!(StatsHelper::finite_range(&[]), None);
    }

    #[test]
    fn max_spacing_handles_descending_axes() {
        approx::assert_relative_eq!(
            StatsHelper::max_spacing(&[10.0, 9.94, 9.88, 9.0]),
            0.88,
            epsilon = 1e-9
        );
    }
}
