use crate::prelude::AxisOrder;

/// Position of a coordinate between two neighbouring samples of an axis.
///
/// `weight` is the fractional distance from `lower` towards `upper`; an exact
/// hit has `lower == upper` and a zero weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lower: usize,
    pub upper: usize,
    pub weight: f64,
}

/// Finds the samples of a strictly monotonic `axis` that enclose `value`.
///
/// Returns `None` when `value` lies outside the axis range.
pub fn bracket(axis: &[f64], order: AxisOrder, value: f64) -> Option<Bracket> {
    if axis.is_empty() || !value.is_finite() {
        return None;
    }
    // Index of the first sample that is not before `value` along the axis direction.
    let idx = match order {
        AxisOrder::Ascending => axis.partition_point(|&a| a < value),
        AxisOrder::Descending => axis.partition_point(|&a| a > value),
    };
    if idx < axis.len() && axis[idx] == value {
        return Some(Bracket {
            lower: idx,
            upper: idx,
            weight: 0.0,
        });
    }
    if idx == 0 || idx == axis.len() {
        return None;
    }
    let (lower, upper) = (idx - 1, idx);
    let span = axis[upper] - axis[lower];
    Some(Bracket {
        lower,
        upper,
        weight: (value - axis[lower]) / span,
    })
}

/// `count` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bracket_on_descending_axis() {
        let axis = [4.0, 3.0, 2.0, 1.0];
        let hit = bracket(&axis, AxisOrder::Descending, 2.5).unwrap();
        assert_eq!((hit.lower, hit.upper), (1, 2));
        assert_relative_eq!(hit.weight, 0.5);
    }

    #[test]
    fn bracket_exact_match_has_zero_weight() {
        let axis = [1.0, 2.0, 3.0];
        let hit = bracket(&axis, AxisOrder::Ascending, 3.0).unwrap();
        assert_eq!((hit.lower, hit.upper), (2, 2));
        assert_eq!(hit.weight, 0.0);
    }

    #[test]
    fn bracket_outside_range_is_none() {
        let axis = [4.0, 3.0, 2.0];
        assert!(bracket(&axis, AxisOrder::Descending, 4.5).is_none());
        assert!(bracket(&axis, AxisOrder::Descending, 1.0).is_none());
    }

    #[test]
    fn linspace_includes_endpoints() {
        assert_eq!(linspace(20.0, 0.0, 5), vec![20.0, 15.0, 10.0, 5.0, 0.0]);
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }
}
