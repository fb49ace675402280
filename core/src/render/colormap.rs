use serde::{Deserialize, Serialize};

use crate::prelude::{StageError, StageResult};

pub type Rgb = [u8; 3];

/// Where a sample lands after boundary normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    /// Masked or non-finite sample.
    Bad,
    Under,
    Over,
    Level(usize),
}

/// Listed color map with boundary normalisation.
///
/// `bounds` has one more entry than `colors`; color `i` covers
/// `bounds[i] <= v < bounds[i + 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMap {
    pub colors: Vec<Rgb>,
    pub under: Rgb,
    pub over: Rgb,
    pub bad: Rgb,
    pub bounds: Vec<f32>,
}

impl ColorMap {
    /// Checks that `bounds` has one more entry than `colors` and strictly increases.
    pub fn validate(&self) -> StageResult<()> {
        if self.colors.is_empty() || self.bounds.len() != self.colors.len() + 1 {
            return Err(StageError::ShapeMismatch {
                expected: self.colors.len() + 1,
                actual: self.bounds.len(),
            });
        }
        if let Some(idx) = self.bounds.windows(2).position(|pair| !(pair[1] > pair[0])) {
            return Err(StageError::NonMonotonicAxis(idx + 1));
        }
        Ok(())
    }

    /// The attenuated backscatter palette: dark blues for clear air through
    /// greens and yellows for aerosol to reds, greys and white for cloud.
    pub fn backscatter() -> Self {
        let bounds: Vec<f32> = vec![
            1.0e-4, 2.0e-4, 3.0e-4, 4.0e-4, 5.0e-4, 6.0e-4, 7.0e-4, 8.0e-4, 9.0e-4, 1.0e-3,
            1.5e-3, 2.0e-3, 2.5e-3, 3.0e-3, 4.0e-3, 5.0e-3, 6.0e-3, 7.0e-3, 8.0e-3, 1.0e-2,
            2.0e-2, 3.0e-2, 4.0e-2, 5.0e-2, 6.0e-2, 8.0e-2, 1.0e-1,
        ];
        let anchors: [Rgb; 7] = [
            [0, 42, 127],
            [0, 127, 255],
            [0, 170, 85],
            [255, 255, 0],
            [255, 85, 0],
            [100, 100, 100],
            [235, 235, 235],
        ];
        let colors = ramp(&anchors, bounds.len() - 1);
        Self {
            colors,
            under: [0, 0, 63],
            over: [255, 255, 255],
            bad: [64, 64, 64],
            bounds,
        }
    }

    /// Depolarization ratio palette spanning 0 to 1.
    pub fn depolarization() -> Self {
        let bounds: Vec<f32> = (0..=20).map(|i| i as f32 * 0.05).collect();
        let anchors: [Rgb; 4] = [[0, 0, 160], [0, 200, 200], [255, 230, 0], [200, 0, 0]];
        Self {
            colors: ramp(&anchors, bounds.len() - 1),
            under: [0, 0, 63],
            over: [255, 255, 255],
            bad: [64, 64, 64],
            bounds,
        }
    }

    pub fn classify(&self, value: Option<f32>) -> ColorClass {
        let Some(v) = value.filter(|v| v.is_finite()) else {
            return ColorClass::Bad;
        };
        let (Some(&first), Some(&last)) = (self.bounds.first(), self.bounds.last()) else {
            return ColorClass::Bad;
        };
        if v < first {
            return ColorClass::Under;
        }
        if v >= last {
            return ColorClass::Over;
        }
        let idx = self.bounds.partition_point(|&b| b <= v) - 1;
        ColorClass::Level(idx.min(self.colors.len() - 1))
    }

    pub fn color_of(&self, value: Option<f32>) -> Rgb {
        match self.classify(value) {
            ColorClass::Bad => self.bad,
            ColorClass::Under => self.under,
            ColorClass::Over => self.over,
            ColorClass::Level(idx) => self.colors[idx],
        }
    }
}

/// `count` colors linearly interpolated through `anchors`.
fn ramp(anchors: &[Rgb], count: usize) -> Vec<Rgb> {
    if anchors.len() < 2 || count < 2 {
        return anchors.iter().copied().take(count.max(1)).collect();
    }
    let segments = (anchors.len() - 1) as f32;
    (0..count)
        .map(|i| {
            let t = i as f32 / (count - 1) as f32 * segments;
            let seg = (t.floor() as usize).min(anchors.len() - 2);
            let f = t - seg as f32;
            let (a, b) = (anchors[seg], anchors[seg + 1]);
            [0, 1, 2].map(|c| (a[c] as f32 + (b[c] as f32 - a[c] as f32) * f).round() as u8)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_maps_are_valid() {
        ColorMap::backscatter().validate().unwrap();
        ColorMap::depolarization().validate().unwrap();
    }

    #[test]
    fn classify_separates_under_over_and_bad() {
        let map = ColorMap::backscatter();
        assert_eq!(map.classify(None), ColorClass::Bad);
        assert_eq!(map.classify(Some(f32::NAN)), ColorClass::Bad);
        assert_eq!(map.classify(Some(1.0e-5)), ColorClass::Under);
        assert_eq!(map.classify(Some(0.5)), ColorClass::Over);
        assert_eq!(map.classify(Some(1.0e-4)), ColorClass::Level(0));
        assert_eq!(map.classify(Some(0.09)), ColorClass::Level(25));
    }

    #[test]
    fn color_of_uses_special_colors() {
        let map = ColorMap {
            colors: vec![[1, 1, 1], [2, 2, 2]],
            under: [3, 3, 3],
            over: [4, 4, 4],
            bad: [5, 5, 5],
            bounds: vec![0.0, 1.0, 2.0],
        };
        map.validate().unwrap();
        assert_eq!(map.color_of(Some(1.5)), [2, 2, 2]);
        assert_eq!(map.color_of(Some(-1.0)), [3, 3, 3]);
        assert_eq!(map.color_of(Some(2.0)), [4, 4, 4]);
        assert_eq!(map.color_of(None), [5, 5, 5]);
    }

    #[test]
    fn validate_rejects_bad_bounds() {
        let mut map = ColorMap {
            colors: vec![[0, 0, 0]],
            under: [0; 3],
            over: [0; 3],
            bad: [0; 3],
            bounds: vec![0.0],
        };
        assert!(map.validate().is_err());
        map.bounds = vec![1.0, 0.0];
        assert_eq!(map.validate(), Err(StageError::NonMonotonicAxis(1)));
    }

    #[test]
    fn ramp_hits_both_ends() {
        let colors = ramp(&[[0, 0, 0], [200, 100, 50]], 5);
        assert_eq!(colors.first(), Some(&[0, 0, 0]));
        assert_eq!(colors.last(), Some(&[200, 100, 50]));
    }
}
