use std::f64::consts::PI;
use std::ops::Range;

use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::granule::model::{Granule, GranuleResult, GranuleSource};
use crate::prelude::FILL_VALUE;

/// Parameters for a reproducible fake Level 1B granule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub name: String,
    pub profiles: usize,
    pub seed: u64,
    pub start_lat: f64,
    pub end_lat: f64,
    /// Relative noise added to every sample.
    pub noise: f32,
    /// Height of the ground under the track, km.
    pub surface_km: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            name: "CAL_LID_L1-ValStage1-V3-01.2007-06-12T03-42-18ZN.hdf".into(),
            profiles: 1000,
            seed: 0,
            start_lat: 45.0,
            end_lat: -25.0,
            noise: 0.05,
            surface_km: 0.2,
        }
    }
}

/// Level 1B altitude bins: 60 m from 20.2 km down to 8.26 km, then 30 m down to -0.5 km.
pub fn level1b_altitudes() -> Vec<f64> {
    let upper = (0..200).map(|i| 20.2 - 0.06 * i as f64);
    let lower = (0..291).map(|i| 8.2 - 0.03 * i as f64);
    upper.chain(lower).collect()
}

/// Generates granules with a cirrus deck, a boundary-layer aerosol and a surface return.
pub struct SyntheticGranule {
    config: SyntheticConfig,
}

impl SyntheticGranule {
    pub fn new(config: SyntheticConfig) -> Self {
        Self { config }
    }

    fn generate(&self) -> Granule {
        let config = &self.config;
        let profiles = config.profiles;
        let altitudes = level1b_altitudes();
        let bins = altitudes.len();
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut total = Array2::<f32>::zeros((profiles, bins));
        let mut perpendicular = Array2::<f32>::zeros((profiles, bins));

        for p in 0..profiles {
            let phase = p as f64 / profiles.max(1) as f64;
            let cloud_base = 9.5 + 1.5 * (2.0 * PI * phase).sin();
            let has_cloud = (0.2..0.6).contains(&phase);
            for (b, &alt) in altitudes.iter().enumerate() {
                if alt < config.surface_km - 0.06 {
                    total[[p, b]] = FILL_VALUE;
                    perpendicular[[p, b]] = FILL_VALUE;
                    continue;
                }
                let molecular = 1.5e-3 * (-alt / 8.0).exp();
                let mut value = molecular;
                let mut depol = 0.01;
                if (alt - config.surface_km).abs() <= 0.06 {
                    value = 0.5;
                    depol = 0.3;
                } else if alt < 2.0 {
                    value += 4.0e-3;
                    depol = 0.05;
                } else if has_cloud && alt >= cloud_base && alt <= cloud_base + 1.2 {
                    value += 0.03;
                    depol = 0.4;
                }
                let jitter = if config.noise > 0.0 {
                    rng.gen_range(-config.noise..config.noise)
                } else {
                    0.0
                };
                let sample = (value as f32) * (1.0 + jitter);
                total[[p, b]] = sample;
                perpendicular[[p, b]] = sample * depol as f32;
            }
        }

        let step = if profiles > 1 {
            (config.end_lat - config.start_lat) / (profiles - 1) as f64
        } else {
            0.0
        };
        let latitude: Vec<f64> = (0..profiles)
            .map(|p| config.start_lat + step * p as f64)
            .collect();
        let longitude: Vec<f64> = latitude.iter().map(|lat| -120.0 + 0.1 * lat).collect();
        // 0.0744 s between profiles, as a fraction of a day.
        let profile_time: Vec<f64> = (0..profiles)
            .map(|p| 70612.125 + p as f64 * 0.0744 / 86_400.0)
            .collect();

        Granule {
            name: config.name.clone(),
            profile_time,
            latitude,
            longitude,
            altitudes,
            total_backscatter_532: total,
            perpendicular_backscatter_532: Some(perpendicular),
        }
    }
}

impl GranuleSource for SyntheticGranule {
    fn read_profiles(&self, range: Range<usize>) -> GranuleResult<Granule> {
        Ok(self.generate().slice_profiles(range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::AxisOrder;

    #[test]
    fn generator_builds_consistent_granule() {
        let granule = SyntheticGranule::new(SyntheticConfig {
            profiles: 30,
            ..Default::default()
        })
        .read_all()
        .unwrap();
        granule.validate().unwrap();
        assert_eq!(granule.profile_count(), 30);
        assert_eq!(granule.altitudes.len(), 491);
        assert_eq!(
            AxisOrder::of(&granule.altitudes).unwrap(),
            AxisOrder::Descending
        );
    }

    #[test]
    fn same_seed_gives_same_samples() {
        let config = SyntheticConfig {
            profiles: 8,
            seed: 7,
            ..Default::default()
        };
        let a = SyntheticGranule::new(config.clone()).read_all().unwrap();
        let b = SyntheticGranule::new(config).read_all().unwrap();
        assert_eq!(a.total_backscatter_532, b.total_backscatter_532);
    }

    #[test]
    fn bins_below_surface_hold_fill_value() {
        let granule = SyntheticGranule::new(SyntheticConfig {
            profiles: 2,
            ..Default::default()
        })
        .read_all()
        .unwrap();
        let last = granule.altitudes.len() - 1;
        assert_eq!(granule.total_backscatter_532[[0, last]], FILL_VALUE);
    }
}
