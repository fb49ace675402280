use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Failures while obtaining or validating a granule.
#[derive(thiserror::Error, Debug)]
pub enum GranuleError {
    #[error("reading granule {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decoding granule: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("inconsistent granule: {0}")]
    Inconsistent(String),
    #[error("unknown plot type: {0}")]
    UnknownPlot(String),
}

pub type GranuleResult<T> = Result<T, GranuleError>;

/// One Level 1B lidar file: per-profile geolocation plus the backscatter datasets.
///
/// Dataset rows are profiles and columns are altitude bins, ordered like
/// `altitudes` (top to bottom). Missing samples carry the fill value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Granule {
    pub name: String,
    /// `Profile_UTC_Time`, encoded as `yymmdd.fraction_of_day`.
    pub profile_time: Vec<f64>,
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
    /// `Lidar_Data_Altitudes` in km.
    pub altitudes: Vec<f64>,
    pub total_backscatter_532: Array2<f32>,
    #[serde(default)]
    pub perpendicular_backscatter_532: Option<Array2<f32>>,
}

impl Granule {
    pub fn profile_count(&self) -> usize {
        self.total_backscatter_532.nrows()
    }

    /// Checks that every per-profile and per-bin array agrees in length.
    pub fn validate(&self) -> GranuleResult<()> {
        let (profiles, bins) = self.total_backscatter_532.dim();
        if bins != self.altitudes.len() {
            return Err(GranuleError::Inconsistent(format!(
                "{} altitude bins but {} altitudes",
                bins,
                self.altitudes.len()
            )));
        }
        for (name, len) in [
            ("profile_time", self.profile_time.len()),
            ("latitude", self.latitude.len()),
            ("longitude", self.longitude.len()),
        ] {
            if len != profiles {
                return Err(GranuleError::Inconsistent(format!(
                    "{} has {} entries for {} profiles",
                    name, len, profiles
                )));
            }
        }
        if let Some(perp) = &self.perpendicular_backscatter_532 {
            if perp.dim() != (profiles, bins) {
                return Err(GranuleError::Inconsistent(format!(
                    "perpendicular dataset is {:?}, total is {:?}",
                    perp.dim(),
                    (profiles, bins)
                )));
            }
        }
        Ok(())
    }

    /// Copy restricted to the profiles in `range`, clamped to what exists.
    pub fn slice_profiles(&self, range: Range<usize>) -> Granule {
        let end = range.end.min(self.profile_count());
        let start = range.start.min(end);
        Granule {
            name: self.name.clone(),
            profile_time: self.profile_time[start..end].to_vec(),
            latitude: self.latitude[start..end].to_vec(),
            longitude: self.longitude[start..end].to_vec(),
            altitudes: self.altitudes.clone(),
            total_backscatter_532: self
                .total_backscatter_532
                .slice(ndarray::s![start..end, ..])
                .to_owned(),
            perpendicular_backscatter_532: self
                .perpendicular_backscatter_532
                .as_ref()
                .map(|perp| perp.slice(ndarray::s![start..end, ..]).to_owned()),
        }
    }
}

/// Anything able to hand out the profiles of a granule.
pub trait GranuleSource {
    /// Reads the profiles in `range`; ranges past the end are clamped.
    fn read_profiles(&self, range: Range<usize>) -> GranuleResult<Granule>;

    fn read_all(&self) -> GranuleResult<Granule> {
        self.read_profiles(0..usize::MAX)
    }
}

/// Reads granules that were exported to JSON.
pub struct JsonGranuleReader {
    path: PathBuf,
}

impl JsonGranuleReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl GranuleSource for JsonGranuleReader {
    fn read_profiles(&self, range: Range<usize>) -> GranuleResult<Granule> {
        let contents = fs::read_to_string(&self.path).map_err(|source| GranuleError::Io {
            path: self.path.clone(),
            source,
        })?;
        let granule: Granule = serde_json::from_str(&contents)?;
        granule.validate()?;
        log::debug!(
            "loaded granule {} with {} profiles",
            granule.name,
            granule.profile_count()
        );
        Ok(granule.slice_profiles(range))
    }
}

/// The plots the viewer knows how to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    BasePlot,
    Backscattered,
    Depolarized,
    Vfm,
}

impl PlotKind {
    pub const ALL: [PlotKind; 4] = [
        PlotKind::BasePlot,
        PlotKind::Backscattered,
        PlotKind::Depolarized,
        PlotKind::Vfm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlotKind::BasePlot => "base_plot",
            PlotKind::Backscattered => "backscattered",
            PlotKind::Depolarized => "depolarized",
            PlotKind::Vfm => "vfm",
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlotKind {
    type Err = GranuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlotKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GranuleError::UnknownPlot(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::granule::synthetic::{SyntheticConfig, SyntheticGranule};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn small_granule() -> Granule {
        SyntheticGranule::new(SyntheticConfig {
            profiles: 12,
            ..Default::default()
        })
        .read_all()
        .unwrap()
    }

    #[test]
    fn plot_kind_round_trips_names() {
        assert_eq!("vfm".parse::<PlotKind>().unwrap(), PlotKind::Vfm);
        assert_eq!(PlotKind::BasePlot.to_string(), "base_plot");
        assert!("lidar".parse::<PlotKind>().is_err());
    }

    #[test]
    fn slice_profiles_clamps_range() {
        let granule = small_granule();
        let sliced = granule.slice_profiles(4..100);
        assert_eq!(sliced.profile_count(), 8);
        assert_eq!(sliced.latitude.len(), 8);
        assert_eq!(sliced.latitude[0], granule.latitude[4]);
        sliced.validate().unwrap();
    }

    #[test]
    fn validate_catches_length_mismatch() {
        let mut granule = small_granule();
        granule.latitude.pop();
        assert!(matches!(
            granule.validate(),
            Err(GranuleError::Inconsistent(_))
        ));
    }

    #[test]
    fn json_reader_loads_exported_granule() {
        let granule = small_granule();
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(serde_json::to_string(&granule).unwrap().as_bytes())
            .unwrap();
        let reader = JsonGranuleReader::new(temp.path());
        let loaded = reader.read_profiles(0..5).unwrap();
        assert_eq!(loaded.profile_count(), 5);
        assert_eq!(loaded.altitudes, granule.altitudes);
    }

    #[test]
    fn json_reader_reports_missing_file() {
        let reader = JsonGranuleReader::new("/nonexistent/granule.json");
        assert!(matches!(reader.read_all(), Err(GranuleError::Io { .. })));
    }
}
