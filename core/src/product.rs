//! Turns a granule into an image-ready plot product.
//!
//! Two paths exist. `Regrid` masks, averages horizontally, puts the altitude
//! bins on a uniform axis and regrids onto it. `Interpolate` maps the raw
//! profiles straight onto a regular display grid.

use serde::{Deserialize, Serialize};

use crate::granule::{
    granule_stamp, latitude_window, profile_datetime, Granule, GranuleError, GranuleSource, PlotKind,
};
use crate::grid::MaskedGrid;
use crate::math::StatsHelper;
use crate::prelude::{RegridOptions, StageError, FILL_VALUE};
use crate::processing::{
    average_profiles, decimate_coordinates, interpolate_field, mask_out_of_range, regrid_lidar,
    uniform_altitudes, AltitudeGrid, TargetGrid,
};
use crate::render::ColorMap;
use crate::telemetry::{LogManager, MetricsRecorder};

#[derive(thiserror::Error, Debug)]
pub enum ProductError {
    #[error(transparent)]
    Granule(#[from] GranuleError),
    #[error(transparent)]
    Stage(#[from] StageError),
}

pub type ProductResult<T> = Result<T, ProductError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductMethod {
    #[default]
    Regrid,
    Interpolate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatitudeWindow {
    pub start_lat: f64,
    pub end_lat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductConfig {
    pub plot: PlotKind,
    pub method: ProductMethod,
    pub first_profile: usize,
    pub last_profile: Option<usize>,
    pub averaging_width: usize,
    pub max_altitude_km: f64,
    /// Bottom of the display grid on the interpolate path.
    pub min_altitude_km: f64,
    pub min_scatter: f32,
    pub excessive_scatter: f32,
    pub latitude_window: Option<LatitudeWindow>,
    pub altitude_grid: AltitudeGrid,
    pub regrid: RegridOptions,
    pub interpolation_rows: usize,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            plot: PlotKind::Backscattered,
            method: ProductMethod::Regrid,
            first_profile: 0,
            last_profile: Some(1000),
            averaging_width: 15,
            max_altitude_km: 20.0,
            min_altitude_km: 0.0,
            min_scatter: -0.1,
            excessive_scatter: 0.1,
            latitude_window: None,
            altitude_grid: AltitudeGrid::default(),
            regrid: RegridOptions::default(),
            interpolation_rows: 500,
        }
    }
}

/// Image plus everything the renderer needs to label it.
///
/// `image` rows run from the highest altitude down; `extent` is
/// `[x_start, x_end, min_alt, max_alt]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotProduct {
    pub kind: PlotKind,
    pub image: MaskedGrid,
    pub extent: [f64; 4],
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub colorbar_label: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notes: Vec<String>,
}

impl PlotProduct {
    pub fn colormap(&self) -> ColorMap {
        match self.kind {
            PlotKind::Depolarized => ColorMap::depolarization(),
            _ => ColorMap::backscatter(),
        }
    }

    /// Data coordinates of the centre of image cell `(row, col)`.
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let (rows, cols) = self.image.dim();
        let [x0, x1, z0, z1] = self.extent;
        let x = x0 + (x1 - x0) * (col as f64 + 0.5) / cols.max(1) as f64;
        let z = z1 - (z1 - z0) * (row as f64 + 0.5) / rows.max(1) as f64;
        (x, z)
    }
}

pub struct ProductBuilder {
    config: ProductConfig,
    logger: LogManager,
    metrics: MetricsRecorder,
}

impl ProductBuilder {
    pub fn new(config: ProductConfig) -> Self {
        Self {
            config,
            logger: LogManager::with_target("calipso::product"),
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn config(&self) -> &ProductConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// Reads the configured profile range from `source` and builds the product.
    pub fn build<S: GranuleSource + ?Sized>(&self, source: &S) -> ProductResult<PlotProduct> {
        let end = self.config.last_profile.unwrap_or(usize::MAX);
        let result = source
            .read_profiles(self.config.first_profile..end)
            .map_err(ProductError::from)
            .and_then(|granule| self.build_from_granule(&granule));
        match &result {
            Ok(product) => self.metrics.record_product(product.image.masked_count()),
            Err(err) => {
                log::error!("building {} product failed: {}", self.config.plot, err);
                self.metrics.record_error();
            }
        }
        result
    }

    pub fn build_from_granule(&self, granule: &Granule) -> ProductResult<PlotProduct> {
        granule.validate()?;
        // Index of the first selected profile within the whole granule.
        let mut first_profile = self.config.first_profile;
        let granule = match self.config.latitude_window {
            Some(window) => {
                let range = latitude_window(&granule.latitude, window.start_lat, window.end_lat);
                self.logger.record(&format!(
                    "latitude window {:.1}..{:.1} -> profiles {:?}",
                    window.start_lat, window.end_lat, range
                ));
                first_profile += range.start;
                granule.slice_profiles(range)
            }
            None => granule.clone(),
        };
        if granule.profile_count() == 0 {
            return Err(StageError::InvalidInput("no profiles in selection".into()).into());
        }

        let dataset = self.dataset(&granule)?;
        let mut product = match self.config.method {
            ProductMethod::Regrid => self.regrid_path(&granule, &dataset)?,
            ProductMethod::Interpolate => self.interpolate_path(&granule, &dataset, first_profile)?,
        };

        product.start_time = granule
            .profile_time
            .first()
            .and_then(|&t| profile_datetime(t))
            .map(|dt| dt.to_string());
        product.end_time = granule
            .profile_time
            .last()
            .and_then(|&t| profile_datetime(t))
            .map(|dt| dt.to_string());
        self.logger.record(&format!(
            "{} product {}x{}, {} masked cells",
            product.kind,
            product.image.rows(),
            product.image.cols(),
            product.image.masked_count()
        ));
        Ok(product)
    }

    fn dataset(&self, granule: &Granule) -> ProductResult<MaskedGrid> {
        let mut total = MaskedGrid::from_sentinel(granule.total_backscatter_532.clone(), FILL_VALUE);
        mask_out_of_range(&mut total, self.config.min_scatter, self.config.excessive_scatter);

        match self.config.plot {
            PlotKind::Backscattered => Ok(total),
            PlotKind::Depolarized => {
                let perp = granule.perpendicular_backscatter_532.as_ref().ok_or_else(|| {
                    GranuleError::Inconsistent("granule has no perpendicular channel".into())
                })?;
                let perp = MaskedGrid::from_sentinel(perp.clone(), FILL_VALUE);
                Ok(depolarization_ratio(&total, &perp)?)
            }
            other => Err(StageError::Unsupported(format!("{} plots", other)).into()),
        }
    }

    fn regrid_path(&self, granule: &Granule, dataset: &MaskedGrid) -> ProductResult<PlotProduct> {
        let width = self.config.averaging_width;
        let averaged = average_profiles(dataset, width)?;
        let latitude = decimate_coordinates(&granule.latitude, width)?;
        if averaged.rows() == 0 {
            return Err(StageError::InvalidInput(format!(
                "{} profiles are fewer than the averaging width {}",
                granule.profile_count(),
                width
            ))
            .into());
        }

        let unified = uniform_altitudes(
            self.config.max_altitude_km,
            &granule.altitudes,
            &self.config.altitude_grid,
        )?;
        let regridded = regrid_lidar(&granule.altitudes, &averaged, &unified, &self.config.regrid)?;

        let mut image = regridded.transposed();
        let (top, bottom) = match (unified.first(), unified.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Err(StageError::InvalidInput("empty uniform altitude axis".into()).into()),
        };
        if top < bottom {
            image = image.flipped_rows();
        }
        let extent = [
            latitude[0],
            latitude[latitude.len() - 1],
            top.min(bottom),
            top.max(bottom),
        ];

        Ok(PlotProduct {
            kind: self.config.plot,
            image,
            extent,
            title: self.title(granule, true),
            x_label: "Latitude (degrees)".into(),
            y_label: "Altitude (km)".into(),
            colorbar_label: self.colorbar_label(),
            start_time: None,
            end_time: None,
            notes: vec![
                format!("averaged {} profiles per column", width),
                format!("{} uniform altitude bins", unified.len()),
                format!(
                    "source bin spacing up to {:.3} km",
                    StatsHelper::max_spacing(&granule.altitudes)
                ),
            ],
        })
    }

    fn interpolate_path(
        &self,
        granule: &Granule,
        dataset: &MaskedGrid,
        first_profile: usize,
    ) -> ProductResult<PlotProduct> {
        let first = first_profile as f64;
        let x: Vec<f64> = (0..granule.profile_count()).map(|i| first + i as f64).collect();
        let target = TargetGrid {
            x_start: x[0],
            x_end: x[x.len() - 1],
            nx: x.len(),
            z_top: self.config.max_altitude_km,
            z_bottom: self.config.min_altitude_km,
            nz: self.config.interpolation_rows,
        };
        let image = interpolate_field(dataset, &x, &granule.altitudes, &target)?;

        Ok(PlotProduct {
            kind: self.config.plot,
            image,
            extent: [
                target.x_start,
                target.x_end,
                target.z_bottom.min(target.z_top),
                target.z_bottom.max(target.z_top),
            ],
            title: self.title(granule, false),
            x_label: "Profile".into(),
            y_label: "Altitude (km)".into(),
            colorbar_label: self.colorbar_label(),
            start_time: None,
            end_time: None,
            notes: vec![format!("interpolated onto {}x{} grid", target.nz, target.nx)],
        })
    }

    fn title(&self, granule: &Granule, averaged: bool) -> String {
        let quantity = match self.config.plot {
            PlotKind::Depolarized => "532 nm Depolarization Ratio",
            _ => "532 nm Total Attenuated Backscatter",
        };
        let prefix = if averaged { "Averaged " } else { "" };
        match granule_stamp(&granule.name) {
            Some(stamp) => format!("{}{} for granule {}", prefix, quantity, stamp),
            None => format!("{}{}", prefix, quantity),
        }
    }

    fn colorbar_label(&self) -> String {
        match self.config.plot {
            PlotKind::Depolarized => "Depolarization Ratio 532nm".into(),
            _ => "Total Attenuated Backscatter 532nm (km^-1 sr^-1)".into(),
        }
    }
}

/// Perpendicular over parallel return, masked wherever the parallel part vanishes.
pub fn depolarization_ratio(total: &MaskedGrid, perpendicular: &MaskedGrid) -> Result<MaskedGrid, StageError> {
    if total.dim() != perpendicular.dim() {
        return Err(StageError::ShapeMismatch {
            expected: total.data().len(),
            actual: perpendicular.data().len(),
        });
    }
    let (rows, cols) = total.dim();
    let mut out = MaskedGrid::masked(rows, cols);
    for r in 0..rows {
        for c in 0..cols {
            let ratio = match (total.get(r, c), perpendicular.get(r, c)) {
                (Some(t), Some(p)) if t - p > 0.0 => Some(p / (t - p)),
                _ => None,
            };
            out.set(r, c, ratio);
        }
    }
    Ok(out)
}
