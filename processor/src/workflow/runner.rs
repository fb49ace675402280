use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use calipsocore::granule::{GranuleSource, JsonGranuleReader, SyntheticGranule};
use calipsocore::math::StatsHelper;
use calipsocore::product::{PlotProduct, ProductBuilder};
use calipsocore::render::ColorClass;
use calipsocore::telemetry::MetricsSnapshot;

/// Image cells per color map class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts {
    pub bad: usize,
    pub under: usize,
    pub over: usize,
    pub levels: usize,
}

/// Largest valid sample and the data coordinates of its cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub value: f32,
    pub x: f64,
    pub altitude_km: f64,
}

pub struct WorkflowResult {
    pub product: PlotProduct,
    /// Mean of each image row, top altitude first.
    pub mean_profile: Vec<Option<f32>>,
    pub value_range: Option<(f32, f32)>,
    pub classes: ClassCounts,
    pub peak: Option<Peak>,
    pub metrics: MetricsSnapshot,
}

impl WorkflowResult {
    pub fn summary(&self) -> String {
        let product = &self.product;
        let range = self
            .value_range
            .map(|(lo, hi)| format!("{:.3e}..{:.3e}", lo, hi))
            .unwrap_or_else(|| "n/a".into());
        let peak = self
            .peak
            .map(|p| format!("{:.3e}@({:.2}, {:.2} km)", p.value, p.x, p.altitude_km))
            .unwrap_or_else(|| "n/a".into());
        format!(
            "plot={} image={}x{} masked={} extent={:?} range={} peak={} classes={}/{}/{}/{} start={} end={}\n",
            product.kind,
            product.image.rows(),
            product.image.cols(),
            product.image.masked_count(),
            product.extent,
            range,
            peak,
            self.classes.levels,
            self.classes.under,
            self.classes.over,
            self.classes.bad,
            product.start_time.as_deref().unwrap_or("?"),
            product.end_time.as_deref().unwrap_or("?"),
        )
    }
}

pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    fn source(&self) -> Box<dyn GranuleSource> {
        match &self.config.granule {
            Some(path) => Box::new(JsonGranuleReader::new(path)),
            None => Box::new(SyntheticGranule::new(self.config.synthetic.clone())),
        }
    }

    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let builder = ProductBuilder::new(self.config.product.clone());
        let source = self.source();
        let product = builder
            .build(source.as_ref())
            .with_context(|| format!("building {} product", self.config.product.plot))?;

        let mean_profile = product.image.transposed().column_means();
        let valid: Vec<f32> = product
            .image
            .data()
            .iter()
            .zip(product.image.mask().iter())
            .filter(|(_, &masked)| !masked)
            .map(|(&v, _)| v)
            .collect();
        let value_range = StatsHelper::finite_range(&valid);
        let classes = class_counts(&product)?;
        let peak = find_peak(&product);

        for note in &product.notes {
            log::info!("{}", note);
        }

        Ok(WorkflowResult {
            mean_profile,
            value_range,
            classes,
            peak,
            metrics: builder.metrics().snapshot(),
            product,
        })
    }
}

fn class_counts(product: &PlotProduct) -> anyhow::Result<ClassCounts> {
    let colormap = product.colormap();
    colormap
        .validate()
        .with_context(|| format!("color map for {} product", product.kind))?;
    let (rows, cols) = product.image.dim();
    let mut counts = ClassCounts::default();
    for row in 0..rows {
        for col in 0..cols {
            match colormap.classify(product.image.get(row, col)) {
                ColorClass::Bad => counts.bad += 1,
                ColorClass::Under => counts.under += 1,
                ColorClass::Over => counts.over += 1,
                ColorClass::Level(_) => counts.levels += 1,
            }
        }
    }
    Ok(counts)
}

fn find_peak(product: &PlotProduct) -> Option<Peak> {
    let (rows, cols) = product.image.dim();
    let mut best: Option<(usize, usize, f32)> = None;
    for row in 0..rows {
        for col in 0..cols {
            if let Some(v) = product.image.get(row, col).filter(|v| v.is_finite()) {
                if best.map_or(true, |(_, _, b)| v > b) {
                    best = Some((row, col, v));
                }
            }
        }
    }
    best.map(|(row, col, value)| {
        let (x, altitude_km) = product.cell_center(row, col);
        Peak {
            value,
            x,
            altitude_km,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use calipsocore::granule::SyntheticConfig;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn small_config() -> WorkflowConfig {
        WorkflowConfig {
            synthetic: SyntheticConfig {
                profiles: 45,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn runner_executes_workflow() {
        let result = Runner::new(small_config()).execute().unwrap();
        assert_eq!(result.product.image.cols(), 3);
        assert_eq!(result.mean_profile.len(), result.product.image.rows());
        assert_eq!(result.metrics.products, 1);
        let (lo, hi) = result.value_range.unwrap();
        assert!(lo <= hi && hi <= 0.1);
        assert!(result.summary().starts_with("plot=backscattered image="));

        let classes = result.classes;
        let cells = result.product.image.rows() * result.product.image.cols();
        assert_eq!(classes.bad + classes.under + classes.over + classes.levels, cells);
        assert_eq!(classes.bad, result.product.image.masked_count());

        let peak = result.peak.unwrap();
        assert_eq!(peak.value, hi);
        let [_, _, z0, z1] = result.product.extent;
        assert!(peak.altitude_km >= z0 && peak.altitude_km <= z1);
    }

    #[test]
    fn runner_reads_exported_granule() {
        let granule = SyntheticGranule::new(small_config().synthetic)
            .read_all()
            .unwrap();
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(serde_json::to_string(&granule).unwrap().as_bytes())
            .unwrap();

        let config = WorkflowConfig {
            granule: Some(temp.path().to_path_buf()),
            ..small_config()
        };
        let result = Runner::new(config).execute().unwrap();
        assert_eq!(result.product.image.cols(), 3);
    }

    #[test]
    fn runner_surfaces_missing_granule() {
        let config = WorkflowConfig {
            granule: Some("/nonexistent/granule.json".into()),
            ..small_config()
        };
        let err = Runner::new(config).execute().err().unwrap();
        assert!(err.to_string().contains("building backscattered product"));
    }
}
