use anyhow::Context;
use calipsocore::granule::PlotKind;
use calipsocore::product::ProductMethod;
use calipsocore::telemetry::{init_logging, install_panic_hook};
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Builds CALIPSO lidar plot products offline")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Granule exported as JSON; a synthetic granule is generated otherwise
    #[arg(long)]
    granule: Option<PathBuf>,
    /// base_plot, backscattered, depolarized or vfm
    #[arg(long)]
    plot: Option<String>,
    /// Use the display-grid interpolation instead of uniform-altitude regridding
    #[arg(long, default_value_t = false)]
    interpolate: bool,
    #[arg(long)]
    averaging_width: Option<usize>,
    #[arg(long)]
    max_altitude: Option<f64>,
    /// Profiles in the synthetic granule
    #[arg(long)]
    profiles: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Append a one-line summary to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Write the full product as JSON
    #[arg(long)]
    dump: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<WorkflowConfig> {
        let mut config = match &self.workflow {
            Some(path) => WorkflowConfig::load(path)?,
            None => WorkflowConfig::default(),
        };
        if let Some(plot) = &self.plot {
            config.product.plot = plot.parse::<PlotKind>()?;
        }
        if self.interpolate {
            config.product.method = ProductMethod::Interpolate;
        }
        if let Some(width) = self.averaging_width {
            config.product.averaging_width = width;
        }
        if let Some(max_alt) = self.max_altitude {
            config.product.max_altitude_km = max_alt;
        }
        if let Some(profiles) = self.profiles {
            config.synthetic.profiles = profiles;
        }
        if let Some(seed) = self.seed {
            config.synthetic.seed = seed;
        }
        config.granule = self.granule.or(config.granule);
        config.report = self.report.or(config.report);
        config.dump = self.dump.or(config.dump);
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;
    init_logging(&config.log).context("initialising logging")?;
    install_panic_hook();

    let runner = Runner::new(config.clone());
    let result = runner.execute()?;
    let summary = result.summary();
    print!("{}", summary);

    if let Some(report_path) = &config.report {
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(report_path)
            .with_context(|| format!("opening report {}", report_path.display()))?;
        file.write_all(summary.as_bytes())?;
    }

    if let Some(dump_path) = &config.dump {
        let json = serde_json::to_string(&result.product).context("serialising product")?;
        fs::write(dump_path, json)
            .with_context(|| format!("writing product {}", dump_path.display()))?;
        log::info!("product written to {}", dump_path.display());
    }

    Ok(())
}
