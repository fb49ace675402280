use anyhow::Context;
use calipsocore::granule::SyntheticConfig;
use calipsocore::product::ProductConfig;
use calipsocore::telemetry::LogConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub product: ProductConfig,
    /// Exported granule to read; the synthetic generator is used when unset.
    pub granule: Option<PathBuf>,
    pub synthetic: SyntheticConfig,
    pub log: LogConfig,
    pub report: Option<PathBuf>,
    pub dump: Option<PathBuf>,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }
}
