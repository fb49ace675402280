//! Granule model and the readers that produce it.

pub mod latitude;
pub mod model;
pub mod naming;
pub mod synthetic;

pub use latitude::{find_lat_index, latitude_window};
pub use model::{Granule, GranuleError, GranuleResult, GranuleSource, JsonGranuleReader, PlotKind};
pub use naming::{granule_stamp, profile_datetime};
pub use synthetic::{SyntheticConfig, SyntheticGranule};
