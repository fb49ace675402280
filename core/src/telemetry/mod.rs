pub mod log;
pub mod metrics;

pub use log::{init_logging, install_panic_hook, LogConfig, LogManager};
pub use metrics::{MetricsRecorder, MetricsSnapshot};
