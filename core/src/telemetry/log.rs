use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use log::{error, info, LevelFilter};
use serde::{Deserialize, Serialize};

/// Records stage notes under a fixed log target.
pub struct LogManager {
    target: &'static str,
}

impl LogManager {
    pub fn new() -> Self {
        Self { target: "calipso" }
    }

    pub fn with_target(target: &'static str) -> Self {
        Self { target }
    }

    pub fn record(&self, message: &str) {
        info!(target: self.target, "{}", message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Trace file written next to the working directory unless configured otherwise.
const DEFAULT_LOG_FILE: &str = "log/trace.log";

/// Console and optional log file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Fallback level when `RUST_LOG` is unset.
    pub level: String,
    /// Copy of every line, truncated at startup.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "debug".into(),
            file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

/// Writes every line to stdout and, when configured, to the trace file.
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Installs the global logger. Calling it twice keeps the first logger.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let file = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Some(File::create(path)?)
        }
        None => None,
    };

    let fallback = config
        .level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::Debug);

    let _ = env_logger::Builder::new()
        .filter_level(fallback)
        .parse_env("RUST_LOG")
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{:>8}] --- {}... ({}:{})",
                buf.timestamp(),
                record.level(),
                record.args(),
                record.file().unwrap_or("?"),
                record.line().unwrap_or(0)
            )
        })
        .target(env_logger::Target::Pipe(Box::new(Tee { file })))
        .try_init();
    Ok(())
}

/// Routes panics through the logger, with a backtrace, before the default hook runs.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        error!("uncaught panic: {}", panic_info);
        error!("{}", backtrace);
        default_hook(panic_info);
    }));
}
