//! Log sink. The terminal is in raw mode while playing, so log lines only
//! ever go to a file given on the command line.

use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::Path;

/// `PANELPOP_LOG` (env_logger filter syntax) refines the level from `--log-level`.
const LOG_ENV: &str = "PANELPOP_LOG";

/// Append to `path` at `level` and install as the global logger.
pub fn init(path: &Path, level: LevelFilter) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env(LOG_ENV)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .context("installing logger")?;
    Ok(())
}
