//! Logging setup
//!
//! Logs go to a daily-rolling file so they never interleave with the chat
//! transcript on the terminal. `RUST_LOG` overrides the configured filter.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "viveka.log";

/// Initialize the global tracing subscriber
///
/// Keep the returned guard alive for the lifetime of the program; dropping
/// it flushes and stops the background writer.
pub fn init_logging(config: &LogConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.dir)
        .with_context(|| format!("Failed to create log directory: {:?}", config.dir))?;

    let appender = tracing_appender::rolling::daily(&config.dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_filter))
        .context("Invalid log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::debug!("Logging to {:?}", config.dir);
    Ok(guard)
}
