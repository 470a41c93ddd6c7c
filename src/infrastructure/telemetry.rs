//! Tracing initialization.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

use crate::services::config::LoggingConfig;

/// Initialize the global tracing subscriber from configuration.
///
/// Returns the appender guard when file logging is enabled; the caller
/// keeps it alive for the process lifetime.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    if let Some(directory) = &config.directory {
        let appender = tracing_appender::rolling::daily(directory, "noesis.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        if config.format == "json" {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(writer)
                .try_init()
                .map_err(|e| anyhow::anyhow!("{e}"))
                .context("failed to initialize json file logging")?;
        } else {
            fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("{e}"))
                .context("failed to initialize file logging")?;
        }
        return Ok(Some(guard));
    }

    if config.format == "json" {
        fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .context("failed to initialize json logging")?;
    } else {
        fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .context("failed to initialize logging")?;
    }
    Ok(None)
}
