//! Tracing setup: a daily log file plus warnings on stderr

use anyhow::{Context, Result};
use gcoder_core::config::LoggingConfig;
use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

pub const LOG_FILE_PREFIX: &str = "gcoder.log";

/// `RUST_LOG` wins over `level`.
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: {level}"))
}

/// Installs the global subscriber. Keep the returned guard alive until exit
/// or buffered file output is lost.
pub fn init_logging(config: &LoggingConfig, level_override: Option<&str>) -> Result<Option<WorkerGuard>> {
    let level = level_override.unwrap_or(&config.level);

    if !config.file_enabled {
        let console = fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_filter(env_filter(level)?);
        tracing_subscriber::registry()
            .with(console)
            .try_init()
            .context("Failed to initialize logging")?;
        return Ok(None);
    }

    std::fs::create_dir_all(&config.dir)
        .with_context(|| format!("Failed to create log directory: {}", config.dir))?;
    let appender = tracing_appender::rolling::daily(&config.dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(env_filter(level)?);
    // stderr only sees warnings while a file is attached
    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(file)
        .with(console)
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(Some(guard))
}
