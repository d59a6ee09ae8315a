//! Shared logging utilities for BLD Remote binaries.

use anyhow::{Context, Result};
use bld_remote_protocol::config::{HOME_ENV, LOG_LEVEL_ENV};
use std::fs;
use std::path::PathBuf;
use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str =
    "bld_remote_broker=info,bld_remote_mcp=info,bld_remote_protocol=info";

/// Logging configuration shared by BLD Remote binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Explicit level from the CLI; overrides the environment variable.
    pub level_override: Option<&'a str>,
}

/// Initialize tracing with a daily-rotated log file and stderr output.
///
/// File rotation is delegated to `tracing-appender`'s rolling writer; one
/// file per day per binary under the app's logs directory. Filter
/// resolution order: the CLI override, then `RUST_LOG` (EnvFilter
/// syntax), then the five-level `BLD_REMOTE_LOG_LEVEL` variable the host
/// ecosystem uses, then a per-crate info default.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = ensure_logs_dir().context("Failed to ensure log directory")?;
    let file_appender = rolling::daily(log_dir, format!("{}.log", config.app_name));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(resolve_filter(config.level_override)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(resolve_filter(config.level_override)),
        )
        .init();

    Ok(())
}

fn resolve_filter(level_override: Option<&str>) -> EnvFilter {
    if let Some(level) = level_override.and_then(app_level_to_filter) {
        return EnvFilter::new(level);
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if let Some(level) = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .as_deref()
        .and_then(app_level_to_filter)
    {
        return EnvFilter::new(level);
    }
    EnvFilter::new(DEFAULT_LOG_FILTER)
}

/// Map the host ecosystem's log level names onto tracing level filters.
/// CRITICAL has no tracing counterpart and collapses into `error`.
fn app_level_to_filter(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_uppercase().as_str() {
        "DEBUG" => Some("debug"),
        "INFO" => Some("info"),
        "WARNING" => Some("warn"),
        "ERROR" | "CRITICAL" => Some("error"),
        _ => None,
    }
}

/// Application home directory: ~/.bld_remote (override via BLD_REMOTE_HOME).
pub fn app_home() -> PathBuf {
    if let Ok(override_path) = std::env::var(HOME_ENV) {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bld_remote")
}

/// Logs directory: ~/.bld_remote/logs
pub fn logs_dir() -> PathBuf {
    app_home().join("logs")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}
