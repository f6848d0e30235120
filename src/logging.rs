//! Logging bootstrap for applications embedding the cleaner.
//!
//! The library itself only emits `tracing` events (through
//! [`Diagnostics`](crate::diagnostics::Diagnostics) and directly from the pipeline). Binaries
//! and notebooks call [`init`] once to get console output, optionally with rotating log files.
//!
//! ```no_run
//! use boxscore_cleaner::logging;
//!
//! // Console only
//! logging::init(None).expect("Failed to initialize logging");
//!
//! tracing::info!("Cleaner ready");
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Gets the default log directory based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/boxscore-cleaner/logs`
/// - macOS: `~/Library/Application Support/boxscore-cleaner/logs`
/// - Linux: `~/.local/share/boxscore-cleaner/logs`
pub fn default_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    ensure_log_dir(&base_dir.join("boxscore-cleaner").join("logs"))
}

/// Creates `dir` if needed and returns it.
pub fn ensure_log_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    }
    Ok(dir.to_path_buf())
}

/// Initializes the global subscriber.
///
/// Console output is always enabled. When `log_dir` is given, two daily-rotating files are
/// written there as well:
/// - `boxscore-cleaner.log`: everything that passes the env filter
/// - `error.log`: warnings and errors only (skipped stages end up here)
///
/// The filter defaults to `info` and can be overridden with `RUST_LOG`.
///
/// # Errors
///
/// Returns error if the log directory cannot be created, a file appender fails, or a global
/// subscriber is already installed.
pub fn init(log_dir: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(true)
        .with_file(true);

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .try_init()
            .context("Failed to install tracing subscriber")?;
        return Ok(());
    };

    let log_dir = ensure_log_dir(log_dir)?;

    let all_logs_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("boxscore-cleaner")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create all-logs file appender")?;

    let error_logs_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("error")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create error-logs file appender")?;

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(all_logs_appender);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(error_logs_appender)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Logging initialized, log directory: {}", log_dir.display());

    Ok(())
}
