// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always; with the `file-logging` feature and a configured
//! `log_dir`, a daily rotated `shim.log` as well.

use anyhow::{Context, Result};
use shim_config::LoggingConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Keeps background log writers alive; drop it last.
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Directory receiving log files, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Build the filter for `config.level` plus the per-crate debug flags.
pub fn build_filter(config: &LoggingConfig, debug_flags: &CrateDebugFlags) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string(&config.level.to_lowercase());
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log filter '{}'", directives))
}

/// Initialize the global subscriber
///
/// # Arguments
/// * `config` - `[logging]` section: base level and optional log directory
/// * `debug_flags` - Per-crate debug flags
///
/// # Errors
/// Fails when the filter does not parse, the log directory cannot be created,
/// or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig, debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    let filter = build_filter(config, debug_flags)?;

    let mut layers = Vec::new();
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(filter)
        .boxed();
    layers.push(console_layer);

    #[cfg(feature = "file-logging")]
    let mut file_guard = None;
    let mut log_dir = None;

    if let Some(dir) = &config.log_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
        #[cfg(feature = "file-logging")]
        {
            let appender = tracing_appender::rolling::daily(dir, "shim.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(build_filter(config, debug_flags)?)
                .boxed();
            layers.push(file_layer);
            file_guard = Some(guard);
            log_dir = Some(dir.clone());
        }
        #[cfg(not(feature = "file-logging"))]
        eprintln!(
            "log_dir {} ignored: built without the file-logging feature",
            dir.display()
        );
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guard: file_guard,
        log_dir,
    })
}

/// Initialize logging from the process arguments and `SHIM_DEBUG`.
pub fn init_logging_default(config: &LoggingConfig) -> Result<LoggingGuard> {
    init_logging(config, &crate::parse_debug_flags())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_config() {
        let config = LoggingConfig {
            level: "WARN".into(),
            log_dir: None,
        };
        let flags = CrateDebugFlags::from_args(vec!["--debug-shim-update".to_string()]);
        let filter = build_filter(&config, &flags).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("shim_update=debug"));
        assert!(rendered.contains("warn"));
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = LoggingConfig {
            level: "very=loud=indeed".into(),
            log_dir: None,
        };
        assert!(build_filter(&config, &CrateDebugFlags::default()).is_err());
    }
}
