// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Every struct maps to one section of `shim_configuration.toml`. All fields
//! have defaults, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShimConfig {
    pub coprocessor: CoprocessorConfig,
    pub interrupts: InterruptsConfig,
    pub update: UpdateConfig,
    pub logging: LoggingConfig,
}

/// Co-processor command channel
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CoprocessorConfig {
    /// Result buffer size used when a caller does not specify one.
    pub default_result_buffer_size: usize,
    /// Upper bound for payload and result buffers.
    pub max_buffer_size: usize,
    /// Skip probing the platform and use this protocol version.
    pub protocol_version: Option<u32>,
    /// Return an empty result instead of an error when a command fails.
    pub empty_result_on_failure: bool,
}

impl Default for CoprocessorConfig {
    fn default() -> Self {
        Self {
            default_result_buffer_size: 4096,
            max_buffer_size: 65536,
            protocol_version: None,
            empty_result_on_failure: false,
        }
    }
}

/// Interrupt dispatch
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InterruptsConfig {
    pub queue_name: String,
    pub read_error_backoff_ms: u64,
    /// Pins sharing `pin % group_width` share one interrupt group.
    pub group_width: u8,
}

impl InterruptsConfig {
    pub fn read_error_backoff(&self) -> Duration {
        Duration::from_millis(self.read_error_backoff_ms)
    }
}

impl Default for InterruptsConfig {
    fn default() -> Self {
        Self {
            queue_name: "/gpio-interrupts".to_string(),
            read_error_backoff_ms: 5000,
            group_width: 16,
        }
    }
}

/// What to do when a downloaded archive does not match its declared hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashMismatchPolicy {
    /// Log a warning and keep the archive.
    #[default]
    Warn,
    /// Delete the archive and leave the update un-retrieved.
    Reject,
}

impl FromStr for HashMismatchPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "warn" => Ok(HashMismatchPolicy::Warn),
            "reject" => Ok(HashMismatchPolicy::Reject),
            other => Err(format!("unknown hash mismatch policy '{}' (expected warn or reject)", other)),
        }
    }
}

/// Over-the-air update service
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub enabled: bool,
    pub update_server: String,
    pub update_port: u16,
    pub use_authentication: bool,
    pub auth_server: String,
    pub auth_port: u16,
    /// Topics to subscribe to; `{ID}` is replaced with the device id.
    pub topics: Vec<String>,
    /// Holds `update-store/` and the extracted `update/` tree.
    pub root_directory: PathBuf,
    pub auth_retry_seconds: u64,
    pub connect_retry_seconds: u64,
    pub idle_poll_ms: u64,
    pub shutdown_timeout_ms: u64,
    /// Prefixed to download URLs that carry no scheme.
    pub default_download_scheme: String,
    pub hash_mismatch_policy: HashMismatchPolicy,
    /// Raise a failure event when a download fails.
    pub report_download_failures: bool,
}

impl UpdateConfig {
    pub fn auth_retry_delay(&self) -> Duration {
        Duration::from_secs(self.auth_retry_seconds)
    }

    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_secs(self.connect_retry_seconds)
    }

    pub fn idle_poll_interval(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            update_server: String::new(),
            update_port: 1883,
            use_authentication: false,
            auth_server: String::new(),
            auth_port: 443,
            topics: vec!["{ID}/updates".to_string()],
            root_directory: PathBuf::from("/data"),
            auth_retry_seconds: 10,
            connect_retry_seconds: 15,
            idle_poll_ms: 1000,
            shutdown_timeout_ms: 5000,
            default_download_scheme: "http".to_string(),
            hash_mismatch_policy: HashMismatchPolicy::Warn,
            report_download_failures: false,
        }
    }
}

/// Logging
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for rotated log files; console only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}
