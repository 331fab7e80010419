// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # MCU Shim Configuration
//!
//! Type-safe configuration for the shim, resolved once at startup:
//! - TOML file parsing (`shim_configuration.toml`)
//! - Environment variable overrides (`SHIM_*`)
//! - CLI argument overrides (`section.field` keys)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use shim_config::{load_config, ShimConfig};
//!
//! let config: ShimConfig = load_config(None, None).expect("Failed to load config");
//! println!("Interrupt queue: {}", config.interrupts.queue_name);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "shim_configuration.toml";

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{apply_cli_overrides, apply_environment_overrides, apply_override, find_config_file, load_config};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
