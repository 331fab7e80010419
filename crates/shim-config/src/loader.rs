// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later tiers win:
//! 1. TOML file
//! 2. Environment variables (`SHIM_*`)
//! 3. CLI arguments (`section.field` keys)

use crate::{validate_config, ConfigError, ConfigResult, ShimConfig, CONFIG_FILE_NAME};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming a config file explicitly.
pub const CONFIG_PATH_ENV: &str = "SHIM_CONFIG_PATH";

/// Environment variables and the `section.field` key each one overrides.
const ENVIRONMENT_OVERRIDES: &[(&str, &str)] = &[
    ("SHIM_COPROCESSOR_RESULT_BUFFER_SIZE", "coprocessor.default_result_buffer_size"),
    ("SHIM_COPROCESSOR_MAX_BUFFER_SIZE", "coprocessor.max_buffer_size"),
    ("SHIM_PROTOCOL_VERSION", "coprocessor.protocol_version"),
    ("SHIM_EMPTY_RESULT_ON_FAILURE", "coprocessor.empty_result_on_failure"),
    ("SHIM_INTERRUPT_QUEUE", "interrupts.queue_name"),
    ("SHIM_INTERRUPT_BACKOFF_MS", "interrupts.read_error_backoff_ms"),
    ("SHIM_UPDATE_ENABLED", "update.enabled"),
    ("SHIM_UPDATE_SERVER", "update.update_server"),
    ("SHIM_UPDATE_PORT", "update.update_port"),
    ("SHIM_USE_AUTHENTICATION", "update.use_authentication"),
    ("SHIM_AUTH_SERVER", "update.auth_server"),
    ("SHIM_AUTH_PORT", "update.auth_port"),
    ("SHIM_UPDATE_ROOT", "update.root_directory"),
    ("SHIM_HASH_MISMATCH_POLICY", "update.hash_mismatch_policy"),
    ("SHIM_LOG_LEVEL", "logging.level"),
    ("SHIM_LOG_DIR", "logging.log_dir"),
];

/// Find the shim configuration file
///
/// Search order:
/// 1. `SHIM_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to five parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|path| path.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load and validate the configuration
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI overrides keyed by `section.field`
///
/// # Errors
///
/// Returns error if the file is missing, is not valid TOML, an override does not
/// parse, or validation fails
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<ShimConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: ShimConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    validate_config(&config)?;
    Ok(config)
}

/// Apply `SHIM_*` environment variable overrides.
pub fn apply_environment_overrides(config: &mut ShimConfig) -> ConfigResult<()> {
    for (variable, key) in ENVIRONMENT_OVERRIDES {
        if let Ok(value) = env::var(variable) {
            apply_override(config, key, &value)
                .map_err(|err| ConfigError::InvalidValue(format!("{}: {}", variable, err)))?;
        }
    }
    Ok(())
}

/// Apply CLI overrides, e.g. `{"update.update_port": "8883"}`.
pub fn apply_cli_overrides(config: &mut ShimConfig, cli_args: &HashMap<String, String>) -> ConfigResult<()> {
    for (key, value) in cli_args {
        apply_override(config, key, value)?;
    }
    Ok(())
}

/// Set one field addressed by its `section.field` key.
pub fn apply_override(config: &mut ShimConfig, key: &str, value: &str) -> ConfigResult<()> {
    match key {
        "coprocessor.default_result_buffer_size" => {
            config.coprocessor.default_result_buffer_size = parse(key, value)?
        }
        "coprocessor.max_buffer_size" => config.coprocessor.max_buffer_size = parse(key, value)?,
        "coprocessor.protocol_version" => {
            config.coprocessor.protocol_version = if value.is_empty() {
                None
            } else {
                Some(parse(key, value)?)
            }
        }
        "coprocessor.empty_result_on_failure" => config.coprocessor.empty_result_on_failure = parse_bool(value),
        "interrupts.queue_name" => config.interrupts.queue_name = value.to_string(),
        "interrupts.read_error_backoff_ms" => config.interrupts.read_error_backoff_ms = parse(key, value)?,
        "interrupts.group_width" => config.interrupts.group_width = parse(key, value)?,
        "update.enabled" => config.update.enabled = parse_bool(value),
        "update.update_server" => config.update.update_server = value.to_string(),
        "update.update_port" => config.update.update_port = parse(key, value)?,
        "update.use_authentication" => config.update.use_authentication = parse_bool(value),
        "update.auth_server" => config.update.auth_server = value.to_string(),
        "update.auth_port" => config.update.auth_port = parse(key, value)?,
        "update.topics" => {
            config.update.topics = value
                .split(',')
                .map(str::trim)
                .filter(|topic| !topic.is_empty())
                .map(str::to_string)
                .collect()
        }
        "update.root_directory" => config.update.root_directory = PathBuf::from(value),
        "update.auth_retry_seconds" => config.update.auth_retry_seconds = parse(key, value)?,
        "update.connect_retry_seconds" => config.update.connect_retry_seconds = parse(key, value)?,
        "update.idle_poll_ms" => config.update.idle_poll_ms = parse(key, value)?,
        "update.shutdown_timeout_ms" => config.update.shutdown_timeout_ms = parse(key, value)?,
        "update.default_download_scheme" => config.update.default_download_scheme = value.to_string(),
        "update.hash_mismatch_policy" => {
            config.update.hash_mismatch_policy = value.parse().map_err(ConfigError::InvalidValue)?
        }
        "update.report_download_failures" => config.update.report_download_failures = parse_bool(value),
        "logging.level" => config.logging.level = value.to_string(),
        "logging.log_dir" => {
            config.logging.log_dir = if value.is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            }
        }
        unknown => {
            return Err(ConfigError::InvalidValue(format!("unknown configuration key '{}'", unknown)));
        }
    }
    Ok(())
}

fn parse<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = '{}'", key, value)))
}

fn parse_bool(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value == "true" || value == "1" || value == "yes"
}
