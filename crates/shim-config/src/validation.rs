// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every problem is collected before failing, so one run reports all of them.

use crate::{ConfigError, ConfigResult, ShimConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    ZeroPort { port_name: String },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroPort { port_name } => write!(f, "Port {} must not be 0", port_name),
            Self::MissingRequired { field } => write!(f, "Missing required configuration: {}", field),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &ShimConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }
    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// All problems with `config`, in section order.
pub fn collect_errors(config: &ShimConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_coprocessor(config, &mut errors);
    validate_interrupts(config, &mut errors);
    validate_update(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn validate_coprocessor(config: &ShimConfig, errors: &mut Vec<ConfigValidationError>) {
    let coprocessor = &config.coprocessor;
    if coprocessor.default_result_buffer_size == 0 {
        errors.push(invalid("coprocessor.default_result_buffer_size", "must be greater than 0"));
    }
    if coprocessor.default_result_buffer_size > coprocessor.max_buffer_size {
        errors.push(invalid(
            "coprocessor.default_result_buffer_size",
            format!("exceeds max_buffer_size ({})", coprocessor.max_buffer_size),
        ));
    }
}

fn validate_interrupts(config: &ShimConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.interrupts.queue_name.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "interrupts.queue_name".to_string(),
        });
    }
    if config.interrupts.group_width == 0 {
        errors.push(invalid("interrupts.group_width", "must be greater than 0"));
    }
}

fn validate_update(config: &ShimConfig, errors: &mut Vec<ConfigValidationError>) {
    let update = &config.update;
    if update.update_port == 0 {
        errors.push(ConfigValidationError::ZeroPort {
            port_name: "update.update_port".to_string(),
        });
    }
    if update.auth_port == 0 {
        errors.push(ConfigValidationError::ZeroPort {
            port_name: "update.auth_port".to_string(),
        });
    }
    if update.default_download_scheme.trim().is_empty() {
        errors.push(invalid("update.default_download_scheme", "must not be empty"));
    }
    if !update.enabled {
        return;
    }
    if update.update_server.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "update.update_server".to_string(),
        });
    }
    if update.topics.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "update.topics".to_string(),
        });
    }
    if update.use_authentication && update.auth_server.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "update.auth_server".to_string(),
        });
    }
}

fn validate_logging(config: &ShimConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(invalid(
            "logging.level",
            format!("'{}' is not one of {}", config.logging.level, LOG_LEVELS.join(", ")),
        ));
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigValidationError {
    ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_problems_reported_together() {
        let mut config = ShimConfig::default();
        config.update.enabled = true;
        config.update.use_authentication = true;
        config.update.topics.clear();
        config.interrupts.queue_name = String::new();
        config.coprocessor.default_result_buffer_size = 1 << 20;

        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 5);
        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("update.update_server"));
        assert!(message.contains("update.auth_server"));
        assert!(message.contains("interrupts.queue_name"));
    }

    #[test]
    fn test_disabled_updates_skip_server_checks() {
        let config = ShimConfig::default();
        assert!(!config.update.enabled);
        assert!(collect_errors(&config).is_empty());
    }

    #[test]
    fn test_log_level_checked() {
        let mut config = ShimConfig::default();
        config.logging.level = "WARN".into();
        assert!(validate_config(&config).is_ok());
        config.logging.level = "loud".into();
        assert!(validate_config(&config).is_err());
    }
}
