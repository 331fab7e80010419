// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::PinId;
use thiserror::Error;

/// Errors reported by platform collaborators.
#[derive(Debug, Error)]
pub enum HalError {
    #[error("notification queue '{name}' unavailable: {reason}")]
    QueueUnavailable { name: String, reason: String },

    #[error("notification queue read failed: {0}")]
    QueueRead(String),

    #[error("operation not supported on this platform: {0}")]
    NotSupported(&'static str),

    #[error("invalid pin name '{0}'")]
    InvalidPinName(String),

    #[error("pin {pin} does not support {capability}")]
    MissingCapability { pin: PinId, capability: &'static str },

    #[error("pin {pin}: {source}")]
    Port {
        pin: PinId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HalResult<T> = Result<T, HalError>;
