// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use shim_hal::{HalError, PinId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterruptError {
    /// Another pin already owns the interrupt group.
    #[error("interrupt group {group} is in use by {owner}")]
    GroupInUse { group: u8, owner: PinId },

    /// The platform rejected the control call.
    #[error("interrupt control for {pin} failed with status {status}")]
    ControlFailed { pin: PinId, status: i32 },

    #[error("{0} does not fit the notification record encoding")]
    PinNotEncodable(PinId),

    #[error("no interrupt is registered for {0}")]
    NotRegistered(PinId),

    #[error("failed to start the interrupt listener: {0}")]
    ListenerSpawn(#[from] std::io::Error),

    #[error(transparent)]
    Hal(#[from] HalError),
}

pub type InterruptResult<T> = Result<T, InterruptError>;
