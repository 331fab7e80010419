// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use shim_codec::{CodecError, FunctionId, InterfaceId, StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    /// The platform call returned non-zero or the co-processor reported a
    /// status other than `CompletedOk`.
    #[error("command {interface}/{function} failed: status {status}, return code {return_code}")]
    CommandFailed {
        interface: InterfaceId,
        function: FunctionId,
        status: StatusCode,
        return_code: i32,
    },

    /// A programming error in the request itself.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ChannelError {
    pub fn is_command_failure(&self) -> bool {
        matches!(self, ChannelError::CommandFailed { .. })
    }
}

pub type ChannelResult<T> = Result<T, ChannelError>;
