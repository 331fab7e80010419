// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors produced while encoding or decoding wire messages.
///
/// Decoding never panics on peer data: every out-of-bounds read, missing
/// string terminator or inconsistent length field becomes a
/// [`CodecError::MalformedMessage`] naming the message type and the absolute
/// byte offset where decoding stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed {message_type} at offset {offset}: {reason}")]
    MalformedMessage {
        message_type: &'static str,
        offset: usize,
        reason: String,
    },

    #[error("{message_type} has {count} trailing bytes after offset {offset}")]
    TrailingBytes {
        message_type: &'static str,
        offset: usize,
        count: usize,
    },

    #[error("unsupported value for {field}: {value}")]
    UnsupportedValue { field: &'static str, value: u32 },
}

impl CodecError {
    pub(crate) fn malformed(message_type: &'static str, offset: usize, reason: impl Into<String>) -> Self {
        CodecError::MalformedMessage {
            message_type,
            offset,
            reason: reason.into(),
        }
    }

    /// True for errors caused by the shape of peer data.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            CodecError::MalformedMessage { .. } | CodecError::TrailingBytes { .. }
        )
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
