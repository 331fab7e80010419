// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the HTTP and pub/sub collaborators.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{url} answered with HTTP {status}")]
    Status { status: u16, url: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("connect failed: {0}")]
    Connect(String),

    #[error("subscribe to '{topic}' failed: {reason}")]
    Subscribe { topic: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Device login failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("login rejected with HTTP {0}")]
    Rejected(u16),

    #[error("malformed login response: {0}")]
    Response(String),

    /// The device key could not decrypt the session key. The device has to be
    /// provisioned again before it can log in.
    #[error("device needs re-provisioning")]
    NeedsReprovisioning,

    #[error("session key decryption failed: {0}")]
    KeyDecryption(String),

    #[error("token decryption failed: {0}")]
    TokenDecryption(String),
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("invalid update id '{0}'")]
    InvalidId(String),

    #[error("unknown update '{0}'")]
    UnknownUpdate(String),

    #[error("update '{0}' has not been retrieved")]
    NotRetrieved(String),

    #[error("hash mismatch for update '{id}': expected {expected}, got {actual}")]
    HashMismatch { id: String, expected: String, actual: String },

    #[error("extracted update in {0} has neither an app nor an os payload")]
    MissingPayload(PathBuf),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("background task failed: {0}")]
    Task(String),
}

pub type UpdateResult<T> = Result<T, UpdateError>;
