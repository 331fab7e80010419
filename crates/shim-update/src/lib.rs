// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Over-the-air Updates
//!
//! - [`UpdateStore`]: persistent update records and archives
//! - [`Authenticator`]: device login yielding a bearer token
//! - [`UpdateService`]: the connection state machine, downloads, staging
//!   and the early-boot completion of an applied update
//!
//! Network access goes through the [`HttpClient`] and [`PubSubClient`]
//! traits. With the `http-reqwest` feature, [`ReqwestHttpClient`] provides
//! the HTTP side.

pub mod archive;
mod auth;
mod error;
#[cfg(feature = "http-reqwest")]
mod http_reqwest;
mod lifecycle;
mod model;
mod service;
mod store;
mod transport;

pub use auth::{Authenticator, DeviceKeyProvider, KeyDecryptError, LOGIN_PATH};
pub use error::{AuthError, TransportError, UpdateError, UpdateResult};
#[cfg(feature = "http-reqwest")]
pub use http_reqwest::ReqwestHttpClient;
pub use lifecycle::ApplicationLifecycle;
pub use model::UpdateMessage;
pub use service::{UpdateCollaborators, UpdateEvent, UpdateService, UpdateState, DEVICE_ID_TOKEN};
pub use store::{UpdateStore, APPLY_PENDING_FILE_NAME, INFO_FILE_NAME, STORE_DIRECTORY, UPDATE_DIRECTORY};
pub use transport::{normalize_url, ConnectOptions, HttpClient, HttpResponse, PubSubClient, PubSubEvent};
