// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Network collaborators of the update service.

use crate::TransportError;
use async_trait::async_trait;
use std::path::Path;

/// Response of an HTTP request whose body fits in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POST `body` as JSON.
    ///
    /// # Returns
    /// The response whatever its status; only transport failures are errors
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse, TransportError>;

    /// GET `url` and stream the body into `destination`.
    ///
    /// # Arguments
    /// * `bearer` - Bearer token for the `Authorization` header
    ///
    /// # Returns
    /// Bytes written. A non-2xx status is [`TransportError::Status`].
    async fn download_to_file(&self, url: &str, bearer: Option<&str>, destination: &Path) -> Result<u64, TransportError>;
}

/// Broker connection settings, built once per login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Asynchronous notifications from the broker client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PubSubEvent {
    Connected,
    Disconnected,
    Message { topic: String, payload: Vec<u8> },
}

/// MQTT-style broker client.
///
/// `connect` only starts the connection; the client reports
/// [`PubSubEvent::Connected`] on its event channel once the broker accepts it.
#[async_trait]
pub trait PubSubClient: Send + Sync {
    async fn connect(&self, options: &ConnectOptions) -> Result<(), TransportError>;
    async fn subscribe(&self, topic: &str) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// Prefix `default_scheme` when `url` carries none.
pub fn normalize_url(url: &str, default_scheme: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("{}://{}", default_scheme, url.trim_start_matches('/'))
    }
}
