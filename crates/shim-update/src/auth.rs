// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Device login against the update server.
//!
//! The server answers a login with a session key encrypted for the device's
//! private key and a bearer token encrypted with that session key (AES-CBC,
//! no padding). The token is padded with non-alphanumeric bytes, which are
//! stripped.

use crate::transport::{normalize_url, HttpClient};
use crate::AuthError;
use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Path of the login endpoint on the auth server.
pub const LOGIN_PATH: &str = "/api/devices/login/";

/// Why the device key could not decrypt a ciphertext.
#[derive(Debug, Error)]
pub enum KeyDecryptError {
    /// The ciphertext does not fit the key; the key on the device no longer
    /// matches the one the server encrypts for.
    #[error("ciphertext overflows the device key")]
    Overflow,

    #[error("{0}")]
    Failed(String),
}

/// The device's private-key capability.
pub trait DeviceKeyProvider: Send + Sync {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, KeyDecryptError>;
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LoginResponse {
    encrypted_key: String,
    encrypted_token: String,
    iv: String,
}

pub struct Authenticator {
    http: Arc<dyn HttpClient>,
    keys: Arc<dyn DeviceKeyProvider>,
    login_url: String,
}

impl Authenticator {
    pub fn new(http: Arc<dyn HttpClient>, keys: Arc<dyn DeviceKeyProvider>, auth_server: &str, auth_port: u16) -> Self {
        let server = normalize_url(auth_server.trim_end_matches('/'), "https");
        Self {
            http,
            keys,
            login_url: format!("{}:{}{}", server, auth_port, LOGIN_PATH),
        }
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Log in as `device_id` and return the bearer token.
    pub async fn login(&self, device_id: &str) -> Result<String, AuthError> {
        let id = device_id.to_uppercase();
        let body = serde_json::to_value(LoginRequest { id: &id }).map_err(|e| AuthError::Response(e.to_string()))?;
        debug!("[UPDATE] Logging in at {}", self.login_url);
        let response = self.http.post_json(&self.login_url, &body).await?;
        if !response.is_success() {
            return Err(AuthError::Rejected(response.status));
        }
        let login: LoginResponse =
            serde_json::from_slice(&response.body).map_err(|e| AuthError::Response(e.to_string()))?;

        let encrypted_key = decode_field("EncryptedKey", &login.encrypted_key)?;
        let mut token = decode_field("EncryptedToken", &login.encrypted_token)?;
        let iv = decode_field("Iv", &login.iv)?;

        let key = self.keys.decrypt(&encrypted_key).map_err(|e| match e {
            KeyDecryptError::Overflow => AuthError::NeedsReprovisioning,
            KeyDecryptError::Failed(reason) => AuthError::KeyDecryption(reason),
        })?;
        let plain = decrypt_token(&key, &iv, &mut token)?;
        let token = String::from_utf8_lossy(strip_padding(plain)).into_owned();
        info!("[UPDATE] Device {} authenticated", id);
        Ok(token)
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, AuthError> {
    STANDARD
        .decode(value.trim())
        .map_err(|e| AuthError::Response(format!("{} is not base64: {}", name, e)))
}

fn decrypt_token<'a>(key: &[u8], iv: &[u8], data: &'a mut [u8]) -> Result<&'a [u8], AuthError> {
    let invalid = |e: aes::cipher::InvalidLength| AuthError::TokenDecryption(format!("{} (key {} bytes, iv {} bytes)", e, key.len(), iv.len()));
    let unpad = |e: aes::cipher::block_padding::UnpadError| AuthError::TokenDecryption(e.to_string());
    match key.len() {
        16 => cbc::Decryptor::<aes::Aes128>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_mut::<NoPadding>(data)
            .map_err(unpad),
        24 => cbc::Decryptor::<aes::Aes192>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_mut::<NoPadding>(data)
            .map_err(unpad),
        32 => cbc::Decryptor::<aes::Aes256>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_mut::<NoPadding>(data)
            .map_err(unpad),
        other => Err(AuthError::TokenDecryption(format!("unsupported session key length {}", other))),
    }
}

fn strip_padding(token: &[u8]) -> &[u8] {
    let end = token
        .iter()
        .rposition(|b| b.is_ascii_alphanumeric())
        .map_or(0, |index| index + 1);
    &token[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_padding() {
        assert_eq!(strip_padding(b"abc123\0\0\x04\x04"), b"abc123");
        assert_eq!(strip_padding(b"a-b\x10"), b"a-b");
        assert_eq!(strip_padding(b"\0\0"), b"");
    }

    #[test]
    fn test_login_url() {
        struct NoKeys;
        impl DeviceKeyProvider for NoKeys {
            fn decrypt(&self, _: &[u8]) -> Result<Vec<u8>, KeyDecryptError> {
                Err(KeyDecryptError::Failed("none".to_string()))
            }
        }
        struct NoHttp;
        #[async_trait::async_trait]
        impl HttpClient for NoHttp {
            async fn post_json(
                &self,
                _: &str,
                _: &serde_json::Value,
            ) -> Result<crate::transport::HttpResponse, crate::TransportError> {
                Err(crate::TransportError::Request("offline".to_string()))
            }
            async fn download_to_file(
                &self,
                _: &str,
                _: Option<&str>,
                _: &std::path::Path,
            ) -> Result<u64, crate::TransportError> {
                Err(crate::TransportError::Request("offline".to_string()))
            }
        }
        let auth = Authenticator::new(Arc::new(NoHttp), Arc::new(NoKeys), "auth.example.com/", 8443);
        assert_eq!(auth.login_url(), "https://auth.example.com:8443/api/devices/login/");
    }
}
