// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// An update notification as published by the update server, plus the local
/// progress flags. Stored verbatim as `info.json`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateMessage {
    #[serde(rename = "ID")]
    pub id: String,
    pub mpak_download_url: String,
    #[serde(default)]
    pub download_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_type: Option<serde_json::Value>,
    #[serde(default)]
    pub retrieved: bool,
    #[serde(default)]
    pub applied: bool,
}

impl UpdateMessage {
    pub fn new(id: impl Into<String>, download_url: impl Into<String>, download_hash: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mpak_download_url: download_url.into(),
            download_hash: download_hash.into(),
            ..Default::default()
        }
    }
}
