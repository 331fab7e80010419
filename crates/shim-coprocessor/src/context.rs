// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use shim_codec::ProtocolVersion;
use shim_config::CoprocessorConfig;
use shim_hal::{CoprocessorPlatform, PlatformCapabilities};
use std::sync::Arc;

/// Everything the channel needs from startup: the platform handle, the
/// protocol version resolved once, and the buffer limits.
#[derive(Clone)]
pub struct ChannelContext {
    pub platform: Arc<dyn CoprocessorPlatform>,
    pub protocol_version: ProtocolVersion,
    pub default_result_buffer_size: usize,
    pub max_buffer_size: usize,
    pub empty_result_on_failure: bool,
}

impl ChannelContext {
    /// Probe the platform (unless the configuration pins a version) and
    /// capture the buffer settings.
    pub fn new(platform: Arc<dyn CoprocessorPlatform>, config: &CoprocessorConfig) -> Self {
        let capabilities = PlatformCapabilities::probe(platform.as_ref(), config.protocol_version);
        Self {
            platform,
            protocol_version: capabilities.protocol_version,
            default_result_buffer_size: config.default_result_buffer_size,
            max_buffer_size: config.max_buffer_size,
            empty_result_on_failure: config.empty_result_on_failure,
        }
    }

    pub fn with_protocol_version(mut self, protocol_version: ProtocolVersion) -> Self {
        self.protocol_version = protocol_version;
        self
    }
}

impl std::fmt::Debug for ChannelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelContext")
            .field("protocol_version", &self.protocol_version)
            .field("default_result_buffer_size", &self.default_result_buffer_size)
            .field("max_buffer_size", &self.max_buffer_size)
            .field("empty_result_on_failure", &self.empty_result_on_failure)
            .finish_non_exhaustive()
    }
}
