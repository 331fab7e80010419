// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use shim_codec::{FunctionId, InterfaceId, ProtocolVersion};
use tracing::{debug, info};

/// One command as handed to the platform.
///
/// The caller owns both buffers for the duration of the call. The platform
/// writes the co-processor status into `status` and the response into
/// `result`.
#[derive(Debug)]
pub struct CommandEnvelope<'a> {
    pub interface: InterfaceId,
    pub function: FunctionId,
    pub status: u32,
    pub payload: &'a [u8],
    pub result: &'a mut [u8],
    pub blocking: bool,
}

/// The native co-processor command primitive.
pub trait CoprocessorCall: Send + Sync {
    /// Execute one command.
    ///
    /// # Arguments
    /// * `envelope` - Interface, function, payload and result buffer
    ///
    /// # Returns
    /// Platform return code, 0 on success. The co-processor's own status is
    /// written to `envelope.status`.
    fn execute(&self, envelope: &mut CommandEnvelope<'_>) -> i32;
}

/// A co-processor call plus the optional protocol version entry point.
pub trait CoprocessorPlatform: CoprocessorCall {
    /// Protocol version reported by the platform, or `None` when the platform
    /// has no version entry point (older firmware).
    fn protocol_version(&self) -> Option<u32> {
        None
    }
}

/// Capabilities resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformCapabilities {
    pub protocol_version: ProtocolVersion,
}

impl PlatformCapabilities {
    /// Probe the platform. A configured version takes precedence; a platform
    /// without a version entry point is treated as [`ProtocolVersion::LEGACY`].
    pub fn probe(platform: &dyn CoprocessorPlatform, configured: Option<u32>) -> Self {
        let protocol_version = match configured {
            Some(version) => {
                debug!("[HAL] Using configured protocol version {}", version);
                ProtocolVersion(version)
            }
            None => platform
                .protocol_version()
                .map(ProtocolVersion)
                .unwrap_or(ProtocolVersion::LEGACY),
        };
        info!(version = protocol_version.0, "[HAL] Co-processor protocol {}", protocol_version);
        Self { protocol_version }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Legacy;

    impl CoprocessorCall for Legacy {
        fn execute(&self, _envelope: &mut CommandEnvelope<'_>) -> i32 {
            0
        }
    }

    impl CoprocessorPlatform for Legacy {}

    struct Versioned(u32);

    impl CoprocessorCall for Versioned {
        fn execute(&self, _envelope: &mut CommandEnvelope<'_>) -> i32 {
            0
        }
    }

    impl CoprocessorPlatform for Versioned {
        fn protocol_version(&self) -> Option<u32> {
            Some(self.0)
        }
    }

    #[test]
    fn test_missing_entry_point_is_legacy() {
        assert_eq!(PlatformCapabilities::probe(&Legacy, None).protocol_version, ProtocolVersion::LEGACY);
    }

    #[test]
    fn test_probe_prefers_configuration() {
        assert_eq!(PlatformCapabilities::probe(&Versioned(1), None).protocol_version, ProtocolVersion(1));
        assert_eq!(PlatformCapabilities::probe(&Versioned(1), Some(0)).protocol_version, ProtocolVersion(0));
    }
}
