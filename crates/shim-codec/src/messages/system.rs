// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::wire_message;

wire_message! {
    /// Persistent co-processor configuration block.
    pub struct SystemConfiguration {
        pub software_version_major: u8,
        pub software_version_minor: u8,
        pub software_version_build: u16,
        pub device_name: String,
        pub default_access_point: String,
        pub maximum_retry_count: u8,
        pub antenna: u8,
        pub automatically_start_network: bool,
        pub automatically_reconnect: bool,
        pub get_time_at_startup: bool,
        pub ntp_server: String,
        pub station_mac_address: [u8; 6],
        pub soft_ap_mac_address: [u8; 6],
        pub bluetooth_mac_address: [u8; 6],
        pub boot_count: u32,
    }
}

wire_message! {
    /// Version strings reported by the co-processor firmware.
    pub struct DeviceInformation {
        pub hardware_version: String,
        pub firmware_version: String,
        pub build_date: String,
        pub coprocessor_id: String,
    }
}

wire_message! {
    pub struct HealthInformation {
        pub free_heap: u32,
        pub minimum_free_heap: u32,
        pub uptime_ms: u32,
        pub reset_reason: u8,
    }
}

wire_message! {
    /// Error raised asynchronously by a co-processor component.
    pub struct ErrorEventData {
        pub error_code: u32,
        pub component: u8,
        pub message: String,
    }
}

wire_message! {
    /// Generic event envelope: which interface/function raised it, its status
    /// and an opaque payload decoded by the interface owner.
    pub struct EventData {
        pub interface: u8,
        pub function: u32,
        pub status: u32,
        pub payload: Vec<u8>,
    }
}

wire_message! {
    pub struct ResetRequest {
        pub reason: u8,
        pub delay_ms: u32,
    }
}

wire_message! {
    pub struct RtcTime {
        pub seconds: u32,
        pub microseconds: u32,
    }
}

wire_message! {
    pub struct NtpConfiguration {
        pub enabled: bool,
        pub server: String,
        pub sync_interval_seconds: u32,
    }
}

wire_message! {
    pub struct AntennaConfiguration {
        pub antenna: u8,
        pub persist: bool,
    }
}

wire_message! {
    pub struct ProtocolVersionResponse {
        pub version: u32,
    }
}

wire_message! {
    /// Single string argument or result.
    pub struct StringPayload {
        pub value: String,
    }
}

wire_message! {
    pub struct U32Payload {
        pub value: u32,
    }
}
