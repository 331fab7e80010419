// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{wire_message, SsidString};

/// Byte offsets of the address triple at the start of a connect result.
pub const CONNECT_RESULT_IP_OFFSET: usize = 0;
pub const CONNECT_RESULT_SUBNET_OFFSET: usize = 4;
pub const CONNECT_RESULT_GATEWAY_OFFSET: usize = 8;

wire_message! {
    /// Credentials sent with [`crate::WiFiFunction::ConnectToAccessPoint`].
    ///
    /// The SSID occupies a fixed 33-byte slot; longer names are cut at the
    /// byte level when the value is built.
    pub struct WiFiCredentials {
        pub ssid: SsidString,
        pub password: String,
        pub reconnect: u8,
    }
}

wire_message! {
    /// Result of a successful connect, also raised as an event on reconnect.
    pub struct ConnectEventData {
        pub ip_address: [u8; 4],
        pub subnet_mask: [u8; 4],
        pub gateway: [u8; 4],
        pub ssid: SsidString,
        pub bssid: [u8; 6],
        pub channel: u8,
        pub auth_mode: u8,
    }
}

wire_message! {
    /// One entry of a scan result.
    pub struct AccessPoint {
        pub ssid: SsidString,
        pub bssid: [u8; 6],
        pub rssi: i8,
        pub channel: u8,
        pub auth_mode: u8,
    }
}

wire_message! {
    pub struct ScanRequest {
        pub max_results: u16,
        pub show_hidden: bool,
        pub channel: u8,
    }
}

wire_message! {
    pub struct ScanResponse {
        pub access_points: Vec<AccessPoint>,
    }
}

wire_message! {
    /// Static IPv4 configuration; ignored by the co-processor when `use_dhcp` is set.
    pub struct NetworkConfiguration {
        pub use_dhcp: bool,
        pub ip_address: [u8; 4],
        pub subnet_mask: [u8; 4],
        pub gateway: [u8; 4],
        pub primary_dns: [u8; 4],
        pub secondary_dns: [u8; 4],
    }
}

wire_message! {
    pub struct Ipv6Address {
        pub address: [u8; 16],
        pub prefix_length: u8,
    }
}

wire_message! {
    pub struct NetworkInterfaceInfo {
        pub mac_address: [u8; 6],
        pub ip_address: [u8; 4],
        pub subnet_mask: [u8; 4],
        pub gateway: [u8; 4],
        pub ipv6_addresses: Vec<Ipv6Address>,
        pub hostname: String,
    }
}

wire_message! {
    pub struct SoftApConfiguration {
        pub ssid: SsidString,
        pub password: String,
        pub channel: u8,
        pub auth_mode: u8,
        pub max_connections: u8,
        pub hidden: bool,
    }
}

wire_message! {
    /// A station joined the soft access point.
    pub struct StationConnectedEventData {
        pub mac_address: [u8; 6],
        pub association_id: u8,
    }
}

wire_message! {
    pub struct StationDisconnectedEventData {
        pub mac_address: [u8; 6],
        pub association_id: u8,
    }
}

wire_message! {
    pub struct RssiResponse {
        pub rssi: i8,
    }
}

wire_message! {
    pub struct MacAddressPayload {
        pub mac_address: [u8; 6],
    }
}

wire_message! {
    pub struct HostnameRequest {
        pub hostname: String,
    }
}

wire_message! {
    pub struct DnsServersResponse {
        pub servers: Vec<[u8; 4]>,
    }
}
