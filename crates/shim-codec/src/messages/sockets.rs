// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! BSD-style socket calls forwarded to the co-processor's network stack.
//!
//! Handles are the co-processor's descriptors; results follow the usual
//! convention of a negative value plus `errno` on failure.

use crate::wire_message;

pub const ADDRESS_FAMILY_INET: u8 = 2;
pub const ADDRESS_FAMILY_INET6: u8 = 10;

wire_message! {
    pub struct SocketCreateRequest {
        pub family: u8,
        pub socket_type: u8,
        pub protocol: u8,
    }
}

wire_message! {
    pub struct SocketHandleResponse {
        pub handle: i32,
    }
}

wire_message! {
    /// IPv4 addresses use the first four bytes of `address`.
    pub struct SocketAddress {
        pub family: u8,
        pub port: u16,
        pub address: [u8; 16],
    }
}

wire_message! {
    pub struct SocketBindRequest {
        pub handle: i32,
        pub address: SocketAddress,
    }
}

wire_message! {
    pub struct SocketConnectRequest {
        pub handle: i32,
        pub address: SocketAddress,
        pub timeout_ms: u32,
    }
}

wire_message! {
    pub struct SocketListenRequest {
        pub handle: i32,
        pub backlog: i32,
    }
}

wire_message! {
    pub struct SocketAcceptResponse {
        pub handle: i32,
        pub address: SocketAddress,
    }
}

wire_message! {
    pub struct SocketSendRequest {
        pub handle: i32,
        pub flags: i32,
        pub data: Vec<u8>,
    }
}

wire_message! {
    pub struct SocketSendToRequest {
        pub handle: i32,
        pub flags: i32,
        pub address: SocketAddress,
        pub data: Vec<u8>,
    }
}

wire_message! {
    pub struct SocketReceiveRequest {
        pub handle: i32,
        pub flags: i32,
        pub max_length: u32,
        pub timeout_ms: u32,
    }
}

wire_message! {
    pub struct SocketReceiveResponse {
        pub result: i32,
        pub data: Vec<u8>,
    }
}

wire_message! {
    pub struct SocketReceiveFromResponse {
        pub result: i32,
        pub address: SocketAddress,
        pub data: Vec<u8>,
    }
}

wire_message! {
    pub struct SocketCloseRequest {
        pub handle: i32,
    }
}

wire_message! {
    pub struct SocketShutdownRequest {
        pub handle: i32,
        pub how: u8,
    }
}

wire_message! {
    /// Used for both set and get; `value` is empty on a get.
    pub struct SocketOptionRequest {
        pub handle: i32,
        pub level: i32,
        pub option_name: i32,
        pub value: Vec<u8>,
    }
}

wire_message! {
    pub struct SocketOptionResponse {
        pub result: i32,
        pub value: Vec<u8>,
    }
}

wire_message! {
    pub struct GetAddrInfoRequest {
        pub node: String,
        pub service: String,
        pub family: u8,
        pub socket_type: u8,
        pub flags: i32,
    }
}

wire_message! {
    pub struct AddrInfoEntry {
        pub family: u8,
        pub socket_type: u8,
        pub protocol: u8,
        pub address: SocketAddress,
        pub canonical_name: String,
    }
}

wire_message! {
    pub struct GetAddrInfoResponse {
        pub result: i32,
        pub entries: Vec<AddrInfoEntry>,
    }
}

wire_message! {
    /// Result of calls that return nothing but a status.
    pub struct SocketResultResponse {
        pub result: i32,
        pub errno: i32,
    }
}

wire_message! {
    pub struct PollDescriptor {
        pub handle: i32,
        pub events: u16,
        pub revents: u16,
    }
}

wire_message! {
    pub struct SocketPollRequest {
        pub descriptors: Vec<PollDescriptor>,
        pub timeout_ms: i32,
    }
}

wire_message! {
    pub struct SocketPollResponse {
        pub result: i32,
        pub descriptors: Vec<PollDescriptor>,
    }
}

wire_message! {
    /// TLS material for a socket; empty blobs leave the co-processor default in place.
    pub struct TlsConfigurationRequest {
        pub handle: i32,
        pub server_name: String,
        pub ca_certificate: Vec<u8>,
        pub client_certificate: Vec<u8>,
        pub client_key: Vec<u8>,
        pub verify_peer: bool,
    }
}
